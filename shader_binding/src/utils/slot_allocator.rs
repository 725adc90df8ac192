/// Hands out and reclaims stable `u32` slot indices, up to a fixed capacity.
///
/// Vacated slots go on a LIFO free list and are handed out again before the
/// high-water mark grows. Every slot carries a liveness flag, so freeing a
/// slot that is not currently allocated is reported instead of corrupting
/// the free list.
///
/// # Example
///
/// ```
/// use shader_binding::utils::SlotAllocator;
///
/// let mut slots = SlotAllocator::with_capacity(8);
/// let a = slots.alloc().unwrap(); // 0
/// let _b = slots.alloc().unwrap(); // 1
/// assert!(slots.free(a));
/// assert!(!slots.free(a)); // already free
/// assert_eq!(slots.alloc(), Some(0)); // recycled
/// ```
#[derive(Debug, Clone)]
pub struct SlotAllocator {
    free_list: Vec<u32>,
    live: Vec<bool>,
    len: u32,
    capacity: u32,
}

impl SlotAllocator {
    /// Allocator that never hands out an index >= `capacity`
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            free_list: Vec::new(),
            live: Vec::new(),
            len: 0,
            capacity,
        }
    }

    /// Next slot index, recycled first (None when every slot is taken)
    pub fn alloc(&mut self) -> Option<u32> {
        let id = match self.free_list.pop() {
            Some(id) => id,
            None => {
                let id = self.high_water_mark();
                if id >= self.capacity {
                    return None;
                }
                self.live.push(false);
                id
            }
        };
        self.live[id as usize] = true;
        self.len += 1;
        Some(id)
    }

    /// Return `id` to the pool. False if `id` is not currently allocated.
    pub fn free(&mut self, id: u32) -> bool {
        if !self.is_live(id) {
            return false;
        }
        self.live[id as usize] = false;
        self.len -= 1;
        self.free_list.push(id);
        true
    }

    /// Whether `id` is currently allocated
    pub fn is_live(&self, id: u32) -> bool {
        self.live.get(id as usize).copied().unwrap_or(false)
    }

    /// Highest index ever allocated + 1
    pub fn high_water_mark(&self) -> u32 {
        self.live.len() as u32
    }

    /// Maximum number of slots
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of currently allocated slots
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
#[path = "slot_allocator_tests.rs"]
mod tests;
