#![allow(dead_code)]
//! Minimal SPIR-V assembler for reflection tests
//!
//! Emits just enough of a module (SPIR-V 1.0, Logical/GLSL450) to declare
//! float and 8-bit integer vertex inputs, uniform and storage blocks made of
//! float vectors, and combined image samplers. Storage blocks use the
//! pre-1.3 `BufferBlock` decoration. Every declared resource is loaded in
//! `main` unless it is explicitly marked unused, so reference-based
//! filtering can be exercised.

/// Execution model of the generated entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

/// Buffer block whose members are float vectors laid out on 16-byte boundaries
#[derive(Debug, Clone)]
pub struct BufferBlock {
    pub set: u32,
    pub binding: u32,
    /// Component count of each member (1 = float, 4 = vec4)
    pub members: Vec<u32>,
    pub used: bool,
    /// Storage block instead of uniform block
    pub storage: bool,
    /// Trailing runtime-sized `vec4[]` after the members
    pub runtime_tail: bool,
}

/// Builder for a single-entry-point module
#[derive(Debug, Clone)]
pub struct SpirvModule {
    stage: Stage,
    entry_point: String,
    inputs: Vec<(u32, u32)>,
    /// Locations of scalar 8-bit signed integer inputs
    int8_inputs: Vec<u32>,
    blocks: Vec<BufferBlock>,
    samplers: Vec<(u32, u32)>,
}

const OP_CAPABILITY: u32 = 17;
const OP_MEMORY_MODEL: u32 = 14;
const OP_ENTRY_POINT: u32 = 15;
const OP_EXECUTION_MODE: u32 = 16;
const OP_DECORATE: u32 = 71;
const OP_MEMBER_DECORATE: u32 = 72;
const OP_TYPE_VOID: u32 = 19;
const OP_TYPE_FUNCTION: u32 = 33;
const OP_TYPE_INT: u32 = 21;
const OP_TYPE_FLOAT: u32 = 22;
const OP_TYPE_VECTOR: u32 = 23;
const OP_TYPE_IMAGE: u32 = 25;
const OP_TYPE_SAMPLED_IMAGE: u32 = 27;
const OP_TYPE_RUNTIME_ARRAY: u32 = 29;
const OP_TYPE_STRUCT: u32 = 30;
const OP_TYPE_POINTER: u32 = 32;
const OP_VARIABLE: u32 = 59;
const OP_FUNCTION: u32 = 54;
const OP_LABEL: u32 = 248;
const OP_LOAD: u32 = 61;
const OP_RETURN: u32 = 253;
const OP_FUNCTION_END: u32 = 56;

const CAPABILITY_SHADER: u32 = 1;
const CAPABILITY_INT8: u32 = 39;

const DECORATION_BLOCK: u32 = 2;
const DECORATION_BUFFER_BLOCK: u32 = 3;
const DECORATION_ARRAY_STRIDE: u32 = 6;
const DECORATION_LOCATION: u32 = 30;
const DECORATION_BINDING: u32 = 33;
const DECORATION_DESCRIPTOR_SET: u32 = 34;
const DECORATION_OFFSET: u32 = 35;

const STORAGE_UNIFORM_CONSTANT: u32 = 0;
const STORAGE_INPUT: u32 = 1;
const STORAGE_UNIFORM: u32 = 2;

fn op(opcode: u32, operands: &[u32]) -> Vec<u32> {
    let mut words = Vec::with_capacity(operands.len() + 1);
    words.push(((operands.len() as u32 + 1) << 16) | opcode);
    words.extend_from_slice(operands);
    words
}

fn string_words(s: &str) -> Vec<u32> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.push(0);
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

impl SpirvModule {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            entry_point: "main".to_string(),
            inputs: Vec::new(),
            int8_inputs: Vec::new(),
            blocks: Vec::new(),
            samplers: Vec::new(),
        }
    }

    pub fn entry_point(mut self, name: &str) -> Self {
        self.entry_point = name.to_string();
        self
    }

    /// Float input (`components` = 1..4) at `location`
    pub fn input(mut self, location: u32, components: u32) -> Self {
        self.inputs.push((location, components));
        self
    }

    /// Scalar 8-bit signed integer input at `location`
    pub fn int8_input(mut self, location: u32) -> Self {
        self.int8_inputs.push(location);
        self
    }

    fn block(mut self, set: u32, binding: u32, members: &[u32], used: bool, storage: bool, runtime_tail: bool) -> Self {
        self.blocks.push(BufferBlock {
            set,
            binding,
            members: members.to_vec(),
            used,
            storage,
            runtime_tail,
        });
        self
    }

    /// Uniform block of float vectors, each member on its own 16-byte slot
    pub fn uniform_block(self, set: u32, binding: u32, members: &[u32]) -> Self {
        self.block(set, binding, members, true, false, false)
    }

    /// Uniform block that is declared but never accessed
    pub fn unused_uniform_block(self, set: u32, binding: u32, members: &[u32]) -> Self {
        self.block(set, binding, members, false, false, false)
    }

    /// Storage block of float vectors, laid out like a uniform block
    pub fn storage_block(self, set: u32, binding: u32, members: &[u32]) -> Self {
        self.block(set, binding, members, true, true, false)
    }

    /// Storage block whose members are followed by a runtime-sized `vec4[]`
    pub fn runtime_storage_block(self, set: u32, binding: u32, members: &[u32]) -> Self {
        self.block(set, binding, members, true, true, true)
    }

    /// 2D combined image sampler at (set, binding)
    pub fn sampler(mut self, set: u32, binding: u32) -> Self {
        self.samplers.push((set, binding));
        self
    }

    /// Assemble into SPIR-V words
    pub fn words(&self) -> Vec<u32> {
        let mut next_id = 1u32;
        let mut alloc = || {
            let id = next_id;
            next_id += 1;
            id
        };

        let void_id = alloc();
        let fn_ty = alloc();
        let f32_id = alloc();
        let main_id = alloc();
        let label_id = alloc();

        // Vector types, deduplicated by component count (index 0 unused, 1 = f32)
        let mut vec_ids = [0u32; 5];
        vec_ids[1] = f32_id;
        let mut needed = Vec::new();
        for &(_, n) in &self.inputs {
            needed.push(n);
        }
        for block in &self.blocks {
            needed.extend(block.members.iter().copied());
            if block.runtime_tail {
                needed.push(4);
            }
        }
        for n in needed {
            if n > 1 && vec_ids[n as usize] == 0 {
                vec_ids[n as usize] = alloc();
            }
        }

        // Input pointer types per component count
        let mut input_ptr_ids = [0u32; 5];
        for &(_, n) in &self.inputs {
            if input_ptr_ids[n as usize] == 0 {
                input_ptr_ids[n as usize] = alloc();
            }
        }
        let input_vars: Vec<(u32, u32, u32)> = self
            .inputs
            .iter()
            .map(|&(loc, n)| (alloc(), loc, n))
            .collect();

        let (int8_id, int8_ptr_id) = if self.int8_inputs.is_empty() {
            (0, 0)
        } else {
            (alloc(), alloc())
        };
        let int8_vars: Vec<(u32, u32)> = self.int8_inputs.iter().map(|&loc| (alloc(), loc)).collect();

        // (struct, pointer, variable, runtime array or 0)
        let blocks: Vec<(u32, u32, u32, u32, &BufferBlock)> = self
            .blocks
            .iter()
            .map(|b| {
                let (struct_id, ptr_id, var_id) = (alloc(), alloc(), alloc());
                let array_id = if b.runtime_tail { alloc() } else { 0 };
                (struct_id, ptr_id, var_id, array_id, b)
            })
            .collect();

        let (image_id, sampled_image_id, sampler_ptr_id) = if self.samplers.is_empty() {
            (0, 0, 0)
        } else {
            (alloc(), alloc(), alloc())
        };
        let sampler_vars: Vec<(u32, u32, u32)> = self
            .samplers
            .iter()
            .map(|&(set, binding)| (alloc(), set, binding))
            .collect();

        // Load results
        let load_count = input_vars.len()
            + int8_vars.len()
            + blocks.iter().filter(|b| b.4.used).count()
            + sampler_vars.len();
        let load_ids: Vec<u32> = (0..load_count).map(|_| alloc()).collect();

        let bound = next_id;
        let mut words = vec![0x0723_0203, 0x0001_0000, 0, bound, 0];

        words.extend(op(OP_CAPABILITY, &[CAPABILITY_SHADER]));
        if !int8_vars.is_empty() {
            words.extend(op(OP_CAPABILITY, &[CAPABILITY_INT8]));
        }
        words.extend(op(OP_MEMORY_MODEL, &[0, 1]));

        let exec_model = match self.stage {
            Stage::Vertex => 0,
            Stage::Fragment => 4,
        };
        let mut entry = vec![exec_model, main_id];
        entry.extend(string_words(&self.entry_point));
        entry.extend(input_vars.iter().map(|v| v.0));
        entry.extend(int8_vars.iter().map(|v| v.0));
        words.extend(op(OP_ENTRY_POINT, &entry));
        if self.stage == Stage::Fragment {
            // OriginUpperLeft
            words.extend(op(OP_EXECUTION_MODE, &[main_id, 7]));
        }

        // Decorations
        for &(var, loc, _) in &input_vars {
            words.extend(op(OP_DECORATE, &[var, DECORATION_LOCATION, loc]));
        }
        for &(var, loc) in &int8_vars {
            words.extend(op(OP_DECORATE, &[var, DECORATION_LOCATION, loc]));
        }
        for &(struct_id, _, var, array_id, block) in &blocks {
            let block_decoration = if block.storage { DECORATION_BUFFER_BLOCK } else { DECORATION_BLOCK };
            words.extend(op(OP_DECORATE, &[struct_id, block_decoration]));
            let member_count = block.members.len() as u32 + u32::from(block.runtime_tail);
            for i in 0..member_count {
                words.extend(op(OP_MEMBER_DECORATE, &[struct_id, i, DECORATION_OFFSET, i * 16]));
            }
            if block.runtime_tail {
                words.extend(op(OP_DECORATE, &[array_id, DECORATION_ARRAY_STRIDE, 16]));
            }
            words.extend(op(OP_DECORATE, &[var, DECORATION_DESCRIPTOR_SET, block.set]));
            words.extend(op(OP_DECORATE, &[var, DECORATION_BINDING, block.binding]));
        }
        for &(var, set, binding) in &sampler_vars {
            words.extend(op(OP_DECORATE, &[var, DECORATION_DESCRIPTOR_SET, set]));
            words.extend(op(OP_DECORATE, &[var, DECORATION_BINDING, binding]));
        }

        // Types
        words.extend(op(OP_TYPE_VOID, &[void_id]));
        words.extend(op(OP_TYPE_FUNCTION, &[fn_ty, void_id]));
        words.extend(op(OP_TYPE_FLOAT, &[f32_id, 32]));
        for n in 2..5u32 {
            if vec_ids[n as usize] != 0 {
                words.extend(op(OP_TYPE_VECTOR, &[vec_ids[n as usize], f32_id, n]));
            }
        }
        if int8_id != 0 {
            words.extend(op(OP_TYPE_INT, &[int8_id, 8, 1]));
            words.extend(op(OP_TYPE_POINTER, &[int8_ptr_id, STORAGE_INPUT, int8_id]));
        }
        for n in 1..5u32 {
            if input_ptr_ids[n as usize] != 0 {
                words.extend(op(
                    OP_TYPE_POINTER,
                    &[input_ptr_ids[n as usize], STORAGE_INPUT, vec_ids[n as usize]],
                ));
            }
        }
        for &(struct_id, ptr_id, _, array_id, block) in &blocks {
            if block.runtime_tail {
                words.extend(op(OP_TYPE_RUNTIME_ARRAY, &[array_id, vec_ids[4]]));
            }
            let mut operands = vec![struct_id];
            operands.extend(block.members.iter().map(|&n| vec_ids[n as usize]));
            if block.runtime_tail {
                operands.push(array_id);
            }
            words.extend(op(OP_TYPE_STRUCT, &operands));
            words.extend(op(OP_TYPE_POINTER, &[ptr_id, STORAGE_UNIFORM, struct_id]));
        }
        if !self.samplers.is_empty() {
            // 2D, not depth, not arrayed, single-sampled, sampled, unknown format
            words.extend(op(OP_TYPE_IMAGE, &[image_id, f32_id, 1, 0, 0, 0, 1, 0]));
            words.extend(op(OP_TYPE_SAMPLED_IMAGE, &[sampled_image_id, image_id]));
            words.extend(op(
                OP_TYPE_POINTER,
                &[sampler_ptr_id, STORAGE_UNIFORM_CONSTANT, sampled_image_id],
            ));
        }

        // Global variables
        for &(var, _, n) in &input_vars {
            words.extend(op(OP_VARIABLE, &[input_ptr_ids[n as usize], var, STORAGE_INPUT]));
        }
        for &(var, _) in &int8_vars {
            words.extend(op(OP_VARIABLE, &[int8_ptr_id, var, STORAGE_INPUT]));
        }
        for &(_, ptr_id, var, _, _) in &blocks {
            words.extend(op(OP_VARIABLE, &[ptr_id, var, STORAGE_UNIFORM]));
        }
        for &(var, _, _) in &sampler_vars {
            words.extend(op(OP_VARIABLE, &[sampler_ptr_id, var, STORAGE_UNIFORM_CONSTANT]));
        }

        // main
        words.extend(op(OP_FUNCTION, &[void_id, main_id, 0, fn_ty]));
        words.extend(op(OP_LABEL, &[label_id]));
        let mut loads = load_ids.iter();
        for &(var, _, n) in &input_vars {
            if let Some(&result) = loads.next() {
                words.extend(op(OP_LOAD, &[vec_ids[n as usize], result, var]));
            }
        }
        for &(var, _) in &int8_vars {
            if let Some(&result) = loads.next() {
                words.extend(op(OP_LOAD, &[int8_id, result, var]));
            }
        }
        for &(struct_id, _, var, _, block) in &blocks {
            if block.used {
                if let Some(&result) = loads.next() {
                    words.extend(op(OP_LOAD, &[struct_id, result, var]));
                }
            }
        }
        for &(var, _, _) in &sampler_vars {
            if let Some(&result) = loads.next() {
                words.extend(op(OP_LOAD, &[sampled_image_id, result, var]));
            }
        }
        words.extend(op(OP_RETURN, &[]));
        words.extend(op(OP_FUNCTION_END, &[]));

        words
    }

    /// Assemble into little-endian bytes
    pub fn bytes(&self) -> Vec<u8> {
        self.words().iter().flat_map(|w| w.to_le_bytes()).collect()
    }
}
