use super::*;
use crate::descriptor::ImageLayout;
use crate::limits::ImplementationLimits;
use crate::mock_backend::{MockBackend, MockCommand};

fn stack(backend: &MockBackend, capacity: u32) -> TextureDescriptorStack<MockBackend> {
    TextureDescriptorStack::new(backend, capacity, ShaderStageFlags::FRAGMENT).unwrap()
}

fn texture_bytes(tag: u8) -> Vec<u8> {
    vec![tag; 32]
}

fn image(sampler: u64, image_view: u64) -> ImageDescriptor {
    ImageDescriptor {
        sampler,
        image_view,
        image_layout: ImageLayout::ShaderReadOnly,
    }
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_slot_stride_is_aligned_descriptor_size() {
    let limits = ImplementationLimits {
        combined_image_sampler_descriptor_size: 48,
        descriptor_buffer_offset_alignment: 32,
        ..ImplementationLimits::default()
    };
    let backend = MockBackend::with_limits(limits);
    let textures = stack(&backend, 16);

    assert_eq!(textures.stride(), 64);
    assert_eq!(textures.capacity(), 16);
    assert!(textures.is_empty());
    assert_eq!(textures.layout().bindings().len(), 1);
    assert_eq!(
        textures.layout().bindings()[0].kind,
        DescriptorKind::CombinedImageSampler
    );
    assert!(textures.buffer_info().usage.contains(BufferUsage::SAMPLER_DESCRIPTORS));
}

#[test]
fn test_zero_capacity_rejected() {
    let backend = MockBackend::new();
    assert!(matches!(
        TextureDescriptorStack::new(&backend, 0, ShaderStageFlags::FRAGMENT),
        Err(Error::InvalidResource(_))
    ));
}

#[test]
fn test_capacity_from_config() {
    let backend = MockBackend::new();
    let config = BindingConfig {
        max_textures: 2,
        ..BindingConfig::default()
    };
    let mut textures = TextureDescriptorStack::from_config(&backend, &config, ShaderStageFlags::FRAGMENT).unwrap();

    assert_eq!(textures.capacity(), 2);
    textures.register(&texture_bytes(1)).unwrap();
    textures.register(&texture_bytes(2)).unwrap();
    assert!(matches!(
        textures.register(&texture_bytes(3)),
        Err(Error::OutOfDescriptorSlots(2))
    ));
}

#[test]
fn test_default_config_capacity() {
    let backend = MockBackend::new();
    let textures =
        TextureDescriptorStack::from_config(&backend, &BindingConfig::default(), ShaderStageFlags::FRAGMENT).unwrap();
    assert_eq!(textures.capacity(), 4096);
}

// ============================================================================
// SLOT REUSE
// ============================================================================

#[test]
fn test_vacated_slot_is_reused() {
    let backend = MockBackend::new();
    let mut textures = stack(&backend, 8);

    let t1 = textures.register(&texture_bytes(1)).unwrap();
    let t2 = textures.register(&texture_bytes(2)).unwrap();
    let t3 = textures.register(&texture_bytes(3)).unwrap();
    assert_eq!((t1, t2, t3), (0, 1, 2));

    textures.unregister(t2).unwrap();
    let t4 = textures.register(&texture_bytes(4)).unwrap();

    assert_eq!(t4, 1);
    assert_eq!(textures.slot_bytes(1).unwrap(), &texture_bytes(4)[..]);
    assert_eq!(textures.slot_bytes(2).unwrap(), &texture_bytes(3)[..]);
    assert_eq!(textures.len(), 3);
}

#[test]
fn test_unregister_keeps_bytes() {
    let backend = MockBackend::new();
    let mut textures = stack(&backend, 4);

    let slot = textures.register(&texture_bytes(9)).unwrap();
    textures.unregister(slot).unwrap();

    assert!(!textures.is_registered(slot));
    assert!(textures.binding_info(slot).is_none());
    assert_eq!(textures.slot_bytes(slot).unwrap(), &texture_bytes(9)[..]);
}

#[test]
fn test_double_unregister_rejected() {
    let backend = MockBackend::new();
    let mut textures = stack(&backend, 4);

    let a = textures.register(&texture_bytes(1)).unwrap();
    textures.register(&texture_bytes(2)).unwrap();
    textures.unregister(a).unwrap();

    assert!(matches!(textures.unregister(a), Err(Error::InvalidResource(_))));
    assert!(matches!(textures.unregister(7), Err(Error::InvalidResource(_))));

    // The slot is handed out once, not twice
    assert_eq!(textures.register(&texture_bytes(3)).unwrap(), a);
    assert_eq!(textures.register(&texture_bytes(4)).unwrap(), 2);
}

#[test]
fn test_capacity_exhausted() {
    let backend = MockBackend::new();
    let mut textures = stack(&backend, 2);

    textures.register(&texture_bytes(1)).unwrap();
    textures.register(&texture_bytes(2)).unwrap();
    assert_eq!(
        textures.register(&texture_bytes(3)),
        Err(Error::OutOfDescriptorSlots(2))
    );

    textures.unregister(0).unwrap();
    assert_eq!(textures.register(&texture_bytes(3)), Ok(0));
}

// ============================================================================
// DESCRIPTOR BYTES
// ============================================================================

#[test]
fn test_slot_offsets_follow_stride() {
    let backend = MockBackend::new();
    let mut textures = stack(&backend, 4);
    let base = textures.buffer_info().device_address;

    for tag in 0..3u8 {
        let slot = textures.register(&texture_bytes(tag)).unwrap();
        let info = textures.binding_info(slot).unwrap();
        assert_eq!(info.device_address, base + slot as u64 * textures.stride());
    }
}

#[test]
fn test_oversized_descriptor_rejected() {
    let backend = MockBackend::new();
    let mut textures = stack(&backend, 4);

    assert!(matches!(
        textures.register(&[0u8; 33]),
        Err(Error::InvalidResource(_))
    ));
    assert!(textures.is_empty());
}

#[test]
fn test_short_descriptor_is_zero_padded() {
    let backend = MockBackend::new();
    let mut textures = stack(&backend, 4);

    let slot = textures.register(&texture_bytes(5)).unwrap();
    textures.unregister(slot).unwrap();
    let slot = textures.register(&[1, 2, 3, 4]).unwrap();

    let bytes = textures.slot_bytes(slot).unwrap();
    assert_eq!(&bytes[..4], &[1, 2, 3, 4]);
    assert!(bytes[4..].iter().all(|b| *b == 0));
}

#[test]
fn test_register_texture_writes_through_backend() {
    let backend = MockBackend::new();
    let mut textures = stack(&backend, 4);

    let slot = textures.register_texture(&backend, image(0x11, 0x22)).unwrap();

    assert_eq!(slot, 0);
    assert_eq!(backend.descriptor_writes(), 1);
    assert_eq!(
        &textures.slot_bytes(slot).unwrap()[..16],
        &MockBackend::encode_image(0x11, 0x22)[..]
    );
}

// ============================================================================
// BINDING
// ============================================================================

#[test]
fn test_bind_points_set_at_slot_offset() {
    let backend = MockBackend::new();
    let mut textures = stack(&backend, 4);
    textures.register(&texture_bytes(1)).unwrap();
    let slot = textures.register(&texture_bytes(2)).unwrap();

    textures
        .bind(&backend, 3, PipelineBindPoint::Graphics, 4, 1, slot)
        .unwrap();

    assert_eq!(
        backend.commands(),
        vec![
            MockCommand::BindDescriptorBuffers {
                command_buffer: 3,
                buffers: vec![textures.buffer_info()],
            },
            MockCommand::SetDescriptorBufferOffsets {
                command_buffer: 3,
                bind_point: PipelineBindPoint::Graphics,
                pipeline_layout: 4,
                first_set: 1,
                buffer_indices: vec![0],
                offsets: vec![textures.stride()],
            },
        ]
    );
}

#[test]
fn test_slot_binding_points_at_slot_offset() {
    let backend = MockBackend::new();
    let mut textures = stack(&backend, 4);
    textures.register(&texture_bytes(1)).unwrap();
    let slot = textures.register(&texture_bytes(2)).unwrap();

    let binding = textures.slot_binding(3, slot).unwrap();
    assert_eq!(binding.info, textures.buffer_info());
    assert_eq!(binding.set, 3);
    assert_eq!(binding.offset, textures.stride());

    textures.unregister(slot).unwrap();
    assert!(matches!(textures.slot_binding(3, slot), Err(Error::InvalidResource(_))));
}

#[test]
fn test_bind_unregistered_slot_rejected() {
    let backend = MockBackend::new();
    let textures = stack(&backend, 4);

    assert!(textures
        .bind(&backend, 3, PipelineBindPoint::Graphics, 4, 1, 0)
        .is_err());
    assert!(backend.commands().is_empty());
}
