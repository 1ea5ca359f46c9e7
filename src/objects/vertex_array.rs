// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::device::{
    ComponentType, Device, IndexFormat, RawBuffer, RawVertexArray, RawVertexAttribute,
    VertexArrayLayout,
};
use crate::objects::BufferHandle;

/// Scalar type of a vertex attribute as stored in the buffer, and how the shader sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Float32,
    Float16,
    /// Signed 16-bit, converted to float without scaling.
    Int16,
    /// Signed 16-bit, scaled to [-1, 1].
    Int16Norm,
    UInt16,
    UInt16Norm,
    Int8,
    Int8Norm,
    UInt8,
    UInt8Norm,
    /// Unsigned 8-bit read as an integer by the shader, e.g. joint indices.
    UInt8Integer,
}

impl AttributeType {
    /// (component type, normalized, integer)
    const fn device_params(self) -> (ComponentType, bool, bool) {
        match self {
            AttributeType::Float32 => (ComponentType::F32, false, false),
            AttributeType::Float16 => (ComponentType::F16, false, false),
            AttributeType::Int16 => (ComponentType::I16, false, false),
            AttributeType::Int16Norm => (ComponentType::I16, true, false),
            AttributeType::UInt16 => (ComponentType::U16, false, false),
            AttributeType::UInt16Norm => (ComponentType::U16, true, false),
            AttributeType::Int8 => (ComponentType::I8, false, false),
            AttributeType::Int8Norm => (ComponentType::I8, true, false),
            AttributeType::UInt8 => (ComponentType::U8, false, false),
            AttributeType::UInt8Norm => (ComponentType::U8, true, false),
            AttributeType::UInt8Integer => (ComponentType::U8, false, true),
        }
    }
}

/// Layout of one attribute: a scalar type and 1 to 4 components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttributeFormat {
    ty: AttributeType,
    components: u32,
}

impl VertexAttributeFormat {
    /**
    # Panics
    If `components` is not in 1..=4.
    */
    pub const fn new(ty: AttributeType, components: u32) -> Self {
        assert!(components >= 1 && components <= 4, "vertex attributes have 1 to 4 components");
        VertexAttributeFormat { ty, components }
    }

    pub const FLOAT2: Self = Self::new(AttributeType::Float32, 2);
    pub const FLOAT3: Self = Self::new(AttributeType::Float32, 3);
    pub const FLOAT4: Self = Self::new(AttributeType::Float32, 4);

    pub const fn ty(self) -> AttributeType {
        self.ty
    }

    pub const fn components(self) -> u32 {
        self.components
    }
}

/// A vertex buffer and the distance between consecutive vertices in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBinding {
    pub buffer: BufferHandle,
    pub stride: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Index into [VertexArrayInfo::bindings].
    pub binding: usize,
    /// Shader input location.
    pub location: u32,
    pub format: VertexAttributeFormat,
    /// Byte offset within a vertex.
    pub offset: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct VertexArrayInfo<'a> {
    pub bindings: &'a [VertexBinding],
    pub attributes: &'a [VertexAttribute],
    pub index_buffer: Option<BufferHandle>,
    pub index_format: IndexFormat,
}

impl Default for VertexArrayInfo<'_> {
    /// No attributes, no index buffer.
    fn default() -> Self {
        VertexArrayInfo {
            bindings: &[],
            attributes: &[],
            index_buffer: None,
            index_format: IndexFormat::U16,
        }
    }
}

/// Translates `info` into the device layout, resolving buffer handles through `resolve`.
///
/// # Panics
/// If an attribute names a binding that does not exist.
pub(crate) fn device_layout(
    info: &VertexArrayInfo<'_>,
    mut resolve: impl FnMut(BufferHandle) -> RawBuffer,
) -> VertexArrayLayout {
    let attributes = info
        .attributes
        .iter()
        .map(|attribute| {
            let binding = info.bindings.get(attribute.binding).unwrap_or_else(|| {
                panic!(
                    "vertex attribute at location {} uses missing binding {}",
                    attribute.location, attribute.binding
                )
            });
            let (component_type, normalized, integer) = attribute.format.ty().device_params();
            RawVertexAttribute {
                location: attribute.location,
                buffer: resolve(binding.buffer),
                components: attribute.format.components(),
                component_type,
                normalized,
                integer,
                stride: binding.stride,
                offset: attribute.offset,
            }
        })
        .collect();
    VertexArrayLayout {
        attributes,
        index_buffer: info.index_buffer.map(resolve),
    }
}

#[derive(Debug)]
pub struct VertexArray {
    raw: RawVertexArray,
    index_format: IndexFormat,
}

impl VertexArray {
    pub(crate) fn create<D: Device + ?Sized>(
        device: &mut D,
        layout: &VertexArrayLayout,
        index_format: IndexFormat,
    ) -> VertexArray {
        VertexArray {
            raw: device.create_vertex_array(layout),
            index_format,
        }
    }

    pub(crate) fn release<D: Device + ?Sized>(self, device: &mut D) {
        device.delete_vertex_array(self.raw);
    }

    pub fn raw(&self) -> RawVertexArray {
        self.raw
    }

    pub fn index_format(&self) -> IndexFormat {
        self.index_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::HandleTable;

    #[test]
    fn layout_translation() {
        use crate::device::BufferKind;
        use crate::imp::RecordingDevice;
        use crate::objects::{Buffer, BufferInfo};

        let mut device = RecordingDevice::new();
        let mut buffers = HandleTable::new();
        let positions = buffers.allocate(Buffer::create(
            &mut device,
            &BufferInfo::with_size(BufferKind::Vertex, 400),
        ));
        let indices = buffers.allocate(Buffer::create(
            &mut device,
            &BufferInfo::with_size(BufferKind::Index, 12),
        ));
        let position_raw = buffers.get(positions).raw();
        let index_raw = buffers.get(indices).raw();

        let bindings = [VertexBinding {
            buffer: positions,
            stride: 20,
        }];
        let attributes = [
            VertexAttribute {
                binding: 0,
                location: 0,
                format: VertexAttributeFormat::FLOAT3,
                offset: 0,
            },
            VertexAttribute {
                binding: 0,
                location: 3,
                format: VertexAttributeFormat::new(AttributeType::UInt8Integer, 4),
                offset: 12,
            },
            VertexAttribute {
                binding: 0,
                location: 4,
                format: VertexAttributeFormat::new(AttributeType::Int16Norm, 2),
                offset: 16,
            },
        ];
        let info = VertexArrayInfo {
            bindings: &bindings,
            attributes: &attributes,
            index_buffer: Some(indices),
            index_format: IndexFormat::U16,
        };
        let layout = device_layout(&info, |h| buffers.get(h).raw());
        assert_eq!(layout.index_buffer, Some(index_raw));
        assert_eq!(layout.attributes.len(), 3);
        assert_eq!(layout.attributes[0].buffer, position_raw);
        assert_eq!(layout.attributes[0].components, 3);
        assert_eq!(layout.attributes[0].stride, 20);
        assert!(layout.attributes[1].integer);
        assert!(!layout.attributes[1].normalized);
        assert_eq!(layout.attributes[2].component_type, ComponentType::I16);
        assert!(layout.attributes[2].normalized);
        assert!(!layout.attributes[2].integer);
    }

    #[test]
    #[should_panic(expected = "1 to 4 components")]
    fn five_components_rejected() {
        let _ = VertexAttributeFormat::new(AttributeType::Float32, 5);
    }
}
