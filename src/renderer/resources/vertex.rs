use std::mem::{offset_of, size_of};
use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use smallvec::{smallvec, SmallVec};
use crate::renderer::error::{PipelineError, PipelineResult};

/// Vertex as it is laid out in the vertex buffers drawn with the pipeline.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, tex_coords: Vec2) -> Self {
        Self { position, normal, tex_coords }
    }

    /// Layout read straight off the struct, so buffers filled with
    /// `bytemuck::cast_slice(&[Vertex])` always agree with the pipeline.
    pub fn layout() -> VertexLayout {
        VertexLayout {
            binding: 0,
            stride: size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
            attributes: smallvec![
                VertexAttribute {
                    location: 0,
                    format: vk::Format::R32G32B32_SFLOAT,
                    offset: offset_of!(Vertex, position) as u32,
                },
                VertexAttribute {
                    location: 1,
                    format: vk::Format::R32G32B32_SFLOAT,
                    offset: offset_of!(Vertex, normal) as u32,
                },
                VertexAttribute {
                    location: 2,
                    format: vk::Format::R32G32_SFLOAT,
                    offset: offset_of!(Vertex, tex_coords) as u32,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: vk::Format,
    pub offset: u32,
}

impl VertexAttribute {
    fn end(&self) -> Option<u32> {
        format_size(self.format).map(|size| self.offset.saturating_add(size))
    }
}

/// Single-binding vertex input description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    pub binding: u32,
    pub stride: u32,
    pub input_rate: vk::VertexInputRate,
    pub attributes: SmallVec<[VertexAttribute; 4]>,
}

impl Default for VertexLayout {
    /// Position (3 floats), normal (3 floats), texture coordinates (2 floats).
    fn default() -> Self {
        let float = size_of::<f32>() as u32;
        Self {
            binding: 0,
            stride: float * (3 * 2 + 2),
            input_rate: vk::VertexInputRate::VERTEX,
            attributes: smallvec![
                VertexAttribute {
                    location: 0,
                    format: vk::Format::R32G32B32_SFLOAT,
                    offset: 0,
                },
                VertexAttribute {
                    location: 1,
                    format: vk::Format::R32G32B32_SFLOAT,
                    offset: float * 3,
                },
                VertexAttribute {
                    location: 2,
                    format: vk::Format::R32G32_SFLOAT,
                    offset: float * 3 * 2,
                },
            ],
        }
    }
}

impl VertexLayout {
    pub fn binding_description(&self) -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription::default()
            .binding(self.binding)
            .stride(self.stride)
            .input_rate(self.input_rate)
    }

    pub fn attribute_descriptions(
        &self,
    ) -> SmallVec<[vk::VertexInputAttributeDescription; 4]> {
        self.attributes
            .iter()
            .map(|attr| {
                vk::VertexInputAttributeDescription::default()
                    .binding(self.binding)
                    .location(attr.location)
                    .format(attr.format)
                    .offset(attr.offset)
            })
            .collect()
    }

    /// Checks the layout is self-consistent. Whether it matches the vertex
    /// buffers bound at draw time cannot be checked here.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.stride == 0 {
            return Err(PipelineError::invalid_config("vertex stride is zero"));
        }
        if self.attributes.is_empty() {
            return Err(PipelineError::invalid_config("vertex layout has no attributes"));
        }

        let mut spans: SmallVec<[(u32, u32, u32); 4]> = SmallVec::new();
        for attr in &self.attributes {
            if self.attributes.iter().filter(|a| a.location == attr.location).count() > 1 {
                return Err(PipelineError::invalid_config(format!(
                    "vertex attribute location {} is declared more than once",
                    attr.location,
                )));
            }
            let end = attr.end().ok_or_else(|| {
                PipelineError::invalid_config(format!(
                    "unsupported vertex attribute format {:?} at location {}",
                    attr.format, attr.location,
                ))
            })?;
            if end > self.stride {
                return Err(PipelineError::invalid_config(format!(
                    "vertex attribute at location {} ends at byte {} past the stride of {}",
                    attr.location, end, self.stride,
                )));
            }
            spans.push((attr.offset, end, attr.location));
        }

        spans.sort_unstable();
        for pair in spans.windows(2) {
            let (_, end, location) = pair[0];
            let (start, _, next_location) = pair[1];
            if start < end {
                return Err(PipelineError::invalid_config(format!(
                    "vertex attributes at locations {} and {} overlap",
                    location, next_location,
                )));
            }
        }

        Ok(())
    }
}

/// Size in bytes of the vertex formats the pipeline accepts.
pub fn format_size(format: vk::Format) -> Option<u32> {
    let size = match format {
        vk::Format::R32_SFLOAT | vk::Format::R32_UINT | vk::Format::R32_SINT => 4,
        vk::Format::R32G32_SFLOAT | vk::Format::R32G32_UINT | vk::Format::R32G32_SINT => 8,
        vk::Format::R32G32B32_SFLOAT
        | vk::Format::R32G32B32_UINT
        | vk::Format::R32G32B32_SINT => 12,
        vk::Format::R32G32B32A32_SFLOAT
        | vk::Format::R32G32B32A32_UINT
        | vk::Format::R32G32B32A32_SINT => 16,
        vk::Format::R16G16_SFLOAT | vk::Format::R16G16_UNORM | vk::Format::R16G16_SNORM => 4,
        vk::Format::R16G16B16A16_SFLOAT
        | vk::Format::R16G16B16A16_UNORM
        | vk::Format::R16G16B16A16_SNORM => 8,
        vk::Format::R8G8B8A8_UNORM
        | vk::Format::R8G8B8A8_SNORM
        | vk::Format::R8G8B8A8_UINT
        | vk::Format::B8G8R8A8_UNORM => 4,
        _ => return None,
    };
    Some(size)
}
