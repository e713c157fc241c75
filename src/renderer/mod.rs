pub mod config;
pub mod device;
pub mod error;
pub mod resources;

pub use config::PipelineConfig;
pub use device::PipelineDevice;
pub use error::{ErrorKind, PipelineError, PipelineResult};
pub use resources::pipeline::GraphicsPipeline;
pub use resources::pipeline_state::{
    BlendEquation, ColorBlendState, DepthBias, InputAssemblyState, MultisampleState,
    PipelineStates, RasterizationState, DYNAMIC_STATES,
};
pub use resources::shader::{decode_spirv, ShaderDirectory, ShaderKind, ShaderSource};
pub use resources::vertex::{format_size, Vertex, VertexAttribute, VertexLayout};
