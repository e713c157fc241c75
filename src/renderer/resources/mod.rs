/// "Resources" refers to the objects a pipeline is assembled from.
/// The pipeline itself is the only one that outlives construction.

pub mod pipeline;
pub mod pipeline_state;
pub mod shader;
pub mod vertex;
