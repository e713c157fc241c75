//! Builds a Vulkan graphics pipeline and its layout from a vertex/fragment
//! shader pair, a vertex layout and fixed-function state, and owns both
//! handles until they are destroyed.

pub mod renderer;

pub use renderer::*;
