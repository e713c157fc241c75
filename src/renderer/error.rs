use ash::vk;
use thiserror::Error;
use crate::renderer::resources::shader::ShaderKind;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Everything that can go wrong while building a graphics pipeline.
/// Nothing is retried; each variant aborts construction.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to load shader {name:?}")]
    Load {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create {kind} shader module {name:?}: {reason}")]
    StageCreation {
        name: String,
        kind: ShaderKind,
        reason: String,
    },

    #[error("Failed to create pipeline layout: {0}")]
    LayoutCreation(#[source] vk::Result),

    #[error("Failed to create graphics pipeline: {reason}")]
    PipelineCreation { reason: String },
}

/// Fieldless mirror of [`PipelineError`] for matching in callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Load,
    StageCreation,
    LayoutCreation,
    PipelineCreation,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Load { .. } => ErrorKind::Load,
            PipelineError::StageCreation { .. } => ErrorKind::StageCreation,
            PipelineError::LayoutCreation(_) => ErrorKind::LayoutCreation,
            PipelineError::PipelineCreation { .. } => ErrorKind::PipelineCreation,
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        PipelineError::PipelineCreation { reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn kind_matches_variant() {
        let load = PipelineError::Load {
            name: "x.vert".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(load.kind(), ErrorKind::Load);
        assert_eq!(
            PipelineError::LayoutCreation(vk::Result::ERROR_OUT_OF_HOST_MEMORY).kind(),
            ErrorKind::LayoutCreation,
        );
        assert_eq!(
            PipelineError::invalid_config("null render pass").kind(),
            ErrorKind::PipelineCreation,
        );
    }

    #[test]
    fn messages_name_the_shader() {
        let err = PipelineError::StageCreation {
            name: "x.frag".into(),
            kind: ShaderKind::Fragment,
            reason: "bytecode is empty".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("fragment"));
        assert!(msg.contains("x.frag"));
        assert!(msg.contains("bytecode is empty"));
    }

    #[test]
    fn load_error_keeps_io_source() {
        let err = PipelineError::Load {
            name: "missing.vert".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let source = err
            .source()
            .and_then(|s| s.downcast_ref::<io::Error>())
            .map(|e| e.kind());
        assert_eq!(source, Some(io::ErrorKind::NotFound));
    }
}
