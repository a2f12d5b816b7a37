use crate::state::ViewerPhase;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewerError {
    #[error("Viewer has been destroyed")]
    Destroyed,

    #[error("Cannot {operation} while the viewer is {phase}")]
    NotReady {
        operation: &'static str,
        phase: ViewerPhase,
    },

    #[error("Viewer container was not found")]
    MissingContainer,

    #[error("Tour has no scenes")]
    EmptyTour,

    #[error("Engine error: {0}")]
    Engine(String),
}

/// Failure reported by an [`EngineFactory`](crate::engine::EngineFactory)
/// while creating an engine instance.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Unsupported panorama format: {0}")]
    UnsupportedFormat(String),

    #[error("Engine could not be created: {0}")]
    Creation(String),
}
