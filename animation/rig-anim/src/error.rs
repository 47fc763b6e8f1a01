use thiserror::Error;

/// Error types for animation sampling, hierarchy propagation and skinning
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimError {
    /// A bone references a node that does not exist in the scene graph
    #[error("Malformed rig: bone '{bone}' of mesh {mesh} has no matching node in the scene")]
    MalformedRig { bone: String, mesh: usize },

    /// A keyframe track was sampled outside of its bracketing keys
    #[error("Sample time {time} is outside the keyframe range (last key at {last_key})")]
    TimeOutOfRange { time: f64, last_key: f64 },

    /// Clip is unusable for playback (zero duration, unknown name, ...)
    #[error("Invalid clip: {0}")]
    InvalidClip(String),

    /// Structural problem in scene, mesh or clip data
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A node lookup requested by the caller failed
    #[error("Node not found: {0}")]
    NodeNotFound(String),
}

/// Result type using AnimError
pub type Result<T> = std::result::Result<T, AnimError>;
