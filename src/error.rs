//! Error type shared by configuration, loading and search

use thiserror::Error;

/// Errors surfaced by the profiler.
///
/// Budgets running out and searches finding no path are not errors; they are
/// reported through stop reasons and [`crate::search::SearchStatus`].
#[derive(Debug, Error)]
pub enum ProfilerError {
    #[error("unsupported agent shape: {0} (only capsules can be swept)")]
    UnsupportedShape(String),

    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f32),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("segment must contain at least one frame")]
    EmptySegment,

    #[error("segment time must strictly increase (frame {index}: {previous} -> {current})")]
    NonMonotonicSegment {
        index: usize,
        previous: f32,
        current: f32,
    },

    #[error("level '{name}' not found. Available: {available:?}")]
    UnknownLevel { name: String, available: Vec<String> },

    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl ProfilerError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
