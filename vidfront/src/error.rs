use thiserror::Error;

/**
    Errors from building a channel registry.
*/
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("channel registry is empty")]
    Empty,

    #[error("channel #{0} has an empty label")]
    EmptyLabel(usize),

    #[error("channel '{0}' has an empty stream URL")]
    EmptyUrl(String),

    #[error("channel label '{0}' is listed more than once")]
    DuplicateLabel(String),

    #[error("default channel '{0}' is not in the registry")]
    UnknownDefault(String),

    #[error("invalid registry document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("failed to read registry file: {0}")]
    Io(#[from] std::io::Error),
}

/**
    Failure reported by the playback engine.

    The engine owns the details; this crate only carries them to the console.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("failed to load {url}: {reason}")]
    Load { url: String, reason: String },

    #[error("playback error: {0}")]
    Playback(String),
}
