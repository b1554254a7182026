use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid context: {0}")]
    InvalidContext(String),

    #[error("Collaborator failure: {0}")]
    Collaborator(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
