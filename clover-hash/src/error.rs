use thiserror::Error;

/// Errors raised while configuring the DAG
#[derive(Error, Debug)]
pub enum DagError {
    #[error("Invalid DAG parameters: {0}")]
    InvalidParams(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DagError>;
