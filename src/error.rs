use thiserror::Error;

use crate::domain::utils::id::{LinkId, NodeId};

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse scenario JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to write CSV results: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Failed to build network model: {0}")]
    ModelConstructionError(String),

    #[error("PathNotFound: no path from {src} to {dst}")]
    PathNotFound { src: NodeId, dst: NodeId },

    #[error("LinkNotFound: no link from {src} to {dst}")]
    LinkNotFound { src: NodeId, dst: NodeId },

    #[error("FlowNotFound: {0}")]
    FlowNotFound(String),

    #[error("Unknown link id {0:?}")]
    UnknownLink(LinkId),

    #[error("Infeasible shaper configuration: {0}")]
    InfeasibleShaperConfiguration(String),
}

pub type Result<T> = std::result::Result<T, Error>;
