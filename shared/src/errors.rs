//! Shared error types for the latency experiment

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid content hash: {input:?}")]
    InvalidContentHash { input: String },

    #[error("Invalid multiaddress: {input:?}")]
    InvalidMultiaddr { input: String },

    #[error("Node address {address} does not contain node id {id}")]
    NodeIdMismatch { id: String, address: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
