// SPDX-License-Identifier: GPL-3.0-only

#[derive(thiserror::Error, Debug)]
pub enum DiscoveryError {
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("No record registered under id {0}")]
    NotFound(String),

    #[error("Record is already published with id {0}")]
    AlreadyPublished(String),

    #[error("Registration id mismatch: target is {expected}, record carries {actual}")]
    IdMismatch { expected: String, actual: String },

    #[error("Record store unavailable: {0:#}")]
    StoreUnavailable(anyhow::Error),

    #[error("Discovery service is closed")]
    ServiceClosed,
}

pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
