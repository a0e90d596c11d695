//! OTL Core - Shared error types and configuration
//!
//! This crate defines the abstractions shared by the resolver, the
//! extraction pipeline and the CLI:
//! - Common error types
//! - Configuration management (resolver budgets, hypothesis expansion, logging)

pub mod config;

pub use config::{AppConfig, ConfigError, ExpansionConfig, LoggingConfig, ResolverConfig};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for OTL operations
#[derive(Error, Debug)]
pub enum OtlError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Pattern search error: {0}")]
    SearchError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, OtlError>;

// ============================================================================
// Tests
// ============================================================================
