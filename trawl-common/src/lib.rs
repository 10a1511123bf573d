//! Common types and utilities shared across trawl crates.
//!
//! This crate defines the shared error type and the observability helpers
//! used throughout the workspace. It stays dependency-light so the driver,
//! crawler and binary crates can all depend on it.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`TrawlError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! Misses are ordinary results, everything else is a real failure:
//!
//! ```rust
//! use trawl_common::TrawlError;
//!
//! let miss = TrawlError::NoSuchElement("id=com.example:id/list".into());
//! assert!(miss.is_not_found());
//!
//! let fatal = TrawlError::ContainerNotFound("id or class".into());
//! assert!(!fatal.is_not_found());
//! ```
pub mod observability;

/// Error types used across the trawl system.
#[derive(thiserror::Error, Debug)]
pub enum TrawlError {
    /// A lookup found nothing. Resolvers turn this into `None`.
    #[error("No such element: {0}")]
    NoSuchElement(String),

    /// A WebDriver command failed for a reason other than a miss.
    #[error("Driver command failed: {0}")]
    Command(String),

    /// The automation session could not be created.
    #[error("Session error: {0}")]
    Session(String),

    /// The automation server answered with something we can't interpret.
    #[error("Unexpected driver response: {0}")]
    Protocol(String),

    /// An element's `bounds` attribute was missing or malformed.
    #[error("Invalid bounds: {0:?}")]
    InvalidBounds(String),

    /// The scrollable list could not be located by any strategy.
    #[error("List container not found ({0})")]
    ContainerNotFound(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Work was interrupted by a shutdown request.
    #[error("Cancelled")]
    Cancelled,
}

impl TrawlError {
    /// True for the expected "nothing there" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TrawlError::NoSuchElement(_))
    }
}

/// Convenient alias for results that use [`TrawlError`].
pub type Result<T> = std::result::Result<T, TrawlError>;
