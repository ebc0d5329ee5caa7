//! Common error types for session resolution and profile mutation
//!
//! This module provides the unified error taxonomy used across the crate,
//! making error handling consistent for every caller. A missing session is
//! deliberately NOT represented here: anonymous visitors are a normal
//! outcome, modeled as a value by [`crate::session::SessionOutcome`].

use crate::providers::{ProviderAuthError, ProviderError};
use std::fmt;

/// Session resolution failed with a provider error that could not be
/// classified as "no active session"
///
/// The caller decides whether to propagate this as fatal or degrade
/// gracefully (e.g. treat as anonymous while surfacing a warning).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionError {
    /// Machine-readable provider error category, when the provider sent one
    pub name: Option<String>,
    /// Human-readable provider message
    pub message: String,
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Session resolution failed ({name}): {}", self.message),
            None => write!(f, "Session resolution failed: {}", self.message),
        }
    }
}

impl std::error::Error for ResolutionError {}

impl From<ProviderAuthError> for ResolutionError {
    fn from(err: ProviderAuthError) -> Self {
        Self {
            name: err.name,
            message: err.message,
        }
    }
}

/// Bad user input rejected before any remote call is made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// Display name is empty after trimming
    EmptyDisplayName,
    /// Upload mime type is missing or outside the raster-image allow-list
    UnsupportedFileType(Option<String>),
    /// Upload exceeds the configured maximum size
    FileTooLarge { size: usize, max: usize },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyDisplayName => write!(f, "display name must not be empty"),
            ValidationIssue::UnsupportedFileType(Some(mime)) => {
                write!(f, "unsupported file type: {mime}")
            }
            ValidationIssue::UnsupportedFileType(None) => write!(f, "file type is missing"),
            ValidationIssue::FileTooLarge { size, max } => {
                write!(f, "file is too large: {size} bytes (maximum {max})")
            }
        }
    }
}

/// Errors surfaced by profile mutation operations
///
/// No operation retries automatically; every failure is returned to the
/// caller for a user-directed retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// Input rejected locally; always recoverable by correcting the input
    Validation(ValidationIssue),
    /// No identity was resolvable at the start of the operation
    AuthRequired,
    /// Remote read/write rejected; `size_limited` is set when the store
    /// reported a size violation
    Persistence { message: String, size_limited: bool },
    /// Avatar stored but the profile record was not updated; the stored
    /// URL is carried so a retry can attempt only the record write
    PartialSuccess { avatar_url: String, message: String },
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::Validation(issue) => write!(f, "Validation failed: {issue}"),
            ProfileError::AuthRequired => write!(f, "Sign in required"),
            ProfileError::Persistence {
                message,
                size_limited,
            } => {
                if *size_limited {
                    write!(f, "Remote store rejected the write (too large): {message}")
                } else {
                    write!(f, "Remote store rejected the write: {message}")
                }
            }
            ProfileError::PartialSuccess {
                avatar_url,
                message,
            } => {
                write!(
                    f,
                    "Avatar stored at {avatar_url} but the profile record was not updated: {message}"
                )
            }
        }
    }
}

impl std::error::Error for ProfileError {}

impl From<ValidationIssue> for ProfileError {
    fn from(issue: ValidationIssue) -> Self {
        ProfileError::Validation(issue)
    }
}

/// Common error type unifying every failure the crate can surface
#[derive(Debug)]
pub enum SessyncError {
    /// Session resolution failures
    Resolution(ResolutionError),
    /// Profile mutation failures
    Profile(ProfileError),
    /// Raw boundary failures not tied to a specific operation
    Provider(ProviderError),
    /// Configuration loading failures
    Settings(String),
}

impl fmt::Display for SessyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessyncError::Resolution(err) => write!(f, "Resolution error: {err}"),
            SessyncError::Profile(err) => write!(f, "Profile error: {err}"),
            SessyncError::Provider(err) => write!(f, "Provider error: {err}"),
            SessyncError::Settings(msg) => write!(f, "Settings error: {msg}"),
        }
    }
}

impl std::error::Error for SessyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessyncError::Resolution(err) => Some(err),
            SessyncError::Profile(err) => Some(err),
            SessyncError::Provider(err) => Some(err),
            SessyncError::Settings(_) => None,
        }
    }
}

impl From<ResolutionError> for SessyncError {
    fn from(err: ResolutionError) -> Self {
        SessyncError::Resolution(err)
    }
}

impl From<ProfileError> for SessyncError {
    fn from(err: ProfileError) -> Self {
        SessyncError::Profile(err)
    }
}

impl From<ProviderError> for SessyncError {
    fn from(err: ProviderError) -> Self {
        SessyncError::Provider(err)
    }
}
