//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::{Backend, Config};
use crate::store::MemberIdentity;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("store.address is required for the redis backend")]
    MissingAddress,
    #[error("store.path is required for the redb backend")]
    MissingPath,
    #[error("store.path parent directory does not exist: {0}")]
    PathParentMissing(String),
    #[error("store.member-identity = \"{0}\" is not supported by the {1} backend")]
    UnsupportedIdentity(&'static str, &'static str),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let store = &config.store;

    match store.backend {
        Backend::Redis => {
            if store.address.trim().is_empty() {
                errors.push(ValidationError::MissingAddress);
            }
            // Sorted sets key members by their bytes.
            if store.member_identity != MemberIdentity::Payload {
                errors.push(ValidationError::UnsupportedIdentity(
                    store.member_identity.as_str(),
                    store.backend.as_str(),
                ));
            }
        }
        Backend::Redb => {
            if store.path.is_empty() {
                errors.push(ValidationError::MissingPath);
            } else if let Some(parent) = Path::new(&store.path).parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                errors.push(ValidationError::PathParentMissing(store.path.clone()));
            }
        }
        Backend::Memory => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
