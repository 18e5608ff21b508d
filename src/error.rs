//! Errors reported by the inode core
//!
//! Resolving a [`Lookup`](crate::Lookup) is the only fallible operation at
//! this layer. Attribute absence is `None`, never an error.

use alloc::string::String;

/// Failure to resolve an inode through a [`Lookup`](crate::Lookup).
#[derive(Debug, Clone, PartialEq, Eq, onlyerror::Error)]
pub enum LookupError {
    /// Nothing exists at the place being resolved.
    #[error("no such file: {0}")]
    NotFound(String),
    /// Something exists but the resolver is not allowed to reach it.
    #[error("inaccessible: {0}")]
    Inaccessible(String),
}

pub type LookupResult<T> = Result<T, LookupError>;
