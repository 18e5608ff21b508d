//! Deferred inode resolution
//!
//! Code that holds an inode but needs another one later (a symbolic link and
//! its target, for instance) keeps a [`Lookup`] instead of a path resolver.
//! The naming layer supplies the implementation, which keeps this crate free of
//! any dependency on directory logic.

use alloc::sync::Arc;

use crate::{error::LookupResult, inode::Inode};

/// Resolves an inode on demand.
pub trait Lookup: Send + Sync {
    /// Looks up the inode.
    ///
    /// Fails with [`LookupError::NotFound`](crate::LookupError::NotFound) or
    /// [`LookupError::Inaccessible`](crate::LookupError::Inaccessible). The
    /// error is returned as is; retrying is up to the caller.
    fn lookup(&self) -> LookupResult<Arc<Inode>>;
}

impl<F> Lookup for F
where
    F: Fn() -> LookupResult<Arc<Inode>> + Send + Sync,
{
    fn lookup(&self) -> LookupResult<Arc<Inode>> {
        self()
    }
}

/// A lookup that always yields the same, already resolved inode.
#[derive(Clone)]
pub struct Resolved(pub Arc<Inode>);

impl Lookup for Resolved {
    fn lookup(&self) -> LookupResult<Arc<Inode>> {
        Ok(self.0.clone())
    }
}
