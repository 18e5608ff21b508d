//! In-memory filesystem metadata core
//!
//! This crate holds the per-file metadata record of an in-memory filesystem:
//! identity, type, link count, timestamps and the namespaced attribute table
//! that attribute views build on. Directory structure, content storage, id
//! allocation and the views themselves are provided by the layers above.
#![no_std]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod attr;
mod error;
mod inode;
mod lookup;
mod time;


pub use attr::{AttrValue, AttributeTable};
pub use error::{LookupError, LookupResult};
pub use inode::{Content, Inode, InodeContent, InodeId, InodeKind, InodeStat};
pub use lookup::{Lookup, Resolved};
#[cfg(feature = "std")]
pub use time::SystemClock;
pub use time::{Clock, ManualClock, TimeSpec};
