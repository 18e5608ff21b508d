//! Per-file metadata record
//!
//! An [`Inode`] tracks everything about a file except its content bytes:
//! identity, type, hard-link count, timestamps and the attribute table used
//! by attribute views. All mutable state sits behind a single per-inode lock,
//! so operations on unrelated inodes never contend.
//!
//! Content itself (file bytes, directory entries, link targets) is owned by
//! other layers and is only reached through the [`Content`] size contract.

use alloc::{collections::BTreeSet, string::String, sync::Arc};
use core::{fmt, ptr};

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use spin::Mutex;

use crate::{
    attr::{AttrValue, AttributeTable},
    time::{Clock, TimeSpec},
};

/// Inode number, issued by an external allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InodeId(pub u64);

impl fmt::Display for InodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for InodeId {
    fn from(value: u64) -> Self {
        InodeId(value)
    }
}

/// Type of the file an inode describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InodeKind {
    Directory,
    RegularFile,
    SymbolicLink,
}

/// Size contract implemented by whatever owns the file's content.
///
/// For regular files this is the content length, for symbolic links the
/// length of the serialized target, and for directories a value derived from
/// the entry count.
pub trait Content: Send + Sync {
    fn size(&self) -> u64;
}

/// The content an inode stands for, tagged with its type.
///
/// The variant is fixed when the inode is built.
#[derive(Clone)]
pub enum InodeContent {
    Directory(Arc<dyn Content>),
    RegularFile(Arc<dyn Content>),
    SymbolicLink(Arc<dyn Content>),
}

impl InodeContent {
    pub fn kind(&self) -> InodeKind {
        match self {
            InodeContent::Directory(_) => InodeKind::Directory,
            InodeContent::RegularFile(_) => InodeKind::RegularFile,
            InodeContent::SymbolicLink(_) => InodeKind::SymbolicLink,
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            InodeContent::Directory(c)
            | InodeContent::RegularFile(c)
            | InodeContent::SymbolicLink(c) => c.size(),
        }
    }
}

/// Point-in-time view of an inode, as used to fill file-status results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InodeStat {
    pub id: InodeId,
    pub kind: InodeKind,
    pub size: u64,
    pub links: u32,
    pub creation_time: TimeSpec,
    pub last_access_time: TimeSpec,
    pub last_modified_time: TimeSpec,
}

struct InodeState {
    links: u32,
    creation_time: TimeSpec,
    last_access_time: TimeSpec,
    last_modified_time: TimeSpec,
    /// None until the first attribute write
    attributes: Option<AttributeTable>,
}

pub struct Inode {
    id: InodeId,
    content: InodeContent,
    clock: Arc<dyn Clock>,
    state: Mutex<InodeState>,
}

impl Inode {
    /// Creates an inode with no links and all three timestamps set to the
    /// clock's current time.
    pub fn new(id: InodeId, content: InodeContent, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        debug!("inode {}: created as {:?}", id, content.kind());
        Self {
            id,
            content,
            clock,
            state: Mutex::new(InodeState {
                links: 0,
                creation_time: now,
                last_access_time: now,
                last_modified_time: now,
                attributes: None,
            }),
        }
    }

    pub fn directory(id: InodeId, content: Arc<dyn Content>, clock: Arc<dyn Clock>) -> Self {
        Self::new(id, InodeContent::Directory(content), clock)
    }

    pub fn regular_file(id: InodeId, content: Arc<dyn Content>, clock: Arc<dyn Clock>) -> Self {
        Self::new(id, InodeContent::RegularFile(content), clock)
    }

    pub fn symbolic_link(id: InodeId, content: Arc<dyn Content>, clock: Arc<dyn Clock>) -> Self {
        Self::new(id, InodeContent::SymbolicLink(content), clock)
    }

    pub fn id(&self) -> InodeId {
        self.id
    }

    pub fn kind(&self) -> InodeKind {
        self.content.kind()
    }

    pub fn is_directory(&self) -> bool {
        self.kind() == InodeKind::Directory
    }

    pub fn is_regular_file(&self) -> bool {
        self.kind() == InodeKind::RegularFile
    }

    pub fn is_symbolic_link(&self) -> bool {
        self.kind() == InodeKind::SymbolicLink
    }

    pub fn content(&self) -> &InodeContent {
        &self.content
    }

    /// Size in bytes, as computed by the content owner.
    pub fn size(&self) -> u64 {
        self.content.size()
    }

    pub fn links(&self) -> u32 {
        self.state.lock().links
    }

    pub fn increment_link_count(&self) {
        let mut state = self.state.lock();
        state.links += 1;
        trace!("inode {}: links -> {}", self.id, state.links);
    }

    /// Decrements and returns the link count.
    ///
    /// Callers must pair this with an earlier increment; a return value of
    /// zero means no directory entry refers to the inode any more.
    pub fn decrement_link_count(&self) -> u32 {
        let mut state = self.state.lock();
        debug_assert!(state.links > 0, "inode {}: link count underflow", self.id);
        state.links = state.links.saturating_sub(1);
        let links = state.links;
        drop(state);

        if links == 0 {
            debug!("inode {}: last link removed", self.id);
        } else {
            trace!("inode {}: links -> {}", self.id, links);
        }
        links
    }

    pub fn creation_time(&self) -> TimeSpec {
        self.state.lock().creation_time
    }

    pub fn last_access_time(&self) -> TimeSpec {
        self.state.lock().last_access_time
    }

    pub fn last_modified_time(&self) -> TimeSpec {
        self.state.lock().last_modified_time
    }

    pub fn set_creation_time(&self, time: TimeSpec) {
        self.state.lock().creation_time = time;
    }

    pub fn set_last_access_time(&self, time: TimeSpec) {
        self.state.lock().last_access_time = time;
    }

    pub fn set_last_modified_time(&self, time: TimeSpec) {
        self.state.lock().last_modified_time = time;
    }

    /// Sets all three timestamps at once.
    pub fn set_times(&self, creation: TimeSpec, last_modified: TimeSpec, last_access: TimeSpec) {
        let mut state = self.state.lock();
        state.creation_time = creation;
        state.last_modified_time = last_modified;
        state.last_access_time = last_access;
    }

    /// Sets the last access time to the clock's current time.
    pub fn update_access_time(&self) {
        let now = self.clock.now();
        self.set_last_access_time(now);
    }

    /// Sets the last modified time to the clock's current time.
    pub fn update_modified_time(&self) {
        let now = self.clock.now();
        self.set_last_modified_time(now);
    }

    /// Names of the attributes stored under `view`. Unknown views are empty.
    pub fn attribute_names(&self, view: &str) -> BTreeSet<String> {
        match &self.state.lock().attributes {
            Some(table) => table.names(view),
            None => BTreeSet::new(),
        }
    }

    /// Every attribute key held by this inode, formatted as `view:name`.
    pub fn attribute_keys(&self) -> BTreeSet<String> {
        match &self.state.lock().attributes {
            Some(table) => table.keys(),
            None => BTreeSet::new(),
        }
    }

    /// Returns the stored value, or `None` if the attribute was never set.
    pub fn get_attribute(&self, view: &str, name: &str) -> Option<AttrValue> {
        self.state
            .lock()
            .attributes
            .as_ref()?
            .get(view, name)
            .cloned()
    }

    pub fn set_attribute(&self, view: &str, name: &str, value: impl Into<AttrValue>) {
        let value = value.into();
        let mut state = self.state.lock();
        state
            .attributes
            .get_or_insert_with(AttributeTable::new)
            .set(view, name, value);
        trace!("inode {}: set {}:{}", self.id, view, name);
    }

    /// Removes an attribute. Removing one that is not set does nothing.
    pub fn delete_attribute(&self, view: &str, name: &str) {
        let mut state = self.state.lock();
        if let Some(table) = state.attributes.as_mut() {
            if table.remove(view, name).is_some() {
                trace!("inode {}: deleted {}:{}", self.id, view, name);
            }
        }
    }

    /// Copies the three timestamps onto `target`, leaving its attributes alone.
    ///
    /// `target` must not yet be visible to other threads: the source lock is
    /// held while the target lock is taken.
    pub fn copy_basic_attributes(&self, target: &Inode) {
        if ptr::eq(self, target) {
            return;
        }
        let src = self.state.lock();
        target.set_times(src.creation_time, src.last_modified_time, src.last_access_time);
        debug!("inode {}: copied times to inode {}", self.id, target.id);
    }

    /// Copies the timestamps and merges the whole attribute table onto
    /// `target`.
    ///
    /// Entries of this inode overwrite the same (view, name) in the target;
    /// entries only the target has are kept. The same publication rule as
    /// [`Inode::copy_basic_attributes`] applies.
    pub fn copy_attributes(&self, target: &Inode) {
        if ptr::eq(self, target) {
            return;
        }
        let src = self.state.lock();
        let mut dst = target.state.lock();

        dst.creation_time = src.creation_time;
        dst.last_modified_time = src.last_modified_time;
        dst.last_access_time = src.last_access_time;

        if let Some(table) = src.attributes.as_ref().filter(|t| !t.is_empty()) {
            dst.attributes
                .get_or_insert_with(AttributeTable::new)
                .merge_from(table);
        }
        debug!("inode {}: copied attributes to inode {}", self.id, target.id);
    }

    /// Snapshot of type, size, link count and timestamps.
    ///
    /// Link count and timestamps are read in one critical section.
    pub fn stat(&self) -> InodeStat {
        let size = self.size();
        let state = self.state.lock();
        InodeStat {
            id: self.id,
            kind: self.kind(),
            size,
            links: state.links,
            creation_time: state.creation_time,
            last_access_time: state.last_access_time,
            last_modified_time: state.last_modified_time,
        }
    }
}

impl fmt::Debug for Inode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inode")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("links", &self.links())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;
    use alloc::{string::ToString, vec, vec::Vec};

    struct Fixed(u64);

    impl Content for Fixed {
        fn size(&self) -> u64 {
            self.0
        }
    }

    fn clock_at(sec: i64) -> Arc<ManualClock> {
        Arc::new(ManualClock::new(TimeSpec::new(sec, 0)))
    }

    fn new_file(id: u64, clock: Arc<ManualClock>) -> Inode {
        Inode::regular_file(InodeId(id), Arc::new(Fixed(0)), clock)
    }

    #[test]
    fn test_type_predicates() {
        let clock = clock_at(0);
        let dir = Inode::directory(InodeId(1), Arc::new(Fixed(2)), clock.clone());
        let file = Inode::regular_file(InodeId(2), Arc::new(Fixed(10)), clock.clone());
        let link = Inode::symbolic_link(InodeId(3), Arc::new(Fixed(4)), clock);

        assert!(dir.is_directory() && !dir.is_regular_file() && !dir.is_symbolic_link());
        assert!(!file.is_directory() && file.is_regular_file() && !file.is_symbolic_link());
        assert!(!link.is_directory() && !link.is_regular_file() && link.is_symbolic_link());

        assert_eq!(dir.size(), 2);
        assert_eq!(file.size(), 10);
        assert_eq!(link.size(), 4);
        assert_eq!(link.kind(), InodeKind::SymbolicLink);
    }

    #[test]
    fn test_new_inode_times_come_from_clock() {
        let inode = new_file(1, clock_at(42));
        let t = TimeSpec::new(42, 0);
        assert_eq!(inode.creation_time(), t);
        assert_eq!(inode.last_access_time(), t);
        assert_eq!(inode.last_modified_time(), t);
        assert_eq!(inode.links(), 0);
    }

    #[test]
    fn test_link_count() {
        let inode = new_file(1, clock_at(0));
        for _ in 0..5 {
            inode.increment_link_count();
        }
        assert_eq!(inode.decrement_link_count(), 4);
        assert_eq!(inode.decrement_link_count(), 3);
        assert_eq!(inode.links(), 3);
    }

    #[test]
    fn test_update_times_follow_clock() {
        let clock = clock_at(100);
        let inode = new_file(1, clock.clone());

        clock.advance(5_000_000_000);
        inode.update_access_time();
        assert_eq!(inode.last_access_time(), TimeSpec::new(105, 0));
        assert_eq!(inode.last_modified_time(), TimeSpec::new(100, 0));

        clock.advance(1_000_000_000);
        inode.update_modified_time();
        assert_eq!(inode.last_modified_time(), TimeSpec::new(106, 0));
        assert_eq!(inode.creation_time(), TimeSpec::new(100, 0));
    }

    #[test]
    fn test_setters_allow_going_backwards() {
        let inode = new_file(1, clock_at(1_000));
        inode.set_last_modified_time(TimeSpec::new(10, 0));
        inode.set_last_access_time(TimeSpec::new(20, 0));
        inode.set_creation_time(TimeSpec::new(5, 0));

        assert_eq!(inode.last_modified_time(), TimeSpec::new(10, 0));
        assert_eq!(inode.last_access_time(), TimeSpec::new(20, 0));
        assert_eq!(inode.creation_time(), TimeSpec::new(5, 0));
    }

    #[test]
    fn test_attribute_names_without_table() {
        let inode = new_file(1, clock_at(0));
        assert!(inode.attribute_names("basic").is_empty());
        assert!(inode.attribute_names("").is_empty());
        assert!(inode.attribute_keys().is_empty());
        assert_eq!(inode.get_attribute("owner", "owner"), None);
    }

    #[test]
    fn test_set_get_delete_attribute() {
        let inode = new_file(1, clock_at(0));
        inode.set_attribute("posix", "permissions", 0o644u32);
        assert_eq!(inode.get_attribute("posix", "permissions"), Some(AttrValue::Uint(0o644)));

        inode.delete_attribute("posix", "permissions");
        assert_eq!(inode.get_attribute("posix", "permissions"), None);
        assert!(inode.attribute_names("posix").is_empty());

        // absent attribute and absent view are both fine
        inode.delete_attribute("posix", "permissions");
        inode.delete_attribute("nope", "nothing");
    }

    #[test]
    fn test_stored_null_is_not_absence() {
        let inode = new_file(1, clock_at(0));
        inode.set_attribute("user", "empty", AttrValue::Null);
        assert_eq!(inode.get_attribute("user", "empty"), Some(AttrValue::Null));
        assert_eq!(inode.get_attribute("user", "other"), None);
    }

    #[test]
    fn test_attribute_keys() {
        let inode = new_file(1, clock_at(0));
        inode.set_attribute("dos", "readonly", false);
        inode.set_attribute("owner", "owner", "alice");

        let keys: Vec<String> = inode.attribute_keys().into_iter().collect();
        assert_eq!(keys, vec!["dos:readonly".to_string(), "owner:owner".to_string()]);
    }

    #[test]
    fn test_copy_basic_attributes_leaves_table() {
        let source = new_file(1, clock_at(10));
        source.set_times(TimeSpec::new(1, 0), TimeSpec::new(2, 0), TimeSpec::new(3, 0));
        source.set_attribute("user", "k", "v");

        let target = new_file(2, clock_at(99));
        target.set_attribute("user", "other", "x");
        source.copy_basic_attributes(&target);

        assert_eq!(target.creation_time(), TimeSpec::new(1, 0));
        assert_eq!(target.last_modified_time(), TimeSpec::new(2, 0));
        assert_eq!(target.last_access_time(), TimeSpec::new(3, 0));
        assert_eq!(target.get_attribute("user", "k"), None);
        let keys: Vec<String> = target.attribute_keys().into_iter().collect();
        assert_eq!(keys, vec!["user:other".to_string()]);
    }

    #[test]
    fn test_copy_attributes_merges() {
        let source = new_file(1, clock_at(10));
        source.set_attribute("user", "k", "v");
        source.set_attribute("owner", "owner", "alice");

        let target = new_file(2, clock_at(99));
        target.set_attribute("user", "other", "x");
        target.set_attribute("owner", "owner", "bob");
        source.copy_attributes(&target);

        assert_eq!(target.get_attribute("user", "k"), Some(AttrValue::from("v")));
        assert_eq!(target.get_attribute("user", "other"), Some(AttrValue::from("x")));
        assert_eq!(target.get_attribute("owner", "owner"), Some(AttrValue::from("alice")));
        assert_eq!(target.creation_time(), TimeSpec::new(10, 0));

        // source is untouched
        assert_eq!(source.get_attribute("user", "other"), None);
    }

    #[test]
    fn test_copy_attributes_without_source_table() {
        let source = new_file(1, clock_at(10));
        let target = new_file(2, clock_at(99));
        source.copy_attributes(&target);

        assert_eq!(target.last_access_time(), TimeSpec::new(10, 0));
        assert!(target.attribute_keys().is_empty());
    }

    #[test]
    fn test_copy_onto_self_is_noop() {
        let inode = new_file(1, clock_at(10));
        inode.set_attribute("user", "k", "v");
        inode.copy_attributes(&inode);
        inode.copy_basic_attributes(&inode);
        assert_eq!(inode.get_attribute("user", "k"), Some(AttrValue::from("v")));
    }

    #[test]
    fn test_stat_snapshot() {
        let inode = Inode::regular_file(InodeId(9), Arc::new(Fixed(128)), clock_at(7));
        inode.increment_link_count();

        let stat = inode.stat();
        assert_eq!(stat.id, InodeId(9));
        assert_eq!(stat.kind, InodeKind::RegularFile);
        assert_eq!(stat.size, 128);
        assert_eq!(stat.links, 1);
        assert_eq!(stat.creation_time, TimeSpec::new(7, 0));
    }

    #[test]
    fn test_debug_output() {
        let inode = new_file(5, clock_at(0));
        let text = alloc::format!("{:?}", inode);
        assert!(text.contains("InodeId(5)"));
        assert!(text.contains("RegularFile"));
    }

    #[test]
    #[should_panic(expected = "link count underflow")]
    #[cfg(debug_assertions)]
    fn test_decrement_below_zero_panics_in_debug() {
        let inode = new_file(1, clock_at(0));
        inode.decrement_link_count();
    }
}
