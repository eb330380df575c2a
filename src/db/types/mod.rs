//! The in-memory database model: an arena of entries and groups addressed by UUID-derived ids,
//! borrowed through [`EntryRef`]/[`EntryMut`]/[`GroupRef`]/[`GroupMut`] handles.
//!
//! `Database` owns every [`Entry`] and [`Group`] in a flat pool; a `Group` does not own its
//! children directly but stores an ordered list of [`NodeId`]s, preserving the document order of
//! the source XML while keeping node lookup O(1) by id instead of a tree walk.

mod attachment;
mod autotype;
mod color;
mod custom_data;
mod entry;
mod group;
mod history;
mod icon;
mod meta;
mod times;
mod value;

use std::collections::HashMap;

use chrono::NaiveDateTime;
use uuid::Uuid;

pub use attachment::{Attachment, AttachmentId, AttachmentMut, AttachmentRef};
pub use autotype::{AutoType, AutoTypeAssociation};
pub use color::{Color, ParseColorError};
pub use custom_data::{CustomDataItem, CustomDataValue};
pub use entry::{DestinationGroupNotFoundError, Entry, EntryId, EntryMut, EntryRef, EntryTrack};
pub use group::{Group, GroupId, GroupMut, GroupRef, NodeId};
pub use history::History;
pub use icon::{Icon, IconId, IconMut, IconRef};
pub use meta::{MemoryProtection, Meta};
pub use times::Times;
pub use value::Value;

use crate::config::DatabaseConfig;

/// A record of an object that used to exist in the database but was removed. Kept so that a
/// merge against another copy of the database knows the deletion happened after the other
/// copy's last-seen state of the object, instead of resurrecting it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize))]
pub struct DeletedObject {
    pub uuid: Uuid,
    pub deletion_time: NaiveDateTime,
}

pub struct Database {
    pub config: DatabaseConfig,
    pub(crate) root: GroupId,

    pub(crate) entries: HashMap<EntryId, Entry>,
    pub(crate) groups: HashMap<GroupId, Group>,
    pub(crate) icons: HashMap<IconId, Icon>,
    pub(crate) attachments: HashMap<AttachmentId, Attachment>,

    pub deleted_objects: Vec<DeletedObject>,

    pub meta: Meta,
}

impl Database {
    pub fn new() -> Self {
        let root = Group::new("Root");
        let root_id = root.id();

        let mut groups = HashMap::new();
        groups.insert(root_id, root);

        Database {
            config: DatabaseConfig::default(),
            root: root_id,
            entries: HashMap::new(),
            groups,
            icons: HashMap::new(),
            attachments: HashMap::new(),
            deleted_objects: Vec::new(),
            meta: Meta::default(),
        }
    }

    pub(crate) fn with_config(config: DatabaseConfig) -> Self {
        let mut db = Database::new();
        db.config = config;
        db
    }

    /// Build an empty database whose root group carries a caller-supplied id, used by the XML
    /// parser to preserve the root group's UUID from the source file instead of minting a fresh
    /// one.
    pub(crate) fn new_with_root_id(root_id: GroupId) -> Self {
        let root = Group::with_id(root_id, "Root");

        let mut groups = HashMap::new();
        groups.insert(root_id, root);

        Database {
            config: DatabaseConfig::default(),
            root: root_id,
            entries: HashMap::new(),
            groups,
            icons: HashMap::new(),
            attachments: HashMap::new(),
            deleted_objects: Vec::new(),
            meta: Meta::default(),
        }
    }

    pub fn root(&self) -> GroupRef<'_> {
        GroupRef::new(self, self.root)
    }

    pub fn root_mut(&mut self) -> GroupMut<'_> {
        GroupMut::new(self, self.root)
    }

    pub fn root_id(&self) -> GroupId {
        self.root
    }

    pub fn iter_all_entries(&self) -> impl Iterator<Item = EntryRef<'_>> + '_ {
        self.entries.keys().map(move |id| EntryRef::new(self, *id))
    }

    pub fn iter_all_groups(&self) -> impl Iterator<Item = GroupRef<'_>> + '_ {
        self.groups.keys().map(move |id| GroupRef::new(self, *id))
    }

    pub fn entry(&self, id: EntryId) -> Option<EntryRef<'_>> {
        self.entries.contains_key(&id).then(move || EntryRef::new(self, id))
    }

    pub fn entry_mut(&mut self, id: EntryId) -> Option<EntryMut<'_>> {
        self.entries
            .contains_key(&id)
            .then(move || EntryMut::new(self, id))
    }

    pub fn group(&self, id: GroupId) -> Option<GroupRef<'_>> {
        self.groups.contains_key(&id).then(move || GroupRef::new(self, id))
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<GroupMut<'_>> {
        self.groups
            .contains_key(&id)
            .then(move || GroupMut::new(self, id))
    }

    pub fn icon(&self, id: IconId) -> Option<IconRef<'_>> {
        self.icons.contains_key(&id).then(move || IconRef::new(self, id))
    }

    pub fn icon_mut(&mut self, id: IconId) -> Option<IconMut<'_>> {
        self.icons.contains_key(&id).then(move || IconMut::new(self, id))
    }

    pub fn attachment(&self, id: AttachmentId) -> Option<AttachmentRef<'_>> {
        self.attachments
            .contains_key(&id)
            .then(move || AttachmentRef::new(self, id))
    }

    /// Insert binary attachment data, deduplicating against any existing attachment with the
    /// same content, and return its id.
    pub(crate) fn get_or_insert_attachment(&mut self, data: Vec<u8>) -> AttachmentId {
        if let Some(existing) = self.attachments.values().find(|a| a.data() == data.as_slice()) {
            return existing.id();
        }

        let mut attachment = Attachment::new();
        attachment.set_data(data);
        let id = attachment.id();
        self.attachments.insert(id, attachment);
        id
    }

    pub(crate) fn get_or_insert_icon(&mut self, data: Vec<u8>) -> IconId {
        if let Some(existing) = self.icons.values().find(|i| i.data == data) {
            return existing.id();
        }

        let icon = Icon::new(data);
        let id = icon.id();
        self.icons.insert(id, icon);
        id
    }
}

impl Default for Database {
    fn default() -> Self {
        Database::new()
    }
}
