use std::{
    collections::HashMap,
    ops::{Deref, DerefMut},
};

use uuid::Uuid;

use crate::db::{CustomDataItem, Database, Entry, EntryId, EntryMut, EntryRef, IconId, IconRef, Times};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize))]
pub struct GroupId(Uuid);

impl GroupId {
    pub(crate) fn with_uuid(uuid: Uuid) -> GroupId {
        GroupId(uuid)
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A child of a [`Group`], tagged by kind rather than by a class hierarchy so that both groups
/// and entries can live in one ordered list and keep the document order KeePass itself relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize))]
pub enum NodeId {
    Group(GroupId),
    Entry(EntryId),
}

/// A KeePass group (folder).
///
/// As with [`Entry`], you will only ever touch a `Group` through a [`GroupRef`]/[`GroupMut`]
/// handle borrowed from the owning [`Database`].
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize))]
pub struct Group {
    id: GroupId,

    pub name: String,
    pub notes: Option<String>,

    pub icon_id: Option<usize>,
    custom_icon_id: Option<IconId>,

    /// children, in document order
    children: Vec<NodeId>,

    pub times: Times,
    pub custom_data: HashMap<String, CustomDataItem>,

    pub is_expanded: bool,
    pub default_autotype_sequence: Option<String>,
    pub enable_autotype: Option<String>,
    pub enable_searching: Option<String>,
    pub last_top_visible_entry: Option<Uuid>,
}

impl Group {
    pub(crate) fn new(name: impl Into<String>) -> Group {
        Group::with_id(GroupId(Uuid::new_v4()), name)
    }

    pub(crate) fn with_id(id: GroupId, name: impl Into<String>) -> Group {
        Group {
            id,
            name: name.into(),
            notes: None,
            icon_id: None,
            custom_icon_id: None,
            children: Vec::new(),
            times: Times::default(),
            custom_data: HashMap::new(),
            is_expanded: true,
            default_autotype_sequence: None,
            enable_autotype: None,
            enable_searching: None,
            last_top_visible_entry: None,
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Get the id of this group's custom icon, if any.
    pub fn custom_icon_id(&self) -> Option<IconId> {
        self.custom_icon_id
    }

    pub(crate) fn set_custom_icon_id(&mut self, id: Option<IconId>) {
        self.custom_icon_id = id;
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Append a child id if it is not already present. Used by merge, which works directly on
    /// pool entries rather than through a `GroupMut` handle.
    pub(crate) fn adopt_child(&mut self, child: NodeId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }
}

/// An immutable reference to a valid group in the database. Implements Deref to Group.
pub struct GroupRef<'a> {
    database: &'a Database,
    id: GroupId,
}

impl<'a> GroupRef<'a> {
    pub(crate) fn new(database: &'a Database, id: GroupId) -> GroupRef<'a> {
        GroupRef { database, id }
    }

    /// Iterate over the direct child groups, in document order.
    pub fn groups(&self) -> impl Iterator<Item = GroupRef<'a>> + 'a {
        let database = self.database;
        self.children.clone().into_iter().filter_map(move |c| match c {
            NodeId::Group(id) => Some(GroupRef::new(database, id)),
            NodeId::Entry(_) => None,
        })
    }

    /// Iterate over the direct child entries, in document order.
    pub fn entries(&self) -> impl Iterator<Item = EntryRef<'a>> + 'a {
        let database = self.database;
        self.children.clone().into_iter().filter_map(move |c| match c {
            NodeId::Entry(id) => Some(EntryRef::new(database, id)),
            NodeId::Group(_) => None,
        })
    }

    /// Recursively iterate over every entry contained in this group or any descendant group.
    pub fn entries_recursive(&self) -> Box<dyn Iterator<Item = EntryRef<'a>> + 'a> {
        let own = self.entries();
        let nested = self.groups().flat_map(|g| g.entries_recursive());
        Box::new(own.chain(nested))
    }

    pub fn custom_icon(&self) -> Option<IconRef<'_>> {
        let icon_id = self.custom_icon_id?;
        self.database.icon(icon_id)
    }

    pub fn database(&self) -> &Database {
        self.database
    }
}

impl Deref for GroupRef<'_> {
    type Target = Group;

    fn deref(&self) -> &Self::Target {
        // UNWRAP safety: GroupRef can only be constructed with a valid GroupId
        self.database.groups.get(&self.id).expect("Group not found")
    }
}

/// A mutable reference to a valid group in the database. Implements Deref and DerefMut to Group.
pub struct GroupMut<'a> {
    database: &'a mut Database,
    id: GroupId,
}

impl<'a> GroupMut<'a> {
    pub(crate) fn new(database: &'a mut Database, id: GroupId) -> GroupMut<'a> {
        GroupMut { database, id }
    }

    pub fn as_ref(&self) -> GroupRef<'_> {
        GroupRef::new(self.database, self.id)
    }

    /// Create a new subgroup and append it as the last child.
    pub fn create_group(&mut self, name: impl Into<String>) -> GroupMut<'_> {
        let group = Group::new(name);
        let id = group.id();
        self.database.groups.insert(id, group);
        self.children.push(NodeId::Group(id));

        GroupMut::new(self.database, id)
    }

    /// Create a new subgroup under a caller-supplied id and append it as the last child. Used by
    /// the XML parser to preserve a group's UUID from the source file instead of minting a fresh
    /// one.
    pub(crate) fn create_group_with_id(&mut self, id: GroupId, name: impl Into<String>) -> GroupMut<'_> {
        let group = Group::with_id(id, name);
        self.database.groups.insert(id, group);
        self.children.push(NodeId::Group(id));

        GroupMut::new(self.database, id)
    }

    /// Create a new entry and append it as the last child.
    pub fn create_entry(&mut self) -> EntryMut<'_> {
        let entry = Entry::new(self.id);
        let id = entry.id();
        self.database.entries.insert(id, entry);
        self.children.push(NodeId::Entry(id));

        EntryMut::new(self.database, id)
    }

    /// Create a new entry under a caller-supplied id and append it as the last child. Used by the
    /// XML parser to preserve an entry's UUID from the source file instead of minting a fresh one.
    pub(crate) fn create_entry_with_id(&mut self, id: EntryId) -> EntryMut<'_> {
        let entry = Entry::with_id(id, self.id);
        self.database.entries.insert(id, entry);
        self.children.push(NodeId::Entry(id));

        EntryMut::new(self.database, id)
    }

    pub(crate) fn adopt_entry(&mut self, id: EntryId) {
        self.children.push(NodeId::Entry(id));
    }

    pub(crate) fn adopt_group(&mut self, id: GroupId) {
        self.children.push(NodeId::Group(id));
    }

    pub(crate) fn remove_child(&mut self, child: NodeId) {
        if let Some(pos) = self.children.iter().position(|c| *c == child) {
            self.children.remove(pos);
        }
    }

    pub fn database_mut(&mut self) -> &mut Database {
        self.database
    }
}

impl Deref for GroupMut<'_> {
    type Target = Group;

    fn deref(&self) -> &Self::Target {
        self.database.groups.get(&self.id).expect("Group not found")
    }
}

impl DerefMut for GroupMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.database.groups.get_mut(&self.id).expect("Group not found")
    }
}
