use uuid::Uuid;

use crate::db::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize))]
pub struct IconId(Uuid);

impl IconId {
    pub(crate) fn with_uuid(uuid: Uuid) -> IconId {
        IconId(uuid)
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for IconId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A custom icon, stored once per unique image and referenced by id from groups and entries.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize))]
pub struct Icon {
    id: IconId,

    /// image data, in whatever raster format KeePass embedded (usually PNG)
    pub data: Vec<u8>,
}

impl Icon {
    pub(crate) fn new(data: Vec<u8>) -> Icon {
        Icon::with_id(IconId(Uuid::new_v4()), data)
    }

    pub(crate) fn with_id(id: IconId, data: Vec<u8>) -> Icon {
        Icon { id, data }
    }

    pub fn id(&self) -> IconId {
        self.id
    }
}

/// An immutable reference to an icon in the database
pub struct IconRef<'a> {
    database: &'a Database,
    id: IconId,
}

impl<'a> IconRef<'a> {
    pub(crate) fn new(database: &'a Database, id: IconId) -> IconRef<'a> {
        IconRef { database, id }
    }
}

impl std::ops::Deref for IconRef<'_> {
    type Target = Icon;

    fn deref(&self) -> &Self::Target {
        // UNWRAP safety: IconRef can only be constructed with a valid id
        self.database.icons.get(&self.id).expect("icon not found")
    }
}

/// A mutable reference to an icon in the database
pub struct IconMut<'a> {
    database: &'a mut Database,
    id: IconId,
}

impl<'a> IconMut<'a> {
    pub(crate) fn new(database: &'a mut Database, id: IconId) -> IconMut<'a> {
        IconMut { database, id }
    }
}

impl std::ops::Deref for IconMut<'_> {
    type Target = Icon;

    fn deref(&self) -> &Self::Target {
        self.database.icons.get(&self.id).expect("icon not found")
    }
}

impl std::ops::DerefMut for IconMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.database.icons.get_mut(&self.id).expect("icon not found")
    }
}
