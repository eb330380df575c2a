use std::ops::{Deref, DerefMut};

use secrecy::{ExposeSecret, SecretBox};
use uuid::Uuid;

use crate::db::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize))]
pub struct AttachmentId(Uuid);

impl AttachmentId {
    pub(crate) fn with_uuid(uuid: Uuid) -> AttachmentId {
        AttachmentId(uuid)
    }
}

impl std::fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A binary attachment associated with an entry, kept in a content-deduplicated pool on
/// [`Database`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize))]
pub struct Attachment {
    id: AttachmentId,
    pub name: String,
    pub protected: bool,
    data: SecretBox<[u8]>,
}

impl Attachment {
    pub(crate) fn new() -> Self {
        Attachment {
            id: AttachmentId(Uuid::new_v4()),
            name: String::new(),
            protected: true,
            data: SecretBox::new(Box::new([])),
        }
    }

    pub fn id(&self) -> AttachmentId {
        self.id
    }

    pub fn data(&self) -> &[u8] {
        self.data.expose_secret()
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = SecretBox::new(data.into_boxed_slice());
    }
}

/// An immutable reference to an attachment in the database.
pub struct AttachmentRef<'a> {
    database: &'a Database,
    id: AttachmentId,
}

impl<'a> AttachmentRef<'a> {
    pub(crate) fn new(database: &'a Database, id: AttachmentId) -> AttachmentRef<'a> {
        AttachmentRef { database, id }
    }
}

impl Deref for AttachmentRef<'_> {
    type Target = Attachment;

    fn deref(&self) -> &Self::Target {
        // UNWRAP safety: AttachmentRef can only be constructed with a valid AttachmentId
        self.database.attachments.get(&self.id).expect("attachment not found")
    }
}

/// A mutable reference to an attachment in the database.
pub struct AttachmentMut<'a> {
    database: &'a mut Database,
    id: AttachmentId,
}

impl<'a> AttachmentMut<'a> {
    pub(crate) fn new(database: &'a mut Database, id: AttachmentId) -> AttachmentMut<'a> {
        AttachmentMut { database, id }
    }
}

impl Deref for AttachmentMut<'_> {
    type Target = Attachment;

    fn deref(&self) -> &Self::Target {
        self.database.attachments.get(&self.id).expect("attachment not found")
    }
}

impl DerefMut for AttachmentMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.database
            .attachments
            .get_mut(&self.id)
            .expect("attachment not found")
    }
}
