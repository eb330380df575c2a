//! Removing groups and entries: either a trash move (when the database has a recycle bin
//! configured and enabled) or a hard delete that records a [`DeletedObject`], per
//! [`crate::db::merge`]'s expectation that deletions are always logged somewhere a later merge
//! can see them.

use thiserror::Error;

use crate::db::{Database, DeletedObject, EntryId, Group, GroupId, NodeId, Times};

#[derive(Error, Debug)]
pub enum DeleteError {
    #[error("Entry {0} not found")]
    EntryNotFound(EntryId),

    #[error("Group {0} not found")]
    GroupNotFound(GroupId),

    #[error("The root group cannot be deleted")]
    CannotDeleteRoot,
}

impl Database {
    fn use_trash(&self) -> bool {
        self.meta.recyclebin_enabled.unwrap_or(false)
    }

    /// Find (or lazily create) the recycle bin group, per the `recyclebin_uuid`/
    /// `recyclebin_enabled` fields in [`crate::db::Meta`].
    fn ensure_trash_group(&mut self) -> GroupId {
        if let Some(uuid) = self.meta.recyclebin_uuid {
            let id = GroupId::with_uuid(uuid);
            if self.groups.contains_key(&id) {
                return id;
            }
        }

        let mut trash = Group::new("Recycle Bin");
        trash.is_expanded = false;
        let id = trash.id();

        self.groups.insert(id, trash);
        self.groups.get_mut(&self.root).unwrap().adopt_child(NodeId::Group(id));

        self.meta.recyclebin_uuid = Some(id.uuid());
        self.meta.recyclebin_changed = Some(Times::now());

        id
    }

    /// Find the group that directly contains `child`, if any. Groups carry no parent pointer of
    /// their own (see `spec.md` §9's "lookup-by-UUID into a Tree-owned index" design note), so
    /// this is a scan rather than an O(1) lookup; deletion is not a hot path.
    fn find_parent_group(&self, child: GroupId) -> Option<GroupId> {
        self.groups
            .iter()
            .find(|(_, g)| g.children().contains(&NodeId::Group(child)))
            .map(|(id, _)| *id)
    }

    /// Delete an entry: move it to the recycle bin if one is configured and enabled and the entry
    /// is not already in it, otherwise remove it outright and record a [`DeletedObject`].
    pub fn delete_entry(&mut self, id: EntryId) -> Result<(), DeleteError> {
        let parent = self
            .entries
            .get(&id)
            .map(|e| e.parent)
            .ok_or(DeleteError::EntryNotFound(id))?;

        if self.use_trash() {
            let trash = self.ensure_trash_group();
            if parent != trash {
                self.group_mut(parent).unwrap().remove_child(NodeId::Entry(id));
                self.group_mut(trash).unwrap().adopt_entry(id);

                let entry = self.entries.get_mut(&id).unwrap();
                entry.parent = trash;
                entry.times.location_changed = Some(Times::now());
                return Ok(());
            }
        }

        self.hard_delete_entry(id, parent);
        Ok(())
    }

    /// Delete a group (and everything in it): move it to the recycle bin if one is configured
    /// and enabled and it is not already in it, otherwise remove it and everything it contains
    /// outright, recording a [`DeletedObject`] for every node removed.
    pub fn delete_group(&mut self, id: GroupId) -> Result<(), DeleteError> {
        if id == self.root {
            return Err(DeleteError::CannotDeleteRoot);
        }

        let parent = self.find_parent_group(id).ok_or(DeleteError::GroupNotFound(id))?;

        if self.use_trash() {
            let trash = self.ensure_trash_group();
            if id != trash && parent != trash {
                self.group_mut(parent).unwrap().remove_child(NodeId::Group(id));
                self.group_mut(trash).unwrap().adopt_group(id);
                self.groups.get_mut(&id).unwrap().times.location_changed = Some(Times::now());
                return Ok(());
            }
        }

        self.hard_delete_group(id, parent);
        Ok(())
    }

    fn hard_delete_entry(&mut self, id: EntryId, parent: GroupId) {
        self.group_mut(parent).unwrap().remove_child(NodeId::Entry(id));
        self.entries.remove(&id);
        self.deleted_objects.push(DeletedObject {
            uuid: id.uuid(),
            deletion_time: Times::now(),
        });
    }

    fn hard_delete_group(&mut self, id: GroupId, parent: GroupId) {
        let children = self.groups.get(&id).map(|g| g.children().to_vec()).unwrap_or_default();

        for child in children {
            match child {
                NodeId::Entry(entry_id) => self.hard_delete_entry(entry_id, id),
                NodeId::Group(group_id) => self.hard_delete_group(group_id, id),
            }
        }

        self.group_mut(parent).unwrap().remove_child(NodeId::Group(id));
        self.groups.remove(&id);
        self.deleted_objects.push(DeletedObject {
            uuid: id.uuid(),
            deletion_time: Times::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{fields, Database, NodeId};

    #[test]
    fn hard_delete_entry_records_deleted_object() {
        let mut db = Database::new();
        let root_id = db.root_id();

        let entry_id = {
            let mut root = db.root_mut();
            let mut entry = root.create_entry();
            entry.set_unprotected(fields::TITLE, "Gone soon");
            entry.id()
        };

        db.delete_entry(entry_id).unwrap();

        assert!(db.entry(entry_id).is_none());
        assert!(!db.root().children().contains(&NodeId::Entry(entry_id)));
        assert_eq!(db.deleted_objects.len(), 1);
        assert_eq!(db.deleted_objects[0].uuid, entry_id.uuid());
        assert_eq!(db.root_id(), root_id);
    }

    #[test]
    fn hard_delete_group_cascades_to_children() {
        let mut db = Database::new();

        let (group_id, entry_id) = {
            let mut root = db.root_mut();
            let mut group = root.create_group("Subgroup");
            let entry_id = group.create_entry().id();
            (group.id(), entry_id)
        };

        db.delete_group(group_id).unwrap();

        assert!(db.group(group_id).is_none());
        assert!(db.entry(entry_id).is_none());
        assert_eq!(db.deleted_objects.len(), 2);
    }

    #[test]
    fn delete_with_recycle_bin_moves_instead_of_deleting() {
        let mut db = Database::new();
        db.meta.recyclebin_enabled = Some(true);

        let entry_id = {
            let mut root = db.root_mut();
            root.create_entry().id()
        };

        db.delete_entry(entry_id).unwrap();

        // The entry still exists...
        let entry = db.entry(entry_id).expect("entry moved to trash, not deleted");
        assert!(db.deleted_objects.is_empty());

        // ...under the lazily created recycle bin group.
        let trash_id = db.meta.recyclebin_uuid.expect("recycle bin was created");
        assert_eq!(entry.parent().id().uuid(), trash_id);

        // Deleting it again, now that it's already in the trash, hard-deletes it.
        db.delete_entry(entry_id).unwrap();
        assert!(db.entry(entry_id).is_none());
        assert_eq!(db.deleted_objects.len(), 1);
    }

    #[test]
    fn cannot_delete_root_group() {
        let mut db = Database::new();
        let root_id = db.root_id();
        assert!(db.delete_group(root_id).is_err());
    }
}
