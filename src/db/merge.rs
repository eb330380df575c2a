//! Merging two copies of the same database (e.g. after syncing a KDBX file from two devices).
//!
//! Merge is UUID-keyed: an entry or group present in both copies is the "same" object if its id
//! matches, and the copy with the later `last_modification` time wins, with the losing side
//! pushed into the winner's history. Deletions are tracked in [`crate::db::DeletedObject`] so
//! that a deletion on one side is not resurrected by an older copy on the other side.

use std::collections::HashSet;

use thiserror::Error;
use uuid::Uuid;

use crate::db::{Database, EntryId, GroupId, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeEventType {
    EntryCreated,
    EntryUpdated,
    EntryHistoryUpdated,
    GroupCreated,
    GroupUpdated,
}

#[derive(Debug, Clone)]
pub struct MergeEvent {
    pub event_type: MergeEventType,
    pub object_uuid: Uuid,
}

/// A record of what a merge did: every object it touched, plus warnings about conflicts it
/// could not resolve automatically (e.g. two history entries sharing a modification time but
/// carrying different content).
#[derive(Debug, Default, Clone)]
pub struct MergeLog {
    pub events: Vec<MergeEvent>,
    pub warnings: Vec<String>,
}

impl MergeLog {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl std::fmt::Display for MergeLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} change(s) applied", self.events.len())?;
        for w in &self.warnings {
            writeln!(f, "warning: {w}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Entry {0} references group {1}, which does not exist in either database")]
    OrphanedEntry(EntryId, GroupId),
}

impl Database {
    /// Merge `other` into `self`, returning a log of what changed.
    ///
    /// Entries and groups are matched by id; whichever side has the later
    /// `times.last_modification` wins, with the losing entry's prior content pushed into its
    /// history. Objects recorded as deleted (in either database's `deleted_objects` log) after
    /// the other side's last-known modification time are dropped rather than resurrected.
    pub fn merge(&mut self, other: &Database) -> Result<MergeLog, MergeError> {
        let mut log = MergeLog::default();

        self.merge_deletions(other);
        self.merge_groups(other, &mut log)?;
        self.merge_entries(other, &mut log)?;

        Ok(log)
    }

    fn is_deleted(&self, uuid: Uuid, not_before: Option<chrono::NaiveDateTime>) -> bool {
        self.deleted_objects.iter().any(|d| {
            d.uuid == uuid
                && match not_before {
                    Some(t) => d.deletion_time >= t,
                    None => true,
                }
        })
    }

    fn merge_deletions(&mut self, other: &Database) {
        let existing: HashSet<Uuid> = self.deleted_objects.iter().map(|d| d.uuid).collect();
        for d in &other.deleted_objects {
            if !existing.contains(&d.uuid) {
                self.deleted_objects.push(d.clone());
            }
        }
    }

    fn merge_groups(&mut self, other: &Database, log: &mut MergeLog) -> Result<(), MergeError> {
        // Groups carry no single "last touched" signal as clean as an entry's modification time,
        // so group metadata merges by last_modification same as entries, and missing groups are
        // simply adopted.
        for (id, other_group) in &other.groups {
            if self.is_deleted(id.uuid(), None) {
                continue;
            }

            if let Some(existing) = self.groups.get_mut(id) {
                if other_group.times.get_last_modification() > existing.times.get_last_modification() {
                    let children = existing.children().to_vec();
                    *existing = other_group.clone();
                    for child in children {
                        if !existing.children().contains(&child) {
                            existing.adopt_child(child);
                        }
                    }
                    log.events.push(MergeEvent {
                        event_type: MergeEventType::GroupUpdated,
                        object_uuid: id.uuid(),
                    });
                }
            } else {
                self.groups.insert(*id, other_group.clone());
                log.events.push(MergeEvent {
                    event_type: MergeEventType::GroupCreated,
                    object_uuid: id.uuid(),
                });
            }
        }

        // Adopt any child listed by `other` that this side doesn't know about yet (a sibling
        // created concurrently on the other device).
        let group_ids: Vec<GroupId> = other.groups.keys().copied().collect();
        for id in group_ids {
            let Some(other_group) = other.groups.get(&id) else { continue };
            if !self.groups.contains_key(&id) {
                continue;
            }

            for child in other_group.children().to_vec() {
                let present = self.groups.get(&id).unwrap().children().contains(&child);
                if present {
                    continue;
                }
                let exists = match child {
                    NodeId::Group(g) => self.groups.contains_key(&g),
                    NodeId::Entry(e) => self.entries.contains_key(&e),
                };
                if exists {
                    self.groups.get_mut(&id).unwrap().adopt_child(child);
                }
            }
        }

        Ok(())
    }

    fn merge_entries(&mut self, other: &Database, log: &mut MergeLog) -> Result<(), MergeError> {
        for (id, other_entry) in &other.entries {
            if self.is_deleted(id.uuid(), other_entry.times.get_last_modification().copied()) {
                continue;
            }

            if let Some(existing) = self.entries.get(id) {
                let existing_time = existing.times.get_last_modification();
                let other_time = other_entry.times.get_last_modification();

                if other_time > existing_time {
                    let mut merged = other_entry.clone();

                    if existing.has_diverged_from(other_entry) {
                        let mut history = existing.history.clone().unwrap_or_default();
                        history.add_entry(existing.clone());
                        merged.history = Some(history);
                        log.events.push(MergeEvent {
                            event_type: MergeEventType::EntryHistoryUpdated,
                            object_uuid: id.uuid(),
                        });
                    }

                    if let Some(other_history) = other_entry.history.clone() {
                        let mut merged_history = merged.history.clone().unwrap_or_default();
                        let sub_log = merged_history.merge_with(&other_history);
                        log.warnings.extend(sub_log.warnings);
                        merged.history = Some(merged_history);
                    }

                    self.entries.insert(*id, merged);
                    log.events.push(MergeEvent {
                        event_type: MergeEventType::EntryUpdated,
                        object_uuid: id.uuid(),
                    });
                }
            } else {
                if !self.groups.contains_key(&other_entry.parent) {
                    return Err(MergeError::OrphanedEntry(*id, other_entry.parent));
                }
                self.entries.insert(*id, other_entry.clone());
                self.groups
                    .get_mut(&other_entry.parent)
                    .unwrap()
                    .adopt_child(NodeId::Entry(*id));
                log.events.push(MergeEvent {
                    event_type: MergeEventType::EntryCreated,
                    object_uuid: id.uuid(),
                });
            }
        }

        Ok(())
    }
}
