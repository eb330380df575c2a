use std::collections::HashMap;

use crate::db::Entry;

/// An entry's modification history: older revisions, most recent first.
#[derive(Debug, Default, Eq, PartialEq, Clone)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize))]
pub struct History {
    pub(crate) entries: Vec<Entry>,
}

impl History {
    pub fn add_entry(&mut self, mut entry: Entry) {
        // a history entry never carries its own history, or it would grow without bound
        entry.history = None;
        self.entries.insert(0, entry);
    }

    pub fn get_entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Drop history entries down to `max_items` (if `Some`) and `max_size` bytes of serialized
    /// field data (if `Some`), dropping the oldest entries first.
    pub(crate) fn enforce_limits(&mut self, max_items: Option<usize>, max_size: Option<usize>) {
        if let Some(max_items) = max_items {
            self.entries.truncate(max_items);
        }

        if let Some(max_size) = max_size {
            let mut total = 0usize;
            let mut cutoff = self.entries.len();
            for (i, entry) in self.entries.iter().enumerate() {
                let size: usize = entry
                    .fields
                    .values()
                    .filter_map(|v| v.as_string().map(str::len).or_else(|| v.as_bytes().map(<[u8]>::len)))
                    .sum();
                total += size;
                if total > max_size {
                    cutoff = i;
                    break;
                }
            }
            self.entries.truncate(cutoff);
        }
    }

    #[cfg(test)]
    pub(crate) fn is_ordered(&self) -> bool {
        let mut last: Option<&chrono::NaiveDateTime> = None;
        for entry in &self.entries {
            let modified = entry.times.get_last_modification();
            if let (Some(last), Some(modified)) = (last, modified) {
                if last < modified {
                    return false;
                }
            }
            last = modified;
        }
        true
    }

    /// Merge the history entries of another copy of this entry into this one, keyed by
    /// modification time, keeping the newest-first order.
    pub(crate) fn merge_with(&mut self, other: &History) -> crate::db::merge::MergeLog {
        let mut log = crate::db::merge::MergeLog::default();
        let mut by_modification_time: HashMap<chrono::NaiveDateTime, Entry> = HashMap::new();

        for entry in &self.entries {
            if let Some(t) = entry.times.get_last_modification() {
                by_modification_time.insert(*t, entry.clone());
            }
        }

        for entry in &other.entries {
            let Some(t) = entry.times.get_last_modification() else {
                continue;
            };
            match by_modification_time.get(t) {
                Some(existing) if existing.has_diverged_from(entry) => {
                    log.warnings.push(format!(
                        "History entries for {} share a modification time but differ",
                        existing.id()
                    ));
                }
                Some(_) => {}
                None => {
                    by_modification_time.insert(*t, entry.clone());
                }
            }
        }

        let mut times: Vec<chrono::NaiveDateTime> = by_modification_time.keys().copied().collect();
        times.sort_unstable();
        times.reverse();

        self.entries = times
            .into_iter()
            .map(|t| by_modification_time.remove(&t).unwrap())
            .collect();

        log
    }
}
