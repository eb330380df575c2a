use chrono::NaiveDateTime;

/// Timestamps for a Group or Entry
///
/// NaiveDateTime is used because KeePass does not store timezone information
#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize))]
pub struct Times {
    pub creation: Option<NaiveDateTime>,
    pub last_modification: Option<NaiveDateTime>,
    pub last_access: Option<NaiveDateTime>,
    pub expiry: Option<NaiveDateTime>,
    pub location_changed: Option<NaiveDateTime>,

    pub expires: Option<bool>,
    pub usage_count: Option<usize>,
}

impl Times {
    /// The current time, as stored in `Times` fields (no timezone, matching KeePass's own
    /// on-disk representation).
    pub fn now() -> NaiveDateTime {
        chrono::Utc::now().naive_utc()
    }

    pub fn get_last_modification(&self) -> Option<&NaiveDateTime> {
        self.last_modification.as_ref()
    }

    pub fn get_creation(&self) -> Option<&NaiveDateTime> {
        self.creation.as_ref()
    }

    pub fn get_expiry(&self) -> Option<&NaiveDateTime> {
        self.expiry.as_ref()
    }
}
