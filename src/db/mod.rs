//! The in-memory representation of a KeePass database, independent of its on-disk format.
//!
//! [`Database`] owns every [`Entry`] and [`Group`] in flat, UUID-keyed pools; handles like
//! [`EntryRef`]/[`GroupMut`] borrow into those pools rather than owning a tree directly. See
//! [`types`] for the full data model and [`merge`] for combining two copies of a database.

mod delete;
pub mod fields;
pub(crate) mod merge;
mod types;

pub use delete::DeleteError;
pub use merge::{MergeError, MergeEvent, MergeEventType, MergeLog};
pub use types::*;

use crate::{
    error::Error,
    format::{self, kdb, kdbx3, kdbx4, DatabaseVersion},
    key::DatabaseKey,
};

impl Database {
    /// Parse a database from a reader.
    pub fn open(source: &mut dyn std::io::Read, key: DatabaseKey) -> Result<Database, Error> {
        let mut data = Vec::new();
        source.read_to_end(&mut data)?;

        Database::parse(&data, key)
    }

    /// Parse a database from an already-read buffer.
    pub fn parse(data: &[u8], key: DatabaseKey) -> Result<Database, Error> {
        Database::parse_cancellable(data, key, &|| false)
    }

    /// Parse a database, aborting the key-derivation step early if `cancel` returns true.
    pub fn parse_cancellable(data: &[u8], key: DatabaseKey, cancel: &dyn Fn() -> bool) -> Result<Database, Error> {
        let key_elements = key.get_key_elements()?;

        match DatabaseVersion::parse(data)? {
            DatabaseVersion::KDB(_) => kdb::parse(data),
            DatabaseVersion::KDB2(_) => Err(Error::UnsupportedVersion("KDBX2".into())),
            DatabaseVersion::KDB3(_) => kdbx3::parse(data, &key_elements, cancel),
            DatabaseVersion::KDB4(_) => kdbx4::parse::parse(data, &key_elements, cancel),
        }
    }

    /// Serialize and encrypt the database to a writer.
    #[cfg(feature = "save_kdbx4")]
    pub fn save(&self, destination: &mut dyn std::io::Write, key: DatabaseKey) -> Result<(), Error> {
        match self.config.version {
            DatabaseVersion::KDB(_) | DatabaseVersion::KDB2(_) | DatabaseVersion::KDB3(_) => Err(
                Error::WriteFailed("only KDBX4 databases can be written by this crate".into()),
            ),
            DatabaseVersion::KDB4(_) => kdbx4::dump::dump(self, &key, destination),
        }
    }

    /// Decrypt a database and return its inner, decompressed XML body without parsing it into a
    /// [`Database`]. Useful for debugging or for tools that want to inspect the raw XML.
    pub fn get_xml(source: &mut dyn std::io::Read, key: DatabaseKey) -> Result<Vec<u8>, Error> {
        let mut data = Vec::new();
        source.read_to_end(&mut data)?;

        let key_elements = key.get_key_elements()?;

        match DatabaseVersion::parse(&data)? {
            DatabaseVersion::KDB(_) | DatabaseVersion::KDB2(_) => {
                Err(Error::UnsupportedVersion("KDB/KDBX2".into()))
            }
            DatabaseVersion::KDB3(_) => kdbx3::get_xml(&data, &key_elements),
            DatabaseVersion::KDB4(_) => kdbx4::parse::get_xml(&data, &key_elements),
        }
    }

    /// Read a database's version header without decrypting the rest of the file.
    pub fn get_version(source: &mut dyn std::io::Read) -> Result<DatabaseVersion, Error> {
        let mut data = vec![0; DatabaseVersion::get_version_header_size()];
        source.read_exact(&mut data)?;
        DatabaseVersion::parse(&data)
    }
}

#[cfg(test)]
mod database_tests {
    use crate::{key::DatabaseKey, Database};

    #[test]
    #[cfg(feature = "save_kdbx4")]
    fn test_xml() {
        let mut db = Database::new();
        db.root_mut().create_entry();

        let key = DatabaseKey::new().with_password("demopass");

        let mut buf = Vec::new();
        db.save(&mut buf, key.clone()).unwrap();

        let xml = Database::get_xml(&mut buf.as_slice(), key).unwrap();
        assert!(xml.len() > 100);
    }

    #[test]
    fn test_open_invalid_version_header_size() {
        assert!(Database::parse(&[], DatabaseKey::new().with_password("testing")).is_err());
        assert!(
            Database::parse(&[0, 0, 0, 0, 0, 0, 0, 0], DatabaseKey::new().with_password("testing")).is_err()
        );
    }
}
