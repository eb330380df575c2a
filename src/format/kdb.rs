//! Legacy pre-KDBX "KDB" format.
//!
//! [`DatabaseVersion::parse`](crate::format::DatabaseVersion::parse) already recognizes the KDB
//! magic well enough to route here instead of falling through to KDBX3/KDBX4 parsing, but the KDB
//! field codec and group/entry TLV layout are out of scope: a database in this format is
//! identified precisely, then rejected, rather than silently misparsed as KDBX.

use crate::{db::Database, error::Error};

pub(crate) fn parse(_data: &[u8]) -> Result<Database, Error> {
    Err(Error::UnsupportedVersion("KDB".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_kdb() {
        assert!(matches!(parse(&[]), Err(Error::UnsupportedVersion(_))));
    }
}
