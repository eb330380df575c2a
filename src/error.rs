//! The single error type returned by every fallible operation in this crate.

use thiserror::Error;

/// Everything that can go wrong while opening, saving or otherwise handling a KDBX database.
#[derive(Debug, Error)]
pub enum Error {
    /// The file does not start with a recognized KeePass/KDBX magic number.
    #[error("Not a KeePass/KDBX file")]
    UnknownFileFormat,

    /// The file is a recognized format, but this crate does not implement its body (e.g. legacy
    /// KDB, or a KDBX major version newer than this crate understands).
    #[error("Unsupported database version: {0}")]
    UnsupportedVersion(String),

    /// A header TLV was truncated, malformed, or referenced a field that must appear exactly
    /// once but didn't (or appeared twice).
    #[error("Corrupted or incomplete header: {0}")]
    HeaderCorrupted(String),

    /// The outer cipher UUID in the header does not match any cipher this crate implements.
    #[error("Unsupported outer cipher")]
    UnsupportedCipher,

    /// The KDF UUID in the header (or the variant dictionary parsed from it) does not match any
    /// KDF this crate implements.
    #[error("Unsupported key derivation function")]
    UnsupportedKDF,

    /// The compression algorithm ID in the header is not recognized.
    #[error("Unsupported compression algorithm")]
    UnsupportedCompression,

    /// The inner random stream (protected value) cipher ID is not recognized.
    #[error("Unsupported inner random stream cipher")]
    UnsupportedRandomStream,

    /// A variant dictionary entry used a type tag this crate does not understand.
    #[error("Unsupported variant dictionary value type: {0:#x}")]
    UnsupportedVariantType(u8),

    /// The variant dictionary itself was malformed (bad version, truncated entry, wrong length
    /// for a fixed-size type).
    #[error("Corrupt variant dictionary: {0}")]
    CorruptVariantDict(String),

    /// A checksum or HMAC over a block, or the header, did not match. Distinguished from
    /// [`Error::AuthFailure`] because integrity failures can occur independently of key
    /// correctness (e.g. bit rot, truncated file).
    #[error("Integrity check failed{}", .block_index.map(|i| format!(" at block {i}")).unwrap_or_default())]
    IntegrityFailure { block_index: Option<u64> },

    /// The composite key (password / key file / combination) did not match the database. This
    /// variant intentionally never carries which component was wrong.
    #[error("Invalid credentials")]
    AuthFailure,

    /// Decompression of the plaintext payload failed (corrupt gzip stream).
    #[error("Failed to decompress database payload: {0}")]
    DecompressionFailed(String),

    /// The decrypted payload was not well-formed KeePass XML, or didn't match the expected
    /// shape.
    #[error("Failed to parse database XML: {0}")]
    XMLParseFailed(String),

    /// A key file could not be parsed as XML, binary, or hashed as a raw file.
    #[error("Failed to parse key file: {0}")]
    KeyFileParseFailed(String),

    /// Writing the serialized database failed (I/O error, or an invariant required for saving
    /// was not met, e.g. asking to save a KDBX3 database with a KDBX4-only cipher).
    #[error("Failed to write database: {0}")]
    WriteFailed(String),

    /// A lower-level cryptographic primitive (cipher construction, HMAC, Argon2, random number
    /// generation) failed, independent of the file format layer built on top of it.
    #[error("Cryptography error: {0}")]
    Cryptography(String),

    /// A long-running key-derivation operation was cancelled via its cancellation token.
    #[error("Operation cancelled")]
    Cancelled,

    /// No key material (password, key file, ...) was supplied at all.
    #[error("No key material supplied")]
    EmptyKey,

    /// An I/O error that doesn't fit a more specific read/write variant above.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<crate::crypt::CryptographyError> for Error {
    fn from(e: crate::crypt::CryptographyError) -> Self {
        Error::Cryptography(e.to_string())
    }
}

impl From<crate::config::OuterCipherConfigError> for Error {
    fn from(e: crate::config::OuterCipherConfigError) -> Self {
        match e {
            crate::config::OuterCipherConfigError::InvalidOuterCipherID { .. } => Error::UnsupportedCipher,
            crate::config::OuterCipherConfigError::Cryptography(e) => e.into(),
        }
    }
}

impl From<crate::config::InnerCipherConfigError> for Error {
    fn from(e: crate::config::InnerCipherConfigError) -> Self {
        match e {
            crate::config::InnerCipherConfigError::InvalidInnerCipherID { .. } => {
                Error::UnsupportedRandomStream
            }
            crate::config::InnerCipherConfigError::Cryptography(e) => e.into(),
        }
    }
}

impl From<crate::config::KdfConfigError> for Error {
    fn from(e: crate::config::KdfConfigError) -> Self {
        match e {
            crate::config::KdfConfigError::InvalidKDFVersion { .. } => Error::UnsupportedKDF,
            crate::config::KdfConfigError::InvalidKDFUUID { .. } => Error::UnsupportedKDF,
            crate::config::KdfConfigError::VariantDictionary(e) => e.into(),
        }
    }
}

impl From<crate::config::CompressionConfigError> for Error {
    fn from(_: crate::config::CompressionConfigError) -> Self {
        Error::UnsupportedCompression
    }
}

impl From<crate::variant_dictionary::VariantDictionaryError> for Error {
    fn from(e: crate::variant_dictionary::VariantDictionaryError) -> Self {
        Error::CorruptVariantDict(e.to_string())
    }
}

impl From<crate::hmac_block_stream::BlockStreamError> for Error {
    fn from(e: crate::hmac_block_stream::BlockStreamError) -> Self {
        match e {
            crate::hmac_block_stream::BlockStreamError::BlockHashMismatch { block_index } => {
                Error::IntegrityFailure {
                    block_index: Some(block_index),
                }
            }
            crate::hmac_block_stream::BlockStreamError::BlockIndexMismatch { .. } => {
                Error::IntegrityFailure { block_index: None }
            }
            crate::hmac_block_stream::BlockStreamError::Cryptography(e) => e.into(),
        }
    }
}

impl From<quick_xml::DeError> for Error {
    fn from(e: quick_xml::DeError) -> Self {
        Error::XMLParseFailed(e.to_string())
    }
}

#[cfg(feature = "save_kdbx4")]
impl From<quick_xml::SeError> for Error {
    fn from(e: quick_xml::SeError) -> Self {
        Error::WriteFailed(e.to_string())
    }
}

impl From<cipher::block_padding::UnpadError> for Error {
    fn from(_: cipher::block_padding::UnpadError) -> Self {
        Error::AuthFailure
    }
}

impl From<crate::format::DatabaseVersionParseError> for Error {
    fn from(e: crate::format::DatabaseVersionParseError) -> Self {
        match e {
            crate::format::DatabaseVersionParseError::InvalidKDBXIdentifier => Error::UnknownFileFormat,
            crate::format::DatabaseVersionParseError::InvalidKDBXVersion { .. } => {
                Error::UnsupportedVersion(e.to_string())
            }
        }
    }
}

impl From<crate::format::xml_db::entry::UnprotectError> for Error {
    fn from(e: crate::format::xml_db::entry::UnprotectError) -> Self {
        match e {
            crate::format::xml_db::entry::UnprotectError::Base64(e) => Error::XMLParseFailed(e.to_string()),
            crate::format::xml_db::entry::UnprotectError::Decrypt(e) => e.into(),
        }
    }
}

impl From<crate::key::GetKeyElementsError> for Error {
    fn from(e: crate::key::GetKeyElementsError) -> Self {
        match e {
            crate::key::GetKeyElementsError::EmptyKey => Error::EmptyKey,
            crate::key::GetKeyElementsError::Keyfile(e) => Error::KeyFileParseFailed(e.to_string()),
        }
    }
}
