//! Low-level cryptographic primitives: hashing, HMAC, and the stream/block cipher
//! implementations in [`ciphers`] and the KDFs in [`kdf`].

use cipher::generic_array::{
    typenum::{U32, U64},
    GenericArray,
};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};
use thiserror::Error;

pub(crate) mod ciphers;
pub(crate) mod kdf;

/// A failure in a cryptographic primitive itself (as opposed to a format/parse failure).
#[derive(Debug, Error)]
pub enum CryptographyError {
    #[error("Invalid key or IV length: {0}")]
    InvalidLength(#[from] cipher::InvalidLength),

    #[error("Argon2 error: {0}")]
    Argon2(#[from] argon2::Error),

    #[error("HMAC error: {0}")]
    Hmac(#[from] hmac::digest::InvalidLength),

    #[error("getrandom error: {0}")]
    Random(#[from] getrandom::Error),
}

pub(crate) fn calculate_hmac(
    elements: &[&[u8]],
    key: &[u8],
) -> Result<GenericArray<u8, U32>, CryptographyError> {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(key)?;

    for element in elements {
        mac.update(element);
    }

    Ok(mac.finalize().into_bytes())
}

pub(crate) fn calculate_sha256(elements: &[&[u8]]) -> Result<GenericArray<u8, U32>, CryptographyError> {
    let mut digest = Sha256::new();

    for element in elements {
        digest.update(element);
    }

    Ok(digest.finalize())
}

pub(crate) fn calculate_sha512(elements: &[&[u8]]) -> Result<GenericArray<u8, U64>, CryptographyError> {
    let mut digest = Sha512::new();

    for element in elements {
        digest.update(element);
    }

    Ok(digest.finalize())
}
