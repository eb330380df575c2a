use aes::Aes256;
use cipher::{
    generic_array::{typenum::U32, GenericArray},
    BlockEncrypt, KeyInit,
};
use sha2::{Digest, Sha256};

use super::CryptographyError;
use crate::error::Error;

/// How often (in AES-KDF rounds) the cancellation predicate is polled. Checking every round
/// would dominate the cost of the loop; checking too rarely makes cancellation unresponsive.
const AES_KDF_CANCEL_CHECK_INTERVAL: u64 = 1024;

pub(crate) trait Kdf {
    fn transform_key(
        &self,
        composite_key: &GenericArray<u8, U32>,
        cancel: &dyn Fn() -> bool,
    ) -> Result<GenericArray<u8, U32>, Error>;
}

pub struct AesKdf {
    pub seed: Vec<u8>,
    pub rounds: u64,
}

impl Kdf for AesKdf {
    fn transform_key(
        &self,
        composite_key: &GenericArray<u8, U32>,
        cancel: &dyn Fn() -> bool,
    ) -> Result<GenericArray<u8, U32>, Error> {
        let cipher = Aes256::new(&GenericArray::clone_from_slice(&self.seed));
        let mut block1 = GenericArray::clone_from_slice(&composite_key[..16]);
        let mut block2 = GenericArray::clone_from_slice(&composite_key[16..]);

        for round in 0..self.rounds {
            if round % AES_KDF_CANCEL_CHECK_INTERVAL == 0 && cancel() {
                return Err(Error::Cancelled);
            }
            cipher.encrypt_block(&mut block1);
            cipher.encrypt_block(&mut block2);
        }

        let mut digest = Sha256::new();
        digest.update(block1);
        digest.update(block2);

        Ok(digest.finalize())
    }
}

pub struct Argon2Kdf {
    pub memory: u64,
    pub salt: Vec<u8>,
    pub iterations: u64,
    pub parallelism: u32,
    pub version: argon2::Version,
    pub variant: argon2::Variant,
}

impl Kdf for Argon2Kdf {
    fn transform_key(
        &self,
        composite_key: &GenericArray<u8, U32>,
        cancel: &dyn Fn() -> bool,
    ) -> Result<GenericArray<u8, U32>, Error> {
        // Argon2 itself cannot be interrupted mid-hash by any Rust Argon2 crate this project
        // depends on, so cancellation is checked only at the call boundary.
        if cancel() {
            return Err(Error::Cancelled);
        }

        let config = argon2::Config {
            ad: &[],
            hash_length: 32,
            lanes: self.parallelism,
            mem_cost: (self.memory / 1024) as u32,
            secret: &[],
            time_cost: self.iterations as u32,
            variant: self.variant,
            version: self.version,
        };

        let key = argon2::hash_raw(composite_key, &self.salt, &config)
            .map_err(CryptographyError::from)?;

        if cancel() {
            return Err(Error::Cancelled);
        }

        Ok(*GenericArray::from_slice(&key))
    }
}
