#![doc = include_str!("../README.md")]
#![recursion_limit = "1024"]

mod compression;
mod config;
pub(crate) mod crypt;
pub mod db;
pub mod error;
pub(crate) mod format;
pub(crate) mod hmac_block_stream;
pub(crate) mod io;
pub mod key;
pub(crate) mod variant_dictionary;

pub use self::{
    config::{CompressionConfig, DatabaseConfig, InnerCipherConfig, KdfConfig, OuterCipherConfig},
    db::*,
    error::Error,
    format::DatabaseVersion,
    key::DatabaseKey,
};
// see https://gist.github.com/msmuenchen/9318327 for file format details
