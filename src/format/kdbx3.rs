//! KDBX3.1: a single outer-encrypted, block-hashed payload wrapping XML. Superseded by KDBX4's
//! HMAC'd block stream and separate inner header, but still the format most KeePass/KeePassXC
//! databases in the wild were written in.

use byteorder::{ByteOrder, LittleEndian};

use crate::{
    config::{CompressionConfig, DatabaseConfig, InnerCipherConfig, KdfConfig, OuterCipherConfig},
    crypt::{self, kdf::Kdf},
    db::Database,
    error::Error,
    format::DatabaseVersion,
};

#[derive(Debug)]
struct KDBX3Header {
    outer_cipher_config: OuterCipherConfig,
    compression_config: CompressionConfig,
    master_seed: Vec<u8>,
    transform_seed: Vec<u8>,
    transform_rounds: u64,
    outer_iv: Vec<u8>,
    protected_stream_key: Vec<u8>,
    stream_start: Vec<u8>,
    inner_cipher_config: InnerCipherConfig,
    body_start: usize,
}

fn parse_header(data: &[u8]) -> Result<KDBX3Header, Error> {
    let mut outer_cipher_config = None;
    let mut compression_config = None;
    let mut master_seed = None;
    let mut transform_seed = None;
    let mut transform_rounds = None;
    let mut outer_iv = None;
    let mut protected_stream_key = None;
    let mut stream_start = None;
    let mut inner_cipher_config = None;

    let mut pos = DatabaseVersion::get_version_header_size();

    loop {
        if pos + 3 > data.len() {
            return Err(Error::HeaderCorrupted("outer header ran past end of file".into()));
        }

        // Every outer header entry is (entry_type: u8, entry_length: u16, entry_buffer: [u8]).
        let entry_type = data[pos];
        let entry_length = LittleEndian::read_u16(&data[pos + 1..pos + 3]) as usize;

        if pos + 3 + entry_length > data.len() {
            return Err(Error::HeaderCorrupted("outer header entry ran past end of file".into()));
        }

        let entry_buffer = &data[pos + 3..pos + 3 + entry_length];
        pos += 3 + entry_length;

        match entry_type {
            0 => break, // END
            1 => {}     // COMMENT
            2 => outer_cipher_config = Some(OuterCipherConfig::try_from(entry_buffer)?),
            3 => compression_config = Some(CompressionConfig::try_from(LittleEndian::read_u32(entry_buffer))?),
            4 => master_seed = Some(entry_buffer.to_vec()),
            5 => transform_seed = Some(entry_buffer.to_vec()),
            6 => transform_rounds = Some(LittleEndian::read_u64(entry_buffer)),
            7 => outer_iv = Some(entry_buffer.to_vec()),
            8 => protected_stream_key = Some(entry_buffer.to_vec()),
            9 => stream_start = Some(entry_buffer.to_vec()),
            10 => inner_cipher_config = Some(InnerCipherConfig::try_from(LittleEndian::read_u32(entry_buffer))?),
            _ => return Err(Error::HeaderCorrupted(format!("unknown outer header entry type {entry_type}"))),
        }
    }

    fn required<T>(v: Option<T>, field: &str) -> Result<T, Error> {
        v.ok_or_else(|| Error::HeaderCorrupted(format!("missing outer header field: {field}")))
    }

    Ok(KDBX3Header {
        outer_cipher_config: required(outer_cipher_config, "cipher ID")?,
        compression_config: required(compression_config, "compression flags")?,
        master_seed: required(master_seed, "master seed")?,
        transform_seed: required(transform_seed, "transform seed")?,
        transform_rounds: required(transform_rounds, "transform rounds")?,
        outer_iv: required(outer_iv, "encryption IV")?,
        protected_stream_key: required(protected_stream_key, "protected stream key")?,
        stream_start: required(stream_start, "stream start bytes")?,
        inner_cipher_config: required(inner_cipher_config, "inner random stream ID")?,
        body_start: pos,
    })
}

fn header_config(header: &KDBX3Header, minor_version: u16) -> DatabaseConfig {
    DatabaseConfig {
        version: DatabaseVersion::KDB3(minor_version),
        outer_cipher_config: header.outer_cipher_config.clone(),
        compression_config: header.compression_config.clone(),
        inner_cipher_config: header.inner_cipher_config.clone(),
        kdf_config: KdfConfig::Aes {
            rounds: header.transform_rounds,
        },
    }
}

/// Decrypt and decompress the payload, returning the header and the concatenated XML bytes of
/// every block. KDBX3 has no inner header, so this is also the last step before handing the
/// buffer to the XML parser.
fn decrypt_xml(data: &[u8], key_elements: &[Vec<u8>]) -> Result<(KDBX3Header, Vec<u8>), Error> {
    let header = parse_header(data)?;
    let payload_encrypted = &data[header.body_start..];

    let key_elements: Vec<&[u8]> = key_elements.iter().map(|v| v.as_slice()).collect();
    let composite_key = crypt::calculate_sha256(&key_elements)?;

    let transformed_key = crypt::kdf::AesKdf {
        seed: header.transform_seed.clone(),
        rounds: header.transform_rounds,
    }
    .transform_key(&composite_key, &|| false)?;

    let master_key = crypt::calculate_sha256(&[&header.master_seed, transformed_key.as_slice()])?;

    let payload = header
        .outer_cipher_config
        .get_cipher(&master_key, &header.outer_iv)?
        .decrypt(payload_encrypted)?;

    if payload.len() < header.stream_start.len() || payload[..header.stream_start.len()] != header.stream_start[..] {
        return Err(Error::AuthFailure);
    }

    let mut compressed = Vec::new();
    let mut pos = header.stream_start.len();
    let mut block_index = 0u64;

    loop {
        if pos + 40 > payload.len() {
            return Err(Error::HeaderCorrupted("truncated block stream".into()));
        }

        // Each block is (block_id: u32, block_hash: [u8; 32], block_size: u32, block_buffer).
        let block_id = LittleEndian::read_u32(&payload[pos..pos + 4]) as u64;
        let block_hash = &payload[pos + 4..pos + 36];
        let block_size = LittleEndian::read_u32(&payload[pos + 36..pos + 40]) as usize;

        if block_id != block_index {
            return Err(Error::HeaderCorrupted(format!(
                "block stream out of order: expected block {block_index}, found {block_id}"
            )));
        }

        if block_size == 0 {
            break;
        }

        if pos + 40 + block_size > payload.len() {
            return Err(Error::HeaderCorrupted("truncated block buffer".into()));
        }

        let block_buffer = &payload[pos + 40..pos + 40 + block_size];
        let block_hash_check = crypt::calculate_sha256(&[block_buffer])?;

        if block_hash != block_hash_check.as_slice() {
            return Err(Error::IntegrityFailure {
                block_index: Some(block_index),
            });
        }

        compressed.extend_from_slice(block_buffer);

        pos += 40 + block_size;
        block_index += 1;
    }

    let xml = header
        .compression_config
        .get_compression()
        .decompress(&compressed)
        .map_err(|e| Error::DecompressionFailed(e.to_string()))?;

    Ok((header, xml))
}

/// Decrypt a KDBX3 database and return its inner XML body without parsing it, for
/// [`Database::get_xml`](crate::db::Database::get_xml).
pub(crate) fn get_xml(data: &[u8], key_elements: &[Vec<u8>]) -> Result<Vec<u8>, Error> {
    decrypt_xml(data, key_elements).map(|(_, xml)| xml)
}

pub(crate) fn parse(data: &[u8], key_elements: &[Vec<u8>], _cancel: &dyn Fn() -> bool) -> Result<Database, Error> {
    let minor_version = match DatabaseVersion::parse(data)? {
        DatabaseVersion::KDB3(v) => v,
        _ => unreachable!("caller already matched on DatabaseVersion::KDB3"),
    };

    let (header, xml) = decrypt_xml(data, key_elements)?;

    let stream_key = crypt::calculate_sha256(&[&header.protected_stream_key])?;
    let mut inner_decryptor = header.inner_cipher_config.get_cipher(&stream_key)?;

    let mut db = crate::format::xml_db::parse_xml(&xml, &[], &mut *inner_decryptor)?;
    db.config = header_config(&header, minor_version);

    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_truncated_header() {
        let data = [0u8; 12];
        assert!(parse_header(&data).is_err());
    }

    #[test]
    fn rejects_unknown_header_entry_type() {
        let mut data = vec![0u8; DatabaseVersion::get_version_header_size()];
        data.extend_from_slice(&[0xfe, 0x00, 0x00]); // unknown entry type, zero-length buffer
        data.extend_from_slice(&[0x00, 0x00, 0x00]); // END
        assert!(matches!(parse_header(&data), Err(Error::HeaderCorrupted(_))));
    }
}
