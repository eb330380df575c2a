//! Decrypting and parsing a KDBX4 file: outer header, header integrity (SHA256 + HMAC), the
//! HMAC-authenticated block stream, and the inner header.

use byteorder::{ByteOrder, LittleEndian};

use crate::{
    config::{CompressionConfig, DatabaseConfig, InnerCipherConfig, KdfConfig, OuterCipherConfig},
    crypt::{self, kdf::Kdf},
    db::{Attachment, Database},
    error::Error,
    format::{
        kdbx4::{
            KDBX4InnerHeader, KDBX4OuterHeader, HEADER_COMMENT, HEADER_COMPRESSION_ID,
            HEADER_ENCRYPTION_IV, HEADER_END, HEADER_KDF_PARAMS, HEADER_MASTER_SEED,
            HEADER_OUTER_ENCRYPTION_ID, HEADER_PUBLIC_CUSTOM_DATA, INNER_HEADER_BINARY_ATTACHMENTS,
            INNER_HEADER_END, INNER_HEADER_RANDOM_STREAM_ID, INNER_HEADER_RANDOM_STREAM_KEY,
        },
        DatabaseVersion,
    },
    hmac_block_stream,
    variant_dictionary::VariantDictionary,
};

fn parse_outer_header(data: &[u8]) -> Result<(KDBX4OuterHeader, usize), Error> {
    let minor_version = match DatabaseVersion::parse(data)? {
        DatabaseVersion::KDB4(v) => v,
        _ => unreachable!("caller already matched on DatabaseVersion::KDB4"),
    };

    let mut pos = DatabaseVersion::get_version_header_size();

    let mut outer_cipher_config = None;
    let mut compression_config = None;
    let mut master_seed = None;
    let mut outer_iv = None;
    let mut kdf_config = None;
    let mut kdf_seed = None;

    loop {
        if pos + 5 > data.len() {
            return Err(Error::HeaderCorrupted("outer header ran past end of file".into()));
        }

        // Every outer header entry is (entry_type: u8, entry_length: u32, entry_buffer: [u8]).
        let entry_type = data[pos];
        let entry_length = LittleEndian::read_u32(&data[pos + 1..pos + 5]) as usize;

        if pos + 5 + entry_length > data.len() {
            return Err(Error::HeaderCorrupted("outer header entry ran past end of file".into()));
        }

        let entry_buffer = &data[pos + 5..pos + 5 + entry_length];
        pos += 5 + entry_length;

        match entry_type {
            HEADER_END => break,
            HEADER_COMMENT | HEADER_PUBLIC_CUSTOM_DATA => {}

            HEADER_OUTER_ENCRYPTION_ID => {
                outer_cipher_config = Some(OuterCipherConfig::try_from(entry_buffer)?);
            }

            HEADER_COMPRESSION_ID => {
                compression_config = Some(CompressionConfig::try_from(LittleEndian::read_u32(entry_buffer))?);
            }

            HEADER_MASTER_SEED => master_seed = Some(entry_buffer.to_vec()),
            HEADER_ENCRYPTION_IV => outer_iv = Some(entry_buffer.to_vec()),

            HEADER_KDF_PARAMS => {
                let vd = VariantDictionary::parse(entry_buffer)?;
                let (config, seed) = <(KdfConfig, Vec<u8>)>::try_from(vd)?;
                kdf_config = Some(config);
                kdf_seed = Some(seed);
            }

            _ => return Err(Error::HeaderCorrupted(format!("unknown outer header entry type {entry_type}"))),
        }
    }

    fn required<T>(v: Option<T>, field: &str) -> Result<T, Error> {
        v.ok_or_else(|| Error::HeaderCorrupted(format!("missing outer header field: {field}")))
    }

    Ok((
        KDBX4OuterHeader {
            minor_version,
            outer_cipher_config: required(outer_cipher_config, "cipher ID")?,
            compression_config: required(compression_config, "compression flags")?,
            master_seed: required(master_seed, "master seed")?,
            outer_iv: required(outer_iv, "encryption IV")?,
            kdf_config: required(kdf_config, "KDF parameters")?,
            kdf_seed: required(kdf_seed, "KDF seed")?,
        },
        pos,
    ))
}

fn parse_inner_header(data: &[u8]) -> Result<(KDBX4InnerHeader, Vec<Attachment>, usize), Error> {
    let mut pos = 0;

    let mut inner_cipher_config = None;
    let mut inner_random_stream_key = None;
    let mut attachments = Vec::new();

    loop {
        if pos + 5 > data.len() {
            return Err(Error::HeaderCorrupted("inner header ran past end of payload".into()));
        }

        let entry_type = data[pos];
        let entry_length = LittleEndian::read_u32(&data[pos + 1..pos + 5]) as usize;

        if pos + 5 + entry_length > data.len() {
            return Err(Error::HeaderCorrupted("inner header entry ran past end of payload".into()));
        }

        let entry_buffer = &data[pos + 5..pos + 5 + entry_length];
        pos += 5 + entry_length;

        match entry_type {
            INNER_HEADER_END => break,

            INNER_HEADER_RANDOM_STREAM_ID => {
                inner_cipher_config = Some(InnerCipherConfig::try_from(LittleEndian::read_u32(entry_buffer))?);
            }

            INNER_HEADER_RANDOM_STREAM_KEY => inner_random_stream_key = Some(entry_buffer.to_vec()),

            INNER_HEADER_BINARY_ATTACHMENTS => {
                if entry_buffer.is_empty() {
                    return Err(Error::HeaderCorrupted("binary attachment entry missing flags byte".into()));
                }

                let flags = entry_buffer[0];
                let mut attachment = Attachment::new();
                attachment.protected = flags & 0x01 != 0;
                attachment.set_data(entry_buffer[1..].to_vec());
                attachments.push(attachment);
            }

            _ => return Err(Error::HeaderCorrupted(format!("unknown inner header entry type {entry_type}"))),
        }
    }

    fn required<T>(v: Option<T>, field: &str) -> Result<T, Error> {
        v.ok_or_else(|| Error::HeaderCorrupted(format!("missing inner header field: {field}")))
    }

    Ok((
        KDBX4InnerHeader {
            inner_cipher_config: required(inner_cipher_config, "inner random stream ID")?,
            inner_random_stream_key: required(inner_random_stream_key, "inner random stream key")?,
        },
        attachments,
        pos,
    ))
}

fn build_config(outer: &KDBX4OuterHeader, inner: &KDBX4InnerHeader) -> DatabaseConfig {
    DatabaseConfig {
        version: DatabaseVersion::KDB4(outer.minor_version),
        outer_cipher_config: outer.outer_cipher_config.clone(),
        compression_config: outer.compression_config.clone(),
        inner_cipher_config: inner.inner_cipher_config.clone(),
        kdf_config: outer.kdf_config.clone(),
    }
}

/// Decrypt and decompress a KDBX4 file, returning the outer header, inner header, header binary
/// attachments, and the XML body.
fn decrypt_kdbx4(
    data: &[u8],
    key_elements: &[Vec<u8>],
    cancel: &dyn Fn() -> bool,
) -> Result<(KDBX4OuterHeader, KDBX4InnerHeader, Vec<Attachment>, Vec<u8>), Error> {
    let (header, inner_header_start) = parse_outer_header(data)?;

    if inner_header_start + 64 > data.len() {
        return Err(Error::HeaderCorrupted("truncated header checksum/HMAC".into()));
    }

    // split file into segments:
    //      header_data         - the outer header bytes
    //      header_sha256       - SHA256 of header_data, verifying header integrity
    //      header_hmac         - HMAC of header_data, verifying the key elements
    //      hmac block stream   - an HMAC-verified block stream of the encrypted, compressed payload
    let header_data = &data[0..inner_header_start];
    let header_sha256 = &data[inner_header_start..inner_header_start + 32];
    let header_hmac = &data[inner_header_start + 32..inner_header_start + 64];
    let block_stream_data = &data[inner_header_start + 64..];

    let key_elements: Vec<&[u8]> = key_elements.iter().map(|v| v.as_slice()).collect();
    let composite_key = crypt::calculate_sha256(&key_elements)?;

    let kdf = header.kdf_config.get_kdf_seeded(&header.kdf_seed);
    let transformed_key = kdf.transform_key(&composite_key, cancel)?;

    let master_key = crypt::calculate_sha256(&[&header.master_seed, transformed_key.as_slice()])?;

    if header_sha256 != crypt::calculate_sha256(&[header_data])?.as_slice() {
        return Err(Error::HeaderCorrupted("header checksum mismatch".into()));
    }

    let hmac_key = crypt::calculate_sha512(&[
        &header.master_seed,
        transformed_key.as_slice(),
        &hmac_block_stream::HMAC_KEY_END,
    ])?;
    let header_hmac_key = hmac_block_stream::get_hmac_block_key(u64::MAX, &hmac_key)?;
    if header_hmac != crypt::calculate_hmac(&[header_data], &header_hmac_key)?.as_slice() {
        return Err(Error::AuthFailure);
    }

    let payload_encrypted = hmac_block_stream::read_hmac_block_stream(block_stream_data, &hmac_key)?;

    let payload_compressed = header
        .outer_cipher_config
        .get_cipher(&master_key, &header.outer_iv)?
        .decrypt(&payload_encrypted)?;

    let payload = header
        .compression_config
        .get_compression()
        .decompress(&payload_compressed)
        .map_err(|e| Error::DecompressionFailed(e.to_string()))?;

    let (inner_header, attachments, body_start) = parse_inner_header(&payload)?;
    let xml = payload[body_start..].to_vec();

    Ok((header, inner_header, attachments, xml))
}

pub(crate) fn parse(data: &[u8], key_elements: &[Vec<u8>], cancel: &dyn Fn() -> bool) -> Result<Database, Error> {
    let (outer_header, inner_header, attachments, xml) = decrypt_kdbx4(data, key_elements, cancel)?;

    let mut inner_decryptor = inner_header
        .inner_cipher_config
        .get_cipher(&inner_header.inner_random_stream_key)?;

    let mut db = crate::format::xml_db::parse_xml(&xml, &attachments, &mut *inner_decryptor)?;
    db.config = build_config(&outer_header, &inner_header);

    Ok(db)
}

/// Decrypt a KDBX4 database and return its inner XML body without parsing it, for
/// [`Database::get_xml`](crate::db::Database::get_xml).
pub(crate) fn get_xml(data: &[u8], key_elements: &[Vec<u8>]) -> Result<Vec<u8>, Error> {
    decrypt_kdbx4(data, key_elements, &|| false).map(|(_, _, _, xml)| xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_truncated_outer_header() {
        let data = [0u8; 12];
        assert!(parse_outer_header(&data).is_err());
    }

    #[test]
    fn rejects_truncated_inner_header() {
        let data = [0u8; 3];
        assert!(parse_inner_header(&data).is_err());
    }

    #[test]
    fn rejects_unknown_inner_header_entry_type() {
        let mut data = vec![0xfe, 0x00, 0x00, 0x00, 0x00]; // unknown entry type, zero-length
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00]); // END
        assert!(matches!(parse_inner_header(&data), Err(Error::HeaderCorrupted(_))));
    }
}
