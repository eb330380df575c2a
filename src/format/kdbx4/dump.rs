//! Encrypting and serializing a KDBX4 file: the reverse of [`super::parse`] — a fresh outer
//! header with freshly generated randomness, header integrity (SHA256 + HMAC), the HMAC block
//! stream, and the inner header.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::{
    config::DatabaseConfig,
    crypt::{self, CryptographyError},
    db::{Attachment, Database},
    error::Error,
    format::{
        kdbx4::{
            HEADER_COMPRESSION_ID, HEADER_END, HEADER_ENCRYPTION_IV, HEADER_KDF_PARAMS,
            HEADER_MASTER_SEED, HEADER_OUTER_ENCRYPTION_ID, INNER_HEADER_BINARY_ATTACHMENTS,
            INNER_HEADER_END, INNER_HEADER_RANDOM_STREAM_ID, INNER_HEADER_RANDOM_STREAM_KEY,
        },
        DatabaseVersion,
    },
    hmac_block_stream,
    key::DatabaseKey,
};

fn write_header_field(header_data: &mut Vec<u8>, field_id: u8, field_value: &[u8]) {
    header_data.push(field_id);
    let pos = header_data.len();
    header_data.resize(pos + 4, 0);
    LittleEndian::write_u32(&mut header_data[pos..pos + 4], field_value.len() as u32);
    header_data.extend_from_slice(field_value);
}

fn random_bytes(len: usize) -> Result<Vec<u8>, CryptographyError> {
    let mut buf = vec![0u8; len];
    getrandom::getrandom(&mut buf).map_err(CryptographyError::from)?;
    Ok(buf)
}

/// Freshly generated, write-time-only randomness. None of this lives in [`DatabaseConfig`]: a
/// saved database gets a new master seed, IV, KDF seed and inner stream key every time.
struct WriteSecrets {
    master_seed: Vec<u8>,
    outer_iv: Vec<u8>,
    kdf: Box<dyn crypt::kdf::Kdf>,
    kdf_seed: Vec<u8>,
    inner_random_stream_key: Vec<u8>,
}

fn generate_write_secrets(config: &DatabaseConfig) -> Result<WriteSecrets, Error> {
    let master_seed = random_bytes(32)?;
    let outer_iv = random_bytes(config.outer_cipher_config.get_iv_size())?;
    let (kdf, kdf_seed) = config
        .kdf_config
        .get_kdf_and_seed()
        .map_err(CryptographyError::from)?;
    let inner_random_stream_key = random_bytes(config.inner_cipher_config.get_key_size())?;

    Ok(WriteSecrets {
        master_seed,
        outer_iv,
        kdf,
        kdf_seed,
        inner_random_stream_key,
    })
}

fn dump_outer_header(config: &DatabaseConfig, secrets: &WriteSecrets) -> Result<Vec<u8>, Error> {
    let mut header_data = Vec::new();
    config.version.dump(&mut header_data)?;

    write_header_field(
        &mut header_data,
        HEADER_OUTER_ENCRYPTION_ID,
        &config.outer_cipher_config.dump(),
    );
    write_header_field(
        &mut header_data,
        HEADER_COMPRESSION_ID,
        &config.compression_config.dump(),
    );
    write_header_field(&mut header_data, HEADER_MASTER_SEED, &secrets.master_seed);
    write_header_field(&mut header_data, HEADER_ENCRYPTION_IV, &secrets.outer_iv);

    let vd = config.kdf_config.to_variant_dictionary(&secrets.kdf_seed);
    let mut vd_data = Vec::new();
    vd.dump(&mut vd_data)?;
    write_header_field(&mut header_data, HEADER_KDF_PARAMS, &vd_data);

    write_header_field(&mut header_data, HEADER_END, &[]);

    Ok(header_data)
}

fn dump_inner_header(config: &DatabaseConfig, secrets: &WriteSecrets, attachments: &[Attachment]) -> Vec<u8> {
    let mut header_data = Vec::new();

    let mut random_stream_id = [0u8; 4];
    LittleEndian::write_u32(&mut random_stream_id, config.inner_cipher_config.dump());
    write_header_field(&mut header_data, INNER_HEADER_RANDOM_STREAM_ID, &random_stream_id);

    write_header_field(
        &mut header_data,
        INNER_HEADER_RANDOM_STREAM_KEY,
        &secrets.inner_random_stream_key,
    );

    for attachment in attachments {
        let mut entry = vec![if attachment.protected { 1u8 } else { 0u8 }];
        entry.extend_from_slice(attachment.data());
        write_header_field(&mut header_data, INNER_HEADER_BINARY_ATTACHMENTS, &entry);
    }

    write_header_field(&mut header_data, INNER_HEADER_END, &[]);

    header_data
}

pub(crate) fn dump(db: &Database, key: &DatabaseKey, destination: &mut dyn Write) -> Result<(), Error> {
    let config = &db.config;

    if !matches!(config.version, DatabaseVersion::KDB4(_)) {
        return Err(Error::WriteFailed(
            "only KDBX4 databases can be written by this crate".into(),
        ));
    }

    let secrets = generate_write_secrets(config)?;

    let header_data = dump_outer_header(config, &secrets)?;
    let header_sha256 = crypt::calculate_sha256(&[&header_data])?;

    let key_elements = key.get_key_elements()?;
    let key_elements: Vec<&[u8]> = key_elements.iter().map(|v| v.as_slice()).collect();
    let composite_key = crypt::calculate_sha256(&key_elements)?;
    let transformed_key = secrets.kdf.transform_key(&composite_key, &|| false)?;
    let master_key = crypt::calculate_sha256(&[&secrets.master_seed, transformed_key.as_slice()])?;

    let hmac_key = crypt::calculate_sha512(&[
        &secrets.master_seed,
        transformed_key.as_slice(),
        &hmac_block_stream::HMAC_KEY_END,
    ])?;
    let header_hmac_key = hmac_block_stream::get_hmac_block_key(u64::MAX, &hmac_key)?;
    let header_hmac = crypt::calculate_hmac(&[&header_data], &header_hmac_key)?;

    // Every attachment in the database's pool, whether or not the XML body still references it,
    // is written into the inner header and handed to the XML serializer under the same ordering
    // so the two agree on which positional index is which attachment.
    let attachments: Vec<Attachment> = db.attachments.values().cloned().collect();

    let mut inner_encryptor = config.inner_cipher_config.get_cipher(&secrets.inner_random_stream_key)?;
    let xml = crate::format::xml_db::to_xml(db, &mut *inner_encryptor, &attachments)?;

    let mut payload = dump_inner_header(config, &secrets, &attachments);
    payload.extend_from_slice(&xml);

    let payload_compressed = config.compression_config.get_compression().compress(&payload)?;

    let mut outer_encryptor = config.outer_cipher_config.get_cipher(&master_key, &secrets.outer_iv)?;
    let payload_encrypted = outer_encryptor.encrypt(&payload_compressed);

    let payload_hmac = hmac_block_stream::write_hmac_block_stream(&payload_encrypted, &hmac_key)?;

    destination.write_all(&header_data)?;
    destination.write_all(&header_sha256)?;
    destination.write_all(&header_hmac)?;
    destination.write_all(&payload_hmac)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_header_field_matches_tlv_layout() {
        let mut buf = Vec::new();
        write_header_field(&mut buf, 7, &[0xaa, 0xbb, 0xcc]);
        assert_eq!(buf, vec![7, 3, 0, 0, 0, 0xaa, 0xbb, 0xcc]);
    }

    #[test]
    fn write_header_field_empty_value() {
        let mut buf = Vec::new();
        write_header_field(&mut buf, 0, &[]);
        assert_eq!(buf, vec![0, 0, 0, 0, 0]);
    }

    #[test]
    fn random_bytes_has_requested_length() {
        assert_eq!(random_bytes(32).unwrap().len(), 32);
        assert_eq!(random_bytes(0).unwrap().len(), 0);
    }

    #[test]
    fn rejects_non_kdbx4_config() {
        let mut db = Database::new();
        db.config.version = DatabaseVersion::KDB3(1);

        let key = DatabaseKey::new().with_password("test");
        let mut out = Vec::new();
        assert!(matches!(dump(&db, &key, &mut out), Err(Error::WriteFailed(_))));
    }
}
