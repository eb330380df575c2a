//! KDBX4: an outer header, an HMAC-authenticated block stream (see
//! [`crate::hmac_block_stream`]) wrapping the compressed payload, and — inside that payload — an
//! inner header carrying the protected-value stream cipher and any binary attachments, followed
//! by the XML body.

#[cfg(feature = "save_kdbx4")]
pub(crate) mod dump;
pub(crate) mod parse;

use crate::config::{CompressionConfig, InnerCipherConfig, KdfConfig, OuterCipherConfig};

/// Header entry denoting the end of the header
pub(crate) const HEADER_END: u8 = 0;
/// Header entry denoting a comment
pub(crate) const HEADER_COMMENT: u8 = 1;
/// A UUID specifying which cipher suite should be used to encrypt the payload
pub(crate) const HEADER_OUTER_ENCRYPTION_ID: u8 = 2;
/// First byte determines compression of payload
pub(crate) const HEADER_COMPRESSION_ID: u8 = 3;
/// Master seed for deriving the master key
pub(crate) const HEADER_MASTER_SEED: u8 = 4;
/// Initialization Vector for decrypting the payload
pub(crate) const HEADER_ENCRYPTION_IV: u8 = 7;
/// Parameters for the key derivation function
pub(crate) const HEADER_KDF_PARAMS: u8 = 11;
/// Custom data of plugins/ports. Accepted and ignored, like [`HEADER_COMMENT`]: this crate has no
/// concept of "public custom data" to expose, but KeePassXC writes an (often empty) entry for it.
pub(crate) const HEADER_PUBLIC_CUSTOM_DATA: u8 = 12;

/// Inner header entry denoting the end of the inner header
pub(crate) const INNER_HEADER_END: u8 = 0x00;
/// Inner header entry denoting the UUID of the inner cipher
pub(crate) const INNER_HEADER_RANDOM_STREAM_ID: u8 = 0x01;
/// Inner header entry denoting the key of the inner cipher
pub(crate) const INNER_HEADER_RANDOM_STREAM_KEY: u8 = 0x02;
/// Inner header entry denoting a binary attachment
pub(crate) const INNER_HEADER_BINARY_ATTACHMENTS: u8 = 0x03;

struct KDBX4OuterHeader {
    minor_version: u16,
    outer_cipher_config: OuterCipherConfig,
    compression_config: CompressionConfig,
    master_seed: Vec<u8>,
    outer_iv: Vec<u8>,
    kdf_config: KdfConfig,
    kdf_seed: Vec<u8>,
}

struct KDBX4InnerHeader {
    inner_cipher_config: InnerCipherConfig,
    inner_random_stream_key: Vec<u8>,
}

#[cfg(test)]
mod kdbx4_tests {
    use crate::{
        config::{CompressionConfig, DatabaseConfig, InnerCipherConfig, KdfConfig, OuterCipherConfig},
        db::{fields, Database},
        format::{kdbx4::parse::parse, DatabaseVersion, KDBX4_CURRENT_MINOR_VERSION},
        key::DatabaseKey,
    };

    #[cfg(feature = "save_kdbx4")]
    fn roundtrip_with_config(config: DatabaseConfig) {
        use crate::format::kdbx4::dump::dump;

        let mut db = Database::with_config(config);

        {
            let mut root = db.root_mut();
            let mut entry = root.create_entry();
            entry.set_unprotected(fields::TITLE, "Demo Entry");
            entry.set_protected(fields::PASSWORD, "secret");
            root.create_entry();
            root.create_entry();
        }

        let db_key = DatabaseKey::new().with_password("a reasonably strong passphrase");

        let mut encrypted = Vec::new();
        dump(&db, &db_key, &mut encrypted).unwrap();

        let decrypted = parse(&encrypted, &db_key.get_key_elements().unwrap(), &|| false).unwrap();

        assert_eq!(decrypted.iter_all_entries().count(), 3);

        let title_match = decrypted
            .iter_all_entries()
            .find(|e| e.get_str(fields::TITLE) == Some("Demo Entry"))
            .expect("entry with title survived round trip");
        assert_eq!(title_match.get_str(fields::PASSWORD), Some("secret"));
    }

    #[test]
    #[cfg(feature = "save_kdbx4")]
    fn test_config_matrix() {
        let outer_cipher_configs = [OuterCipherConfig::AES256, OuterCipherConfig::ChaCha20];
        let compression_configs = [CompressionConfig::None, CompressionConfig::GZip];
        let inner_cipher_configs = [
            InnerCipherConfig::Plain,
            InnerCipherConfig::Salsa20,
            InnerCipherConfig::ChaCha20,
        ];
        let kdf_configs = [
            KdfConfig::Aes { rounds: 10 },
            KdfConfig::Argon2 {
                iterations: 10,
                memory: 64 * 1024,
                parallelism: 2,
                version: argon2::Version::Version13,
            },
            KdfConfig::Argon2id {
                iterations: 10,
                memory: 64 * 1024,
                parallelism: 2,
                version: argon2::Version::Version13,
            },
        ];

        for outer_cipher_config in &outer_cipher_configs {
            for compression_config in &compression_configs {
                for inner_cipher_config in &inner_cipher_configs {
                    for kdf_config in &kdf_configs {
                        roundtrip_with_config(DatabaseConfig {
                            version: DatabaseVersion::KDB4(KDBX4_CURRENT_MINOR_VERSION),
                            outer_cipher_config: outer_cipher_config.clone(),
                            compression_config: compression_config.clone(),
                            inner_cipher_config: inner_cipher_config.clone(),
                            kdf_config: kdf_config.clone(),
                        });
                    }
                }
            }
        }
    }

    #[test]
    #[cfg(feature = "save_kdbx4")]
    fn header_attachments_roundtrip() {
        use crate::format::kdbx4::dump::dump;

        let mut db = Database::new();

        {
            let mut root = db.root_mut();
            let mut entry = root.create_entry();
            entry.set_unprotected(fields::TITLE, "Demo entry");
            entry.set_protected(fields::PASSWORD, "secret");

            let mut attachment1 = entry.add_attachment();
            attachment1.name = "hello.txt".to_string();
            attachment1.set_data(b"Hello, World!".to_vec());

            let mut attachment2 = entry.add_attachment();
            attachment2.name = "image.png".to_string();
            attachment2.set_data(vec![0x89, 0x50, 0x4E, 0x47]);
        }

        let db_key = DatabaseKey::new().with_password("test");

        let mut encrypted = Vec::new();
        dump(&db, &db_key, &mut encrypted).unwrap();

        let decrypted = parse(&encrypted, &db_key.get_key_elements().unwrap(), &|| false).unwrap();

        let entry = decrypted
            .iter_all_entries()
            .find(|e| e.get_str(fields::TITLE) == Some("Demo entry"))
            .expect("entry survived round trip");

        let mut names: Vec<_> = entry.attachments().map(|a| a.name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["hello.txt", "image.png"]);

        for attachment in entry.attachments() {
            match attachment.name.as_str() {
                "hello.txt" => assert_eq!(attachment.data(), &b"Hello, World!"[..]),
                "image.png" => assert_eq!(attachment.data(), &[0x89, 0x50, 0x4E, 0x47][..]),
                other => panic!("unexpected attachment name {other}"),
            }
        }
    }
}
