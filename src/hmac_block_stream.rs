//! The HMAC-authenticated block stream used to wrap the KDBX4 payload (and, on write, the
//! decrypted body that gets compressed/encrypted underneath it).

use byteorder::{ByteOrder, LittleEndian};
use cipher::generic_array::{typenum::U64, GenericArray};
use hex_literal::hex;
use thiserror::Error;

use crate::crypt::CryptographyError;

pub const HMAC_KEY_END: [u8; 1] = hex!("01");

#[derive(Debug, Error)]
pub enum BlockStreamError {
    #[error("HMAC mismatch on block {block_index}")]
    BlockHashMismatch { block_index: u64 },

    #[error("Block {expected} was not in the expected position (found index {found})")]
    BlockIndexMismatch { expected: u64, found: u64 },

    #[error(transparent)]
    Cryptography(#[from] CryptographyError),
}

/// Read from a HMAC block stream into a raw buffer
pub(crate) fn read_hmac_block_stream(
    data: &[u8],
    key: &GenericArray<u8, U64>,
) -> Result<Vec<u8>, BlockStreamError> {
    // keepassxc src/streams/HmacBlockStream.cpp

    let mut out = Vec::new();

    let mut pos = 0;
    let mut block_index: u64 = 0;

    while pos < data.len() {
        let hmac = &data[pos..(pos + 32)];
        let size_bytes = &data[(pos + 32)..(pos + 36)];
        let size = LittleEndian::read_u32(size_bytes) as usize;
        let block = &data[(pos + 36)..(pos + 36 + size)];

        let hmac_block_key = get_hmac_block_key(block_index, key)?;
        let mut block_index_buf = [0u8; 8];
        LittleEndian::write_u64(&mut block_index_buf, block_index);

        if hmac
            != crate::crypt::calculate_hmac(&[&block_index_buf, size_bytes, block], &hmac_block_key)?
                .as_slice()
        {
            return Err(BlockStreamError::BlockHashMismatch { block_index });
        }

        pos += 36 + size;
        block_index += 1;

        if size == 0 {
            break;
        }

        out.extend_from_slice(block);
    }

    Ok(out)
}

#[cfg(feature = "save_kdbx4")]
/// Write a raw buffer as a HMAC block stream
pub(crate) fn write_hmac_block_stream(
    data: &[u8],
    key: &GenericArray<u8, U64>,
) -> Result<Vec<u8>, CryptographyError> {
    let mut out = Vec::new();

    let mut pos = 0;
    let mut block_index = 0;

    while pos < data.len() {
        let size = data.len() - pos;
        let block = &data[pos..(pos + size)];

        let mut size_bytes = vec![0; 4];
        LittleEndian::write_u32(&mut size_bytes, size as u32);

        let hmac_block_key = get_hmac_block_key(block_index, key)?;
        let mut block_index_buf = [0u8; 8];
        LittleEndian::write_u64(&mut block_index_buf, block_index);

        let hmac = crate::crypt::calculate_hmac(&[&block_index_buf, &size_bytes, block], &hmac_block_key)?;

        pos += size;
        block_index += 1;

        out.extend_from_slice(&hmac);
        out.extend_from_slice(&size_bytes);
        out.extend_from_slice(block);
    }

    // the end of the HMAC block stream is an empty block with a valid HMAC
    let hmac_block_key = get_hmac_block_key(block_index, key)?;
    let mut block_index_buf = [0u8; 8];
    LittleEndian::write_u64(&mut block_index_buf, block_index);

    let size_bytes = vec![0; 4];
    let hmac = crate::crypt::calculate_hmac(&[&block_index_buf, &size_bytes, &[]], &hmac_block_key)?;

    out.extend_from_slice(&hmac);
    out.extend_from_slice(&size_bytes);

    Ok(out)
}

pub(crate) fn get_hmac_block_key(
    block_index: u64,
    key: &GenericArray<u8, U64>,
) -> Result<GenericArray<u8, U64>, CryptographyError> {
    let mut buf = [0u8; 8];
    LittleEndian::write_u64(&mut buf, block_index);
    crate::crypt::calculate_sha512(&[&buf, key])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_write_read() {
        #[cfg(feature = "save_kdbx4")]
        {
            let key: GenericArray<u8, U64> = GenericArray::clone_from_slice(&[0x42u8; 64]);
            let payload = b"a reasonably sized payload to split across HMAC blocks".to_vec();

            let stream = write_hmac_block_stream(&payload, &key).unwrap();
            let recovered = read_hmac_block_stream(&stream, &key).unwrap();

            assert_eq!(recovered, payload);
        }
    }
}
