//! AES-128-CBC with PKCS#7 padding
//!
//! Callers authenticate ciphertext before handing it to [`decrypt`].

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Block};
use zeroize::Zeroizing;

use super::keys::{IV_LEN, SUBKEY_LEN};
use crate::error::{EnvelopeError, EnvelopeResult};

/// AES block size
pub const BLOCK_LEN: usize = 16;

#[inline]
fn xor_block(block: &mut [u8; BLOCK_LEN], other: &[u8; BLOCK_LEN]) {
    block.iter_mut().zip(other.iter()).for_each(|(a, b)| *a ^= b);
}

/// Length of the ciphertext produced for a plaintext of `len` bytes
pub fn padded_len(len: usize) -> usize {
    (len / BLOCK_LEN + 1) * BLOCK_LEN
}

/// Encrypt with PKCS#7 padding. Output is always a non-zero multiple of 16.
pub fn encrypt(key: &[u8; SUBKEY_LEN], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Vec<u8> {
    let cipher = Aes128::new(&(*key).into());
    let mut output = Vec::with_capacity(padded_len(plaintext.len()));
    let mut prev = *iv;

    let full_blocks = plaintext.len() / BLOCK_LEN;
    let mut block = Zeroizing::new([0u8; BLOCK_LEN]);

    for i in 0..=full_blocks {
        let start = i * BLOCK_LEN;
        if i < full_blocks {
            block.copy_from_slice(&plaintext[start..start + BLOCK_LEN]);
        } else {
            // Final block carries the padding (a whole block when aligned)
            let tail = &plaintext[start..];
            let pad = (BLOCK_LEN - tail.len()) as u8;
            block[..tail.len()].copy_from_slice(tail);
            block[tail.len()..].fill(pad);
        }

        xor_block(&mut block, &prev);
        let mut aes_block = Block::from(*block);
        cipher.encrypt_block(&mut aes_block);
        prev.copy_from_slice(aes_block.as_slice());
        output.extend_from_slice(&prev);
    }

    output
}

/// Decrypt and strip PKCS#7 padding
pub fn decrypt(
    key: &[u8; SUBKEY_LEN],
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
) -> EnvelopeResult<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(EnvelopeError::invalid_token(
            "ciphertext is not a whole number of blocks",
        ));
    }

    let cipher = Aes128::new(&(*key).into());
    let mut plaintext = Zeroizing::new(Vec::with_capacity(ciphertext.len()));
    let mut prev = *iv;

    for chunk in ciphertext.chunks_exact(BLOCK_LEN) {
        let mut current = [0u8; BLOCK_LEN];
        current.copy_from_slice(chunk);

        let mut aes_block = Block::from(current);
        cipher.decrypt_block(&mut aes_block);

        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(aes_block.as_slice());
        xor_block(&mut block, &prev);
        plaintext.extend_from_slice(&block);

        prev = current;
    }

    let pad = plaintext[plaintext.len() - 1] as usize;
    if pad == 0 || pad > BLOCK_LEN {
        return Err(EnvelopeError::invalid_token("invalid padding"));
    }
    let body_len = plaintext.len() - pad;
    if plaintext[body_len..].iter().any(|&b| b as usize != pad) {
        return Err(EnvelopeError::invalid_token("invalid padding"));
    }

    plaintext.truncate(body_len);
    Ok(std::mem::take(&mut *plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 16] = [
        0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f,
        0x3c,
    ];
    const IV: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f,
    ];

    #[test]
    fn test_nist_sp800_38a_first_block() {
        // F.2.1 CBC-AES128.Encrypt, block #1
        let plaintext = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();
        let ciphertext = encrypt(&KEY, &IV, &plaintext);

        assert_eq!(
            hex::encode(&ciphertext[..16]),
            "7649abac8119b246cee98e9b12e9197d"
        );
        // Aligned input gains a full padding block
        assert_eq!(ciphertext.len(), 32);
    }

    #[test]
    fn test_roundtrip_various_lengths() {
        for len in [0usize, 1, 15, 16, 17, 31, 32, 100] {
            let plaintext: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let ciphertext = encrypt(&KEY, &IV, &plaintext);

            assert_eq!(ciphertext.len(), padded_len(len));
            assert_eq!(decrypt(&KEY, &IV, &ciphertext).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_misaligned_ciphertext_rejected() {
        assert!(decrypt(&KEY, &IV, &[]).is_err());
        assert!(decrypt(&KEY, &IV, &[0u8; 15]).is_err());
    }

    #[test]
    fn test_bad_padding_rejected() {
        let mut ciphertext = encrypt(&KEY, &IV, b"padding check 123456");
        // Flipping the previous ciphertext block garbles the padding byte
        let n = ciphertext.len();
        ciphertext[n - 17] ^= 0x01;
        assert!(matches!(
            decrypt(&KEY, &IV, &ciphertext),
            Err(EnvelopeError::InvalidToken(_))
        ));
    }
}
