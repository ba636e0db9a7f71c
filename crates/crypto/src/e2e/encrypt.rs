//! Frame-Verschluesselung
//!
//! Verschluesselt einen kodierten Medien-Frame mit dem Schluessel aus dem
//! aktiven Key-Slot.
//!
//! ## Format
//! ```text
//! [ciphertext] [iv] [iv_len(1)]
//! ```
//!
//! ## IV
//! - AES-GCM: 12 zufaellige Bytes, Auth-Tag (16 Bytes) haengt am Ciphertext
//! - AES-CBC: 16 zufaellige Bytes, PKCS#7-Padding

use aes::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyIvInit};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Aes256Gcm, Nonce as GcmNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};
use crate::types::{Algorithm, EncryptedFrame};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

/// Verschluesselt einen Frame
///
/// # Parameter
/// - `algorithm`: AES-GCM oder AES-CBC
/// - `key`: Rohschluessel, 16 Bytes (AES-128) oder 32 Bytes (AES-256)
/// - `plaintext`: Kodierter Frame (Opus, VP8, H264, ...)
pub fn encrypt_frame(
    algorithm: Algorithm,
    key: &[u8],
    plaintext: &[u8],
) -> CryptoResult<EncryptedFrame> {
    let mut iv = vec![0u8; algorithm.iv_len()];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = match algorithm {
        Algorithm::AesGcm => encrypt_aes_gcm(plaintext, key, &iv)?,
        Algorithm::AesCbc => encrypt_aes_cbc(plaintext, key, &iv)?,
    };

    Ok(EncryptedFrame { ciphertext, iv })
}

fn encrypt_aes_gcm(plaintext: &[u8], key_bytes: &[u8], iv: &[u8]) -> CryptoResult<Vec<u8>> {
    let nonce = GcmNonce::from_slice(iv);
    let ergebnis = match key_bytes.len() {
        16 => Aes128Gcm::new_from_slice(key_bytes)
            .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?
            .encrypt(nonce, plaintext),
        32 => Aes256Gcm::new_from_slice(key_bytes)
            .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?
            .encrypt(nonce, plaintext),
        erhalten => return Err(CryptoError::UngueltigeSchluesselLaenge { erhalten }),
    };

    ergebnis.map_err(|e| CryptoError::Verschluesselung(e.to_string()))
}

fn encrypt_aes_cbc(plaintext: &[u8], key_bytes: &[u8], iv: &[u8]) -> CryptoResult<Vec<u8>> {
    match key_bytes.len() {
        16 => Ok(Aes128CbcEnc::new_from_slices(key_bytes, iv)
            .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        32 => Ok(Aes256CbcEnc::new_from_slices(key_bytes, iv)
            .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        erhalten => Err(CryptoError::UngueltigeSchluesselLaenge { erhalten }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
