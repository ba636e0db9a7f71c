//! Frame-Entschluesselung
//!
//! Gegenstueck zu `encrypt`: liest den IV aus dem Trailer und
//! entschluesselt mit dem Schluessel aus dem aktiven Key-Slot.
//! Bei AES-GCM wird dabei der Auth-Tag verifiziert.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Aes256Gcm, Nonce as GcmNonce,
};

use crate::error::{CryptoError, CryptoResult};
use crate::types::{Algorithm, EncryptedFrame};

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Entschluesselt einen Frame
///
/// Der IV muss zur Laenge des Algorithmus passen, sonst wurde der Frame
/// mit einem anderen Algorithmus (oder gar nicht) verschluesselt.
pub fn decrypt_frame(algorithm: Algorithm, key: &[u8], frame: &EncryptedFrame) -> CryptoResult<Vec<u8>> {
    if frame.iv.len() != algorithm.iv_len() {
        return Err(CryptoError::UngueltigeIv {
            erwartet: algorithm.iv_len(),
            erhalten: frame.iv.len(),
        });
    }

    match algorithm {
        Algorithm::AesGcm => decrypt_aes_gcm(&frame.ciphertext, key, &frame.iv),
        Algorithm::AesCbc => decrypt_aes_cbc(&frame.ciphertext, key, &frame.iv),
    }
}

/// Entschluesselt rohe Frame-Bytes (ohne EncryptedFrame-Wrapper)
///
/// So kommen die Frames aus der Empfangs-Pipeline.
pub fn decrypt_frame_bytes(algorithm: Algorithm, key: &[u8], data: &[u8]) -> CryptoResult<Vec<u8>> {
    let frame = EncryptedFrame::from_bytes(data)
        .ok_or_else(|| CryptoError::UngueltigeDaten("Ungueltige Frame-Struktur".to_string()))?;
    decrypt_frame(algorithm, key, &frame)
}

fn decrypt_aes_gcm(ciphertext: &[u8], key_bytes: &[u8], iv: &[u8]) -> CryptoResult<Vec<u8>> {
    let nonce = GcmNonce::from_slice(iv);
    let ergebnis = match key_bytes.len() {
        16 => Aes128Gcm::new_from_slice(key_bytes)
            .map_err(|e| CryptoError::Entschluesselung(e.to_string()))?
            .decrypt(nonce, ciphertext),
        32 => Aes256Gcm::new_from_slice(key_bytes)
            .map_err(|e| CryptoError::Entschluesselung(e.to_string()))?
            .decrypt(nonce, ciphertext),
        erhalten => return Err(CryptoError::UngueltigeSchluesselLaenge { erhalten }),
    };

    ergebnis.map_err(|e| CryptoError::Entschluesselung(e.to_string()))
}

fn decrypt_aes_cbc(ciphertext: &[u8], key_bytes: &[u8], iv: &[u8]) -> CryptoResult<Vec<u8>> {
    let ergebnis = match key_bytes.len() {
        16 => Aes128CbcDec::new_from_slices(key_bytes, iv)
            .map_err(|e| CryptoError::Entschluesselung(e.to_string()))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        32 => Aes256CbcDec::new_from_slices(key_bytes, iv)
            .map_err(|e| CryptoError::Entschluesselung(e.to_string()))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        erhalten => return Err(CryptoError::UngueltigeSchluesselLaenge { erhalten }),
    };

    ergebnis.map_err(|_| CryptoError::Entschluesselung("Ungueltiges Padding".to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::e2e::encrypt::encrypt_frame;

    #[test]
    fn roundtrip_aes_gcm_256() {
        let key = [0x42u8; 32];
        let plaintext = b"Hallo Opus-Audio 1234567890abcdef";

        let frame = encrypt_frame(Algorithm::AesGcm, &key, plaintext).unwrap();
        let decrypted = decrypt_frame(Algorithm::AesGcm, &key, &frame).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn roundtrip_aes_cbc_128_ueber_bytes() {
        let key = [0x17u8; 16];
        let plaintext = b"CBC-Test-Video-Frame";

        let bytes = encrypt_frame(Algorithm::AesCbc, &key, plaintext)
            .unwrap()
            .to_bytes();
        let decrypted = decrypt_frame_bytes(Algorithm::AesCbc, &key, &bytes).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn falscher_schluessel_schlaegt_fehl() {
        let frame = encrypt_frame(Algorithm::AesGcm, &[1u8; 16], b"Geheime Audio-Daten").unwrap();
        let result = decrypt_frame(Algorithm::AesGcm, &[2u8; 16], &frame);

        assert!(matches!(result, Err(CryptoError::Entschluesselung(_))));
    }

    #[test]
    fn manipulierter_ciphertext_schlaegt_fehl() {
        let key = [9u8; 32];
        let mut frame = encrypt_frame(Algorithm::AesGcm, &key, b"Original-Audio").unwrap();
        // Ciphertext manipulieren
        if let Some(byte) = frame.ciphertext.first_mut() {
            *byte ^= 0xFF;
        }

        assert!(decrypt_frame(Algorithm::AesGcm, &key, &frame).is_err());
    }

    #[test]
    fn algorithmus_mismatch_wird_am_iv_erkannt() {
        let key = [5u8; 16];
        let frame = encrypt_frame(Algorithm::AesCbc, &key, b"frame").unwrap();

        let result = decrypt_frame(Algorithm::AesGcm, &key, &frame);
        assert!(matches!(
            result,
            Err(CryptoError::UngueltigeIv {
                erwartet: 12,
                erhalten: 16
            })
        ));
    }

    #[test]
    fn unverschluesselter_frame_schlaegt_fehl() {
        let result = decrypt_frame_bytes(Algorithm::AesGcm, &[0u8; 16], &[0u8; 5]);
        assert!(result.is_err());
    }

    #[test]
    fn leerer_frame_roundtrip() {
        let key = [8u8; 16];
        let frame = encrypt_frame(Algorithm::AesGcm, &key, b"").unwrap();
        let decrypted = decrypt_frame(Algorithm::AesGcm, &key, &frame).unwrap();
        assert!(decrypted.is_empty());
    }
}
