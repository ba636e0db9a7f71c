//! Frame-Cipher-Schnittstelle
//!
//! Der Frame-Cryptor kennt nur dieses Trait. Die Standard-Implementierung
//! ist `AesFrameCipher`; Tests koennen eigene Implementierungen einsetzen
//! um zu pruefen welcher Schluessel verwendet wurde.

use crate::e2e::decrypt::decrypt_frame_bytes;
use crate::e2e::encrypt::encrypt_frame;
use crate::error::CryptoResult;
use crate::types::{Algorithm, SecretBytes};

/// Ver-/Entschluesselt einzelne Frames mit einem gegebenen Schluessel
pub trait FrameCipher: Send + Sync + std::fmt::Debug {
    /// Liefert die fertigen Bytes fuer die Sende-Pipeline
    fn encrypt(&self, algorithm: Algorithm, key: &SecretBytes, frame: &[u8]) -> CryptoResult<Vec<u8>>;

    fn decrypt(&self, algorithm: Algorithm, key: &SecretBytes, frame: &[u8]) -> CryptoResult<Vec<u8>>;
}

/// AES-GCM / AES-CBC mit IV-Trailer
#[derive(Debug, Default, Clone, Copy)]
pub struct AesFrameCipher;

impl FrameCipher for AesFrameCipher {
    fn encrypt(&self, algorithm: Algorithm, key: &SecretBytes, frame: &[u8]) -> CryptoResult<Vec<u8>> {
        Ok(encrypt_frame(algorithm, key.as_bytes(), frame)?.to_bytes())
    }

    fn decrypt(&self, algorithm: Algorithm, key: &SecretBytes, frame: &[u8]) -> CryptoResult<Vec<u8>> {
        decrypt_frame_bytes(algorithm, key.as_bytes(), frame)
    }
}
