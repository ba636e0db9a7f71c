//! # framecrypt-crypto
//!
//! Schluesselverwaltung und Frame-Verschluesselung fuer framecrypt.
//!
//! ## Module
//! - `e2e` - Key-Ring pro Teilnehmer, Key-Ratchet, Frame-Cipher (AES-GCM / AES-CBC)
//! - `types` - Gemeinsame Typen (SecretBytes, Algorithm, EncryptedFrame)
//! - `error` - Fehlertypen

pub mod e2e;
pub mod error;
pub mod types;

// Bequeme Re-Exports
pub use error::{CryptoError, CryptoResult};
pub use types::{Algorithm, EncryptedFrame, SecretBytes};

pub use e2e::{
    decrypt_frame, decrypt_frame_bytes, encrypt_frame, hkdf_derive, ratchet_key_material,
    AesFrameCipher, FrameCipher, KeyManager, KeyManagerOptions,
};
