//! Fehlertypen fuer das Kryptografie-Subsystem

use framecrypt_core::FrameCryptorError;
use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Entschluesselung fehlgeschlagen: {0}")]
    Entschluesselung(String),

    #[error("Ungueltige IV-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeIv { erwartet: usize, erhalten: usize },

    #[error("Ungueltige Schluessel-Laenge: erwartet 16 oder 32, erhalten {erhalten}")]
    UngueltigeSchluesselLaenge { erhalten: usize },

    #[error("Ungueltige Daten: {0}")]
    UngueltigeDaten(String),

    #[error("Slot {slot} ausserhalb des Key-Rings (Kapazitaet {kapazitaet})")]
    UngueltigerSlot { slot: usize, kapazitaet: usize },

    #[error("Kein Schluessel fuer Teilnehmer {participant_id} in Slot {slot}")]
    KeinSchluessel { participant_id: String, slot: usize },

    #[error("KeyManager wurde bereits entsorgt")]
    Entsorgt,

    #[error("Key Derivation fehlgeschlagen: {0}")]
    KeyDerivation(String),
}

impl CryptoError {
    /// Fehler die nicht am Frame liegen, sondern an Schluessel oder Cipher-Kontext
    ///
    /// Der Frame-Cryptor meldet diese als `InternalError` statt als
    /// Ver-/Entschluesselungsfehler.
    pub fn ist_intern(&self) -> bool {
        matches!(
            self,
            Self::UngueltigeSchluesselLaenge { .. } | Self::KeyDerivation(_) | Self::Entsorgt
        )
    }
}

impl From<CryptoError> for FrameCryptorError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::UngueltigerSlot { .. } | CryptoError::UngueltigeDaten(_) => {
                FrameCryptorError::InvalidArgument(err.to_string())
            }
            CryptoError::KeinSchluessel {
                participant_id,
                slot,
            } => FrameCryptorError::MissingKey {
                participant_id,
                slot,
            },
            other => FrameCryptorError::Crypto(other.to_string()),
        }
    }
}

pub type CryptoResult<T> = Result<T, CryptoError>;
