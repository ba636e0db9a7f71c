//! Fehlertypen fuer framecrypt
//!
//! Zentraler Fehler-Enum der Control-Schnittstelle. Laufzeitfehler der
//! Frame-Verarbeitung (fehlender Schluessel, Entschluesselung fehlgeschlagen)
//! tauchen hier nicht auf: sie werden asynchron als `FrameCryptionState`
//! ueber den Observer gemeldet.

use thiserror::Error;

/// Globaler Result-Alias fuer framecrypt
pub type Result<T> = std::result::Result<T, FrameCryptorError>;

/// Alle Fehler, die ein Control-Aufruf synchron zurueckgeben kann
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameCryptorError {
    // --- Lookup ---
    /// Unbekannte ID bei einer ID-basierten Operation
    #[error("{kind} nicht gefunden: {id}")]
    NotFound { kind: &'static str, id: String },

    // --- Validierung beim Erstellen eines Cryptors ---
    #[error("KeyManager nicht gefunden: {0}")]
    KeyManagerNotFound(String),

    #[error("Media-Endpunkt nicht gefunden: {0}")]
    EndpointNotFound(String),

    #[error("Ungueltige Rolle '{0}': erwartet 'sender' oder 'receiver'")]
    InvalidRole(String),

    // --- Parameter ---
    #[error("Ungueltiges Argument: {0}")]
    InvalidArgument(String),

    /// Kein Schluessel im angefragten Slot (nur bei expliziten Key-Operationen)
    #[error("Kein Schluessel fuer Teilnehmer {participant_id} in Slot {slot}")]
    MissingKey { participant_id: String, slot: usize },

    // --- Krypto & Intern ---
    #[error("Kryptografie-Fehler: {0}")]
    Crypto(String),

    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl FrameCryptorError {
    /// Unbekannte KeyManager-ID
    pub fn key_manager_unbekannt(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "KeyManager",
            id: id.into(),
        }
    }

    /// Unbekannte FrameCryptor-ID
    pub fn frame_cryptor_unbekannt(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "FrameCryptor",
            id: id.into(),
        }
    }

    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn der Fehler auf eine unbekannte ID zurueckgeht
    pub fn ist_nicht_gefunden(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::KeyManagerNotFound(_) | Self::EndpointNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = FrameCryptorError::frame_cryptor_unbekannt("abc");
        assert_eq!(e.to_string(), "FrameCryptor nicht gefunden: abc");
    }

    #[test]
    fn ungueltige_rolle_nennt_wert() {
        let e = FrameCryptorError::InvalidRole("observer".into());
        assert!(e.to_string().contains("'observer'"));
    }

    #[test]
    fn nicht_gefunden_erkennung() {
        assert!(FrameCryptorError::key_manager_unbekannt("x").ist_nicht_gefunden());
        assert!(FrameCryptorError::EndpointNotFound("pc/s".into()).ist_nicht_gefunden());
        assert!(!FrameCryptorError::InvalidArgument("slot".into()).ist_nicht_gefunden());
    }
}
