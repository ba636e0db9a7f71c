//! Fehler der Methoden-Schnittstelle

use framecrypt_core::FrameCryptorError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fehlercode fuer fehlende oder nicht lesbare Argumente
pub const BAD_ARGUMENTS: &str = "Bad Arguments";

/// Fehlerantwort an den Host: operationsspezifischer Code + Meldung
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct MethodError {
    pub code: String,
    pub message: String,
}

impl MethodError {
    pub fn neu(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Aufruf ohne Argument-Map
    pub fn null_argumente() -> Self {
        Self::neu(BAD_ARGUMENTS, "Null arguments received")
    }

    /// Code `<methode>Failed`
    pub fn fuer_methode(methode: &str, fehler: &FrameCryptorError) -> Self {
        Self::neu(format!("{methode}Failed"), fehler.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_aus_methodenname() {
        let err = MethodError::fuer_methode(
            "keyManagerSetKey",
            &FrameCryptorError::key_manager_unbekannt("km-1"),
        );
        assert_eq!(err.code, "keyManagerSetKeyFailed");
        assert!(err.message.contains("km-1"));
    }

    #[test]
    fn serialisierung() {
        let json = serde_json::to_value(MethodError::null_argumente()).unwrap();
        assert_eq!(json["code"], "Bad Arguments");
        assert_eq!(json["message"], "Null arguments received");
    }
}
