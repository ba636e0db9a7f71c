//! Gemeinsame Identifikationstypen fuer framecrypt
//!
//! Beide ID-Arten verwenden das Newtype-Pattern um Verwechslungen zwischen
//! KeyManager- und FrameCryptor-IDs zur Compilezeit auszuschliessen.
//! Die IDs sind opake Strings: sie werden nur verglichen, nie geparst.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::FrameCryptorError;

/// Eindeutige KeyManager-ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyManagerId(String);

impl KeyManagerId {
    /// Erstellt eine neue zufaellige KeyManagerId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for KeyManagerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for KeyManagerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for KeyManagerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Eindeutige FrameCryptor-ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameCryptorId(String);

impl FrameCryptorId {
    /// Erstellt eine neue zufaellige FrameCryptorId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FrameCryptorId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for FrameCryptorId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for FrameCryptorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Richtung eines Cryptors: verschluesselt ausgehende oder entschluesselt
/// eingehende Frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Sender,
    Receiver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sender => "sender",
            Self::Receiver => "receiver",
        }
    }
}

impl FromStr for Role {
    type Err = FrameCryptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sender" => Ok(Self::Sender),
            "receiver" => Ok(Self::Receiver),
            other => Err(FrameCryptorError::InvalidRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_manager_id_eindeutig() {
        let a = KeyManagerId::new();
        let b = KeyManagerId::new();
        assert_ne!(a, b, "Zwei neue KeyManagerIds muessen verschieden sein");
    }

    #[test]
    fn frame_cryptor_id_ist_opak() {
        let id = FrameCryptorId::from("kein-uuid");
        assert_eq!(id.as_str(), "kein-uuid");
        assert_eq!(id.to_string(), "kein-uuid");
    }

    #[test]
    fn rolle_parsen() {
        assert_eq!("sender".parse::<Role>().unwrap(), Role::Sender);
        assert_eq!("receiver".parse::<Role>().unwrap(), Role::Receiver);
        let err = "Sender".parse::<Role>().unwrap_err();
        assert!(matches!(err, FrameCryptorError::InvalidRole(ref r) if r == "Sender"));
    }

    #[test]
    fn ids_sind_serde_kompatibel() {
        let id = KeyManagerId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let id2: KeyManagerId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, id2);
    }
}
