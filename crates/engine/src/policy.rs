//! Frame-Policy
//!
//! Legt fest was mit einem Frame passiert, der nicht ver- oder
//! entschluesselt werden kann.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Aktion fuer einen nicht transformierten Frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameAction {
    /// Frame unveraendert weiterreichen
    PassThrough,
    /// Frame verwerfen
    Drop,
}

/// Ergebnis eines Transforms fuer die Media-Pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformResult {
    Forward(Bytes),
    Drop,
}

impl TransformResult {
    pub fn ist_verworfen(&self) -> bool {
        matches!(self, Self::Drop)
    }

    /// Frame-Inhalt falls weitergereicht
    pub fn frame(&self) -> Option<&Bytes> {
        match self {
            Self::Forward(frame) => Some(frame),
            Self::Drop => None,
        }
    }
}

/// Policy eines Frame-Cryptors
///
/// Ein deaktivierter Sender reicht immer durch, dafuer gibt es keinen Schalter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptorPolicy {
    /// Deaktivierter Empfaenger
    pub disabled_receiver: FrameAction,
    /// Kein Schluessel im aktiven Slot
    pub missing_key: FrameAction,
    /// Ver-/Entschluesselung fehlgeschlagen
    pub cipher_failure: FrameAction,
}

impl Default for CryptorPolicy {
    fn default() -> Self {
        Self {
            disabled_receiver: FrameAction::PassThrough,
            missing_key: FrameAction::Drop,
            cipher_failure: FrameAction::Drop,
        }
    }
}
