//! Zustands-Events eines Frame-Cryptors
//!
//! Ein Cryptor meldet nur Zustandswechsel, nie jeden einzelnen Frame.
//! Das Event-Format entspricht dem, was die Host-Anwendung pro Cryptor
//! auf ihrem Event-Stream erwartet:
//!
//! ```text
//! { "event": "frameCryptionStateChanged", "participantId": "...", "state": "missingKey" }
//! ```

use serde::{Deserialize, Serialize};

/// Name des einzigen Event-Typs auf dem Cryptor-Stream
pub const EVENT_STATE_CHANGED: &str = "frameCryptionStateChanged";

/// Fehler-/Gesundheitszustand eines Frame-Cryptors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrameCryptionState {
    #[default]
    New,
    Ok,
    EncryptionFailed,
    DecryptionFailed,
    MissingKey,
    InternalError,
}

impl FrameCryptionState {
    /// Name des Zustands wie er auf dem Event-Stream erscheint
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Ok => "ok",
            Self::EncryptionFailed => "encryptionFailed",
            Self::DecryptionFailed => "decryptionFailed",
            Self::MissingKey => "missingKey",
            Self::InternalError => "internalError",
        }
    }

    /// Gibt true zurueck fuer alle Fehlerzustaende
    pub fn ist_fehler(&self) -> bool {
        !matches!(self, Self::New | Self::Ok)
    }
}

impl std::fmt::Display for FrameCryptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ein Zustandswechsel, so wie er an den Konsumenten geliefert wird
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameCryptorEvent {
    pub event: String,
    pub participant_id: String,
    pub state: FrameCryptionState,
}

impl FrameCryptorEvent {
    /// Erstellt ein `frameCryptionStateChanged`-Event
    pub fn state_changed(participant_id: impl Into<String>, state: FrameCryptionState) -> Self {
        Self {
            event: EVENT_STATE_CHANGED.to_string(),
            participant_id: participant_id.into(),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zustand_namen() {
        assert_eq!(FrameCryptionState::New.as_str(), "new");
        assert_eq!(FrameCryptionState::DecryptionFailed.as_str(), "decryptionFailed");
        assert_eq!(FrameCryptionState::InternalError.to_string(), "internalError");
        assert_eq!(FrameCryptionState::default(), FrameCryptionState::New);
    }

    #[test]
    fn serde_name_stimmt_mit_as_str_ueberein() {
        for state in [
            FrameCryptionState::New,
            FrameCryptionState::Ok,
            FrameCryptionState::EncryptionFailed,
            FrameCryptionState::DecryptionFailed,
            FrameCryptionState::MissingKey,
            FrameCryptionState::InternalError,
        ] {
            let json = serde_json::to_value(state).unwrap();
            assert_eq!(json, serde_json::Value::String(state.as_str().into()));
        }
    }

    #[test]
    fn event_json_format() {
        let event = FrameCryptorEvent::state_changed("p1", FrameCryptionState::MissingKey);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "event": "frameCryptionStateChanged",
                "participantId": "p1",
                "state": "missingKey",
            })
        );
    }

    #[test]
    fn fehlerzustaende() {
        assert!(!FrameCryptionState::Ok.ist_fehler());
        assert!(!FrameCryptionState::New.ist_fehler());
        assert!(FrameCryptionState::MissingKey.ist_fehler());
    }
}
