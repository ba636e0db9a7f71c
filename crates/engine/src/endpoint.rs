//! Schnittstelle zur Media-Pipeline
//!
//! Die Registry besitzt weder Peer-Connections noch Sender/Empfaenger.
//! Sie loest nur eine Referenz (Peer-Connection-ID + Sender-/Empfaenger-ID)
//! ueber einen `EndpointResolver` auf und haengt dort einen
//! `FrameTransformer` ein.

use bytes::Bytes;
use dashmap::DashMap;
use framecrypt_core::{FrameCryptorId, Role};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::cryptor::FrameTransformer;
use crate::policy::TransformResult;

/// Referenz auf einen Sender oder Empfaenger einer Peer-Connection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointRef {
    pub peer_connection_id: String,
    /// RTP-Sender- bzw. RTP-Receiver-ID
    pub endpoint_id: String,
}

impl EndpointRef {
    pub fn neu(peer_connection_id: impl Into<String>, endpoint_id: impl Into<String>) -> Self {
        Self {
            peer_connection_id: peer_connection_id.into(),
            endpoint_id: endpoint_id.into(),
        }
    }
}

impl std::fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.peer_connection_id, self.endpoint_id)
    }
}

/// Ein Sender oder Empfaenger, der Frames durch einen Transformer schickt
///
/// Ein Endpunkt haelt hoechstens einen Transformer. Ein neuer Cryptor auf
/// demselben Endpunkt ersetzt den alten.
pub trait MediaEndpoint: Send + Sync {
    /// Setzt den Frame-Transformer und ersetzt einen vorhandenen
    fn set_frame_transformer(&self, transformer: FrameTransformer);

    /// Entfernt den Transformer, aber nur wenn er zu `frame_cryptor_id` gehoert
    ///
    /// Gibt `true` zurueck wenn etwas entfernt wurde.
    fn remove_frame_transformer(&self, frame_cryptor_id: &FrameCryptorId) -> bool;
}

/// Loest Endpunkt-Referenzen auf
pub trait EndpointResolver: Send + Sync {
    fn resolve(&self, endpoint: &EndpointRef, role: Role) -> Option<Arc<dyn MediaEndpoint>>;
}

// ---------------------------------------------------------------------------
// EndpointTable
// ---------------------------------------------------------------------------

/// Resolver ueber eine Tabelle registrierter Endpunkte
///
/// Sender und Empfaenger liegen in getrennten Tabellen, damit eine
/// Sender-ID nie als Empfaenger aufgeloest wird.
#[derive(Default)]
pub struct EndpointTable {
    senders: DashMap<EndpointRef, Arc<dyn MediaEndpoint>>,
    receivers: DashMap<EndpointRef, Arc<dyn MediaEndpoint>>,
}

impl EndpointTable {
    pub fn neu() -> Self {
        Self::default()
    }

    pub fn registrieren(&self, endpoint: EndpointRef, role: Role, media: Arc<dyn MediaEndpoint>) {
        tracing::debug!(endpoint = %endpoint, role = %role, "Media-Endpunkt registriert");
        self.tabelle(role).insert(endpoint, media);
    }

    pub fn entfernen(&self, endpoint: &EndpointRef, role: Role) -> bool {
        self.tabelle(role).remove(endpoint).is_some()
    }

    pub fn anzahl(&self) -> usize {
        self.senders.len() + self.receivers.len()
    }

    fn tabelle(&self, role: Role) -> &DashMap<EndpointRef, Arc<dyn MediaEndpoint>> {
        match role {
            Role::Sender => &self.senders,
            Role::Receiver => &self.receivers,
        }
    }
}

impl EndpointResolver for EndpointTable {
    fn resolve(&self, endpoint: &EndpointRef, role: Role) -> Option<Arc<dyn MediaEndpoint>> {
        self.tabelle(role).get(endpoint).map(|e| Arc::clone(&*e))
    }
}

// ---------------------------------------------------------------------------
// PipelineEndpoint
// ---------------------------------------------------------------------------

/// In-Process-Endpunkt: haelt den aktuellen Transformer und schickt
/// Frames hindurch
///
/// Der Transformer wird vor dem Aufruf aus dem Mutex geklont, damit ein
/// paralleles `set_frame_transformer` nie auf einen laufenden Frame wartet.
#[derive(Default)]
pub struct PipelineEndpoint {
    transformer: Mutex<Option<FrameTransformer>>,
}

impl PipelineEndpoint {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Schickt einen Frame durch den Transformer (ohne Transformer: unveraendert)
    pub fn frame_verarbeiten(&self, frame: Bytes) -> TransformResult {
        let transformer = self.transformer.lock().clone();
        match transformer {
            Some(t) => t.transform(frame),
            None => TransformResult::Forward(frame),
        }
    }

    pub fn hat_transformer(&self) -> bool {
        self.transformer.lock().is_some()
    }
}

impl MediaEndpoint for PipelineEndpoint {
    fn set_frame_transformer(&self, transformer: FrameTransformer) {
        *self.transformer.lock() = Some(transformer);
    }

    fn remove_frame_transformer(&self, frame_cryptor_id: &FrameCryptorId) -> bool {
        let mut slot = self.transformer.lock();
        if slot.as_ref().is_some_and(|t| t.frame_cryptor_id() == frame_cryptor_id) {
            *slot = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabelle_trennt_sender_und_empfaenger() {
        let tabelle = EndpointTable::neu();
        let endpunkt = EndpointRef::neu("pc-1", "sender-1");
        tabelle.registrieren(endpunkt.clone(), Role::Sender, Arc::new(PipelineEndpoint::neu()));

        assert!(tabelle.resolve(&endpunkt, Role::Sender).is_some());
        assert!(tabelle.resolve(&endpunkt, Role::Receiver).is_none());
        assert!(tabelle
            .resolve(&EndpointRef::neu("pc-2", "sender-1"), Role::Sender)
            .is_none());

        assert!(tabelle.entfernen(&endpunkt, Role::Sender));
        assert_eq!(tabelle.anzahl(), 0);
    }

    #[test]
    fn pipeline_ohne_transformer_reicht_durch() {
        let endpunkt = PipelineEndpoint::neu();
        assert!(!endpunkt.hat_transformer());
        assert_eq!(
            endpunkt.frame_verarbeiten(Bytes::from_static(b"roh")),
            TransformResult::Forward(Bytes::from_static(b"roh"))
        );
    }

    #[test]
    fn endpoint_ref_anzeige() {
        assert_eq!(EndpointRef::neu("pc", "rx").to_string(), "pc/rx");
    }
}
