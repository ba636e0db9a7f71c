//! Methoden-Dispatcher – Routet Host-Aufrufe an die Registry
//!
//! Jeder Aufruf besteht aus einem Methodennamen und einer JSON-Map mit
//! Argumenten. Die Antwort ist eine JSON-Map oder ein `MethodError` mit
//! dem Code `<methode>Failed`.
//!
//! Unbekannte Methoden ergeben `None`, damit der Host weitere Handler
//! anfragen kann.

use framecrypt_core::{FrameCryptorError, FrameCryptorId, KeyManagerId, Role};
use framecrypt_crypto::Algorithm;
use framecrypt_engine::{EndpointRef, FrameCryptorRegistry};
use serde_json::{json, Value};

use crate::params::Params;

pub use crate::error::MethodError;

// ---------------------------------------------------------------------------
// Methodennamen
// ---------------------------------------------------------------------------

pub const CREATE_KEY_MANAGER: &str = "frameCryptorFactoryCreateKeyManager";
pub const KEY_MANAGER_SET_KEY: &str = "keyManagerSetKey";
pub const KEY_MANAGER_SET_KEYS: &str = "keyManagerSetKeys";
pub const KEY_MANAGER_GET_KEYS: &str = "keyManagerGetKeys";
pub const KEY_MANAGER_RATCHET_KEY: &str = "keyManagerRatchetKey";
pub const KEY_MANAGER_DISPOSE: &str = "keyManagerDispose";
pub const CREATE_FRAME_CRYPTOR: &str = "frameCryptorFactoryCreateFrameCryptor";
pub const FRAME_CRYPTOR_SET_KEY_INDEX: &str = "frameCryptorSetKeyIndex";
pub const FRAME_CRYPTOR_GET_KEY_INDEX: &str = "frameCryptorGetKeyIndex";
pub const FRAME_CRYPTOR_SET_ENABLED: &str = "frameCryptorSetEnabled";
pub const FRAME_CRYPTOR_GET_ENABLED: &str = "frameCryptorGetEnabled";
pub const FRAME_CRYPTOR_DISPOSE: &str = "frameCryptorDispose";

type Handler = fn(&MethodDispatcher, Params<'_>) -> Result<Value, FrameCryptorError>;

/// Zentraler Methoden-Dispatcher
#[derive(Debug, Clone)]
pub struct MethodDispatcher {
    registry: FrameCryptorRegistry,
}

impl MethodDispatcher {
    pub fn neu(registry: FrameCryptorRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &FrameCryptorRegistry {
        &self.registry
    }

    /// Verarbeitet einen Aufruf
    ///
    /// Gibt `None` zurueck wenn die Methode nicht zu framecrypt gehoert.
    pub fn handle(&self, methode: &str, argumente: &Value) -> Option<Result<Value, MethodError>> {
        let handler: Handler = match methode {
            CREATE_KEY_MANAGER => Self::create_key_manager,
            KEY_MANAGER_SET_KEY => Self::key_manager_set_key,
            KEY_MANAGER_SET_KEYS => Self::key_manager_set_keys,
            KEY_MANAGER_GET_KEYS => Self::key_manager_get_keys,
            KEY_MANAGER_RATCHET_KEY => Self::key_manager_ratchet_key,
            KEY_MANAGER_DISPOSE => Self::key_manager_dispose,
            CREATE_FRAME_CRYPTOR => Self::create_frame_cryptor,
            FRAME_CRYPTOR_SET_KEY_INDEX => Self::frame_cryptor_set_key_index,
            FRAME_CRYPTOR_GET_KEY_INDEX => Self::frame_cryptor_get_key_index,
            FRAME_CRYPTOR_SET_ENABLED => Self::frame_cryptor_set_enabled,
            FRAME_CRYPTOR_GET_ENABLED => Self::frame_cryptor_get_enabled,
            FRAME_CRYPTOR_DISPOSE => Self::frame_cryptor_dispose,
            _ => return None,
        };

        let Some(params) = Params::aus_value(argumente) else {
            tracing::warn!(methode, "Aufruf ohne Argument-Map");
            return Some(Err(MethodError::null_argumente()));
        };

        let antwort = handler(self, params).map_err(|fehler| {
            let err = MethodError::fuer_methode(methode, &fehler);
            tracing::warn!(methode, code = %err.code, "Methodenaufruf fehlgeschlagen: {fehler}");
            err
        });
        if antwort.is_ok() {
            tracing::debug!(methode, "Methodenaufruf erfolgreich");
        }
        Some(antwort)
    }

    // -----------------------------------------------------------------------
    // KeyManager
    // -----------------------------------------------------------------------

    fn create_key_manager(&self, _params: Params<'_>) -> Result<Value, FrameCryptorError> {
        let id = self.registry.create_key_manager();
        Ok(json!({ "keyManagerId": id }))
    }

    fn key_manager_set_key(&self, params: Params<'_>) -> Result<Value, FrameCryptorError> {
        let id = key_manager_id(params)?;
        let participant_id = params.string("participantId")?;
        let slot = params.slot("keyIndex")?;
        let key = params.bytes("key")?;

        let ok = self.registry.set_key(&id, participant_id, slot, key)?;
        Ok(json!({ "result": ok }))
    }

    fn key_manager_set_keys(&self, params: Params<'_>) -> Result<Value, FrameCryptorError> {
        let id = key_manager_id(params)?;
        let participant_id = params.string("participantId")?;
        let keys = params.bytes_liste("keys")?;

        let ok = self.registry.set_keys(&id, participant_id, keys)?;
        Ok(json!({ "result": ok }))
    }

    fn key_manager_get_keys(&self, params: Params<'_>) -> Result<Value, FrameCryptorError> {
        let id = key_manager_id(params)?;
        let participant_id = params.string("participantId")?;

        let keys = self.registry.get_keys(&id, participant_id)?;
        Ok(json!({ "keys": keys }))
    }

    fn key_manager_ratchet_key(&self, params: Params<'_>) -> Result<Value, FrameCryptorError> {
        let id = key_manager_id(params)?;
        let participant_id = params.string("participantId")?;
        let slot = params.slot("keyIndex")?;

        let key = self.registry.ratchet_key(&id, participant_id, slot)?;
        Ok(json!({ "key": key }))
    }

    fn key_manager_dispose(&self, params: Params<'_>) -> Result<Value, FrameCryptorError> {
        let id = key_manager_id(params)?;
        self.registry.dispose_key_manager(&id)?;
        Ok(json!({ "result": "success" }))
    }

    // -----------------------------------------------------------------------
    // FrameCryptor
    // -----------------------------------------------------------------------

    /// Reihenfolge der Pruefungen: KeyManager, Rolle, Endpunkt
    fn create_frame_cryptor(&self, params: Params<'_>) -> Result<Value, FrameCryptorError> {
        let km_id = KeyManagerId::from(params.string("keyManagerId")?);
        if self.registry.key_manager(&km_id).is_err() {
            return Err(FrameCryptorError::KeyManagerNotFound(km_id.to_string()));
        }

        let role: Role = params.string("type")?.parse()?;
        let peer_connection_id = params.string("peerConnectionId")?;
        let endpoint_param = match role {
            Role::Sender => "rtpSenderId",
            Role::Receiver => "rtpReceiverId",
        };
        let endpoint_id = params.string(endpoint_param)?;
        let participant_id = params.optional_string("participantId")?.unwrap_or_default();
        let algorithm = Algorithm::from_code(params.int_oder("algorithm", 0)?);

        let id = self.registry.create_frame_cryptor(
            &km_id,
            &EndpointRef::neu(peer_connection_id, endpoint_id),
            participant_id,
            algorithm,
            role,
        )?;
        Ok(json!({ "frameCryptorId": id }))
    }

    fn frame_cryptor_set_key_index(&self, params: Params<'_>) -> Result<Value, FrameCryptorError> {
        let id = frame_cryptor_id(params)?;
        let index = params.int("keyIndex")?;
        let index = i32::try_from(index).map_err(|_| {
            FrameCryptorError::InvalidArgument(format!("keyIndex ausserhalb des Wertebereichs: {index}"))
        })?;

        let ok = self.registry.set_key_index(&id, index)?;
        Ok(json!({ "result": ok }))
    }

    fn frame_cryptor_get_key_index(&self, params: Params<'_>) -> Result<Value, FrameCryptorError> {
        let id = frame_cryptor_id(params)?;
        Ok(json!({ "keyIndex": self.registry.get_key_index(&id)? }))
    }

    fn frame_cryptor_set_enabled(&self, params: Params<'_>) -> Result<Value, FrameCryptorError> {
        let id = frame_cryptor_id(params)?;
        let enabled = params.bool("enabled")?;
        Ok(json!({ "result": self.registry.set_enabled(&id, enabled)? }))
    }

    fn frame_cryptor_get_enabled(&self, params: Params<'_>) -> Result<Value, FrameCryptorError> {
        let id = frame_cryptor_id(params)?;
        Ok(json!({ "enabled": self.registry.get_enabled(&id)? }))
    }

    fn frame_cryptor_dispose(&self, params: Params<'_>) -> Result<Value, FrameCryptorError> {
        let id = frame_cryptor_id(params)?;
        self.registry.dispose_frame_cryptor(&id)?;
        Ok(json!({ "result": "success" }))
    }
}

fn key_manager_id(params: Params<'_>) -> Result<KeyManagerId, FrameCryptorError> {
    Ok(KeyManagerId::from(params.string("keyManagerId")?))
}

fn frame_cryptor_id(params: Params<'_>) -> Result<FrameCryptorId, FrameCryptorError> {
    Ok(FrameCryptorId::from(params.string("frameCryptorId")?))
}
