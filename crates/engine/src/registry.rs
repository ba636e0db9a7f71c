//! Registry – Opake IDs auf lebende KeyManager und Frame-Cryptors
//!
//! Zwei unabhaengige ID-Raeume in je einer DashMap. Eine entsorgte ID wird
//! vor der Rueckkehr von `dispose_*` aus der Map entfernt und loest danach
//! nie wieder auf.
//!
//! Clone teilt den inneren Zustand.

use dashmap::DashMap;
use framecrypt_core::{FrameCryptorError, FrameCryptorEvent, FrameCryptorId, KeyManagerId, Result, Role};
use framecrypt_crypto::{AesFrameCipher, Algorithm, FrameCipher, KeyManager, KeyManagerOptions};
use framecrypt_observability::CryptorMetrics;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::cryptor::{CryptorBinding, CryptorUmgebung, FrameCryptor};
use crate::endpoint::{EndpointRef, EndpointResolver};
use crate::observer::{EventSink, StateObserver, DEFAULT_MAX_BUFFERED_EVENTS};
use crate::policy::CryptorPolicy;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Einstellungen fuer alle KeyManager und Cryptors einer Registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub keyring: KeyManagerOptions,
    pub policy: CryptorPolicy,
    pub max_buffered_events: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            keyring: KeyManagerOptions::default(),
            policy: CryptorPolicy::default(),
            max_buffered_events: DEFAULT_MAX_BUFFERED_EVENTS,
        }
    }
}

// ---------------------------------------------------------------------------
// FrameCryptorRegistry
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct FrameCryptorRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    key_managers: DashMap<KeyManagerId, Arc<KeyManager>>,
    frame_cryptors: DashMap<FrameCryptorId, Arc<FrameCryptor>>,
    resolver: Arc<dyn EndpointResolver>,
    keyring: KeyManagerOptions,
    umgebung: CryptorUmgebung,
}

impl FrameCryptorRegistry {
    /// Erstellt eine leere Registry
    pub fn neu(
        config: RegistryConfig,
        resolver: Arc<dyn EndpointResolver>,
        cipher: Arc<dyn FrameCipher>,
    ) -> Self {
        Self::mit_metriken(config, resolver, cipher, None)
    }

    /// Registry mit AES-Cipher und Standard-Einstellungen
    pub fn standard(resolver: Arc<dyn EndpointResolver>) -> Self {
        Self::neu(RegistryConfig::default(), resolver, Arc::new(AesFrameCipher))
    }

    pub fn mit_metriken(
        config: RegistryConfig,
        resolver: Arc<dyn EndpointResolver>,
        cipher: Arc<dyn FrameCipher>,
        metrics: Option<Arc<CryptorMetrics>>,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                key_managers: DashMap::new(),
                frame_cryptors: DashMap::new(),
                resolver,
                keyring: config.keyring,
                umgebung: CryptorUmgebung {
                    cipher,
                    policy: config.policy,
                    max_buffered_events: config.max_buffered_events,
                    metrics,
                },
            }),
        }
    }

    pub fn metrics(&self) -> Option<&Arc<CryptorMetrics>> {
        self.inner.umgebung.metrics.as_ref()
    }

    // -----------------------------------------------------------------------
    // KeyManager
    // -----------------------------------------------------------------------

    /// Erstellt einen leeren KeyManager
    pub fn create_key_manager(&self) -> KeyManagerId {
        let id = KeyManagerId::new();
        let key_manager = Arc::new(KeyManager::new(self.inner.keyring.clone()));
        self.inner.key_managers.insert(id.clone(), key_manager);

        if let Some(m) = self.metrics() {
            m.key_managers_active.inc();
        }
        tracing::info!(key_manager_id = %id, "KeyManager erstellt");
        id
    }

    /// Setzt den Schluessel eines Slots
    pub fn set_key(
        &self,
        id: &KeyManagerId,
        participant_id: &str,
        slot: usize,
        key: Vec<u8>,
    ) -> Result<bool> {
        self.key_manager(id)?.set_key(participant_id, slot, key)?;
        tracing::debug!(key_manager_id = %id, participant_id, slot, "Schluessel gesetzt");
        Ok(true)
    }

    /// Ersetzt den Key-Ring eines Teilnehmers
    pub fn set_keys(&self, id: &KeyManagerId, participant_id: &str, keys: Vec<Vec<u8>>) -> Result<bool> {
        self.key_manager(id)?.set_keys(participant_id, keys)?;
        Ok(true)
    }

    /// Alle Slots eines Teilnehmers (leer = unbelegt)
    pub fn get_keys(&self, id: &KeyManagerId, participant_id: &str) -> Result<Vec<Vec<u8>>> {
        Ok(self.key_manager(id)?.get_keys(participant_id))
    }

    /// Schluessel eines Slots, `None` wenn unbelegt
    pub fn get_key(&self, id: &KeyManagerId, participant_id: &str, slot: usize) -> Result<Option<Vec<u8>>> {
        Ok(self
            .key_manager(id)?
            .get_key(participant_id, slot)
            .map(|k| k.as_bytes().to_vec()))
    }

    /// Ratchet eines Slots; gibt den neuen Schluessel zurueck
    pub fn ratchet_key(&self, id: &KeyManagerId, participant_id: &str, slot: usize) -> Result<Vec<u8>> {
        let neu = self.key_manager(id)?.ratchet_key(participant_id, slot)?;
        tracing::info!(key_manager_id = %id, participant_id, slot, "Schluessel geratcheted");
        Ok(neu.as_bytes().to_vec())
    }

    /// Teilnehmer mit Schluesselmaterial
    pub fn participants(&self, id: &KeyManagerId) -> Result<Vec<String>> {
        Ok(self.key_manager(id)?.participants())
    }

    /// Entsorgt einen KeyManager
    ///
    /// Cryptors die noch daran haengen, finden danach keine Schluessel mehr
    /// und melden `MissingKey`.
    pub fn dispose_key_manager(&self, id: &KeyManagerId) -> Result<()> {
        let (_, key_manager) = self
            .inner
            .key_managers
            .remove(id)
            .ok_or_else(|| FrameCryptorError::key_manager_unbekannt(id.as_str()))?;
        key_manager.dispose();

        if let Some(m) = self.metrics() {
            m.key_managers_active.dec();
        }
        tracing::info!(key_manager_id = %id, "KeyManager entsorgt");
        Ok(())
    }

    pub fn key_manager(&self, id: &KeyManagerId) -> Result<Arc<KeyManager>> {
        self.inner
            .key_managers
            .get(id)
            .map(|e| Arc::clone(&*e))
            .ok_or_else(|| FrameCryptorError::key_manager_unbekannt(id.as_str()))
    }

    // -----------------------------------------------------------------------
    // FrameCryptor
    // -----------------------------------------------------------------------

    /// Erstellt einen Frame-Cryptor und haengt ihn in den Endpunkt ein
    pub fn create_frame_cryptor(
        &self,
        key_manager_id: &KeyManagerId,
        endpoint: &EndpointRef,
        participant_id: &str,
        algorithm: Algorithm,
        role: Role,
    ) -> Result<FrameCryptorId> {
        let key_manager = self
            .inner
            .key_managers
            .get(key_manager_id)
            .map(|e| Arc::clone(&*e))
            .ok_or_else(|| FrameCryptorError::KeyManagerNotFound(key_manager_id.to_string()))?;

        let media = self
            .inner
            .resolver
            .resolve(endpoint, role)
            .ok_or_else(|| FrameCryptorError::EndpointNotFound(endpoint.to_string()))?;

        let id = FrameCryptorId::new();
        let cryptor = Arc::new(FrameCryptor::neu(
            id.clone(),
            CryptorBinding {
                participant_id: participant_id.to_string(),
                role,
                algorithm,
                key_manager,
            },
            self.inner.umgebung.clone(),
        ));
        cryptor.anbinden(media);
        self.inner.frame_cryptors.insert(id.clone(), cryptor);

        if let Some(m) = self.metrics() {
            m.frame_cryptors_active.inc();
        }
        tracing::info!(
            frame_cryptor_id = %id,
            key_manager_id = %key_manager_id,
            endpoint = %endpoint,
            participant_id,
            role = %role,
            algorithm = ?algorithm,
            "Frame-Cryptor erstellt"
        );
        Ok(id)
    }

    pub fn set_enabled(&self, id: &FrameCryptorId, enabled: bool) -> Result<bool> {
        Ok(self.frame_cryptor(id)?.set_enabled(enabled))
    }

    pub fn get_enabled(&self, id: &FrameCryptorId) -> Result<bool> {
        Ok(self.frame_cryptor(id)?.enabled())
    }

    pub fn set_key_index(&self, id: &FrameCryptorId, index: i32) -> Result<bool> {
        self.frame_cryptor(id)?.set_key_index(index);
        Ok(true)
    }

    pub fn get_key_index(&self, id: &FrameCryptorId) -> Result<i32> {
        Ok(self.frame_cryptor(id)?.key_index())
    }

    /// Entsorgt einen Frame-Cryptor
    ///
    /// Die ID ist schon vor dem Warten auf laufende Frames nicht mehr
    /// aufloesbar. Ein zweiter Aufruf ergibt `NotFound`.
    pub fn dispose_frame_cryptor(&self, id: &FrameCryptorId) -> Result<()> {
        let (_, cryptor) = self
            .inner
            .frame_cryptors
            .remove(id)
            .ok_or_else(|| FrameCryptorError::frame_cryptor_unbekannt(id.as_str()))?;
        cryptor.dispose();

        if let Some(m) = self.metrics() {
            m.frame_cryptors_active.dec();
        }
        Ok(())
    }

    pub fn frame_cryptor(&self, id: &FrameCryptorId) -> Result<Arc<FrameCryptor>> {
        self.inner
            .frame_cryptors
            .get(id)
            .map(|e| Arc::clone(&*e))
            .ok_or_else(|| FrameCryptorError::frame_cryptor_unbekannt(id.as_str()))
    }

    // -----------------------------------------------------------------------
    // Observer
    // -----------------------------------------------------------------------

    pub fn observer(&self, id: &FrameCryptorId) -> Result<Arc<StateObserver>> {
        Ok(Arc::clone(self.frame_cryptor(id)?.observer()))
    }

    /// Haengt einen Konsumenten an und leert den Puffer
    pub fn attach_observer(&self, id: &FrameCryptorId, sink: Box<dyn EventSink>) -> Result<bool> {
        Ok(self.frame_cryptor(id)?.observer().attach(sink))
    }

    pub fn detach_observer(&self, id: &FrameCryptorId) -> Result<()> {
        self.frame_cryptor(id)?.observer().detach();
        Ok(())
    }

    pub fn subscribe(&self, id: &FrameCryptorId) -> Result<mpsc::UnboundedReceiver<FrameCryptorEvent>> {
        Ok(self.frame_cryptor(id)?.observer().subscribe())
    }

    // -----------------------------------------------------------------------
    // Verwaltung
    // -----------------------------------------------------------------------

    pub fn key_manager_count(&self) -> usize {
        self.inner.key_managers.len()
    }

    pub fn frame_cryptor_count(&self) -> usize {
        self.inner.frame_cryptors.len()
    }

    /// Entsorgt alle Cryptors und KeyManager
    pub fn shutdown(&self) {
        let cryptor_ids: Vec<FrameCryptorId> = self
            .inner
            .frame_cryptors
            .iter()
            .map(|e| e.key().clone())
            .collect();
        for id in &cryptor_ids {
            // Parallel entsorgte IDs sind kein Fehler
            let _ = self.dispose_frame_cryptor(id);
        }

        let key_manager_ids: Vec<KeyManagerId> = self
            .inner
            .key_managers
            .iter()
            .map(|e| e.key().clone())
            .collect();
        for id in &key_manager_ids {
            let _ = self.dispose_key_manager(id);
        }

        tracing::info!(
            frame_cryptors = cryptor_ids.len(),
            key_managers = key_manager_ids.len(),
            "Registry heruntergefahren"
        );
    }
}

impl std::fmt::Debug for FrameCryptorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCryptorRegistry")
            .field("key_managers", &self.key_manager_count())
            .field("frame_cryptors", &self.frame_cryptor_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{EndpointTable, PipelineEndpoint};

    fn setup() -> (FrameCryptorRegistry, Arc<EndpointTable>, EndpointRef) {
        let tabelle = Arc::new(EndpointTable::neu());
        let endpunkt = EndpointRef::neu("pc-1", "sender-1");
        tabelle.registrieren(endpunkt.clone(), Role::Sender, Arc::new(PipelineEndpoint::neu()));
        let registry = FrameCryptorRegistry::standard(tabelle.clone());
        (registry, tabelle, endpunkt)
    }

    #[test]
    fn key_manager_lebenszyklus() {
        let (registry, _, _) = setup();
        let id = registry.create_key_manager();
        assert_eq!(registry.key_manager_count(), 1);

        assert!(registry.set_key(&id, "p1", 0, vec![1; 16]).unwrap());
        assert_eq!(registry.get_keys(&id, "p1").unwrap(), vec![vec![1u8; 16]]);

        registry.dispose_key_manager(&id).unwrap();
        assert_eq!(registry.key_manager_count(), 0);

        let err = registry.get_keys(&id, "p1").unwrap_err();
        assert!(matches!(err, FrameCryptorError::NotFound { kind: "KeyManager", .. }));
        assert!(registry.dispose_key_manager(&id).is_err());
    }

    #[test]
    fn key_manager_ids_sind_unabhaengig() {
        let (registry, _, _) = setup();
        let a = registry.create_key_manager();
        let b = registry.create_key_manager();
        assert_ne!(a, b);

        registry.set_key(&a, "p1", 0, vec![1; 16]).unwrap();
        assert!(registry.get_keys(&b, "p1").unwrap().is_empty());
    }

    #[test]
    fn slot_fehler_wird_invalid_argument() {
        let (registry, _, _) = setup();
        let id = registry.create_key_manager();
        let err = registry.set_key(&id, "p1", 99, vec![1; 16]).unwrap_err();
        assert!(matches!(err, FrameCryptorError::InvalidArgument(_)));
    }

    #[test]
    fn ratchet_ohne_schluessel_ist_missing_key() {
        let (registry, _, _) = setup();
        let id = registry.create_key_manager();
        let err = registry.ratchet_key(&id, "p1", 0).unwrap_err();
        assert!(matches!(err, FrameCryptorError::MissingKey { slot: 0, .. }));
    }

    #[test]
    fn cryptor_erstellen_validiert() {
        let (registry, _, endpunkt) = setup();
        let km = registry.create_key_manager();

        let err = registry
            .create_frame_cryptor(&KeyManagerId::from("gibt-es-nicht"), &endpunkt, "p1", Algorithm::AesGcm, Role::Sender)
            .unwrap_err();
        assert!(matches!(err, FrameCryptorError::KeyManagerNotFound(_)));

        let err = registry
            .create_frame_cryptor(&km, &EndpointRef::neu("pc-1", "fehlt"), "p1", Algorithm::AesGcm, Role::Sender)
            .unwrap_err();
        assert!(matches!(err, FrameCryptorError::EndpointNotFound(_)));

        // Sender-ID als Empfaenger
        let err = registry
            .create_frame_cryptor(&km, &endpunkt, "p1", Algorithm::AesGcm, Role::Receiver)
            .unwrap_err();
        assert!(matches!(err, FrameCryptorError::EndpointNotFound(_)));

        assert_eq!(registry.frame_cryptor_count(), 0);
    }

    #[test]
    fn cryptor_einstellungen() {
        let (registry, _, endpunkt) = setup();
        let km = registry.create_key_manager();
        let id = registry
            .create_frame_cryptor(&km, &endpunkt, "p1", Algorithm::AesCbc, Role::Sender)
            .unwrap();

        assert!(!registry.get_enabled(&id).unwrap());
        assert_eq!(registry.get_key_index(&id).unwrap(), 0);

        assert!(registry.set_enabled(&id, true).unwrap());
        assert!(!registry.set_enabled(&id, false).unwrap());
        assert!(registry.set_key_index(&id, 7).unwrap());
        assert_eq!(registry.get_key_index(&id).unwrap(), 7);
        assert_eq!(registry.frame_cryptor(&id).unwrap().algorithm(), Algorithm::AesCbc);
    }

    #[test]
    fn cryptor_doppelt_entsorgen() {
        let (registry, _, endpunkt) = setup();
        let km = registry.create_key_manager();
        let id = registry
            .create_frame_cryptor(&km, &endpunkt, "p1", Algorithm::AesGcm, Role::Sender)
            .unwrap();

        registry.dispose_frame_cryptor(&id).unwrap();
        let err = registry.dispose_frame_cryptor(&id).unwrap_err();
        assert!(matches!(err, FrameCryptorError::NotFound { kind: "FrameCryptor", .. }));
        assert!(registry.get_enabled(&id).unwrap_err().ist_nicht_gefunden());
        assert!(registry.set_key_index(&id, 1).is_err());
        assert!(registry.subscribe(&id).is_err());
    }

    #[test]
    fn shutdown_entsorgt_alles() {
        let metrics = Arc::new(CryptorMetrics::neu().unwrap());
        let tabelle = Arc::new(EndpointTable::neu());
        let endpunkt = EndpointRef::neu("pc-1", "rx-1");
        let media = Arc::new(PipelineEndpoint::neu());
        tabelle.registrieren(endpunkt.clone(), Role::Receiver, media.clone());

        let registry = FrameCryptorRegistry::mit_metriken(
            RegistryConfig::default(),
            tabelle,
            Arc::new(AesFrameCipher),
            Some(Arc::clone(&metrics)),
        );
        let km = registry.create_key_manager();
        registry
            .create_frame_cryptor(&km, &endpunkt, "p1", Algorithm::AesGcm, Role::Receiver)
            .unwrap();
        assert!(media.hat_transformer());
        assert_eq!(metrics.frame_cryptors_active.get(), 1);

        registry.shutdown();

        assert_eq!(registry.key_manager_count(), 0);
        assert_eq!(registry.frame_cryptor_count(), 0);
        assert!(!media.hat_transformer());
        assert_eq!(metrics.frame_cryptors_active.get(), 0);
        assert_eq!(metrics.key_managers_active.get(), 0);
    }
}
