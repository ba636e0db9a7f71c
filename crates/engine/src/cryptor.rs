//! Frame-Cryptor – Ver-/Entschluesselung pro Sender bzw. Empfaenger
//!
//! Ein Cryptor ist an einen KeyManager, einen Teilnehmer und einen
//! Media-Endpunkt gebunden. Die Media-Pipeline ruft pro Frame den
//! `FrameTransformer` auf; Steuer-Aufrufe (enabled, Key-Index, dispose)
//! kommen parallel aus dem Control-Kontext.
//!
//! ## Per-Frame-Ablauf
//! 1. Deaktiviert: Sender reicht durch, Empfaenger nach Policy
//! 2. Schluessel im aktiven Slot nachschlagen
//! 3. Kein Schluessel: `MissingKey` melden, Policy anwenden
//! 4. Ver-/Entschluesseln
//! 5. Fehler: `EncryptionFailed` / `DecryptionFailed` / `InternalError` melden,
//!    Policy anwenden. Erfolg: `Ok` melden, Frame weiterreichen
//!
//! Gemeldet wird nur bei Zustandswechsel.
//!
//! ## Lebenszyklus
//! `dispose` nimmt den Schreib-Lock des Lebenszyklus. Damit wartet es auf
//! laufende Transforms (Lese-Lock) und erhoeht die Generation. Transformer
//! mit alter Generation verwerfen jeden weiteren Frame.

use bytes::Bytes;
use framecrypt_core::{FrameCryptionState, FrameCryptorEvent, FrameCryptorId, Role};
use framecrypt_crypto::{Algorithm, FrameCipher, KeyManager};
use framecrypt_observability::CryptorMetrics;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use crate::endpoint::MediaEndpoint;
use crate::observer::StateObserver;
use crate::policy::{CryptorPolicy, FrameAction, TransformResult};

// ---------------------------------------------------------------------------
// Bausteine
// ---------------------------------------------------------------------------

/// Woran ein Cryptor gebunden ist
#[derive(Debug, Clone)]
pub struct CryptorBinding {
    pub participant_id: String,
    pub role: Role,
    pub algorithm: Algorithm,
    pub key_manager: Arc<KeyManager>,
}

/// Gemeinsame Umgebung aller Cryptors einer Registry
#[derive(Debug, Clone)]
pub struct CryptorUmgebung {
    pub cipher: Arc<dyn FrameCipher>,
    pub policy: CryptorPolicy,
    pub max_buffered_events: usize,
    pub metrics: Option<Arc<CryptorMetrics>>,
}

struct Lifecycle {
    generation: u64,
    disposed: bool,
    endpoint: Option<Arc<dyn MediaEndpoint>>,
}

// ---------------------------------------------------------------------------
// FrameCryptor
// ---------------------------------------------------------------------------

pub struct FrameCryptor {
    id: FrameCryptorId,
    binding: CryptorBinding,
    umgebung: CryptorUmgebung,
    enabled: AtomicBool,
    key_index: AtomicI32,
    observer: Arc<StateObserver>,
    /// Zuletzt gemeldeter Zustand; Meldung erfolgt unter diesem Lock
    last_state: Mutex<FrameCryptionState>,
    lifecycle: RwLock<Lifecycle>,
}

impl FrameCryptor {
    /// Erstellt einen Cryptor (deaktiviert, Key-Index 0)
    pub fn neu(id: FrameCryptorId, binding: CryptorBinding, umgebung: CryptorUmgebung) -> Self {
        let observer = Arc::new(StateObserver::neu(
            id.as_str(),
            umgebung.max_buffered_events,
        ));
        Self {
            id,
            binding,
            umgebung,
            enabled: AtomicBool::new(false),
            key_index: AtomicI32::new(0),
            observer,
            last_state: Mutex::new(FrameCryptionState::New),
            lifecycle: RwLock::new(Lifecycle {
                generation: 0,
                disposed: false,
                endpoint: None,
            }),
        }
    }

    pub fn id(&self) -> &FrameCryptorId {
        &self.id
    }

    pub fn participant_id(&self) -> &str {
        &self.binding.participant_id
    }

    pub fn role(&self) -> Role {
        self.binding.role
    }

    pub fn algorithm(&self) -> Algorithm {
        self.binding.algorithm
    }

    pub fn observer(&self) -> &Arc<StateObserver> {
        &self.observer
    }

    /// Setzt enabled und gibt den neuen Wert zurueck
    pub fn set_enabled(&self, enabled: bool) -> bool {
        self.enabled.store(enabled, Ordering::SeqCst);
        tracing::debug!(frame_cryptor_id = %self.id, enabled, "Cryptor umgeschaltet");
        enabled
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Setzt den aktiven Slot; ungueltige Indizes zeigen sich erst als `MissingKey`
    pub fn set_key_index(&self, index: i32) {
        self.key_index.store(index, Ordering::SeqCst);
        tracing::debug!(frame_cryptor_id = %self.id, key_index = index, "Key-Index gesetzt");
    }

    pub fn key_index(&self) -> i32 {
        self.key_index.load(Ordering::SeqCst)
    }

    pub fn last_state(&self) -> FrameCryptionState {
        *self.last_state.lock()
    }

    pub fn is_disposed(&self) -> bool {
        self.lifecycle.read().disposed
    }

    /// Transformer-Handle fuer die aktuelle Generation
    pub fn transformer(self: &Arc<Self>) -> Option<FrameTransformer> {
        let lifecycle = self.lifecycle.read();
        if lifecycle.disposed {
            return None;
        }
        Some(FrameTransformer {
            cryptor: Arc::clone(self),
            generation: lifecycle.generation,
        })
    }

    /// Haengt den Transformer in den Media-Endpunkt ein
    pub fn anbinden(self: &Arc<Self>, endpoint: Arc<dyn MediaEndpoint>) {
        let Some(transformer) = self.transformer() else {
            return;
        };
        endpoint.set_frame_transformer(transformer);

        let mut lifecycle = self.lifecycle.write();
        if lifecycle.disposed {
            // dispose kam dazwischen
            drop(lifecycle);
            endpoint.remove_frame_transformer(&self.id);
            return;
        }
        lifecycle.endpoint = Some(endpoint);
    }

    /// Beendet den Cryptor
    ///
    /// Wartet auf laufende Transforms, haengt den Transformer aus dem
    /// Endpunkt und den Konsumenten vom Observer ab. Gibt `false` zurueck
    /// wenn der Cryptor schon entsorgt war.
    pub fn dispose(&self) -> bool {
        let endpoint = {
            let mut lifecycle = self.lifecycle.write();
            if lifecycle.disposed {
                return false;
            }
            lifecycle.disposed = true;
            lifecycle.generation += 1;
            lifecycle.endpoint.take()
        };

        // Ausserhalb des Locks; nur der eigene Transformer wird entfernt
        if let Some(endpoint) = endpoint {
            endpoint.remove_frame_transformer(&self.id);
        }
        self.observer.detach();
        self.enabled.store(false, Ordering::SeqCst);

        tracing::info!(
            frame_cryptor_id = %self.id,
            participant_id = %self.binding.participant_id,
            "Frame-Cryptor entsorgt"
        );
        true
    }

    /// Verarbeitet einen Frame; Aufrufer haelt den Lese-Lock des Lebenszyklus
    pub(crate) fn process_frame(&self, frame: Bytes) -> TransformResult {
        if let Some(m) = &self.umgebung.metrics {
            m.frame_size_bytes.observe(frame.len() as f64);
        }

        if !self.enabled() {
            let aktion = match self.binding.role {
                Role::Sender => FrameAction::PassThrough,
                Role::Receiver => self.umgebung.policy.disabled_receiver,
            };
            return self.anwenden(aktion, frame);
        }

        let index = self.key_index();
        let key = usize::try_from(index)
            .ok()
            .and_then(|slot| self.binding.key_manager.get_key(&self.binding.participant_id, slot));

        let Some(key) = key else {
            tracing::debug!(
                frame_cryptor_id = %self.id,
                participant_id = %self.binding.participant_id,
                key_index = index,
                "Kein Schluessel im aktiven Slot"
            );
            self.melden(FrameCryptionState::MissingKey);
            return self.anwenden(self.umgebung.policy.missing_key, frame);
        };

        let cipher = &self.umgebung.cipher;
        let algorithm = self.binding.algorithm;
        let ergebnis = match self.binding.role {
            Role::Sender => cipher.encrypt(algorithm, &key, &frame),
            Role::Receiver => cipher.decrypt(algorithm, &key, &frame),
        };

        match ergebnis {
            Ok(ausgabe) => {
                if let Some(m) = &self.umgebung.metrics {
                    match self.binding.role {
                        Role::Sender => m.frames_encrypted.inc(),
                        Role::Receiver => m.frames_decrypted.inc(),
                    }
                }
                self.melden(FrameCryptionState::Ok);
                TransformResult::Forward(Bytes::from(ausgabe))
            }
            Err(err) => {
                let zustand = if err.ist_intern() {
                    FrameCryptionState::InternalError
                } else {
                    match self.binding.role {
                        Role::Sender => FrameCryptionState::EncryptionFailed,
                        Role::Receiver => FrameCryptionState::DecryptionFailed,
                    }
                };
                tracing::debug!(
                    frame_cryptor_id = %self.id,
                    key_index = index,
                    "Frame-Transform fehlgeschlagen: {err}"
                );
                self.melden(zustand);
                self.anwenden(self.umgebung.policy.cipher_failure, frame)
            }
        }
    }

    fn anwenden(&self, aktion: FrameAction, frame: Bytes) -> TransformResult {
        match aktion {
            FrameAction::PassThrough => {
                if let Some(m) = &self.umgebung.metrics {
                    m.frames_passed_through.inc();
                }
                TransformResult::Forward(frame)
            }
            FrameAction::Drop => {
                if let Some(m) = &self.umgebung.metrics {
                    m.frames_dropped.inc();
                }
                TransformResult::Drop
            }
        }
    }

    /// Meldet einen Zustand, falls er sich geaendert hat
    fn melden(&self, zustand: FrameCryptionState) {
        let mut last = self.last_state.lock();
        if *last == zustand {
            return;
        }
        *last = zustand;

        if zustand.ist_fehler() {
            tracing::warn!(
                frame_cryptor_id = %self.id,
                participant_id = %self.binding.participant_id,
                state = %zustand,
                "Frame-Cryptor-Zustand geaendert"
            );
        } else {
            tracing::info!(
                frame_cryptor_id = %self.id,
                participant_id = %self.binding.participant_id,
                state = %zustand,
                "Frame-Cryptor-Zustand geaendert"
            );
        }
        if let Some(m) = &self.umgebung.metrics {
            m.zustand_gemeldet(zustand.as_str());
        }

        self.observer.notify(FrameCryptorEvent::state_changed(
            self.binding.participant_id.clone(),
            zustand,
        ));
    }
}

impl std::fmt::Debug for FrameCryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCryptor")
            .field("id", &self.id)
            .field("participant_id", &self.binding.participant_id)
            .field("role", &self.binding.role)
            .field("algorithm", &self.binding.algorithm)
            .field("enabled", &self.enabled())
            .field("key_index", &self.key_index())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// FrameTransformer
// ---------------------------------------------------------------------------

/// Handle, das die Media-Pipeline pro Frame aufruft
#[derive(Clone)]
pub struct FrameTransformer {
    cryptor: Arc<FrameCryptor>,
    generation: u64,
}

impl FrameTransformer {
    /// Transformiert einen Frame; nach `dispose` wird jeder Frame verworfen
    pub fn transform(&self, frame: Bytes) -> TransformResult {
        let lifecycle = self.cryptor.lifecycle.read();
        if lifecycle.disposed || lifecycle.generation != self.generation {
            return TransformResult::Drop;
        }
        self.cryptor.process_frame(frame)
    }

    pub fn frame_cryptor_id(&self) -> &FrameCryptorId {
        &self.cryptor.id
    }
}

impl std::fmt::Debug for FrameTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameTransformer")
            .field("frame_cryptor_id", &self.cryptor.id)
            .field("generation", &self.generation)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
