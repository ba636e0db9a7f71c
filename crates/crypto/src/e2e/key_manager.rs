//! Key-Ring-Verwaltung (Key Manager)
//!
//! Haelt pro Teilnehmer eine geordnete Liste von Key-Slots:
//! - Setzen einzelner Slots oder des ganzen Rings
//! - Auslesen (leere Bytes = Slot nicht belegt)
//! - Ratchet eines Slots
//! - Entsorgen (Schluesselmaterial wird genullt)
//!
//! Ein KeyManager kann von mehreren Frame-Cryptors gleichzeitig gelesen
//! werden, waehrend die Anwendung Schluessel setzt.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::e2e::ratchet::ratchet_key_material;
use crate::error::{CryptoError, CryptoResult};
use crate::types::SecretBytes;

/// Anzahl Key-Slots pro Teilnehmer
pub const DEFAULT_KEYRING_CAPACITY: usize = 16;

/// Salt fuer `ratchet_key`
pub const DEFAULT_RATCHET_SALT: &str = "FrameCryptorRatchet";

type KeyRing = Vec<Option<Arc<SecretBytes>>>;

/// Leere Bytes = unbelegter Slot
fn slot_aus_bytes(key: Vec<u8>) -> Option<Arc<SecretBytes>> {
    (!key.is_empty()).then(|| Arc::new(SecretBytes::new(key)))
}

/// Einstellungen eines KeyManagers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyManagerOptions {
    /// Hoechste erlaubte Slot-Anzahl pro Teilnehmer
    pub capacity: usize,
    pub ratchet_salt: Vec<u8>,
}

impl Default for KeyManagerOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_KEYRING_CAPACITY,
            ratchet_salt: DEFAULT_RATCHET_SALT.as_bytes().to_vec(),
        }
    }
}

/// Verwaltet die Key-Ringe aller Teilnehmer
#[derive(Debug, Default)]
pub struct KeyManager {
    options: KeyManagerOptions,
    /// participant_id -> Slots
    keys: DashMap<String, KeyRing>,
    disposed: AtomicBool,
}

impl KeyManager {
    pub fn new(options: KeyManagerOptions) -> Self {
        Self {
            options,
            keys: DashMap::new(),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn options(&self) -> &KeyManagerOptions {
        &self.options
    }

    /// Setzt den Schluessel eines Slots (ueberschreibt)
    ///
    /// Slots unterhalb von `slot` die noch nicht existieren, bleiben leer.
    /// Leere Bytes setzen den Slot auf unbelegt, wie bei `set_keys`.
    pub fn set_key(&self, participant_id: &str, slot: usize, key: Vec<u8>) -> CryptoResult<()> {
        self.pruefe_aktiv()?;
        self.pruefe_slot(slot)?;

        let mut ring = self.keys.entry(participant_id.to_string()).or_default();
        if ring.len() <= slot {
            ring.resize(slot + 1, None);
        }
        ring[slot] = slot_aus_bytes(key);

        tracing::debug!(participant_id, slot, "Schluessel gesetzt");
        Ok(())
    }

    /// Ersetzt den ganzen Key-Ring eines Teilnehmers
    ///
    /// Position = Slot. Leere Eintraege bleiben unbelegt, wie bei `set_key`.
    pub fn set_keys(&self, participant_id: &str, keys: Vec<Vec<u8>>) -> CryptoResult<()> {
        self.pruefe_aktiv()?;
        if keys.len() > self.options.capacity {
            return Err(CryptoError::UngueltigerSlot {
                slot: keys.len() - 1,
                kapazitaet: self.options.capacity,
            });
        }

        let anzahl = keys.len();
        let ring: KeyRing = keys
            .into_iter()
            .map(slot_aus_bytes)
            .collect();
        self.keys.insert(participant_id.to_string(), ring);

        tracing::debug!(participant_id, anzahl, "Key-Ring ersetzt");
        Ok(())
    }

    /// Gibt alle Slots eines Teilnehmers zurueck (leer = unbelegt)
    pub fn get_keys(&self, participant_id: &str) -> Vec<Vec<u8>> {
        if self.is_disposed() {
            return Vec::new();
        }
        self.keys
            .get(participant_id)
            .map(|ring| {
                ring.iter()
                    .map(|slot| slot.as_ref().map(|k| k.as_bytes().to_vec()).unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Schluessel eines einzelnen Slots
    pub fn get_key(&self, participant_id: &str, slot: usize) -> Option<Arc<SecretBytes>> {
        if self.is_disposed() {
            return None;
        }
        self.keys
            .get(participant_id)
            .and_then(|ring| ring.get(slot).cloned().flatten())
    }

    /// Leitet den naechsten Schluessel eines Slots ab und speichert ihn
    ///
    /// Gibt den neuen Schluessel zurueck.
    pub fn ratchet_key(&self, participant_id: &str, slot: usize) -> CryptoResult<Arc<SecretBytes>> {
        self.pruefe_aktiv()?;
        self.pruefe_slot(slot)?;

        let kein_schluessel = || CryptoError::KeinSchluessel {
            participant_id: participant_id.to_string(),
            slot,
        };

        let mut ring = self.keys.get_mut(participant_id).ok_or_else(kein_schluessel)?;
        let current = ring
            .get(slot)
            .cloned()
            .flatten()
            .ok_or_else(kein_schluessel)?;

        let next = Arc::new(ratchet_key_material(&current, &self.options.ratchet_salt)?);
        ring[slot] = Some(Arc::clone(&next));

        tracing::debug!(participant_id, slot, "Schluessel geratcheted");
        Ok(next)
    }

    /// Teilnehmer mit Schluesselmaterial
    pub fn participants(&self) -> Vec<String> {
        self.keys.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Entsorgt alle Key-Ringe
    ///
    /// Schluessel die ein Cryptor gerade benutzt, werden genullt sobald
    /// dessen letzte Referenz faellt.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        let anzahl = self.keys.len();
        self.keys.clear();
        tracing::debug!(teilnehmer = anzahl, "KeyManager entsorgt");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn pruefe_aktiv(&self) -> CryptoResult<()> {
        if self.is_disposed() {
            return Err(CryptoError::Entsorgt);
        }
        Ok(())
    }

    fn pruefe_slot(&self, slot: usize) -> CryptoResult<()> {
        if slot >= self.options.capacity {
            return Err(CryptoError::UngueltigerSlot {
                slot,
                kapazitaet: self.options.capacity,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
