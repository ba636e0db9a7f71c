//! Bridge-Konfiguration
//!
//! Wird aus einer TOML-Datei geladen. Alle Felder haben sinnvolle
//! Standardwerte, sodass die Bridge ohne Konfigurationsdatei lauffaehig ist.

use framecrypt_crypto::e2e::key_manager::{DEFAULT_KEYRING_CAPACITY, DEFAULT_RATCHET_SALT};
use framecrypt_crypto::KeyManagerOptions;
use framecrypt_engine::{CryptorPolicy, RegistryConfig, DEFAULT_MAX_BUFFERED_EVENTS};
use framecrypt_observability::{filter_gueltig, format_gueltig};
use serde::{Deserialize, Serialize};

/// Umgebungsvariable mit dem Pfad zur Konfigurationsdatei
pub const ENV_CONFIG_PFAD: &str = "FRAMECRYPT_CONFIG";

/// Standard-Pfad wenn `FRAMECRYPT_CONFIG` nicht gesetzt ist
pub const STANDARD_CONFIG_PFAD: &str = "framecrypt.toml";

/// Vollstaendige Bridge-Konfiguration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Key-Ring-Einstellungen
    pub keyring: KeyringEinstellungen,
    /// Verhalten bei nicht transformierbaren Frames
    pub policy: CryptorPolicy,
    /// Event-Puffer
    pub observer: ObserverEinstellungen,
    /// Event-Kanaele
    pub events: EventEinstellungen,
    /// Prometheus-Metriken
    pub metrics: MetrikEinstellungen,
}

/// Logging-Einstellungen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Level oder EnvFilter-Direktive, z.B. "info" oder "framecrypt_engine=debug"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
    /// Globalen Subscriber setzen (aus, wenn der Host selbst loggt)
    pub initialisieren: bool,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
            initialisieren: true,
        }
    }
}

/// Key-Ring-Einstellungen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyringEinstellungen {
    /// Slots pro Teilnehmer
    pub capacity: usize,
    /// Salt fuer den Key-Ratchet
    pub ratchet_salt: String,
}

impl Default for KeyringEinstellungen {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_KEYRING_CAPACITY,
            ratchet_salt: DEFAULT_RATCHET_SALT.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverEinstellungen {
    /// Maximal gepufferte Events pro Cryptor ohne Konsument
    pub max_buffered_events: usize,
}

impl Default for ObserverEinstellungen {
    fn default() -> Self {
        Self {
            max_buffered_events: DEFAULT_MAX_BUFFERED_EVENTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventEinstellungen {
    /// Praefix des Event-Kanals, die Cryptor-ID wird angehaengt
    pub channel_prefix: String,
}

impl Default for EventEinstellungen {
    fn default() -> Self {
        Self {
            channel_prefix: "FrameCryptor/frameCryptorEvent".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetrikEinstellungen {
    pub aktiviert: bool,
}

impl Default for MetrikEinstellungen {
    fn default() -> Self {
        Self { aktiviert: true }
    }
}

impl BridgeConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                config.pruefen()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Laedt die Datei aus `FRAMECRYPT_CONFIG` (Standard: `framecrypt.toml`)
    pub fn aus_umgebung() -> anyhow::Result<Self> {
        let pfad =
            std::env::var(ENV_CONFIG_PFAD).unwrap_or_else(|_| STANDARD_CONFIG_PFAD.to_string());
        Self::laden(&pfad)
    }

    /// Plausibilitaetspruefung nach dem Laden
    pub fn pruefen(&self) -> anyhow::Result<()> {
        if !filter_gueltig(&self.logging.level) {
            anyhow::bail!("logging.level ungueltig: '{}'", self.logging.level);
        }
        if !format_gueltig(&self.logging.format) {
            anyhow::bail!("logging.format muss 'text' oder 'json' sein");
        }
        if self.keyring.capacity == 0 {
            anyhow::bail!("keyring.capacity muss groesser als 0 sein");
        }
        if self.keyring.ratchet_salt.is_empty() {
            anyhow::bail!("keyring.ratchet_salt darf nicht leer sein");
        }
        Ok(())
    }

    /// Einstellungen fuer die Registry
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            keyring: KeyManagerOptions {
                capacity: self.keyring.capacity,
                ratchet_salt: self.keyring.ratchet_salt.as_bytes().to_vec(),
            },
            policy: self.policy,
            max_buffered_events: self.observer.max_buffered_events,
        }
    }

    /// Name des Event-Kanals eines Cryptors
    pub fn event_kanal(&self, frame_cryptor_id: &str) -> String {
        format!("{}{}", self.events.channel_prefix, frame_cryptor_id)
    }
}
