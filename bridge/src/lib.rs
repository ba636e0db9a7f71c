//! framecrypt-bridge – Einstiegspunkt fuer Hosts
//!
//! Buendelt Konfiguration, Logging, Metriken, Registry und den
//! Methoden-Dispatcher. Ein Host (Plugin-Schicht, FFI, Test) reicht
//! Methodenaufrufe als JSON durch und abonniert pro Frame-Cryptor einen
//! Event-Kanal.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod params;

use std::sync::Arc;

use anyhow::Result;
use config::BridgeConfig;
use dispatcher::MethodDispatcher;
use framecrypt_core::{FrameCryptorEvent, FrameCryptorId};
use framecrypt_crypto::{AesFrameCipher, FrameCipher};
use framecrypt_engine::{EndpointResolver, EventSink, FrameCryptorRegistry};
use framecrypt_observability::{logging_initialisieren, CryptorMetrics};
use serde_json::Value;
use tokio::sync::mpsc;

pub use error::MethodError;

/// Haelt den Zustand der Bridge zusammen
pub struct Bridge {
    config: BridgeConfig,
    dispatcher: MethodDispatcher,
    metrics: Option<Arc<CryptorMetrics>>,
}

impl Bridge {
    /// Erstellt eine Bridge mit dem AES-Frame-Cipher
    pub fn neu(config: BridgeConfig, resolver: Arc<dyn EndpointResolver>) -> Result<Self> {
        Self::mit_cipher(config, resolver, Arc::new(AesFrameCipher))
    }

    /// Erstellt eine Bridge mit eigenem Frame-Cipher
    pub fn mit_cipher(
        config: BridgeConfig,
        resolver: Arc<dyn EndpointResolver>,
        cipher: Arc<dyn FrameCipher>,
    ) -> Result<Self> {
        config.pruefen()?;

        if config.logging.initialisieren {
            logging_initialisieren(&config.logging.level, &config.logging.format);
        }

        let metrics = if config.metrics.aktiviert {
            Some(Arc::new(CryptorMetrics::neu()?))
        } else {
            None
        };

        let registry = FrameCryptorRegistry::mit_metriken(
            config.registry_config(),
            resolver,
            cipher,
            metrics.clone(),
        );

        tracing::info!(
            keyring_capacity = config.keyring.capacity,
            max_buffered_events = config.observer.max_buffered_events,
            metriken = config.metrics.aktiviert,
            "framecrypt-Bridge bereit"
        );

        Ok(Self {
            config,
            dispatcher: MethodDispatcher::neu(registry),
            metrics,
        })
    }

    /// Laedt die Konfiguration aus `FRAMECRYPT_CONFIG` und erstellt die Bridge
    pub fn aus_umgebung(resolver: Arc<dyn EndpointResolver>) -> Result<Self> {
        Self::neu(BridgeConfig::aus_umgebung()?, resolver)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn registry(&self) -> &FrameCryptorRegistry {
        self.dispatcher.registry()
    }

    /// Verarbeitet einen Methodenaufruf des Hosts
    ///
    /// `None`: Methode gehoert nicht zu framecrypt.
    pub fn handle_method_call(
        &self,
        methode: &str,
        argumente: &Value,
    ) -> Option<std::result::Result<Value, MethodError>> {
        self.dispatcher.handle(methode, argumente)
    }

    /// Name des Event-Kanals eines Cryptors
    pub fn event_channel_name(&self, frame_cryptor_id: &FrameCryptorId) -> String {
        self.config.event_kanal(frame_cryptor_id.as_str())
    }

    /// Abonniert die Events eines Cryptors; gepufferte Events kommen zuerst
    pub fn subscribe_events(
        &self,
        frame_cryptor_id: &FrameCryptorId,
    ) -> framecrypt_core::Result<mpsc::UnboundedReceiver<FrameCryptorEvent>> {
        self.registry().subscribe(frame_cryptor_id)
    }

    /// Haengt einen eigenen Konsumenten an
    pub fn attach_event_sink(
        &self,
        frame_cryptor_id: &FrameCryptorId,
        sink: Box<dyn EventSink>,
    ) -> framecrypt_core::Result<bool> {
        self.registry().attach_observer(frame_cryptor_id, sink)
    }

    /// Host hat den Event-Kanal geschlossen
    pub fn detach_event_sink(&self, frame_cryptor_id: &FrameCryptorId) -> framecrypt_core::Result<()> {
        self.registry().detach_observer(frame_cryptor_id)
    }

    /// Prometheus-Text, `None` wenn Metriken deaktiviert sind
    pub fn metriken_exportieren(&self) -> Option<Result<String>> {
        self.metrics.as_ref().map(|m| m.exportieren())
    }

    /// Entsorgt alle Cryptors und KeyManager
    pub fn shutdown(&self) {
        self.registry().shutdown();
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}
