//! Prometheus-kompatible Metriken fuer framecrypt
//!
//! Registrierte Metriken:
//! - `framecrypt_frames_encrypted_total` – Counter: Verschluesselte Frames
//! - `framecrypt_frames_decrypted_total` – Counter: Entschluesselte Frames
//! - `framecrypt_frames_passed_through_total` – Counter: Unveraendert weitergereichte Frames
//! - `framecrypt_frames_dropped_total` – Counter: Verworfene Frames
//! - `framecrypt_frame_size_bytes` – Histogram: Groesse der eingehenden Frames
//! - `framecrypt_state_transitions_total` – Counter: Zustandswechsel (state)
//! - `framecrypt_key_managers_active` – Gauge: Lebende KeyManager
//! - `framecrypt_frame_cryptors_active` – Gauge: Lebende Frame-Cryptors

use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Alle framecrypt-Prometheus-Metriken
///
/// Jede Instanz hat eine eigene Registry, damit mehrere Bridges in einem
/// Prozess (und parallele Tests) sich nicht gegenseitig zaehlen.
#[derive(Clone)]
pub struct CryptorMetrics {
    pub registry: Arc<Registry>,

    // Frame-Metriken
    pub frames_encrypted: IntCounter,
    pub frames_decrypted: IntCounter,
    pub frames_passed_through: IntCounter,
    pub frames_dropped: IntCounter,
    pub frame_size_bytes: Histogram,

    // Zustands-Metriken
    pub state_transitions: IntCounterVec,

    // Lebenszyklus
    pub key_managers_active: IntGauge,
    pub frame_cryptors_active: IntGauge,
}

impl CryptorMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        // --- Frame-Metriken ---
        let frames_encrypted = IntCounter::with_opts(Opts::new(
            "framecrypt_frames_encrypted_total",
            "Anzahl verschluesselter Frames",
        ))?;
        registry.register(Box::new(frames_encrypted.clone()))?;

        let frames_decrypted = IntCounter::with_opts(Opts::new(
            "framecrypt_frames_decrypted_total",
            "Anzahl entschluesselter Frames",
        ))?;
        registry.register(Box::new(frames_decrypted.clone()))?;

        let frames_passed_through = IntCounter::with_opts(Opts::new(
            "framecrypt_frames_passed_through_total",
            "Anzahl unveraendert weitergereichter Frames",
        ))?;
        registry.register(Box::new(frames_passed_through.clone()))?;

        let frames_dropped = IntCounter::with_opts(Opts::new(
            "framecrypt_frames_dropped_total",
            "Anzahl verworfener Frames",
        ))?;
        registry.register(Box::new(frames_dropped.clone()))?;

        let frame_size_bytes = Histogram::with_opts(
            HistogramOpts::new("framecrypt_frame_size_bytes", "Groesse eingehender Frames in Bytes")
                .buckets(vec![64.0, 256.0, 1024.0, 4096.0, 16384.0, 65536.0, 262144.0]),
        )?;
        registry.register(Box::new(frame_size_bytes.clone()))?;

        // --- Zustands-Metriken ---
        let state_transitions = IntCounterVec::new(
            Opts::new(
                "framecrypt_state_transitions_total",
                "Gemeldete Zustandswechsel der Frame-Cryptors",
            ),
            &["state"],
        )?;
        registry.register(Box::new(state_transitions.clone()))?;

        // --- Lebenszyklus ---
        let key_managers_active = IntGauge::with_opts(Opts::new(
            "framecrypt_key_managers_active",
            "Anzahl lebender KeyManager",
        ))?;
        registry.register(Box::new(key_managers_active.clone()))?;

        let frame_cryptors_active = IntGauge::with_opts(Opts::new(
            "framecrypt_frame_cryptors_active",
            "Anzahl lebender Frame-Cryptors",
        ))?;
        registry.register(Box::new(frame_cryptors_active.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            frames_encrypted,
            frames_decrypted,
            frames_passed_through,
            frames_dropped,
            frame_size_bytes,
            state_transitions,
            key_managers_active,
            frame_cryptors_active,
        })
    }

    /// Zaehlt einen Zustandswechsel
    pub fn zustand_gemeldet(&self, state: &str) {
        self.state_transitions.with_label_values(&[state]).inc();
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl std::fmt::Debug for CryptorMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptorMetrics")
            .field("frames_encrypted", &self.frames_encrypted.get())
            .field("frames_decrypted", &self.frames_decrypted.get())
            .field("frames_dropped", &self.frames_dropped.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metriken_erstellen_erfolgreich() {
        let metriken = CryptorMetrics::neu().unwrap();
        assert!(!metriken.registry.gather().is_empty());
    }

    #[test]
    fn zwei_instanzen_sind_unabhaengig() {
        let a = CryptorMetrics::neu().unwrap();
        let b = CryptorMetrics::neu().unwrap();
        a.frames_encrypted.inc();
        assert_eq!(a.frames_encrypted.get(), 1);
        assert_eq!(b.frames_encrypted.get(), 0);
    }

    #[test]
    fn zustandswechsel_mit_labels() {
        let metriken = CryptorMetrics::neu().unwrap();
        metriken.zustand_gemeldet("ok");
        metriken.zustand_gemeldet("ok");
        metriken.zustand_gemeldet("missingKey");

        assert_eq!(metriken.state_transitions.with_label_values(&["ok"]).get(), 2);
        assert_eq!(
            metriken.state_transitions.with_label_values(&["missingKey"]).get(),
            1
        );
    }

    #[test]
    fn gauges_hoch_und_runter() {
        let metriken = CryptorMetrics::neu().unwrap();
        metriken.frame_cryptors_active.inc();
        metriken.frame_cryptors_active.inc();
        metriken.frame_cryptors_active.dec();
        assert_eq!(metriken.frame_cryptors_active.get(), 1);
    }

    #[test]
    fn metriken_export_prometheus_format() {
        let metriken = CryptorMetrics::neu().unwrap();
        metriken.frames_dropped.inc();
        metriken.frame_size_bytes.observe(1200.0);
        metriken.zustand_gemeldet("decryptionFailed");

        let output = metriken.exportieren().unwrap();
        assert!(output.contains("framecrypt_frames_dropped_total 1"));
        assert!(output.contains("framecrypt_frame_size_bytes"));
        assert!(output.contains("state=\"decryptionFailed\""));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }
}
