//! Structured Logging via tracing-subscriber
//!
//! Umgebungsvariablen ueberschreiben die Werte aus der Konfigurationsdatei:
//! - `FC_LOG_LEVEL`: Level oder EnvFilter-Direktive (z.B. `framecrypt_engine=debug`)
//! - `FC_LOG_FORMAT`: `text` oder `json`

use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "FC_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "FC_LOG_FORMAT";

/// Level und Format nach Anwendung der Umgebung
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WirksamesLogging {
    pub filter: String,
    pub format: String,
}

impl WirksamesLogging {
    pub fn ermitteln(level: &str, format: &str) -> Self {
        Self {
            filter: std::env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| level.to_string()),
            format: std::env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| format.to_string()),
        }
    }
}

/// Setzt den globalen Subscriber.
///
/// Hat der einbettende Host schon einen Subscriber gesetzt, bleibt dieser
/// aktiv und es wird `false` zurueckgegeben.
pub fn logging_initialisieren(level: &str, format: &str) -> bool {
    let wirksam = WirksamesLogging::ermitteln(level, format);
    let filter = EnvFilter::try_new(&wirksam.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let ergebnis = if wirksam.format == "json" {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_thread_ids(true)
            .try_init()
    } else {
        fmt().with_env_filter(filter).with_target(true).try_init()
    };

    if let Err(e) = ergebnis {
        tracing::debug!("Subscriber bereits gesetzt: {e}");
        return false;
    }
    tracing::debug!(filter = %wirksam.filter, format = %wirksam.format, "Logging aktiv");
    true
}

/// Level oder EnvFilter-Direktive
pub fn filter_gueltig(level: &str) -> bool {
    !level.trim().is_empty() && EnvFilter::try_new(level).is_ok()
}

pub fn format_gueltig(format: &str) -> bool {
    format == "text" || format == "json"
}
