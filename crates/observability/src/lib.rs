//! # framecrypt-observability
//!
//! Observability-Crate fuer framecrypt:
//! - Prometheus-kompatible Metriken der Frame-Cryptors
//! - Structured Logging (Text oder JSON) via tracing-subscriber

pub mod logging;
pub mod metrics;

pub use logging::{filter_gueltig, format_gueltig, logging_initialisieren};
pub use metrics::CryptorMetrics;
