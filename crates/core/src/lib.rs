//! framecrypt-core – Gemeinsame Typen, Events und Fehlertypen
//!
//! Dieses Crate stellt die Bausteine bereit, die Key-Manager, Frame-Cryptor
//! und Bridge gemeinsam nutzen: opake IDs, die Rolle eines Cryptors,
//! die Zustands-Events und den zentralen Fehler-Enum der Control-Schnittstelle.

pub mod error;
pub mod event;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{FrameCryptorError, Result};
pub use event::{FrameCryptionState, FrameCryptorEvent, EVENT_STATE_CHANGED};
pub use types::{FrameCryptorId, KeyManagerId, Role};
