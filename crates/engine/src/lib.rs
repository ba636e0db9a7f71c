//! # framecrypt-engine
//!
//! Laufzeit der Frame-Verschluesselung:
//! - `cryptor` - FrameCryptor pro Sender/Empfaenger und der Per-Frame-Transform
//! - `observer` - Zustands-Events mit Puffer solange kein Konsument haengt
//! - `registry` - Opake IDs auf lebende KeyManager und Frame-Cryptors
//! - `endpoint` - Schnittstelle zur Media-Pipeline
//! - `policy` - Verhalten bei deaktivierten Cryptors, fehlenden Schluesseln und Cipher-Fehlern

pub mod cryptor;
pub mod endpoint;
pub mod observer;
pub mod policy;
pub mod registry;

pub use cryptor::{FrameCryptor, FrameTransformer};
pub use endpoint::{EndpointRef, EndpointResolver, EndpointTable, MediaEndpoint, PipelineEndpoint};
pub use observer::{EventSink, StateObserver, DEFAULT_MAX_BUFFERED_EVENTS};
pub use policy::{CryptorPolicy, FrameAction, TransformResult};
pub use registry::{FrameCryptorRegistry, RegistryConfig};
