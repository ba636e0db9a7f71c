//! E2E Frame-Verschluesselung
//!
//! Medien-Frames werden zwischen Encoder und Packetizer verschluesselt,
//! sodass ein SFU die Nutzdaten weiterleiten, aber nicht lesen kann.
//!
//! ## Ablauf
//! 1. Die Anwendung setzt Schluessel pro Teilnehmer und Slot im `KeyManager`
//! 2. Der Frame-Cryptor waehlt den Slot ueber seinen Key-Index
//! 3. Sender verschluesseln mit `encrypt_frame`, Empfaenger entschluesseln mit `decrypt_frame`
//! 4. Rotation: neuer Schluessel in einem anderen Slot oder `ratchet_key` im selben Slot

pub mod cipher;
pub mod decrypt;
pub mod encrypt;
pub mod key_manager;
pub mod ratchet;

pub use cipher::{AesFrameCipher, FrameCipher};
pub use decrypt::{decrypt_frame, decrypt_frame_bytes};
pub use encrypt::encrypt_frame;
pub use key_manager::{KeyManager, KeyManagerOptions};
pub use ratchet::{hkdf_derive, ratchet_key_material};
