//! Key-Ratchet
//!
//! Leitet aus dem aktuellen Schluessel eines Slots deterministisch den
//! naechsten ab (HKDF-SHA256). Alle Teilnehmer die denselben Schluessel
//! und dasselbe Salt kennen, kommen zum selben Ergebnis, ohne dass der
//! neue Schluessel verteilt werden muss.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};
use crate::types::SecretBytes;

/// HKDF-Info fuer den Ratchet-Schritt
const RATCHET_INFO: &[u8] = b"framecrypt-ratchet-v1";

/// HKDF-basierte Key Derivation (allgemein verwendbar)
pub fn hkdf_derive(ikm: &[u8], salt: &[u8], info: &[u8], len: usize) -> CryptoResult<Vec<u8>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = vec![0u8; len];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(okm)
}

/// Ein Ratchet-Schritt: neuer Schluessel gleicher Laenge
pub fn ratchet_key_material(current: &SecretBytes, salt: &[u8]) -> CryptoResult<SecretBytes> {
    if current.is_empty() {
        return Err(CryptoError::KeyDerivation(
            "Leerer Schluessel kann nicht geratcheted werden".to_string(),
        ));
    }
    let next = hkdf_derive(current.as_bytes(), salt, RATCHET_INFO, current.len())?;
    Ok(SecretBytes::new(next))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratchet_ist_deterministisch() {
        let key = SecretBytes::new(vec![0x11; 16]);
        let a = ratchet_key_material(&key, b"FrameCryptorRatchet").unwrap();
        let b = ratchet_key_material(&key, b"FrameCryptorRatchet").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert_ne!(a.as_bytes(), key.as_bytes());
    }

    #[test]
    fn salt_beeinflusst_ergebnis() {
        let key = SecretBytes::new(vec![0x22; 32]);
        let a = ratchet_key_material(&key, b"salt-a").unwrap();
        let b = ratchet_key_material(&key, b"salt-b").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn zwei_schritte_ergeben_neuen_schluessel() {
        let key = SecretBytes::new(vec![0x33; 16]);
        let eins = ratchet_key_material(&key, b"s").unwrap();
        let zwei = ratchet_key_material(&eins, b"s").unwrap();
        assert_ne!(eins, zwei);
    }

    #[test]
    fn leerer_schluessel_wird_abgelehnt() {
        let result = ratchet_key_material(&SecretBytes::new(Vec::new()), b"s");
        assert!(matches!(result, Err(CryptoError::KeyDerivation(_))));
    }

    #[test]
    fn hkdf_zu_lange_ausgabe_schlaegt_fehl() {
        // HKDF-SHA256 liefert maximal 255 * 32 Bytes
        assert!(hkdf_derive(b"ikm", b"salt", b"info", 255 * 32 + 1).is_err());
    }
}
