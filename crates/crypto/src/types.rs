//! Gemeinsame Typen fuer das Kryptografie-Subsystem

use serde::{Deserialize, Serialize};

/// Sicherer Schluessel-Container (wird beim Drop genullt)
#[derive(Clone, PartialEq, Eq)]
pub struct SecretBytes(Vec<u8>);

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes([REDACTED] {} bytes)", self.0.len())
    }
}

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Frame-Verschluesselungs-Algorithmus
///
/// Die Host-Schnittstelle uebergibt den Algorithmus als Integer-Code.
/// Unbekannte Codes fallen deterministisch auf AES-GCM zurueck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    AesGcm,
    AesCbc,
}

impl Algorithm {
    /// 0 = AES-GCM, 1 = AES-CBC, alles andere = AES-GCM
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::AesCbc,
            _ => Self::AesGcm,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::AesGcm => 0,
            Self::AesCbc => 1,
        }
    }

    /// Laenge des IV, den der Algorithmus pro Frame erzeugt
    pub fn iv_len(&self) -> usize {
        match self {
            Self::AesGcm => 12,
            Self::AesCbc => 16,
        }
    }
}

/// Verschluesselter Frame (Ciphertext + IV)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedFrame {
    /// Verschluesselter Inhalt (bei GCM inkl. 16 Bytes Auth-Tag)
    pub ciphertext: Vec<u8>,
    /// 12 Bytes (GCM) bzw. 16 Bytes (CBC)
    pub iv: Vec<u8>,
}

impl EncryptedFrame {
    /// Serialisiert zu Bytes: [ciphertext] + [iv] + [iv_len(1)]
    ///
    /// Der IV steht hinten, damit ein Empfaenger ohne Kenntnis der
    /// Frame-Laenge den Trailer vom Ende her lesen kann.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.ciphertext.len() + self.iv.len() + 1);
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.iv);
        out.push(self.iv.len() as u8);
        out
    }

    /// Deserialisiert aus Bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&iv_len, rest) = bytes.split_last()?;
        let iv_len = iv_len as usize;
        if iv_len == 0 || rest.len() < iv_len {
            return None;
        }
        let (ciphertext, iv) = rest.split_at(rest.len() - iv_len);
        Some(Self {
            ciphertext: ciphertext.to_vec(),
            iv: iv.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithmus_aus_code() {
        assert_eq!(Algorithm::from_code(0), Algorithm::AesGcm);
        assert_eq!(Algorithm::from_code(1), Algorithm::AesCbc);
        // Unbekannte Codes: Standard AES-GCM
        assert_eq!(Algorithm::from_code(2), Algorithm::AesGcm);
        assert_eq!(Algorithm::from_code(-1), Algorithm::AesGcm);
    }

    #[test]
    fn algorithmus_serde_snake_case() {
        let json = serde_json::to_string(&Algorithm::AesCbc).unwrap();
        assert_eq!(json, "\"aes_cbc\"");
        let alg: Algorithm = serde_json::from_str("\"aes_gcm\"").unwrap();
        assert_eq!(alg, Algorithm::AesGcm);
        assert_eq!(Algorithm::default().code(), 0);
    }

    #[test]
    fn secret_bytes_debug_ist_geschwaerzt() {
        let s = SecretBytes::new(vec![0xAA; 16]);
        let dbg = format!("{s:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("170"));
    }

    #[test]
    fn frame_trailer_lesen() {
        let frame = EncryptedFrame {
            ciphertext: vec![1, 2, 3, 4, 5],
            iv: vec![9; 12],
        };
        let bytes = frame.to_bytes();
        assert_eq!(bytes.len(), 5 + 12 + 1);
        assert_eq!(*bytes.last().unwrap(), 12);
        assert_eq!(EncryptedFrame::from_bytes(&bytes), Some(frame));
    }

    #[test]
    fn zu_kurzer_frame_ergibt_none() {
        assert!(EncryptedFrame::from_bytes(&[]).is_none());
        assert!(EncryptedFrame::from_bytes(&[1, 2, 12]).is_none());
        assert!(EncryptedFrame::from_bytes(&[1, 2, 0]).is_none());
    }
}
