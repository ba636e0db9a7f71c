//! Lesen der Methoden-Argumente
//!
//! Der Host schickt eine JSON-Map. Schluessel kommen entweder als
//! Integer-Array (0..=255) oder als Base64-String.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use framecrypt_core::FrameCryptorError;
use serde_json::{Map, Value};

type ParamResult<T> = Result<T, FrameCryptorError>;

fn fehlt(name: &str) -> FrameCryptorError {
    FrameCryptorError::InvalidArgument(format!("{name} fehlt"))
}

fn falscher_typ(name: &str, erwartet: &str) -> FrameCryptorError {
    FrameCryptorError::InvalidArgument(format!("{name} muss {erwartet} sein"))
}

/// Sicht auf die Argument-Map eines Aufrufs
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Params<'a> {
    /// `None` wenn die Argumente keine Map sind
    pub fn aus_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(|map| Self { map })
    }

    fn wert(&self, name: &str) -> Option<&'a Value> {
        self.map.get(name).filter(|v| !v.is_null())
    }

    pub fn string(&self, name: &str) -> ParamResult<&'a str> {
        let wert = self.wert(name).ok_or_else(|| fehlt(name))?;
        let s = wert.as_str().ok_or_else(|| falscher_typ(name, "ein String"))?;
        if s.is_empty() {
            return Err(fehlt(name));
        }
        Ok(s)
    }

    /// Leere Strings zaehlen als nicht gesetzt
    pub fn optional_string(&self, name: &str) -> ParamResult<Option<&'a str>> {
        match self.wert(name) {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(|s| (!s.is_empty()).then_some(s))
                .ok_or_else(|| falscher_typ(name, "ein String")),
        }
    }

    pub fn int(&self, name: &str) -> ParamResult<i64> {
        self.wert(name)
            .ok_or_else(|| fehlt(name))?
            .as_i64()
            .ok_or_else(|| falscher_typ(name, "eine Ganzzahl"))
    }

    pub fn int_oder(&self, name: &str, standard: i64) -> ParamResult<i64> {
        match self.wert(name) {
            None => Ok(standard),
            Some(v) => v.as_i64().ok_or_else(|| falscher_typ(name, "eine Ganzzahl")),
        }
    }

    /// Slot-Index, nicht negativ
    pub fn slot(&self, name: &str) -> ParamResult<usize> {
        let wert = self.int(name)?;
        usize::try_from(wert).map_err(|_| {
            FrameCryptorError::InvalidArgument(format!("{name} darf nicht negativ sein: {wert}"))
        })
    }

    pub fn bool(&self, name: &str) -> ParamResult<bool> {
        self.wert(name)
            .ok_or_else(|| fehlt(name))?
            .as_bool()
            .ok_or_else(|| falscher_typ(name, "ein Bool"))
    }

    pub fn bytes(&self, name: &str) -> ParamResult<Vec<u8>> {
        let wert = self.wert(name).ok_or_else(|| fehlt(name))?;
        bytes_aus_value(name, wert)
    }

    /// Liste von Schluesseln; `null`-Eintraege werden zu leeren Slots
    pub fn bytes_liste(&self, name: &str) -> ParamResult<Vec<Vec<u8>>> {
        let liste = self
            .wert(name)
            .ok_or_else(|| fehlt(name))?
            .as_array()
            .ok_or_else(|| falscher_typ(name, "eine Liste"))?;

        liste
            .iter()
            .map(|eintrag| {
                if eintrag.is_null() {
                    Ok(Vec::new())
                } else {
                    bytes_aus_value(name, eintrag)
                }
            })
            .collect()
    }
}

fn bytes_aus_value(name: &str, wert: &Value) -> ParamResult<Vec<u8>> {
    match wert {
        Value::String(s) => STANDARD
            .decode(s)
            .map_err(|e| FrameCryptorError::InvalidArgument(format!("{name}: ungueltiges Base64: {e}"))),
        Value::Array(werte) => werte
            .iter()
            .map(|v| {
                v.as_u64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| falscher_typ(name, "eine Liste von Bytes (0..=255)"))
            })
            .collect(),
        _ => Err(falscher_typ(name, "ein Byte-Array oder Base64-String")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strings_und_zahlen() {
        let v = json!({"id": "km-1", "leer": "", "index": 3, "neg": -1, "an": true});
        let p = Params::aus_value(&v).unwrap();

        assert_eq!(p.string("id").unwrap(), "km-1");
        assert!(p.string("leer").is_err());
        assert!(p.string("fehlt").is_err());
        assert_eq!(p.optional_string("leer").unwrap(), None);
        assert_eq!(p.optional_string("fehlt").unwrap(), None);
        assert_eq!(p.int("index").unwrap(), 3);
        assert_eq!(p.int_oder("fehlt", 0).unwrap(), 0);
        assert_eq!(p.slot("index").unwrap(), 3);
        assert!(p.slot("neg").is_err());
        assert!(p.bool("an").unwrap());
        assert!(p.int("id").is_err());
    }

    #[test]
    fn bytes_als_array_oder_base64() {
        let v = json!({"a": [1, 2, 255], "b": "AQL/", "c": [256], "d": "%%%"});
        let p = Params::aus_value(&v).unwrap();

        assert_eq!(p.bytes("a").unwrap(), vec![1, 2, 255]);
        assert_eq!(p.bytes("b").unwrap(), vec![1, 2, 255]);
        assert!(p.bytes("c").is_err());
        assert!(p.bytes("d").is_err());
    }

    #[test]
    fn bytes_liste_mit_luecken() {
        let v = json!({"keys": [[1, 2], null, [], "Aw=="]});
        let p = Params::aus_value(&v).unwrap();
        assert_eq!(
            p.bytes_liste("keys").unwrap(),
            vec![vec![1, 2], Vec::new(), Vec::new(), vec![3]]
        );
    }

    #[test]
    fn keine_map() {
        assert!(Params::aus_value(&json!([1, 2])).is_none());
        assert!(Params::aus_value(&Value::Null).is_none());
    }
}
