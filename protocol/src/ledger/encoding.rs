//! Wire encodings.
//!
//! Two concerns live here: the serde adapters for the node's JSON quirks
//! (base64 byte fields, heights as strings, `null` lists), and the opaque
//! string that carries an [`AccountBlock`] between construction stages,
//! which is the block's JSON encoded as standard base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer};

use super::{AccountBlock, LedgerError};

/// Encode a block into the opaque inter-stage payload.
pub fn encode_block(block: &AccountBlock) -> Result<String, LedgerError> {
    let json = serde_json::to_vec(block).map_err(|e| LedgerError::Encoding(e.to_string()))?;
    Ok(STANDARD.encode(json))
}

/// Decode an inter-stage payload back into a block.
pub fn decode_block(payload: &str) -> Result<AccountBlock, LedgerError> {
    let json = STANDARD
        .decode(payload.trim())
        .map_err(|e| LedgerError::Encoding(format!("invalid base64: {}", e)))?;
    serde_json::from_slice(&json).map_err(|e| LedgerError::Encoding(format!("invalid block: {}", e)))
}

/// Decode a standard base64 string.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, LedgerError> {
    STANDARD
        .decode(text)
        .map_err(|e| LedgerError::Encoding(format!("invalid base64: {}", e)))
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Treat JSON `null` as the type's default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `Vec<u8>` as base64; `null` or absent reads as empty.
pub mod base64_bytes {
    use super::*;
    use serde::{de, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => STANDARD.decode(text).map_err(de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

/// `Option<Vec<u8>>` as base64; `null` and `""` read as `None`.
pub mod base64_opt {
    use super::*;
    use serde::{de, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) if !text.is_empty() => {
                STANDARD.decode(text).map(Some).map_err(de::Error::custom)
            }
            _ => Ok(None),
        }
    }
}

/// `u64` written as a decimal string, read from either a string or a
/// number. `null` reads as zero.
pub mod u64_string {
    use super::*;
    use serde::{de, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(text) if text.is_empty() => Ok(0),
            serde_json::Value::String(text) => text.parse().map_err(de::Error::custom),
            serde_json::Value::Number(number) => number
                .as_u64()
                .ok_or_else(|| de::Error::custom(format!("{} is not a valid height", number))),
            serde_json::Value::Null => Ok(0),
            other => Err(de::Error::custom(format!("{} is not a valid height", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Probe {
        #[serde(default, with = "base64_bytes")]
        key: Vec<u8>,
        #[serde(default, with = "base64_opt")]
        data: Option<Vec<u8>>,
        #[serde(with = "u64_string")]
        height: u64,
        #[serde(default, deserialize_with = "null_as_default")]
        list: Vec<u32>,
    }

    #[test]
    fn test_node_quirks() {
        let probe: Probe =
            serde_json::from_str(r#"{"key":null,"data":"","height":"17","list":null}"#).unwrap();
        assert_eq!(
            probe,
            Probe {
                key: vec![],
                data: None,
                height: 17,
                list: vec![]
            }
        );

        let numeric: Probe = serde_json::from_str(r#"{"data":"AQI=","height":5}"#).unwrap();
        assert_eq!(numeric.data, Some(vec![1, 2]));
        assert_eq!(numeric.height, 5);
    }

    #[test]
    fn test_height_serializes_as_string() {
        let probe = Probe {
            key: vec![0xff],
            data: None,
            height: 9,
            list: vec![],
        };
        let json = serde_json::to_value(&probe).unwrap();
        assert_eq!(json["height"], "9");
        assert_eq!(json["key"], "/w==");
    }

    #[test]
    fn test_decode_block_rejects_garbage() {
        assert!(decode_block("!!!not base64!!!").is_err());
        assert!(decode_block(&STANDARD.encode(b"{\"blockType\": 99}")).is_err());
    }
}
