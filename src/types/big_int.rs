//! Serde support for contract integers.
//!
//! The stellar CLI prints `i128` values as JSON strings, small values may
//! also come through as plain numbers. Values are always written back as
//! strings so no JavaScript client loses precision.

use std::str::FromStr;

use num_bigint::BigInt;
use serde::{de, Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Str(String),
    Signed(i64),
    Unsigned(u64),
}

pub fn serialize<S>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigInt, D::Error>
where
    D: Deserializer<'de>,
{
    match Repr::deserialize(deserializer)? {
        Repr::Str(value) => BigInt::from_str(value.trim()).map_err(de::Error::custom),
        Repr::Signed(value) => Ok(BigInt::from(value)),
        Repr::Unsigned(value) => Ok(BigInt::from(value)),
    }
}

/// Parses the bare integer output of a contract call, e.g. `"42"`.
pub fn parse_output(output: &str) -> Result<BigInt, crate::error::Error> {
    let value = output.trim().trim_matches('"');
    Ok(BigInt::from_str(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super")]
        value: BigInt,
    }

    #[test]
    fn test_deserialize_string_and_number() {
        let w: Wrapper =
            serde_json::from_str(r#"{"value":"170141183460469231731687303715884105727"}"#)
                .unwrap();
        assert_eq!(w.value.to_string(), "170141183460469231731687303715884105727");

        let w: Wrapper = serde_json::from_str(r#"{"value":-12}"#).unwrap();
        assert_eq!(w.value, BigInt::from(-12));
    }

    #[test]
    fn test_serialize_as_string() {
        let w = Wrapper {
            value: BigInt::from(450_000),
        };
        assert_eq!(serde_json::to_string(&w).unwrap(), r#"{"value":"450000"}"#);
    }

    #[test]
    fn test_parse_output() {
        assert_eq!(parse_output("\"1200\"\n").unwrap(), BigInt::from(1200));
        assert_eq!(parse_output("7").unwrap(), BigInt::from(7));
        assert!(parse_output("null").is_err());
    }
}
