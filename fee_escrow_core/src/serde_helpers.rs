// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Serde helpers for amounts handed to JavaScript-facing services

/// Serializes a `u128` as a decimal string so it survives JSON parsers that
/// read every number as a double. Deserialization accepts both forms.
pub mod u128_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        match StringOrNumber::deserialize(deserializer)? {
            StringOrNumber::String(s) => s
                .parse::<u128>()
                .map_err(|_| de::Error::custom(format!("Invalid amount: {s}"))),
            StringOrNumber::Number(n) => Ok(n as u128),
        }
    }
}
