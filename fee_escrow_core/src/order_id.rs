// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Order identifiers
//!
//! An order identifier binds the economic terms of an order to a 32-byte value
//! the escrow contract uses as its key. It is the keccak256 hash of the ABI
//! encoding of, in order:
//!
//! | field | type |
//! |-------|------|
//! | chain id | `uint256` |
//! | payer | `address` |
//! | market id | `string` |
//! | side (`"buy"` / `"sell"`) | `string` |
//! | size in minor units | `uint256` |
//! | price in basis points, `round(price * 10000)` | `uint256` |
//! | timestamp in milliseconds | `uint256` |
//!
//! Leading with the chain id keeps identical terms on two chains apart. The
//! millisecond timestamp is the only thing separating two otherwise identical
//! orders from the same payer, so two such orders placed within the same
//! millisecond share an identifier and the contract rejects the second one.

use std::{fmt, str::FromStr};

use alloy::{
    primitives::{keccak256, Address, B256, U256},
    sol_types::SolValue,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

/// Economic terms of one order, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEconomics {
    pub chain_id: u64,
    /// `0x`-prefixed account address; mixed case must carry a valid checksum
    pub payer: String,
    /// Opaque market identifier
    pub market_id: String,
    pub side: OrderSide,
    /// Order size in minor units
    pub size: u128,
    /// Price in `[0, 1]`
    pub price: f64,
    pub timestamp_ms: u64,
}

impl OrderEconomics {
    /// Parsed payer address
    pub fn payer_address(&self) -> Result<Address> {
        parse_address(&self.payer)
    }

    /// Price rounded to basis points
    pub fn price_bps(&self) -> Result<u64> {
        price_to_bps(self.price)
    }
}

/// 32-byte order identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderId(pub B256);

impl OrderId {
    pub fn as_b256(&self) -> B256 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = Error;

    /// Accepts exactly 32 bytes of hex, with or without `0x`, and rejects the
    /// all-zero identifier.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidOrderId {
            order_id: s.to_owned(),
        };
        let id = B256::from_str(s.trim()).map_err(|_| invalid())?;
        if id.is_zero() {
            return Err(invalid());
        }
        Ok(Self(id))
    }
}

impl TryFrom<String> for OrderId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<OrderId> for String {
    fn from(id: OrderId) -> Self {
        id.to_string()
    }
}

impl From<OrderId> for B256 {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

/// Derives the order identifier for `economics`.
///
/// # Errors
///
/// Returns [`Error::InvalidPrice`] if the price is outside `[0, 1]` and
/// [`Error::InvalidAddress`] if the payer is not a well-formed address.
pub fn generate_order_id(economics: &OrderEconomics) -> Result<OrderId> {
    let price_bps = price_to_bps(economics.price)?;
    let payer = parse_address(&economics.payer)?;

    let encoded = (
        U256::from(economics.chain_id),
        payer,
        economics.market_id.clone(),
        economics.side.as_str().to_owned(),
        U256::from(economics.size),
        U256::from(price_bps),
        U256::from(economics.timestamp_ms),
    )
        .abi_encode_params();

    Ok(OrderId(keccak256(encoded)))
}

/// Recomputes the identifier for `economics` and compares it to `candidate`.
///
/// Returns `false` for any malformed candidate or invalid economics instead of
/// an error.
pub fn verify_order_id(candidate: &str, economics: &OrderEconomics) -> bool {
    let Ok(candidate) = OrderId::from_str(candidate) else {
        return false;
    };
    generate_order_id(economics)
        .map(|expected| expected == candidate)
        .unwrap_or(false)
}

fn price_to_bps(price: f64) -> Result<u64> {
    if !(0.0..=1.0).contains(&price) {
        return Err(Error::InvalidPrice { price });
    }
    Ok((price * 10_000.0).round() as u64)
}

/// Parses a `0x`-prefixed address.
///
/// All-lowercase and all-uppercase hex is accepted as is; mixed case is
/// treated as EIP-55 and must carry a valid checksum.
pub fn parse_address(raw: &str) -> Result<Address> {
    let invalid = || Error::InvalidAddress {
        address: raw.to_owned(),
    };
    let hex = raw.strip_prefix("0x").ok_or_else(invalid)?;
    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());

    if has_lower && has_upper {
        Address::parse_checksummed(raw, None).map_err(|_| invalid())
    } else {
        Address::from_str(raw).map_err(|_| invalid())
    }
}

#[cfg(test)]
mod order_id_tests {
    use rstest::*;

    use super::*;

    #[fixture]
    fn economics() -> OrderEconomics {
        OrderEconomics {
            chain_id: 137,
            payer: "0xabababababababababababababababababababab".to_owned(),
            market_id: "will-it-rain-tomorrow".to_owned(),
            side: OrderSide::Buy,
            size: 100_000_000,
            price: 0.42,
            timestamp_ms: 1_700_000_000_000,
        }
    }

    #[rstest]
    fn generation_is_deterministic(economics: OrderEconomics) {
        let first = generate_order_id(&economics).unwrap();
        let second = generate_order_id(&economics.clone()).unwrap();
        assert_eq!(first, second);
    }

    #[rstest]
    fn matches_manual_encoding(economics: OrderEconomics) {
        let id = generate_order_id(&economics).unwrap();

        let payer = parse_address(&economics.payer).unwrap();
        let mut manual = Vec::new();
        manual.extend_from_slice(&U256::from(137u64).to_be_bytes::<32>());
        manual.extend_from_slice(B256::left_padding_from(payer.as_slice()).as_slice());
        // offsets of the two dynamic strings, in bytes from the start
        manual.extend_from_slice(&U256::from(7 * 32).to_be_bytes::<32>());
        manual.extend_from_slice(&U256::from(9 * 32).to_be_bytes::<32>());
        manual.extend_from_slice(&U256::from(100_000_000u64).to_be_bytes::<32>());
        manual.extend_from_slice(&U256::from(4_200u64).to_be_bytes::<32>());
        manual.extend_from_slice(&U256::from(1_700_000_000_000u64).to_be_bytes::<32>());
        for s in ["will-it-rain-tomorrow", "buy"] {
            manual.extend_from_slice(&U256::from(s.len()).to_be_bytes::<32>());
            let mut padded = s.as_bytes().to_vec();
            padded.resize(32, 0);
            manual.extend_from_slice(&padded);
        }

        assert_eq!(id.0, keccak256(manual));
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::one(1.0)]
    #[case::one_cent(0.01)]
    fn accepts_prices_in_range(mut economics: OrderEconomics, #[case] price: f64) {
        economics.price = price;
        assert!(generate_order_id(&economics).is_ok());
    }

    #[rstest]
    #[case::negative(-0.1)]
    #[case::above_one(1.1)]
    #[case::nan(f64::NAN)]
    fn rejects_prices_out_of_range(mut economics: OrderEconomics, #[case] price: f64) {
        economics.price = price;
        assert!(matches!(
            generate_order_id(&economics),
            Err(Error::InvalidPrice { .. })
        ));
    }

    #[rstest]
    #[case::no_prefix("abababababababababababababababababababab")]
    #[case::too_short("0xabab")]
    #[case::not_hex("0xzzabababababababababababababababababab")]
    #[case::bad_checksum("0xAbababababababababababababababababababab")]
    fn rejects_malformed_payers(mut economics: OrderEconomics, #[case] payer: &str) {
        economics.payer = payer.to_owned();
        assert!(matches!(
            generate_order_id(&economics),
            Err(Error::InvalidAddress { .. })
        ));
    }

    #[rstest]
    fn checksummed_and_lowercase_payers_agree(mut economics: OrderEconomics) {
        economics.payer = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".to_owned();
        let lower = generate_order_id(&economics).unwrap();
        economics.payer = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_owned();
        let checksummed = generate_order_id(&economics).unwrap();
        assert_eq!(lower, checksummed);
    }

    #[rstest]
    fn price_is_bucketed_to_basis_points(mut economics: OrderEconomics) {
        economics.price = 0.42;
        let a = generate_order_id(&economics).unwrap();
        economics.price = 0.420001;
        let b = generate_order_id(&economics).unwrap();
        assert_eq!(a, b);
    }

    #[rstest]
    fn verify_is_a_safe_predicate(economics: OrderEconomics) {
        let id = generate_order_id(&economics).unwrap();

        assert!(verify_order_id(&id.to_string(), &economics));
        assert!(!verify_order_id("0x1234", &economics));
        assert!(!verify_order_id(&B256::ZERO.to_string(), &economics));

        let mut invalid = economics.clone();
        invalid.price = 2.0;
        assert!(!verify_order_id(&id.to_string(), &invalid));
    }

    #[rstest]
    fn order_id_parsing(economics: OrderEconomics) {
        let id = generate_order_id(&economics).unwrap();
        let text = id.to_string();

        assert!(text.starts_with("0x"));
        assert_eq!(text.len(), 66);
        assert_eq!(text.parse::<OrderId>().unwrap(), id);
        assert_eq!(
            serde_json::from_str::<OrderId>(&serde_json::to_string(&id).unwrap()).unwrap(),
            id
        );
        assert!(matches!(
            "0x00".parse::<OrderId>(),
            Err(Error::InvalidOrderId { .. })
        ));
    }

    #[rstest]
    fn side_strings() {
        assert_eq!(OrderSide::Buy.to_string(), "buy");
        assert_eq!("sell".parse::<OrderSide>().unwrap(), OrderSide::Sell);
        assert_eq!(serde_json::to_string(&OrderSide::Sell).unwrap(), "\"sell\"");
    }
}
