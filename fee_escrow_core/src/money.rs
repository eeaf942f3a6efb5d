// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fixed-point currency helpers.
//!
//! Amounts are held as integer minor units of a 6-decimal stablecoin. Fee math
//! never touches floating point; a float is rounded to minor units exactly once
//! at the boundary.

use std::str::FromStr;

use alloy::primitives::U256;
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};

use crate::{Error, Result};

pub const USDC_DECIMALS: u32 = 6;
pub const MINOR_UNITS_PER_UNIT: u128 = 1_000_000;
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Parses a decimal amount such as `"1234.56"` into minor units.
///
/// Digits past the sixth decimal are rounded half away from zero.
///
/// # Errors
///
/// Returns [`Error::InvalidAmount`] for negative, empty or malformed input.
pub fn to_minor_units(amount: &str) -> Result<u128> {
    let invalid = || Error::InvalidAmount {
        amount: amount.to_owned(),
    };
    let decimal = Decimal::from_str(amount.trim()).map_err(|_| invalid())?;
    decimal_to_minor_units(decimal).ok_or_else(invalid)
}

/// Converts a human-entered float into minor units.
///
/// The value is rounded to six decimals before it is scaled, so binary
/// representation drift (`0.1 + 0.2`) never leaks into the integer.
pub fn to_minor_units_f64(amount: f64) -> Result<u128> {
    let invalid = || Error::InvalidAmount {
        amount: amount.to_string(),
    };
    if !amount.is_finite() {
        return Err(invalid());
    }
    let decimal = Decimal::from_f64_retain(amount).ok_or_else(invalid)?;
    decimal_to_minor_units(decimal).ok_or_else(invalid)
}

fn decimal_to_minor_units(decimal: Decimal) -> Option<u128> {
    if decimal.is_sign_negative() && !decimal.is_zero() {
        return None;
    }
    decimal
        .round_dp_with_strategy(USDC_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::from(MINOR_UNITS_PER_UNIT))?
        .to_u128()
}

/// Formats minor units as a decimal string with trailing zeros trimmed.
pub fn to_decimal_string(minor_units: u128) -> String {
    let whole = minor_units / MINOR_UNITS_PER_UNIT;
    let fraction = minor_units % MINOR_UNITS_PER_UNIT;
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{fraction:06}");
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}

/// `floor(amount * bps / 10000)`, truncating the way the contract does.
pub fn apply_bps(amount: u128, bps: u32) -> u128 {
    mul_div(amount, u128::from(bps), BPS_DENOMINATOR)
}

/// `floor(a * b / denominator)` without intermediate overflow.
///
/// Saturates at `u128::MAX`; a zero denominator yields zero.
pub(crate) fn mul_div(a: u128, b: u128, denominator: u128) -> u128 {
    if denominator == 0 {
        return 0;
    }
    let product = U256::from(a) * U256::from(b);
    (product / U256::from(denominator)).saturating_to::<u128>()
}
