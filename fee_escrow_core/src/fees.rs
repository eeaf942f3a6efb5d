// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Fee calculator
//!
//! Platform and affiliate rates are independent basis-point rates charged on
//! the same base amount, not a split of one rate. A minimum fee floor keeps
//! tiny orders from paying nothing, and a cap bounds large ones.
//!
//! Two floor strategies exist, plus a legacy split of a single rate:
//!
//! - [`FeeMode::Independent`]: each side is computed on its own and the platform
//!   absorbs whatever is missing to reach the floor. The affiliate always keeps
//!   its computed share.
//! - [`FeeMode::Proportional`]: the legacy mode. Both shares are rescaled so
//!   their sum equals the floor while keeping their ratio.
//! - [`FeeMode::Split`]: the older affiliate program. `platform_bps` is the
//!   whole fee rate and `affiliate_bps` is the affiliate's share of that fee,
//!   in basis points of the fee rather than of the base.
//!
//! Every function here is pure integer math mirroring the contract's
//! truncating division.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::money::{apply_bps, mul_div, BPS_DENOMINATOR};

pub const DEFAULT_ORDER_FEE_BPS: u32 = 25;
pub const DEFAULT_PERFORMANCE_FEE_BPS: u32 = 500;
/// $0.01
pub const DEFAULT_MIN_FEE: u128 = 10_000;
/// $10,000
pub const DEFAULT_MAX_FEE: u128 = 10_000_000_000;

/// Platform and affiliate shares of one fee, in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub platform: u128,
    pub affiliate: u128,
}

impl FeeBreakdown {
    pub fn new(platform: u128, affiliate: u128) -> Self {
        Self {
            platform,
            affiliate,
        }
    }

    pub fn total(&self) -> u128 {
        self.platform.saturating_add(self.affiliate)
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }
}

/// Floor strategy applied when the computed fee is below the minimum.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeeMode {
    #[default]
    Independent,
    Proportional,
    Split,
}

/// Which fee an authorization covers.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeeKind {
    /// Charged on every order, on the order size
    #[default]
    Order,
    /// Charged only on winning settlement, on the payout
    Performance,
}

/// Computes both shares independently; the platform absorbs the floor.
pub fn calculate_independent(
    size: u128,
    platform_bps: u32,
    affiliate_bps: u32,
    min_fee: u128,
) -> FeeBreakdown {
    let mut fees = FeeBreakdown::new(apply_bps(size, platform_bps), apply_bps(size, affiliate_bps));
    let total = fees.total();
    if total < min_fee {
        fees.platform += min_fee - total;
    }
    fees
}

/// Legacy floor handling: rescales both shares so they sum to `min_fee`.
///
/// The scale factor is computed against a fixed denominator of 10000 and the
/// affiliate receives the remainder, so the sum is exactly `min_fee`. A zero
/// computed fee gives the whole floor to the platform.
pub fn calculate_proportional(
    size: u128,
    platform_bps: u32,
    affiliate_bps: u32,
    min_fee: u128,
) -> FeeBreakdown {
    let fees = FeeBreakdown::new(apply_bps(size, platform_bps), apply_bps(size, affiliate_bps));
    let total = fees.total();
    if total >= min_fee {
        return fees;
    }
    if total == 0 {
        return FeeBreakdown::new(min_fee, 0);
    }

    let scale = mul_div(min_fee, BPS_DENOMINATOR, total);
    let platform = mul_div(fees.platform, scale, BPS_DENOMINATOR).min(min_fee);
    FeeBreakdown::new(platform, min_fee - platform)
}

/// Splits an already computed fee, giving the affiliate
/// `affiliate_share_bps` of it. The platform keeps the rounding remainder.
pub fn split_fee(total: u128, affiliate_share_bps: u32) -> FeeBreakdown {
    let affiliate = apply_bps(total, affiliate_share_bps.min(BPS_DENOMINATOR as u32));
    FeeBreakdown::new(total - affiliate, affiliate)
}

/// Reduces `fees` to at most `max_fee`, keeping the ratio; the platform takes
/// the rounding remainder.
pub fn clamp_to_max(fees: FeeBreakdown, max_fee: u128) -> FeeBreakdown {
    let total = fees.total();
    if total <= max_fee {
        return fees;
    }
    let affiliate = mul_div(fees.affiliate, max_fee, total);
    FeeBreakdown::new(max_fee - affiliate, affiliate)
}

/// Rates and bounds for one fee kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub platform_bps: u32,
    pub affiliate_bps: u32,
    pub min_fee: u128,
    pub max_fee: u128,
    pub mode: FeeMode,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            platform_bps: DEFAULT_ORDER_FEE_BPS,
            affiliate_bps: 0,
            min_fee: DEFAULT_MIN_FEE,
            max_fee: DEFAULT_MAX_FEE,
            mode: FeeMode::Independent,
        }
    }
}

impl FeeSchedule {
    /// Fee owed on `base`.
    ///
    /// The affiliate rate only applies when an affiliate is attached to the
    /// order. The result is clamped to `max_fee`.
    pub fn compute(&self, base: u128, with_affiliate: bool) -> FeeBreakdown {
        let affiliate_bps = if with_affiliate { self.affiliate_bps } else { 0 };
        let fees = match self.mode {
            FeeMode::Independent => {
                calculate_independent(base, self.platform_bps, affiliate_bps, self.min_fee)
            }
            FeeMode::Proportional => {
                calculate_proportional(base, self.platform_bps, affiliate_bps, self.min_fee)
            }
            FeeMode::Split => {
                split_fee(apply_bps(base, self.platform_bps).max(self.min_fee), affiliate_bps)
            }
        };
        clamp_to_max(fees, self.max_fee)
    }
}

/// Fee schedules of one integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeConfig {
    pub order: FeeSchedule,
    pub performance: FeeSchedule,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            order: FeeSchedule::default(),
            performance: FeeSchedule {
                platform_bps: DEFAULT_PERFORMANCE_FEE_BPS,
                ..FeeSchedule::default()
            },
        }
    }
}

impl FeeConfig {
    pub fn schedule(&self, kind: FeeKind) -> &FeeSchedule {
        match kind {
            FeeKind::Order => &self.order,
            FeeKind::Performance => &self.performance,
        }
    }

    /// Fee of `kind` owed on `base`
    pub fn compute(&self, kind: FeeKind, base: u128, with_affiliate: bool) -> FeeBreakdown {
        self.schedule(kind).compute(base, with_affiliate)
    }
}

#[cfg(test)]
mod fee_tests {
    use rand::{rng, Rng};
    use rstest::*;

    use super::*;
    use crate::money::to_minor_units;

    fn dollars(amount: &str) -> u128 {
        to_minor_units(amount).unwrap()
    }

    #[rstest]
    fn hundred_dollars_at_fifty_bps() {
        let fees = calculate_independent(dollars("100"), 50, 0, dollars("0.01"));
        assert_eq!(fees.platform, dollars("0.50"));
        assert_eq!(fees.affiliate, 0);
        assert_eq!(fees.total(), fees.platform);
    }

    #[rstest]
    fn thirty_five_dollars_with_legacy_split() {
        let total = apply_bps(dollars("35"), 25);
        assert_eq!(total, dollars("0.0875"));

        let fees = split_fee(total, 2_000);
        assert_eq!(fees.affiliate, dollars("0.0175"));
        assert_eq!(fees.platform, dollars("0.07"));
    }

    #[rstest]
    fn split_mode_shares_one_rate() {
        let schedule = FeeSchedule {
            platform_bps: 25,
            affiliate_bps: 2_000,
            mode: FeeMode::Split,
            ..Default::default()
        };
        assert_eq!(
            schedule.compute(dollars("35"), true),
            FeeBreakdown::new(dollars("0.07"), dollars("0.0175"))
        );
        assert_eq!(
            schedule.compute(dollars("35"), false),
            FeeBreakdown::new(dollars("0.0875"), 0)
        );
    }

    #[rstest]
    fn split_mode_splits_the_floor() {
        let schedule = FeeSchedule {
            platform_bps: 25,
            affiliate_bps: 2_000,
            mode: FeeMode::Split,
            ..Default::default()
        };
        // $1 at 25 bps is below the $0.01 floor
        let fees = schedule.compute(dollars("1"), true);
        assert_eq!(fees.total(), dollars("0.01"));
        assert_eq!(fees.affiliate, 2_000);
    }

    #[rstest]
    fn floor_goes_to_platform_when_fee_rounds_to_zero() {
        let fees = calculate_independent(100, 50, 0, dollars("0.01"));
        assert_eq!(fees.platform, dollars("0.01"));
        assert_eq!(fees.affiliate, 0);
    }

    #[rstest]
    fn affiliate_keeps_its_share_below_floor() {
        // $1 at 50 bps platform and 10 bps affiliate is $0.006 combined
        let fees = calculate_independent(dollars("1"), 50, 10, dollars("0.01"));
        assert_eq!(fees.affiliate, 1_000);
        assert_eq!(fees.platform, 9_000);
        assert_eq!(fees.total(), dollars("0.01"));
    }

    #[rstest]
    fn proportional_mode_preserves_ratio() {
        let fees = calculate_proportional(dollars("1"), 50, 10, dollars("0.01"));
        assert_eq!(fees.platform, 8_333);
        assert_eq!(fees.affiliate, 1_667);
        assert_eq!(fees.total(), dollars("0.01"));
    }

    #[rstest]
    fn proportional_mode_with_zero_fee() {
        let fees = calculate_proportional(10, 50, 10, dollars("0.01"));
        assert_eq!(fees, FeeBreakdown::new(dollars("0.01"), 0));
    }

    #[rstest]
    #[case::independent(FeeMode::Independent)]
    #[case::proportional(FeeMode::Proportional)]
    fn above_floor_modes_agree(#[case] mode: FeeMode) {
        let schedule = FeeSchedule {
            platform_bps: 40,
            affiliate_bps: 10,
            mode,
            ..Default::default()
        };
        assert_eq!(
            schedule.compute(dollars("1000"), true),
            FeeBreakdown::new(dollars("4"), dollars("1"))
        );
    }

    #[rstest]
    fn affiliate_rate_needs_an_affiliate() {
        let schedule = FeeSchedule {
            platform_bps: 40,
            affiliate_bps: 10,
            ..Default::default()
        };
        assert_eq!(schedule.compute(dollars("1000"), false).affiliate, 0);
    }

    #[rstest]
    fn cap_clamps_and_keeps_ratio() {
        let schedule = FeeSchedule {
            platform_bps: 300,
            affiliate_bps: 100,
            max_fee: dollars("10"),
            ..Default::default()
        };
        let fees = schedule.compute(dollars("1000"), true);
        assert_eq!(fees.total(), dollars("10"));
        assert_eq!(fees.affiliate, dollars("2.5"));
        assert_eq!(fees.platform, dollars("7.5"));
    }

    #[rstest]
    fn performance_schedule_is_separate() {
        let config = FeeConfig::default();
        let order = config.compute(FeeKind::Order, dollars("100"), false);
        let performance = config.compute(FeeKind::Performance, dollars("100"), false);
        assert_eq!(order.platform, dollars("0.25"));
        assert_eq!(performance.platform, dollars("5"));
    }

    /// Reference implementation written against the contract's formula.
    fn reference_independent(size: u128, p: u32, a: u32, min: u128) -> (u128, u128) {
        let platform = size * p as u128 / 10_000;
        let affiliate = size * a as u128 / 10_000;
        if platform + affiliate < min {
            (min - affiliate, affiliate)
        } else {
            (platform, affiliate)
        }
    }

    #[rstest]
    fn independent_mode_matches_reference() {
        let mut rng = rng();
        for _ in 0..1_000 {
            let size = rng.random_range(0..1_000_000_000_000u128);
            let platform_bps = rng.random_range(0..1_000u32);
            let affiliate_bps = rng.random_range(0..1_000u32);
            let min_fee = rng.random_range(0..100_000u128);

            let fees = calculate_independent(size, platform_bps, affiliate_bps, min_fee);
            let (platform, affiliate) =
                reference_independent(size, platform_bps, affiliate_bps, min_fee);

            assert_eq!((fees.platform, fees.affiliate), (platform, affiliate));
            assert!(fees.total() >= min_fee);
        }
    }

    #[rstest]
    fn proportional_mode_always_meets_floor() {
        let mut rng = rng();
        for _ in 0..1_000 {
            let size = rng.random_range(1..10_000_000u128);
            let platform_bps = rng.random_range(0..500u32);
            let affiliate_bps = rng.random_range(0..500u32);
            let min_fee = rng.random_range(1..100_000u128);

            let fees = calculate_proportional(size, platform_bps, affiliate_bps, min_fee);
            assert!(fees.total() >= min_fee);
            if apply_bps(size, platform_bps) + apply_bps(size, affiliate_bps) < min_fee {
                assert_eq!(fees.total(), min_fee);
            }
        }
    }
}
