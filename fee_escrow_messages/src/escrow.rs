// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Read-only projections of the escrow contract's per-order state.

use alloy::{primitives::U256, sol};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

sol! {
    /// Escrow entry as returned by the dual-fee escrow contract
    #[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
    struct EscrowRecord {
        address payer;
        address affiliate;
        uint256 orderFeePlatform;
        uint256 orderFeeAffiliate;
        uint256 performanceFeePlatform;
        uint256 performanceFeeAffiliate;
        /// Set once the escrow has been fully settled or refunded
        bool completed;
        /// Seconds until the payer may withdraw unilaterally
        uint256 timeUntilWithdrawal;
    }
}

impl EscrowRecord {
    pub fn order_fee_total(&self) -> U256 {
        self.orderFeePlatform.saturating_add(self.orderFeeAffiliate)
    }

    pub fn performance_fee_total(&self) -> U256 {
        self.performanceFeePlatform
            .saturating_add(self.performanceFeeAffiliate)
    }

    /// `true` once the payer may pull the escrowed fee back without an operator
    pub fn withdrawable(&self) -> bool {
        !self.completed && self.timeUntilWithdrawal.is_zero()
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown hold state discriminant: {0}")]
pub struct HoldStateError(pub u8);

/// Per-order lifecycle stage tracked by the escrow contract.
///
/// The discriminants match the contract's `uint8` encoding.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldState {
    /// No fee has been held for this order id
    #[default]
    Empty = 0,
    /// Fee is held in escrow
    Held = 1,
    /// Fee was distributed to platform and affiliate
    Sent = 2,
    /// Fee was returned to the payer
    Refunded = 3,
}

impl HoldState {
    /// Anything but [`HoldState::Empty`] means the order id has been consumed
    pub fn is_empty(&self) -> bool {
        matches!(self, HoldState::Empty)
    }
}

impl TryFrom<u8> for HoldState {
    type Error = HoldStateError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(HoldState::Empty),
            1 => Ok(HoldState::Held),
            2 => Ok(HoldState::Sent),
            3 => Ok(HoldState::Refunded),
            other => Err(HoldStateError(other)),
        }
    }
}

impl From<HoldState> for u8 {
    fn from(state: HoldState) -> Self {
        state as u8
    }
}
