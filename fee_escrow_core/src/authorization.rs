// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Authorization builder
//!
//! Builds the structs a payer signs, after checking that the deadline and the
//! fee amounts are acceptable to the escrow.
//!
//! Externally-owned accounts sign a [`Permit`] under the token's domain.
//! Smart-contract wallets sign an [`OrderFeeAuthorization`] or a
//! [`PerformanceFeeAuthorization`] under the escrow's domain.

use alloy::primitives::{Address, U256};
use fee_escrow_messages::{OrderFeeAuthorization, PerformanceFeeAuthorization, Permit};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
    config::EscrowConfig,
    fees::{FeeBreakdown, FeeKind},
    order_id::OrderId,
    Error, Result,
};

pub const DEFAULT_MIN_DEADLINE_SECS: u64 = 60;
pub const DEFAULT_MAX_DEADLINE_SECS: u64 = 86_400;

/// How the payer's wallet authorizes the escrow. Chosen by the caller.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WalletType {
    /// Key-controlled account, signs a token permit
    Eoa,
    /// Contract wallet, signs an escrow-domain fee authorization
    SmartWallet,
}

/// Accepted range of deadlines, in seconds from now, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineBounds {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl Default for DeadlineBounds {
    fn default() -> Self {
        Self {
            min_secs: DEFAULT_MIN_DEADLINE_SECS,
            max_secs: DEFAULT_MAX_DEADLINE_SECS,
        }
    }
}

impl DeadlineBounds {
    pub fn validate(&self, deadline_secs: u64) -> Result<()> {
        if deadline_secs < self.min_secs || deadline_secs > self.max_secs {
            return Err(Error::DeadlineOutOfBounds {
                deadline_secs,
                min_secs: self.min_secs,
                max_secs: self.max_secs,
            });
        }
        Ok(())
    }
}

/// Deadline bounds per authorization kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlineConfig {
    pub order_fee: DeadlineBounds,
    pub performance_fee: DeadlineBounds,
    pub permit: DeadlineBounds,
}

impl DeadlineConfig {
    /// Bounds for the struct signed on `wallet_type`'s path for `fee_kind`
    pub fn bounds(&self, wallet_type: WalletType, fee_kind: FeeKind) -> &DeadlineBounds {
        match (wallet_type, fee_kind) {
            (WalletType::Eoa, _) => &self.permit,
            (WalletType::SmartWallet, FeeKind::Order) => &self.order_fee,
            (WalletType::SmartWallet, FeeKind::Performance) => &self.performance_fee,
        }
    }
}

/// Any of the structs a payer may sign
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeAuthorization {
    OrderFee(OrderFeeAuthorization),
    PerformanceFee(PerformanceFeeAuthorization),
    Permit(Permit),
}

/// Validates inputs and produces unsigned authorization structs.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationBuilder<'a> {
    config: &'a EscrowConfig,
}

impl<'a> AuthorizationBuilder<'a> {
    pub fn new(config: &'a EscrowConfig) -> Self {
        Self { config }
    }

    /// Checks everything that can be checked before a nonce is known.
    ///
    /// # Errors
    ///
    /// - [`Error::DeadlineOutOfBounds`] when `deadline_secs` is outside the
    ///   bounds configured for this path and fee kind
    /// - [`Error::ZeroFee`] when both shares are zero
    /// - [`Error::FeeBelowMinimum`] / [`Error::FeeAboveMaximum`] when the
    ///   combined fee is outside the schedule's bounds
    pub fn validate(
        &self,
        wallet_type: WalletType,
        fee_kind: FeeKind,
        fees: &FeeBreakdown,
        deadline_secs: u64,
    ) -> Result<()> {
        self.config
            .deadlines
            .bounds(wallet_type, fee_kind)
            .validate(deadline_secs)?;

        let schedule = self.config.fees.schedule(fee_kind);
        let fee = fees.total();
        if fee == 0 {
            return Err(Error::ZeroFee);
        }
        if fee < schedule.min_fee {
            return Err(Error::FeeBelowMinimum {
                fee,
                min_fee: schedule.min_fee,
            });
        }
        if fee > schedule.max_fee {
            return Err(Error::FeeAboveMaximum {
                fee,
                max_fee: schedule.max_fee,
            });
        }
        Ok(())
    }

    /// Escrow-domain struct for a smart-contract wallet
    pub fn fee_authorization(
        &self,
        fee_kind: FeeKind,
        order_id: OrderId,
        payer: Address,
        fees: &FeeBreakdown,
        deadline_secs: u64,
        now_secs: u64,
    ) -> Result<FeeAuthorization> {
        self.validate(WalletType::SmartWallet, fee_kind, fees, deadline_secs)?;
        let deadline = now_secs.saturating_add(deadline_secs);
        let chain_id = self.config.chain_id;

        Ok(match fee_kind {
            FeeKind::Order => FeeAuthorization::OrderFee(OrderFeeAuthorization::new(
                order_id.0,
                payer,
                fees.platform,
                fees.affiliate,
                chain_id,
                deadline,
            )),
            FeeKind::Performance => {
                FeeAuthorization::PerformanceFee(PerformanceFeeAuthorization::new(
                    order_id.0,
                    payer,
                    fees.platform,
                    fees.affiliate,
                    chain_id,
                    deadline,
                ))
            }
        })
    }

    /// Token permit letting the escrow pull the combined fee from `owner`
    pub fn permit(
        &self,
        fee_kind: FeeKind,
        owner: Address,
        fees: &FeeBreakdown,
        nonce: U256,
        deadline_secs: u64,
        now_secs: u64,
    ) -> Result<Permit> {
        self.validate(WalletType::Eoa, fee_kind, fees, deadline_secs)?;
        Ok(Permit::new(
            owner,
            self.config.escrow_address,
            fees.total(),
            nonce,
            now_secs.saturating_add(deadline_secs),
        ))
    }
}
