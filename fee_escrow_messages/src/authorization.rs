// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fee authorizations signed under the escrow domain.
//!
//! Smart-contract wallets cannot produce the signature a token permit expects,
//! so they approve the escrow once and then sign one of these structs per
//! order. The escrow validates the signature through the wallet's own
//! on-chain validation hook.

use alloy::{
    primitives::{Address, B256, U256},
    sol,
};
use fee_eip712_message::Eip712SignedMessage;
use serde::{Deserialize, Serialize};

/// EIP712 signed message for [`OrderFeeAuthorization`]
pub type SignedOrderFeeAuthorization = Eip712SignedMessage<OrderFeeAuthorization>;

/// EIP712 signed message for [`PerformanceFeeAuthorization`]
pub type SignedPerformanceFeeAuthorization = Eip712SignedMessage<PerformanceFeeAuthorization>;

sol! {
    /// Authorizes the escrow to hold the order fee for one order.
    #[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
    struct OrderFeeAuthorization {
        /// Order identifier the fee is bound to
        bytes32 orderId;
        /// Account the fee is pulled from
        address payer;
        /// Platform share, in token minor units
        uint256 platformFee;
        /// Affiliate share, in token minor units
        uint256 affiliateFee;
        /// Chain the authorization is valid on
        uint256 chainId;
        /// Unix timestamp in seconds after which the authorization is void
        uint256 deadline;
    }

    /// Authorizes the escrow to take the performance fee from a winning payout.
    #[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
    struct PerformanceFeeAuthorization {
        bytes32 orderId;
        address payer;
        uint256 platformFee;
        uint256 affiliateFee;
        uint256 chainId;
        uint256 deadline;
    }
}

impl OrderFeeAuthorization {
    /// Returns an order fee authorization with provided values
    pub fn new(
        order_id: B256,
        payer: Address,
        platform_fee: u128,
        affiliate_fee: u128,
        chain_id: u64,
        deadline: u64,
    ) -> Self {
        Self {
            orderId: order_id,
            payer,
            platformFee: U256::from(platform_fee),
            affiliateFee: U256::from(affiliate_fee),
            chainId: U256::from(chain_id),
            deadline: U256::from(deadline),
        }
    }

    /// Combined fee the escrow is allowed to hold
    pub fn total_fee(&self) -> U256 {
        self.platformFee.saturating_add(self.affiliateFee)
    }
}

impl PerformanceFeeAuthorization {
    /// Returns a performance fee authorization with provided values
    pub fn new(
        order_id: B256,
        payer: Address,
        platform_fee: u128,
        affiliate_fee: u128,
        chain_id: u64,
        deadline: u64,
    ) -> Self {
        Self {
            orderId: order_id,
            payer,
            platformFee: U256::from(platform_fee),
            affiliateFee: U256::from(affiliate_fee),
            chainId: U256::from(chain_id),
            deadline: U256::from(deadline),
        }
    }

    pub fn total_fee(&self) -> U256 {
        self.platformFee.saturating_add(self.affiliateFee)
    }
}
