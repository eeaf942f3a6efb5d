// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # On-chain state
//!
//! Read-only view of the fee escrow and its token, used for the permit nonce
//! and for pre-flight checks before an authorization is handed to the server.
//! Nothing here submits transactions.

use std::time::Duration;

use alloy::primitives::{keccak256, Address, B256, U256};
use async_trait::async_trait;
use fee_escrow_messages::{EscrowRecord, HoldState, HoldStateError};

use crate::{order_id::OrderId, Result};

pub mod contract;
#[cfg(feature = "in_memory")]
pub mod memory;

/// Role allowed to hold, distribute and refund fees
pub fn operator_role() -> B256 {
    keccak256("OPERATOR_ROLE")
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReaderError {
    #[error("RPC transport error: {0}")]
    Transport(String),
    #[error("RPC call did not answer within {0:?}")]
    Timeout(Duration),
    #[error("Contract call failed: {0}")]
    Contract(String),
    #[error(transparent)]
    HoldState(#[from] HoldStateError),
    #[error("No escrow found for order {0}")]
    NotFound(String),
}

impl ReaderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ReaderError::Transport(_) | ReaderError::Timeout(_))
    }
}

/// Rates the escrow applies when it computes a fee itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRates {
    pub fee_bps: U256,
    pub min_fee: U256,
}

/// Read access to the escrow contract and the permit token.
#[async_trait]
pub trait EscrowReader: Send + Sync {
    /// Next permit nonce of `owner` on the fee token
    async fn permit_nonce(&self, owner: Address) -> Result<U256>;

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256>;

    async fn hold_state(&self, order_id: OrderId) -> Result<HoldState>;

    async fn escrow_record(&self, order_id: OrderId) -> Result<EscrowRecord>;

    /// Amount still held for `order_id`
    async fn remaining_escrow(&self, order_id: OrderId) -> Result<U256>;

    async fn fee_rates(&self) -> Result<FeeRates>;

    async fn has_role(&self, role: B256, account: Address) -> Result<bool>;

    async fn is_paused(&self) -> Result<bool>;

    /// Fee the escrow itself would charge on `amount`
    async fn calculate_fee(&self, amount: U256) -> Result<U256>;

    async fn is_operator(&self, account: Address) -> Result<bool> {
        self.has_role(operator_role(), account).await
    }
}

#[async_trait]
impl<R: EscrowReader + ?Sized> EscrowReader for std::sync::Arc<R> {
    async fn permit_nonce(&self, owner: Address) -> Result<U256> {
        (**self).permit_nonce(owner).await
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        (**self).allowance(owner, spender).await
    }

    async fn hold_state(&self, order_id: OrderId) -> Result<HoldState> {
        (**self).hold_state(order_id).await
    }

    async fn escrow_record(&self, order_id: OrderId) -> Result<EscrowRecord> {
        (**self).escrow_record(order_id).await
    }

    async fn remaining_escrow(&self, order_id: OrderId) -> Result<U256> {
        (**self).remaining_escrow(order_id).await
    }

    async fn fee_rates(&self) -> Result<FeeRates> {
        (**self).fee_rates().await
    }

    async fn has_role(&self, role: B256, account: Address) -> Result<bool> {
        (**self).has_role(role, account).await
    }

    async fn is_paused(&self) -> Result<bool> {
        (**self).is_paused().await
    }

    async fn calculate_fee(&self, amount: U256) -> Result<U256> {
        (**self).calculate_fee(amount).await
    }
}
