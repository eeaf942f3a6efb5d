// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error type for every fallible operation in the crate
//!

use std::{result::Result as StdResult, time::Duration};

use alloy::primitives::Address;
use fee_eip712_message::Eip712Error;
use thiserror::Error as ThisError;

use crate::{authorization::WalletType, reader::ReaderError, signer::SignerError};

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("Price {price} is outside of [0, 1]")]
    InvalidPrice { price: f64 },
    #[error("Invalid account address: {address}")]
    InvalidAddress { address: String },
    #[error("Order is bound to chain {actual} but the escrow is on chain {expected}")]
    ChainMismatch { expected: u64, actual: u64 },
    #[error("Invalid order id: {order_id}")]
    InvalidOrderId { order_id: String },
    #[error("Invalid currency amount: {amount}")]
    InvalidAmount { amount: String },
    #[error("Deadline of {deadline_secs}s is outside of [{min_secs}s, {max_secs}s]")]
    DeadlineOutOfBounds {
        deadline_secs: u64,
        min_secs: u64,
        max_secs: u64,
    },
    #[error("Combined fee is zero")]
    ZeroFee,
    #[error("Fee {fee} is below the minimum fee {min_fee}")]
    FeeBelowMinimum { fee: u128, min_fee: u128 },
    #[error("Fee {fee} is above the maximum fee {max_fee}")]
    FeeAboveMaximum { fee: u128, max_fee: u128 },
    #[error("Signer cannot sign for the {wallet_type} wallet path")]
    CapabilityMismatch { wallet_type: WalletType },
    #[error("Signer {signer} cannot sign a permit for owner {owner}")]
    SignerMismatch { signer: Address, owner: Address },
    #[error("Permit authorization carries no nonce")]
    MissingPermitNonce,
    #[error("Failed to get current system time: {source_error_message} ")]
    InvalidSystemTime { source_error_message: String },
    #[error(transparent)]
    Signer(#[from] SignerError),
    #[error(transparent)]
    Reader(#[from] ReaderError),
    #[error(transparent)]
    Eip712(#[from] Eip712Error),
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },
    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },
}

impl Error {
    /// `true` for transport-level failures that may succeed when tried again.
    ///
    /// Validation, capability and contract errors are never retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::Signer(err) => err.is_transient(),
            Error::Reader(err) => err.is_transient(),
            _ => false,
        }
    }
}

pub type Result<T> = StdResult<T, Error>;
