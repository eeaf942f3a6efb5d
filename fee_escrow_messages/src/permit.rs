// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! EIP-2612 permit
//!
//! Lets an externally-owned account approve the escrow with a signature, so the
//! escrow can run permit-then-transfer without the user ever sending an
//! approval transaction.

use alloy::{
    primitives::{Address, U256},
    sol,
};
use fee_eip712_message::Eip712SignedMessage;
use serde::{Deserialize, Serialize};

/// EIP712 signed message for [`Permit`]
pub type SignedPermit = Eip712SignedMessage<Permit>;

sol! {
    /// Token allowance granted by signature
    #[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
    struct Permit {
        /// Token holder granting the allowance
        address owner;
        /// Account allowed to spend (the escrow contract)
        address spender;
        /// Allowance amount, in token minor units
        uint256 value;
        /// Current permit nonce of `owner`, tracked by the token
        uint256 nonce;
        /// Unix timestamp in seconds after which the permit is void
        uint256 deadline;
    }
}

impl Permit {
    /// Returns a permit with provided values
    pub fn new(owner: Address, spender: Address, value: u128, nonce: U256, deadline: u64) -> Self {
        Self {
            owner,
            spender,
            value: U256::from(value),
            nonce,
            deadline: U256::from(deadline),
        }
    }
}
