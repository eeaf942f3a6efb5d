// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # EIP712 signed message
//!
//! This crate contains the `Eip712SignedMessage` struct which pairs a typed
//! message with the ECDSA signature over its EIP712 signing hash.
//!
//! A signature is either produced here with a local key, or produced elsewhere
//! (for example by a custodial signer) and attached with
//! [`Eip712SignedMessage::from_parts`].
//!
//! # Example
//! ```rust
//! # use alloy::{dyn_abi::Eip712Domain, primitives::{Address, B256, U256}, signers::local::PrivateKeySigner};
//! # let domain_separator = Eip712Domain::default();
//! use fee_eip712_message::Eip712SignedMessage;
//! # let wallet = PrivateKeySigner::random();
//! # let wallet_address = wallet.address();
//! # let message = msg::OrderFeeAuthorization {
//! #     orderId: B256::repeat_byte(0x11),
//! #     payer: wallet_address,
//! #     platformFee: U256::from(10_000),
//! #     affiliateFee: U256::ZERO,
//! #     chainId: U256::from(137),
//! #     deadline: U256::from(1_700_000_000u64),
//! # };
//!
//! let signed_message = Eip712SignedMessage::new(&domain_separator, message, &wallet).unwrap();
//! let signer = signed_message.recover_signer(&domain_separator).unwrap();
//!
//! assert_eq!(signer, wallet_address);
//! ```
//!

use alloy::{
    dyn_abi::Eip712Domain,
    primitives::{Address, Signature, B256},
    signers::{local::PrivateKeySigner, SignerSync},
    sol_types::SolStruct,
};
use serde::{Deserialize, Serialize};

/// Errors returned by creation of messages and verify signature
#[derive(thiserror::Error, Debug)]
pub enum Eip712Error {
    /// `alloy` wallet error
    #[error(transparent)]
    WalletError(#[from] alloy::signers::Error),

    /// `alloy` signature error
    #[error(transparent)]
    SignatureError(#[from] alloy::primitives::SignatureError),
}

/// EIP712 signed message
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Eip712SignedMessage<M: SolStruct> {
    /// Message to be signed
    pub message: M,
    /// ECDSA Signature of eip712 hash of message
    pub signature: Signature,
}

impl<M: SolStruct> Eip712SignedMessage<M> {
    /// Creates a signed message with signed EIP712 hash of `message` using `signing_wallet`
    ///
    /// Signing is deterministic (RFC 6979): the same key, domain and message
    /// always produce the same signature.
    ///
    /// # Errors
    ///
    /// Returns [`Eip712Error::WalletError`] if could not sign using the wallet
    ///
    pub fn new(
        domain_separator: &Eip712Domain,
        message: M,
        signing_wallet: &PrivateKeySigner,
    ) -> Result<Self, Eip712Error> {
        let recovery_message_hash = message.eip712_signing_hash(domain_separator);

        let signature = signing_wallet.sign_hash_sync(&recovery_message_hash)?;

        Ok(Self { message, signature })
    }

    /// Attaches a signature produced outside of this crate to `message`.
    ///
    /// No check is made that the signature matches the message.
    pub fn from_parts(message: M, signature: Signature) -> Self {
        Self { message, signature }
    }

    /// The EIP712 digest the signature is expected to cover.
    pub fn signing_hash(&self, domain_separator: &Eip712Domain) -> B256 {
        self.message.eip712_signing_hash(domain_separator)
    }

    /// Recovers and returns the signer of the message from the signature.
    pub fn recover_signer(&self, domain_separator: &Eip712Domain) -> Result<Address, Eip712Error> {
        let recovery_message_hash = self.signing_hash(domain_separator);
        let recovered_address = self
            .signature
            .recover_address_from_prehash(&recovery_message_hash)?;
        Ok(recovered_address)
    }

    /// Returns `true` if the recovered signer is `expected_address`.
    ///
    /// Any recovery failure is reported as `false`.
    pub fn is_signed_by(&self, domain_separator: &Eip712Domain, expected_address: Address) -> bool {
        self.recover_signer(domain_separator)
            .map(|recovered| recovered == expected_address)
            .unwrap_or(false)
    }
}
