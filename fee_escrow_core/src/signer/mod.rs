// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Signing adapter
//!
//! Every signer, local key or remote service, is driven through
//! [`TypedDataSigner`]. It is handed a [`TypedStruct`], which carries both the
//! EIP712 digest (for signers holding a key) and the full `eth_signTypedData_v4`
//! payload (for signers that want to display or re-derive what they sign).
//!
//! Implementations must produce a 65-byte `(r, s, v)` ECDSA signature over
//! [`TypedStruct::signing_hash`]. Local signing is deterministic; remote signers
//! may not be.

use std::time::Duration;

use alloy::{
    dyn_abi::{Eip712Domain, TypedData},
    primitives::{Address, Signature, B256},
    sol_types::SolStruct,
};
use async_trait::async_trait;
use serde::Serialize;

use crate::authorization::WalletType;

pub mod local;
pub mod remote;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("Signing failed: {0}")]
    Signing(String),
    #[error("Signer transport error: {0}")]
    Transport(String),
    #[error("Signer did not answer within {0:?}")]
    Timeout(Duration),
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),
    #[error("Signer rejected the request: {0}")]
    Rejected(String),
}

impl SignerError {
    /// Whether the same request may succeed when sent again
    pub fn is_transient(&self) -> bool {
        matches!(self, SignerError::Transport(_) | SignerError::Timeout(_))
    }
}

/// A typed struct ready to be signed under a given domain
#[derive(Debug, Clone)]
pub struct TypedStruct {
    pub domain: Eip712Domain,
    pub signing_hash: B256,
    /// `eth_signTypedData_v4` representation of the same struct
    pub typed_data: TypedData,
}

impl TypedStruct {
    pub fn new<M: SolStruct + Serialize>(domain: &Eip712Domain, message: &M) -> Self {
        Self {
            domain: domain.clone(),
            signing_hash: message.eip712_signing_hash(domain),
            typed_data: TypedData::from_struct(message, Some(domain.clone())),
        }
    }

    /// Name of the signed struct, e.g. `Permit`
    pub fn primary_type(&self) -> &str {
        &self.typed_data.primary_type
    }
}

/// Anything able to produce EIP712 signatures for one account.
#[async_trait]
pub trait TypedDataSigner: Send + Sync {
    /// Account the signatures recover to
    async fn address(&self) -> Result<Address, SignerError>;

    async fn sign_typed_struct(&self, typed: &TypedStruct) -> Result<Signature, SignerError>;

    /// Whether this signer can sign on the path used by `wallet_type`.
    ///
    /// A signer that only holds a smart wallet's session key, for instance,
    /// cannot produce a token permit for the wallet itself.
    fn supports(&self, _wallet_type: WalletType) -> bool {
        true
    }
}

#[async_trait]
impl<S: TypedDataSigner + ?Sized> TypedDataSigner for Box<S> {
    async fn address(&self) -> Result<Address, SignerError> {
        (**self).address().await
    }

    async fn sign_typed_struct(&self, typed: &TypedStruct) -> Result<Signature, SignerError> {
        (**self).sign_typed_struct(typed).await
    }

    fn supports(&self, wallet_type: WalletType) -> bool {
        (**self).supports(wallet_type)
    }
}
