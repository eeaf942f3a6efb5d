// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::str::FromStr;

use alloy::{
    primitives::{Address, Signature},
    signers::{local::PrivateKeySigner, SignerSync},
};
use async_trait::async_trait;

use super::{SignerError, TypedDataSigner, TypedStruct};

/// Signs with a private key held in memory.
///
/// Signatures are deterministic (RFC 6979).
#[derive(Debug, Clone)]
pub struct LocalSigner {
    wallet: PrivateKeySigner,
}

impl LocalSigner {
    pub fn new(wallet: PrivateKeySigner) -> Self {
        Self { wallet }
    }

    /// From a hex encoded private key, with or without `0x`
    pub fn from_private_key(key: &str) -> Result<Self, SignerError> {
        PrivateKeySigner::from_str(key)
            .map(Self::new)
            .map_err(|err| SignerError::Signing(err.to_string()))
    }

    pub fn random() -> Self {
        Self::new(PrivateKeySigner::random())
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn wallet(&self) -> &PrivateKeySigner {
        &self.wallet
    }
}

impl From<PrivateKeySigner> for LocalSigner {
    fn from(wallet: PrivateKeySigner) -> Self {
        Self::new(wallet)
    }
}

#[async_trait]
impl TypedDataSigner for LocalSigner {
    async fn address(&self) -> Result<Address, SignerError> {
        Ok(self.wallet.address())
    }

    async fn sign_typed_struct(&self, typed: &TypedStruct) -> Result<Signature, SignerError> {
        self.wallet
            .sign_hash_sync(&typed.signing_hash)
            .map_err(|err| SignerError::Signing(err.to_string()))
    }
}
