// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Signer reached over JSON-RPC, such as a custodial wallet service or a node
//! with an unlocked account. Requests go out as `eth_signTypedData_v4`.

use std::time::Duration;

use alloy::{
    hex,
    primitives::{Address, Signature},
};
use async_trait::async_trait;
use jsonrpsee::{
    core::{client::ClientT, ClientError},
    http_client::{HttpClient, HttpClientBuilder},
    rpc_params,
};
use log::debug;

use super::{SignerError, TypedDataSigner, TypedStruct};
use crate::authorization::WalletType;

pub const SIGN_TYPED_DATA_METHOD: &str = "eth_signTypedData_v4";

#[derive(Debug, Clone)]
pub struct RemoteSigner {
    client: HttpClient,
    address: Address,
    timeout: Duration,
    wallet_types: Vec<WalletType>,
}

impl RemoteSigner {
    /// Signer for `address` served at `url`.
    ///
    /// Requests taking longer than `timeout` fail with
    /// [`SignerError::Timeout`].
    pub fn new(url: &str, address: Address, timeout: Duration) -> Result<Self, SignerError> {
        let client = HttpClientBuilder::default()
            .request_timeout(timeout)
            .build(url)
            .map_err(|err| SignerError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            address,
            timeout,
            wallet_types: vec![WalletType::Eoa, WalletType::SmartWallet],
        })
    }

    /// Restricts the wallet paths this signer reports as supported
    pub fn with_wallet_types(mut self, wallet_types: Vec<WalletType>) -> Self {
        self.wallet_types = wallet_types;
        self
    }

    fn map_client_error(&self, err: ClientError) -> SignerError {
        match err {
            ClientError::Call(err) => SignerError::Rejected(err.message().to_owned()),
            ClientError::RequestTimeout => SignerError::Timeout(self.timeout),
            ClientError::ParseError(err) => SignerError::MalformedSignature(err.to_string()),
            err => SignerError::Transport(err.to_string()),
        }
    }
}

/// Decodes a `0x`-prefixed 65-byte `(r, s, v)` signature
pub fn decode_signature(raw: &str) -> Result<Signature, SignerError> {
    let malformed = || SignerError::MalformedSignature(raw.to_owned());
    let bytes = hex::decode(raw.trim()).map_err(|_| malformed())?;
    if bytes.len() != 65 {
        return Err(malformed());
    }
    Signature::from_raw(&bytes).map_err(|_| malformed())
}

#[async_trait]
impl TypedDataSigner for RemoteSigner {
    async fn address(&self) -> Result<Address, SignerError> {
        Ok(self.address)
    }

    async fn sign_typed_struct(&self, typed: &TypedStruct) -> Result<Signature, SignerError> {
        debug!(
            "requesting {} signature for {} from remote signer",
            typed.primary_type(),
            self.address
        );
        let raw: String = self
            .client
            .request(
                SIGN_TYPED_DATA_METHOD,
                rpc_params![self.address, &typed.typed_data],
            )
            .await
            .map_err(|err| self.map_client_error(err))?;
        decode_signature(&raw)
    }

    fn supports(&self, wallet_type: WalletType) -> bool {
        self.wallet_types.contains(&wallet_type)
    }
}

#[cfg(test)]
mod decode_tests {
    use alloy::primitives::B256;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};
    use rstest::*;

    use super::*;

    #[rstest]
    fn decodes_what_a_key_produces() {
        let wallet = PrivateKeySigner::random();
        let hash = B256::repeat_byte(0x42);
        let signature = wallet.sign_hash_sync(&hash).unwrap();

        let raw = hex::encode_prefixed(signature.as_bytes());
        let decoded = decode_signature(&raw).unwrap();

        assert_eq!(
            decoded.recover_address_from_prehash(&hash).unwrap(),
            wallet.address()
        );
    }

    #[rstest]
    #[case::empty("0x")]
    #[case::not_hex("0xzz")]
    #[case::too_short("0x1234")]
    fn rejects_malformed(#[case] raw: &str) {
        assert!(matches!(
            decode_signature(raw),
            Err(SignerError::MalformedSignature(_))
        ));
    }
}
