// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Fee escrow authorizations
//!
//! Produces signed, replay-protected fee authorizations that the fee escrow
//! contract executes later, without the payer sending an approval transaction
//! per order.
//!
//! The usual flow for one order is:
//!
//! 1. derive an [`order_id::OrderId`] from the order's economics,
//! 2. compute the platform and affiliate fee with [`fees`],
//! 3. build the struct to sign with [`authorization::AuthorizationBuilder`],
//! 4. sign it with any [`signer::TypedDataSigner`].
//!
//! [`authorizer::FeeAuthorizer`] runs all four steps and returns a
//! [`authorizer::SignedFeeAuthorization`] ready to hand to the server that
//! calls the escrow. [`reader`] exposes the escrow's on-chain state for
//! pre-flight checks and [`verifier`] recovers signers locally.
//!
//! ## Getting started
//!
//! ```rust
//! # #[tokio::main]
//! # async fn main() {
//! use alloy::primitives::address;
//! use fee_escrow_core::{
//!     authorization::WalletType,
//!     authorizer::{AuthorizationRequest, FeeAuthorizer},
//!     config::EscrowConfig,
//!     order_id::{OrderEconomics, OrderSide},
//!     reader::memory::InMemoryEscrow,
//!     signer::local::LocalSigner,
//!     verifier::verify_local,
//! };
//!
//! let config = EscrowConfig::polygon(address!("1111111111111111111111111111111111111111"));
//! let signer = LocalSigner::random();
//! let authorizer = FeeAuthorizer::new(config.clone(), InMemoryEscrow::default());
//!
//! let request = AuthorizationRequest::order_fee(
//!     OrderEconomics {
//!         chain_id: config.chain_id,
//!         payer: signer.address().to_string(),
//!         market_id: "will-it-rain-tomorrow".to_owned(),
//!         side: OrderSide::Buy,
//!         size: 100_000_000,
//!         price: 0.42,
//!         timestamp_ms: 1_700_000_000_000,
//!     },
//!     WalletType::Eoa,
//!     3_600,
//! );
//!
//! let signed = authorizer.authorize(&signer, &request).await.unwrap();
//! assert!(verify_local(&signed, signer.address(), &config));
//! # }
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use alloy::{
    dyn_abi::Eip712Domain,
    primitives::{Address, B256, U256},
    sol_types::eip712_domain,
};

pub mod authorization;
pub mod authorizer;
pub mod config;
mod error;
pub mod fees;
pub mod money;
pub mod order_id;
pub mod reader;
pub mod retry;
mod serde_helpers;
pub mod signer;
pub mod verifier;

pub use error::{Error, Result};

/// Name of the escrow's EIP712 domain
pub const ESCROW_DOMAIN_NAME: &str = "DomeFeeEscrow";
pub const ESCROW_DOMAIN_VERSION: &str = "1";
pub const PERMIT_DOMAIN_VERSION: &str = "1";

pub(crate) fn get_current_timestamp_secs() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| Error::InvalidSystemTime {
            source_error_message: err.to_string(),
        })?
        .as_secs())
}

/// The EIP712 domain separator of the fee escrow contract.
///
/// Used for `OrderFeeAuthorization` and `PerformanceFeeAuthorization`, which a
/// smart-contract wallet has verified on-chain through its own signature
/// validation.
///
/// The domain separator is defined as:
/// - `name`: "DomeFeeEscrow"
/// - `version`: "1"
/// - `chain_id`: The chain ID of the chain where the escrow is deployed.
/// - `verifying_contract`: The address of the escrow contract.
pub fn escrow_eip712_domain(chain_id: u64, escrow_address: Address) -> Eip712Domain {
    eip712_domain! {
        name: ESCROW_DOMAIN_NAME,
        version: ESCROW_DOMAIN_VERSION,
        chain_id: chain_id,
        verifying_contract: escrow_address,
    }
}

/// The EIP712 domain separator of the bridged stablecoin's `permit`.
///
/// That token deployment predates the usual domain shape: it has no
/// `chainId` field and carries the chain id left-padded to 32 bytes in `salt`
/// instead. Signatures only verify on-chain if this shape is reproduced.
pub fn permit_eip712_domain(
    token_name: &str,
    chain_id: u64,
    token_address: Address,
) -> Eip712Domain {
    Eip712Domain::new(
        Some(token_name.to_owned().into()),
        Some(PERMIT_DOMAIN_VERSION.into()),
        None,
        Some(token_address),
        Some(B256::from(U256::from(chain_id))),
    )
}
