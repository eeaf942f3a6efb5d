// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Local verification
//!
//! Recovers the signer of a [`SignedFeeAuthorization`] off-chain.
//!
//! Only meaningful for signatures made by a key. A smart-contract wallet's
//! signature is validated by the wallet contract itself; recovering an address
//! from it locally yields a value that must not be trusted, so
//! [`verify_local`] refuses to vouch for the smart wallet path.

use alloy::primitives::Address;
use fee_eip712_message::Eip712SignedMessage;
use log::debug;

use crate::{
    authorization::{FeeAuthorization, WalletType},
    authorizer::SignedFeeAuthorization,
    config::EscrowConfig,
    order_id::parse_address,
    Result,
};

/// Address recovered from the signature of `signed`, under the domain used on
/// its wallet path.
///
/// On the smart wallet path the result is not the wallet's address.
pub fn recover_signer(signed: &SignedFeeAuthorization, config: &EscrowConfig) -> Result<Address> {
    let signature = signed.parsed_signature()?;
    let recovered = match signed.authorization(config.escrow_address)? {
        FeeAuthorization::Permit(permit) => Eip712SignedMessage::from_parts(permit, signature)
            .recover_signer(&config.permit_domain())?,
        FeeAuthorization::OrderFee(auth) => Eip712SignedMessage::from_parts(auth, signature)
            .recover_signer(&config.escrow_domain())?,
        FeeAuthorization::PerformanceFee(auth) => {
            Eip712SignedMessage::from_parts(auth, signature)
                .recover_signer(&config.escrow_domain())?
        }
    };
    Ok(recovered)
}

/// `true` if `signed` was produced by `expected` on the permit path.
///
/// Never fails: malformed signatures, missing nonces and smart wallet
/// authorizations all return `false`.
pub fn verify_local(
    signed: &SignedFeeAuthorization,
    expected: Address,
    config: &EscrowConfig,
) -> bool {
    if signed.wallet_type == WalletType::SmartWallet {
        debug!(
            "Refusing local verification of smart wallet authorization for order {}",
            signed.order_id
        );
        return false;
    }
    match recover_signer(signed, config) {
        Ok(recovered) => recovered == expected,
        Err(err) => {
            debug!("Could not recover signer of order {}: {err}", signed.order_id);
            false
        }
    }
}

/// [`verify_local`] against an address given as text, compared without regard
/// to case.
pub fn verify_local_str(
    signed: &SignedFeeAuthorization,
    expected: &str,
    config: &EscrowConfig,
) -> bool {
    parse_address(&expected.trim().to_ascii_lowercase())
        .map(|expected| verify_local(signed, expected, config))
        .unwrap_or(false)
}
