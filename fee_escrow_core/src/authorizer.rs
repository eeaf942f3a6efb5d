// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Fee authorizer
//!
//! Runs the whole pipeline for one order attempt: order id, fee amounts,
//! signable struct, signature. The result is a [`SignedFeeAuthorization`],
//! the only artifact handed to the server that calls the escrow contract.
//!
//! The wallet path is chosen by the caller through
//! [`AuthorizationRequest::wallet_type`]:
//!
//! - [`WalletType::Eoa`] signs a token permit for the combined fee. The
//!   current permit nonce is read from chain first.
//! - [`WalletType::SmartWallet`] signs an escrow-domain fee authorization. The
//!   contract verifies it through the wallet's own validation hook.
//!
//! The authorizer does not serialize concurrent attempts for the same order.
//! Both may be signed; the escrow's hold state decides which one is collected.
//! Call [`FeeAuthorizer::preflight`] to detect an order id that was already
//! consumed before signing again.

use alloy::{
    dyn_abi::Eip712Domain,
    primitives::{Address, Bytes, Signature, U256},
    sol_types::SolStruct,
};
use fee_eip712_message::{Eip712Error, Eip712SignedMessage};
use fee_escrow_messages::{HoldState, OrderFeeAuthorization, PerformanceFeeAuthorization, Permit};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    authorization::{AuthorizationBuilder, FeeAuthorization, WalletType},
    config::EscrowConfig,
    fees::{FeeBreakdown, FeeKind},
    get_current_timestamp_secs,
    order_id::{generate_order_id, OrderEconomics, OrderId},
    reader::EscrowReader,
    serde_helpers::u128_string,
    signer::{TypedDataSigner, TypedStruct},
    Error, Result,
};

/// Everything needed to authorize the fee for one order attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    pub economics: OrderEconomics,
    pub wallet_type: WalletType,
    pub fee_kind: FeeKind,
    /// Affiliate attached to the order; no affiliate share is charged without
    /// one
    #[serde(default)]
    pub affiliate: Option<Address>,
    /// Seconds from now until the authorization expires
    pub deadline_secs: u64,
    /// Amount the fee is computed on. Defaults to the order size; for
    /// performance fees this is the winning payout.
    #[serde(default)]
    pub fee_base: Option<u128>,
}

impl AuthorizationRequest {
    pub fn order_fee(economics: OrderEconomics, wallet_type: WalletType, deadline_secs: u64) -> Self {
        Self {
            economics,
            wallet_type,
            fee_kind: FeeKind::Order,
            affiliate: None,
            deadline_secs,
            fee_base: None,
        }
    }

    pub fn performance_fee(
        economics: OrderEconomics,
        wallet_type: WalletType,
        payout: u128,
        deadline_secs: u64,
    ) -> Self {
        Self {
            economics,
            wallet_type,
            fee_kind: FeeKind::Performance,
            affiliate: None,
            deadline_secs,
            fee_base: Some(payout),
        }
    }

    pub fn with_affiliate(mut self, affiliate: Address) -> Self {
        self.affiliate = Some(affiliate);
        self
    }

    pub fn fee_base(&self) -> u128 {
        self.fee_base.unwrap_or(self.economics.size)
    }
}

/// Signed fee authorization, flattened for transport.
///
/// Amounts are serialized as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedFeeAuthorization {
    pub order_id: OrderId,
    pub payer: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate: Option<Address>,
    pub fee_kind: FeeKind,
    #[serde(with = "u128_string")]
    pub platform_fee: u128,
    #[serde(with = "u128_string")]
    pub affiliate_fee: u128,
    pub chain_id: u64,
    /// Unix seconds
    pub deadline: u64,
    /// 65-byte `(r, s, v)` signature
    pub signature: Bytes,
    /// Tells the server which escrow entry point to call
    pub wallet_type: WalletType,
    /// Permit nonce that was signed over, permit path only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permit_nonce: Option<U256>,
}

impl SignedFeeAuthorization {
    pub fn fees(&self) -> FeeBreakdown {
        FeeBreakdown::new(self.platform_fee, self.affiliate_fee)
    }

    pub fn total_fee(&self) -> u128 {
        self.fees().total()
    }

    /// `true` once `now_secs` is past the deadline
    pub fn is_expired(&self, now_secs: u64) -> bool {
        now_secs > self.deadline
    }

    pub fn parsed_signature(&self) -> Result<Signature> {
        Signature::from_raw(&self.signature)
            .map_err(|err| Error::Eip712(Eip712Error::SignatureError(err)))
    }

    /// The permit that was signed, with the escrow as spender
    ///
    /// # Errors
    ///
    /// [`Error::MissingPermitNonce`] if this authorization carries no nonce.
    pub fn permit(&self, spender: Address) -> Result<Permit> {
        let nonce = self.permit_nonce.ok_or(Error::MissingPermitNonce)?;
        Ok(Permit::new(
            self.payer,
            spender,
            self.total_fee(),
            nonce,
            self.deadline,
        ))
    }

    /// The struct that was signed, rebuilt from the flat fields: a permit
    /// towards `spender` on the EOA path, an escrow-domain fee authorization
    /// otherwise.
    pub fn authorization(&self, spender: Address) -> Result<FeeAuthorization> {
        Ok(match (self.wallet_type, self.fee_kind) {
            (WalletType::Eoa, _) => FeeAuthorization::Permit(self.permit(spender)?),
            (WalletType::SmartWallet, FeeKind::Order) => {
                FeeAuthorization::OrderFee(OrderFeeAuthorization::new(
                    self.order_id.0,
                    self.payer,
                    self.platform_fee,
                    self.affiliate_fee,
                    self.chain_id,
                    self.deadline,
                ))
            }
            (WalletType::SmartWallet, FeeKind::Performance) => {
                FeeAuthorization::PerformanceFee(PerformanceFeeAuthorization::new(
                    self.order_id.0,
                    self.payer,
                    self.platform_fee,
                    self.affiliate_fee,
                    self.chain_id,
                    self.deadline,
                ))
            }
        })
    }
}

/// Chain state relevant to an order id before it is submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreflightReport {
    pub order_id: OrderId,
    pub hold_state: HoldState,
    pub paused: bool,
}

impl PreflightReport {
    /// Order id unused and escrow accepting holds
    pub fn is_clear(&self) -> bool {
        self.hold_state.is_empty() && !self.paused
    }
}

pub struct FeeAuthorizer<R> {
    config: EscrowConfig,
    reader: R,
}

impl<R: EscrowReader> FeeAuthorizer<R> {
    pub fn new(config: EscrowConfig, reader: R) -> Self {
        Self { config, reader }
    }

    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Order id and fee amounts for `request`, without signing anything.
    ///
    /// # Errors
    ///
    /// [`Error::ChainMismatch`] if the order's chain is not the escrow's, on
    /// top of the validation errors of [`generate_order_id`].
    pub fn quote(&self, request: &AuthorizationRequest) -> Result<(OrderId, FeeBreakdown)> {
        if request.economics.chain_id != self.config.chain_id {
            return Err(Error::ChainMismatch {
                expected: self.config.chain_id,
                actual: request.economics.chain_id,
            });
        }
        let order_id = generate_order_id(&request.economics)?;
        let fees = self.config.fees.compute(
            request.fee_kind,
            request.fee_base(),
            request.affiliate.is_some(),
        );
        Ok((order_id, fees))
    }

    /// Builds and signs the authorization for `request` with `signer`.
    ///
    /// Every input is validated before the first network call. Transport
    /// failures of the signer or of the nonce lookup are retried according to
    /// the configured [`RetryPolicy`](crate::retry::RetryPolicy).
    ///
    /// # Errors
    ///
    /// - validation errors from [`quote`](Self::quote) and
    ///   [`AuthorizationBuilder::validate`]
    /// - [`Error::CapabilityMismatch`] if the signer cannot sign on the
    ///   requested wallet path
    /// - [`Error::SignerMismatch`] if, on the permit path, the signer is not
    ///   the payer
    /// - [`Error::RetriesExhausted`] once transient failures used up every
    ///   attempt
    pub async fn authorize<S>(
        &self,
        signer: &S,
        request: &AuthorizationRequest,
    ) -> Result<SignedFeeAuthorization>
    where
        S: TypedDataSigner + ?Sized,
    {
        let now_secs = get_current_timestamp_secs()?;
        let (order_id, fees) = self.quote(request)?;
        let payer = request.economics.payer_address()?;
        let builder = AuthorizationBuilder::new(&self.config);
        builder.validate(
            request.wallet_type,
            request.fee_kind,
            &fees,
            request.deadline_secs,
        )?;

        if !signer.supports(request.wallet_type) {
            return Err(Error::CapabilityMismatch {
                wallet_type: request.wallet_type,
            });
        }

        let (authorization, permit_nonce) = match request.wallet_type {
            WalletType::Eoa => {
                let signer_address = self
                    .config
                    .retry
                    .retry("signer address", || async move {
                        signer.address().await.map_err(Error::from)
                    })
                    .await?;
                if signer_address != payer {
                    return Err(Error::SignerMismatch {
                        signer: signer_address,
                        owner: payer,
                    });
                }

                let nonce = self.reader.permit_nonce(payer).await?;
                let permit = builder.permit(
                    request.fee_kind,
                    payer,
                    &fees,
                    nonce,
                    request.deadline_secs,
                    now_secs,
                )?;
                (FeeAuthorization::Permit(permit), Some(nonce))
            }
            WalletType::SmartWallet => {
                let authorization = builder.fee_authorization(
                    request.fee_kind,
                    order_id,
                    payer,
                    &fees,
                    request.deadline_secs,
                    now_secs,
                )?;
                (authorization, None)
            }
        };
        let (deadline, signature) = self.sign_authorization(signer, authorization).await?;

        info!(
            "Signed {} authorization for order {order_id}: platform fee {}, affiliate fee {}, {} path",
            request.fee_kind, fees.platform, fees.affiliate, request.wallet_type
        );

        Ok(SignedFeeAuthorization {
            order_id,
            payer,
            affiliate: request.affiliate,
            fee_kind: request.fee_kind,
            platform_fee: fees.platform,
            affiliate_fee: fees.affiliate,
            chain_id: self.config.chain_id,
            deadline: u64::try_from(deadline).unwrap_or(u64::MAX),
            signature: Bytes::copy_from_slice(&signature.as_bytes()),
            wallet_type: request.wallet_type,
            permit_nonce,
        })
    }

    /// Reads the hold state of `order_id` and whether the escrow is paused.
    ///
    /// A non-empty hold state means the id was already consumed and a new
    /// authorization for the same economics would be rejected.
    pub async fn preflight(&self, order_id: OrderId) -> Result<PreflightReport> {
        let hold_state = self.reader.hold_state(order_id).await?;
        let paused = self.reader.is_paused().await?;
        let report = PreflightReport {
            order_id,
            hold_state,
            paused,
        };
        if !report.is_clear() {
            debug!("Order {order_id} is not clear for submission: {hold_state}, paused: {paused}");
        }
        Ok(report)
    }

    async fn sign_authorization<S>(
        &self,
        signer: &S,
        authorization: FeeAuthorization,
    ) -> Result<(U256, Signature)>
    where
        S: TypedDataSigner + ?Sized,
    {
        Ok(match authorization {
            FeeAuthorization::Permit(permit) => {
                let signed = self
                    .sign(signer, &self.config.permit_domain(), permit)
                    .await?;
                (signed.message.deadline, signed.signature)
            }
            FeeAuthorization::OrderFee(auth) => {
                let signed = self
                    .sign(signer, &self.config.escrow_domain(), auth)
                    .await?;
                (signed.message.deadline, signed.signature)
            }
            FeeAuthorization::PerformanceFee(auth) => {
                let signed = self
                    .sign(signer, &self.config.escrow_domain(), auth)
                    .await?;
                (signed.message.deadline, signed.signature)
            }
        })
    }

    async fn sign<S, M>(
        &self,
        signer: &S,
        domain: &Eip712Domain,
        message: M,
    ) -> Result<Eip712SignedMessage<M>>
    where
        S: TypedDataSigner + ?Sized,
        M: SolStruct + Serialize,
    {
        let typed = TypedStruct::new(domain, &message);
        debug!("Signing {} with hash {}", typed.primary_type(), typed.signing_hash);
        let typed = &typed;
        let signature = self
            .config
            .retry
            .retry("signTypedData", || async move {
                signer.sign_typed_struct(typed).await.map_err(Error::from)
            })
            .await?;
        Ok(Eip712SignedMessage::from_parts(message, signature))
    }
}
