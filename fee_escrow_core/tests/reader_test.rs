// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy::primitives::{address, Address, U256};
use fee_escrow_core::{
    authorization::WalletType,
    authorizer::{AuthorizationRequest, FeeAuthorizer},
    config::EscrowConfig,
    fees::FeeKind,
    order_id::{OrderEconomics, OrderSide},
    reader::{memory::InMemoryEscrow, operator_role, EscrowReader, FeeRates},
    retry::RetryPolicy,
    signer::local::LocalSigner,
    Error,
};
use fee_escrow_messages::{EscrowRecord, HoldState};
use rand::{rng, Rng};
use rstest::*;

#[fixture]
fn config() -> EscrowConfig {
    EscrowConfig::polygon(address!("1111111111111111111111111111111111111111"))
}

#[fixture]
fn escrow() -> InMemoryEscrow {
    InMemoryEscrow::new()
}

fn economics(payer: Address, timestamp_ms: u64) -> OrderEconomics {
    OrderEconomics {
        chain_id: 137,
        payer: payer.to_string(),
        market_id: "will-it-rain-tomorrow".to_owned(),
        side: OrderSide::Buy,
        size: 20_000_000,
        price: 0.5,
        timestamp_ms,
    }
}

#[rstest]
#[tokio::test]
async fn local_fees_match_contract_fee_function(config: EscrowConfig, escrow: InMemoryEscrow) {
    let rates = escrow.fee_rates().await.unwrap();
    let schedule = config.fees.schedule(FeeKind::Order);
    assert_eq!(rates.fee_bps, U256::from(schedule.platform_bps));
    assert_eq!(rates.min_fee, U256::from(schedule.min_fee));

    let mut rng = rng();
    for _ in 0..200 {
        let size = rng.random_range(0..10_000_000_000u128);
        let local = config.fees.compute(FeeKind::Order, size, false);
        let onchain = escrow.calculate_fee(U256::from(size)).await.unwrap();
        assert_eq!(U256::from(local.total()), onchain, "size {size}");
    }
}

#[rstest]
#[tokio::test]
async fn consumed_order_ids_are_detected_before_resigning(
    config: EscrowConfig,
    escrow: InMemoryEscrow,
) {
    let signer = LocalSigner::random();
    let authorizer = FeeAuthorizer::new(config, escrow.clone());
    let request = AuthorizationRequest::order_fee(
        economics(signer.address(), 1_700_000_000_000),
        WalletType::Eoa,
        3_600,
    );

    let signed = authorizer.authorize(&signer, &request).await.unwrap();
    assert!(authorizer.preflight(signed.order_id).await.unwrap().is_clear());

    // the server submitted it and the escrow now holds the fee
    escrow.insert_escrow(
        signed.order_id,
        EscrowRecord {
            payer: signed.payer,
            affiliate: Address::ZERO,
            orderFeePlatform: U256::from(signed.platform_fee),
            orderFeeAffiliate: U256::from(signed.affiliate_fee),
            performanceFeePlatform: U256::ZERO,
            performanceFeeAffiliate: U256::ZERO,
            completed: false,
            timeUntilWithdrawal: U256::from(86_400),
        },
    );

    let (same_id, _) = authorizer.quote(&request).unwrap();
    assert_eq!(same_id, signed.order_id);
    let report = authorizer.preflight(same_id).await.unwrap();
    assert_eq!(report.hold_state, HoldState::Held);
    assert!(!report.is_clear());
    assert_eq!(
        escrow.remaining_escrow(same_id).await.unwrap(),
        U256::from(signed.total_fee())
    );

    // a new attempt a millisecond later is a new order
    let retry_request = AuthorizationRequest::order_fee(
        economics(signer.address(), 1_700_000_000_001),
        WalletType::Eoa,
        3_600,
    );
    let (new_id, _) = authorizer.quote(&retry_request).unwrap();
    assert!(authorizer.preflight(new_id).await.unwrap().is_clear());
}

#[rstest]
#[tokio::test]
async fn paused_escrow_is_reported(config: EscrowConfig, escrow: InMemoryEscrow) {
    let signer = LocalSigner::random();
    let authorizer = FeeAuthorizer::new(config, escrow.clone());
    let (order_id, _) = authorizer
        .quote(&AuthorizationRequest::order_fee(
            economics(signer.address(), 1_700_000_000_000),
            WalletType::Eoa,
            3_600,
        ))
        .unwrap();

    escrow.set_paused(true);
    let report = authorizer.preflight(order_id).await.unwrap();
    assert!(report.paused);
    assert!(!report.is_clear());
}

#[rstest]
#[tokio::test]
async fn permit_nonce_advances_between_attempts(config: EscrowConfig, escrow: InMemoryEscrow) {
    let signer = LocalSigner::random();
    let authorizer = FeeAuthorizer::new(config, escrow.clone());
    let request = AuthorizationRequest::order_fee(
        economics(signer.address(), 1_700_000_000_000),
        WalletType::Eoa,
        3_600,
    );

    let first = authorizer.authorize(&signer, &request).await.unwrap();
    escrow.set_nonce(signer.address(), U256::from(1));
    let second = authorizer.authorize(&signer, &request).await.unwrap();

    assert_eq!(first.permit_nonce, Some(U256::ZERO));
    assert_eq!(second.permit_nonce, Some(U256::from(1)));
    assert_ne!(first.signature, second.signature);
}

#[rstest]
#[tokio::test]
async fn transient_read_failures_can_be_retried(escrow: InMemoryEscrow) {
    let policy = RetryPolicy {
        max_attempts: 3,
        delay_ms: 1,
        timeout_ms: 1_000,
    };
    let operator = address!("0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f");
    escrow.grant_role(operator_role(), operator);

    escrow.inject_transient_failures(2);
    let is_operator = policy
        .retry("hasRole", || escrow.is_operator(operator))
        .await
        .unwrap();
    assert!(is_operator);

    escrow.inject_transient_failures(3);
    let err = policy
        .retry("hasRole", || escrow.is_operator(operator))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }));
}

#[rstest]
#[tokio::test]
async fn contract_fee_rates_can_differ(escrow: InMemoryEscrow) {
    escrow.set_fee_rates(FeeRates {
        fee_bps: U256::from(50),
        min_fee: U256::from(20_000),
    });

    assert_eq!(
        escrow.calculate_fee(U256::from(100_000_000)).await.unwrap(),
        U256::from(500_000)
    );
    assert_eq!(
        escrow.calculate_fee(U256::from(1_000_000)).await.unwrap(),
        U256::from(20_000)
    );
}
