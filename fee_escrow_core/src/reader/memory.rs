// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory stand-in for the escrow and token contracts, for tests and local
//! development.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, RwLock},
};

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use fee_escrow_messages::{EscrowRecord, HoldState};

use super::{EscrowReader, FeeRates, ReaderError};
use crate::{
    fees::{DEFAULT_MIN_FEE, DEFAULT_ORDER_FEE_BPS},
    money::BPS_DENOMINATOR,
    order_id::OrderId,
    Error, Result,
};

#[derive(Debug)]
struct State {
    nonces: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    holds: HashMap<OrderId, HoldState>,
    escrows: HashMap<OrderId, EscrowRecord>,
    fee_rates: FeeRates,
    roles: HashSet<(B256, Address)>,
    paused: bool,
    failures_left: u32,
}

impl Default for State {
    fn default() -> Self {
        Self {
            nonces: HashMap::new(),
            allowances: HashMap::new(),
            holds: HashMap::new(),
            escrows: HashMap::new(),
            fee_rates: FeeRates {
                fee_bps: U256::from(DEFAULT_ORDER_FEE_BPS),
                min_fee: U256::from(DEFAULT_MIN_FEE),
            },
            roles: HashSet::new(),
            paused: false,
            failures_left: 0,
        }
    }
}

/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEscrow {
    state: Arc<RwLock<State>>,
}

impl InMemoryEscrow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_nonce(&self, owner: Address, nonce: U256) {
        self.state.write().unwrap().nonces.insert(owner, nonce);
    }

    pub fn set_allowance(&self, owner: Address, spender: Address, amount: U256) {
        self.state
            .write()
            .unwrap()
            .allowances
            .insert((owner, spender), amount);
    }

    pub fn set_hold_state(&self, order_id: OrderId, state: HoldState) {
        self.state.write().unwrap().holds.insert(order_id, state);
    }

    /// Records an escrow and marks the order as held
    pub fn insert_escrow(&self, order_id: OrderId, record: EscrowRecord) {
        let mut state = self.state.write().unwrap();
        let hold = if record.completed {
            HoldState::Sent
        } else {
            HoldState::Held
        };
        state.holds.insert(order_id, hold);
        state.escrows.insert(order_id, record);
    }

    pub fn set_fee_rates(&self, fee_rates: FeeRates) {
        self.state.write().unwrap().fee_rates = fee_rates;
    }

    pub fn grant_role(&self, role: B256, account: Address) {
        self.state.write().unwrap().roles.insert((role, account));
    }

    pub fn set_paused(&self, paused: bool) {
        self.state.write().unwrap().paused = paused;
    }

    /// The next `count` reads fail with a transport error
    pub fn inject_transient_failures(&self, count: u32) {
        self.state.write().unwrap().failures_left = count;
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> Result<T> {
        let mut state = self.state.write().unwrap();
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(Error::Reader(ReaderError::Transport(
                "injected failure".to_owned(),
            )));
        }
        Ok(f(&state))
    }
}

#[async_trait]
impl EscrowReader for InMemoryEscrow {
    async fn permit_nonce(&self, owner: Address) -> Result<U256> {
        self.read(|state| state.nonces.get(&owner).copied().unwrap_or_default())
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        self.read(|state| {
            state
                .allowances
                .get(&(owner, spender))
                .copied()
                .unwrap_or_default()
        })
    }

    async fn hold_state(&self, order_id: OrderId) -> Result<HoldState> {
        self.read(|state| state.holds.get(&order_id).copied().unwrap_or_default())
    }

    async fn escrow_record(&self, order_id: OrderId) -> Result<EscrowRecord> {
        self.read(|state| state.escrows.get(&order_id).cloned())?
            .ok_or_else(|| ReaderError::NotFound(order_id.to_string()).into())
    }

    async fn remaining_escrow(&self, order_id: OrderId) -> Result<U256> {
        self.read(|state| match state.escrows.get(&order_id) {
            Some(record) if !record.completed => record
                .order_fee_total()
                .saturating_add(record.performance_fee_total()),
            _ => U256::ZERO,
        })
    }

    async fn fee_rates(&self) -> Result<FeeRates> {
        self.read(|state| state.fee_rates)
    }

    async fn has_role(&self, role: B256, account: Address) -> Result<bool> {
        self.read(|state| state.roles.contains(&(role, account)))
    }

    async fn is_paused(&self) -> Result<bool> {
        self.read(|state| state.paused)
    }

    /// Same checked uint256 math as the contract; an overflow reverts.
    async fn calculate_fee(&self, amount: U256) -> Result<U256> {
        let rates = self.read(|state| state.fee_rates)?;
        let fee = amount.checked_mul(rates.fee_bps).ok_or_else(|| {
            ReaderError::Contract(format!(
                "arithmetic overflow in calculateFee({amount}) at {} bps",
                rates.fee_bps
            ))
        })? / U256::from(BPS_DENOMINATOR);
        Ok(fee.max(rates.min_fee))
    }
}
