// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration for one escrow deployment.
//!
//! Contract addresses, fee rates and bounds live in a single [`EscrowConfig`]
//! value passed explicitly to every component. There is no process-wide
//! configuration.

use alloy::{
    dyn_abi::Eip712Domain,
    primitives::{address, Address},
};
use serde::{Deserialize, Serialize};

use crate::{
    authorization::DeadlineConfig, escrow_eip712_domain, fees::FeeConfig, permit_eip712_domain,
    retry::RetryPolicy,
};

pub const POLYGON_CHAIN_ID: u64 = 137;
/// Bridged USDC (USDC.e) on Polygon PoS
pub const POLYGON_USDC_E: Address = address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174");
/// EIP712 domain name of [`POLYGON_USDC_E`]
pub const POLYGON_USDC_E_NAME: &str = "USD Coin (PoS)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowConfig {
    pub chain_id: u64,
    /// Fee escrow contract, spender of permits and verifying contract of fee
    /// authorizations
    pub escrow_address: Address,
    /// Permit-capable token fees are paid in
    pub token_address: Address,
    /// Token's EIP712 domain name
    pub token_name: String,
    #[serde(default)]
    pub fees: FeeConfig,
    #[serde(default)]
    pub deadlines: DeadlineConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl EscrowConfig {
    /// Defaults for an escrow collecting USDC.e on Polygon PoS
    pub fn polygon(escrow_address: Address) -> Self {
        Self {
            chain_id: POLYGON_CHAIN_ID,
            escrow_address,
            token_address: POLYGON_USDC_E,
            token_name: POLYGON_USDC_E_NAME.to_owned(),
            fees: FeeConfig::default(),
            deadlines: DeadlineConfig::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Parses a JSON document, filling omitted sections with defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Domain for fee authorizations signed by smart-contract wallets
    pub fn escrow_domain(&self) -> Eip712Domain {
        escrow_eip712_domain(self.chain_id, self.escrow_address)
    }

    /// Domain for token permits signed by externally-owned accounts
    pub fn permit_domain(&self) -> Eip712Domain {
        permit_eip712_domain(&self.token_name, self.chain_id, self.token_address)
    }
}
