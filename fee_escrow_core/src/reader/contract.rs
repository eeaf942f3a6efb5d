// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! [`EscrowReader`] backed by `eth_call`s against the deployed contracts.

use alloy::{
    primitives::{Address, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    sol,
    transports::RpcError,
};
use async_trait::async_trait;
use fee_escrow_messages::{EscrowRecord, HoldState};
use log::debug;

use super::{EscrowReader, FeeRates, ReaderError};
use crate::{config::EscrowConfig, order_id::OrderId, retry::RetryPolicy, Error, Result};

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IFeeEscrow {
        struct Escrow {
            address payer;
            address affiliate;
            uint256 orderFeePlatform;
            uint256 orderFeeAffiliate;
            uint256 performanceFeePlatform;
            uint256 performanceFeeAffiliate;
            bool completed;
            uint256 timeUntilWithdrawal;
        }

        function getHoldState(bytes32 orderId) external view returns (uint8);
        function getEscrow(bytes32 orderId) external view returns (Escrow memory);
        function getRemainingEscrow(bytes32 orderId) external view returns (uint256);
        function feeBps() external view returns (uint256);
        function minFee() external view returns (uint256);
        function calculateFee(uint256 amount) external pure returns (uint256);
        function hasRole(bytes32 role, address account) external view returns (bool);
        function paused() external view returns (bool);
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IERC20Permit {
        function nonces(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
    }
}

impl From<IFeeEscrow::Escrow> for EscrowRecord {
    fn from(escrow: IFeeEscrow::Escrow) -> Self {
        EscrowRecord {
            payer: escrow.payer,
            affiliate: escrow.affiliate,
            orderFeePlatform: escrow.orderFeePlatform,
            orderFeeAffiliate: escrow.orderFeeAffiliate,
            performanceFeePlatform: escrow.performanceFeePlatform,
            performanceFeeAffiliate: escrow.performanceFeeAffiliate,
            completed: escrow.completed,
            timeUntilWithdrawal: escrow.timeUntilWithdrawal,
        }
    }
}

/// Rate limit responses from the node are transport errors and get retried.
/// Any other error response (reverts, unknown selectors) will not go away on
/// a retry.
fn map_contract_error(err: alloy::contract::Error) -> Error {
    let err = match err {
        alloy::contract::Error::TransportError(RpcError::ErrorResp(payload))
            if payload.is_retry_err() =>
        {
            ReaderError::Transport(payload.to_string())
        }
        alloy::contract::Error::TransportError(RpcError::ErrorResp(payload)) => {
            ReaderError::Contract(payload.to_string())
        }
        alloy::contract::Error::TransportError(err) => ReaderError::Transport(err.to_string()),
        err => ReaderError::Contract(err.to_string()),
    };
    Error::Reader(err)
}

pub struct ContractReader<P> {
    escrow: IFeeEscrow::IFeeEscrowInstance<P>,
    token: IERC20Permit::IERC20PermitInstance<P>,
    retry: RetryPolicy,
}

impl ContractReader<DynProvider> {
    /// Reader over a plain HTTP provider for the contracts in `config`
    pub fn connect_http(rpc_url: &str, config: &EscrowConfig) -> Result<Self> {
        let url = rpc_url.parse().map_err(|err| {
            Error::Reader(ReaderError::Transport(format!(
                "invalid RPC URL {rpc_url}: {err}"
            )))
        })?;
        let provider = ProviderBuilder::new().connect_http(url).erased();
        Ok(Self::new(provider, config))
    }
}

impl<P: Provider + Clone> ContractReader<P> {
    pub fn new(provider: P, config: &EscrowConfig) -> Self {
        Self {
            escrow: IFeeEscrow::new(config.escrow_address, provider.clone()),
            token: IERC20Permit::new(config.token_address, provider),
            retry: config.retry,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> EscrowReader for ContractReader<P> {
    async fn permit_nonce(&self, owner: Address) -> Result<U256> {
        let nonce = self
            .retry
            .retry("nonces", || async move {
                self.token
                    .nonces(owner)
                    .call()
                    .await
                    .map_err(map_contract_error)
            })
            .await?;
        debug!("permit nonce of {owner} is {nonce}");
        Ok(nonce)
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        self.retry
            .retry("allowance", || async move {
                self.token
                    .allowance(owner, spender)
                    .call()
                    .await
                    .map_err(map_contract_error)
            })
            .await
    }

    async fn hold_state(&self, order_id: OrderId) -> Result<HoldState> {
        let raw = self
            .retry
            .retry("getHoldState", || async move {
                self.escrow
                    .getHoldState(order_id.0)
                    .call()
                    .await
                    .map_err(map_contract_error)
            })
            .await?;
        Ok(HoldState::try_from(raw).map_err(ReaderError::from)?)
    }

    async fn escrow_record(&self, order_id: OrderId) -> Result<EscrowRecord> {
        let escrow = self
            .retry
            .retry("getEscrow", || async move {
                self.escrow
                    .getEscrow(order_id.0)
                    .call()
                    .await
                    .map_err(map_contract_error)
            })
            .await?;
        if escrow.payer == Address::ZERO {
            return Err(ReaderError::NotFound(order_id.to_string()).into());
        }
        Ok(escrow.into())
    }

    async fn remaining_escrow(&self, order_id: OrderId) -> Result<U256> {
        self.retry
            .retry("getRemainingEscrow", || async move {
                self.escrow
                    .getRemainingEscrow(order_id.0)
                    .call()
                    .await
                    .map_err(map_contract_error)
            })
            .await
    }

    async fn fee_rates(&self) -> Result<FeeRates> {
        let fee_bps = self
            .retry
            .retry("feeBps", || async move {
                self.escrow
                    .feeBps()
                    .call()
                    .await
                    .map_err(map_contract_error)
            })
            .await?;
        let min_fee = self
            .retry
            .retry("minFee", || async move {
                self.escrow
                    .minFee()
                    .call()
                    .await
                    .map_err(map_contract_error)
            })
            .await?;
        Ok(FeeRates { fee_bps, min_fee })
    }

    async fn has_role(&self, role: B256, account: Address) -> Result<bool> {
        self.retry
            .retry("hasRole", || async move {
                self.escrow
                    .hasRole(role, account)
                    .call()
                    .await
                    .map_err(map_contract_error)
            })
            .await
    }

    async fn is_paused(&self) -> Result<bool> {
        self.retry
            .retry("paused", || async move {
                self.escrow
                    .paused()
                    .call()
                    .await
                    .map_err(map_contract_error)
            })
            .await
    }

    async fn calculate_fee(&self, amount: U256) -> Result<U256> {
        self.retry
            .retry("calculateFee", || async move {
                self.escrow
                    .calculateFee(amount)
                    .call()
                    .await
                    .map_err(map_contract_error)
            })
            .await
    }
}
