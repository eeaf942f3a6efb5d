// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Fee escrow structs
//!
//! Solidity-compatible structs exchanged with the fee escrow contract and the
//! permit-capable stablecoin it pulls fees from.
//!
//! - [`OrderFeeAuthorization`] and [`PerformanceFeeAuthorization`] are signed
//!   under the escrow's own EIP712 domain by smart-contract wallets.
//! - [`Permit`] is the EIP-2612 approval signed by externally-owned accounts.
//! - [`EscrowRecord`] and [`HoldState`] mirror the escrow's per-order state.
//!
//! Field names use camelCase so the generated EIP712 type strings match the
//! contract's.

mod authorization;
mod escrow;
mod permit;

pub use authorization::{
    OrderFeeAuthorization, PerformanceFeeAuthorization, SignedOrderFeeAuthorization,
    SignedPerformanceFeeAuthorization,
};
pub use escrow::{EscrowRecord, HoldState, HoldStateError};
pub use permit::{Permit, SignedPermit};
