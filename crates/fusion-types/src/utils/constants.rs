//! Constants shared across the fusion crates.

use alloy_primitives::B256;

/// The all-zero 32-byte word.
///
/// A token reporting this as its `DOMAIN_SEPARATOR` does not implement
/// ERC-2612 in any usable way.
pub const ZERO_BYTES32: B256 = B256::ZERO;

/// Protocol version tag of the sponsor's execution environment.
pub const EXECUTION_VERSION: &str = "2.1.0";

/// EIP-1193 error code a wallet returns when the user declines a request.
pub const USER_REJECTED_CODE: i64 = 4001;
