//! Utility functions for formatting and unit conversion.
//!
//! This module provides helpers shared by the fusion crates for hex prefix
//! handling, display truncation and decimal/minor-unit conversion.

pub mod constants;
pub mod formatting;
pub mod units;

pub use constants::ZERO_BYTES32;
pub use formatting::{short_address, truncate_id, with_0x_prefix, without_0x_prefix};
pub use units::{format_units, parse_units, UnitsError};
