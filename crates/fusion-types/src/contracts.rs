//! Solidity interfaces for the token contracts the fusion flow touches.
//!
//! Only the functions the prober, the token reader and the instruction
//! builder need are declared.

use alloy_sol_types::sol;

sol! {
	/// ERC-20 with the ERC-2612 permit extension.
	#[derive(Debug)]
	interface IERC20Permit {
		function name() external view returns (string);
		function symbol() external view returns (string);
		function decimals() external view returns (uint8);
		function balanceOf(address account) external view returns (uint256);
		function allowance(address owner, address spender) external view returns (uint256);
		function transfer(address to, uint256 value) external returns (bool);
		function approve(address spender, uint256 value) external returns (bool);
		function DOMAIN_SEPARATOR() external view returns (bytes32);
		function nonces(address owner) external view returns (uint256);
	}
}
