//! Known Program Addresses
//!
//! Token programs whose instructions can create a mint, plus address helpers
//! used by configuration validation.

use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// SPL Token program
pub const SPL_TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// SPL Token-2022 program
pub const SPL_TOKEN_2022_PROGRAM: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";

/// Programs that own mint accounts
pub const TOKEN_PROGRAMS: &[&str] = &[SPL_TOKEN_PROGRAM, SPL_TOKEN_2022_PROGRAM];

/// Instruction types that initialize a mint on the token programs
pub const MINT_INIT_INSTRUCTIONS: &[&str] = &["initializeMint", "initializeMint2"];

/// Instruction type reported by enhanced feeds for a token launch, on any program
pub const CREATE_TOKEN_INSTRUCTION: &str = "createToken";

/// Check if a string is a valid base58 Solana address
pub fn is_valid_address(address: &str) -> bool {
    Pubkey::from_str(address).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_programs_are_valid_addresses() {
        assert!(TOKEN_PROGRAMS.iter().all(|p| is_valid_address(p)));
    }

    #[test]
    fn test_is_valid_address() {
        assert!(is_valid_address("So11111111111111111111111111111111111111112"));
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("not-a-key"));
    }
}
