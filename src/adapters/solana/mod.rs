pub mod rpc;
pub mod instructions;

pub use rpc::{parse_commitment, SolanaClient, SolanaClientError};
