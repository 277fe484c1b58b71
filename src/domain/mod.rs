//! Domain Layer - Core detection and tracking logic
//!
//! Pure types and rules with no network access. All external interactions
//! happen through the ports layer.
//!
//! - `token`: per-token all-time-high and one-shot drawdown alert
//! - `registry`: shared map of tracked tokens
//! - `seen`: bounded set of already-evaluated feed signatures
//! - `mint_detector`: mint-initialization pattern matching
//! - `known_programs`: token program addresses
//! - `elapsed`: hours/minutes/seconds breakdown for alert messages

pub mod token;
pub mod registry;
pub mod seen;
pub mod mint_detector;
pub mod known_programs;
pub mod elapsed;

pub use token::{drawdown_pct, DrawdownAlert, Observation, TrackedToken, DEFAULT_DRAWDOWN_THRESHOLD_PCT};
pub use registry::TokenRegistry;
pub use seen::{SeenSignatures, DEFAULT_SEEN_CAPACITY};
pub use mint_detector::{MintDetector, MintMatch, MintPattern};
pub use known_programs::{is_valid_address, SPL_TOKEN_PROGRAM, SPL_TOKEN_2022_PROGRAM};
pub use elapsed::Elapsed;
