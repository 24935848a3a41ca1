//! # rtm-template
//!
//! Mining block templates for Raptoreum-family chains.
//!
//! This crate turns the result of a node's `getblocktemplate` call into the
//! hex block blob a Stratum job layer hands to miners. It handles the fiddly
//! details of the chain's coinbase: special transaction versions and payloads,
//! smartnode, superblock, founder and developer payouts, the segwit witness
//! commitment, and the 17-byte extranonce region inside the scriptSig.
//!
//! ## Quick Start
//!
//! ```rust
//! use rtm_template::{RawTemplate, TemplateBuilder};
//!
//! let raw = RawTemplate::from_json(
//!     r#"{
//!         "height": 1000,
//!         "previousblockhash": "0000000000000000000000000000000000000000000000000000000000000000",
//!         "target": "00000000ffff0000000000000000000000000000000000000000000000000000",
//!         "bits": "1d00ffff",
//!         "curtime": 1600000000,
//!         "version": 4,
//!         "coinbasevalue": 5000000000,
//!         "transactions": []
//!     }"#,
//! )
//! .unwrap();
//!
//! let template = TemplateBuilder::new(&raw, "RJXM13LtN8AeY54ck27M8ePPKTycEjKo89")
//!     .with_timestamp(1_600_000_000)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(template.difficulty, 1.0);
//!
//! // The job layer writes each worker's extranonce at `reserved_offset`.
//! let coinbase = template.coinbase.assemble(&[0u8; 17]).unwrap();
//! assert!(coinbase.is_coinbase());
//! ```
//!
//! ## Modules
//!
//! - [`template`] - Block assembly ([`BlockTemplate`], [`TemplateBuilder`])
//! - [`rpc`] - The `getblocktemplate` result model ([`RawTemplate`])
//! - [`reward`] - Reward distribution into coinbase outputs
//! - [`builder`] - Coinbase serialization ([`CoinbaseBuilder`])
//! - [`split`] - Coinbase segments around the extranonce ([`CoinbaseSplit`])
//! - [`script`] - Coinbase scriptSig construction
//! - [`filter`] - Node transaction filtering
//! - [`address`] - Payout address resolution ([`Payee`])
//! - [`witness`] - Segwit coinbase witness helpers
//! - [`codec`] - Little-endian packers, varints and script numbers
//! - [`error`] - Error types

pub mod address;
pub mod builder;
pub mod codec;
pub mod error;
pub mod filter;
pub mod reward;
pub mod rpc;
pub mod script;
pub mod split;
pub mod template;
pub mod witness;

// Re-export primary types for convenience.
pub use address::Payee;
pub use builder::CoinbaseBuilder;
pub use error::TemplateError;
pub use rpc::RawTemplate;
pub use split::CoinbaseSplit;
pub use template::{BlockTemplate, TemplateBuilder};

// Re-export the bitcoin crate so callers can work with the decoded
// transactions without a separate dependency.
pub use bitcoin;
