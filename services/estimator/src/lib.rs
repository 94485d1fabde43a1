//! # Swap Estimator
//!
//! HTTP service quoting the output of a swap through a Uniswap V2 style
//! constant-product pool. Pool tokens and reserves are read from chain on
//! every request.
//!
//! ## Architecture
//!
//! ```text
//! HTTP /estimate → EstimateRequest → EstimationEngine → PairStateReader → RPC node
//!                                          ↓
//!                                    amm::V2Math
//! ```

pub mod address;
pub mod config;
pub mod engine;
pub mod error;
pub mod fanout;
pub mod reader;
pub mod request;
pub mod rpc_client;
pub mod server;

pub use address::Address;
pub use config::EstimatorConfig;
pub use engine::{EngineConfig, EstimationEngine};
pub use error::{ErrorKind, EstimateError, InvalidArgument, ReaderError, Result};
pub use reader::{Orientation, PairReserves, PairStateReader, PairTokens};
pub use request::{EstimateQuery, EstimateRequest};
pub use rpc_client::{ChainPairReader, PairCaller, TokenSlot, Web3PairCaller};
pub use server::EstimatorServer;
