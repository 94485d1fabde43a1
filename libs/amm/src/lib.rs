//! # AMM Library - Exact Constant-Product Mathematics
//!
//! ## Purpose
//!
//! Integer-exact Uniswap V2 output calculation for off-chain swap quoting.
//! All arithmetic runs on arbitrary-precision integers and is truncated once,
//! at the final division, matching what the pair contract itself computes.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Oriented pool reserves and a caller-supplied input amount
//! - **Output Destinations**: The swap estimator engine
//! - **Fee Model**: Single integer ratio per calculator ([`FeeRate`]), 997/1000 by default
//!
//! ## Performance Profile
//!
//! - **Allocation**: Temporaries are drawn from a bounded [`ScratchPool`]; a warm
//!   pool makes the calculation allocation-free apart from the returned value
//! - **Contention**: Scratch acquisition never blocks; an empty pool falls back
//!   to a fresh allocation

pub mod scratch;
pub mod v2_math;

pub use scratch::{ScratchPool, DEFAULT_SCRATCH_CAPACITY};
pub use v2_math::{FeeRate, FeeRateError, V2Math};

/// Common types for AMM calculations
pub use num_bigint::BigInt;
