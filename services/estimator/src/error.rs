//! Error types for swap estimation
//!
//! Each layer wraps its cause with the operation that failed, while
//! [`EstimateError::kind`] keeps the classification available to the HTTP
//! boundary without inspecting messages.

use crate::address::Address;
use thiserror::Error;

/// Result type alias for estimator operations
pub type Result<T> = std::result::Result<T, EstimateError>;

/// Classification used to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller input is structurally or semantically wrong
    InvalidArgument,
    /// Pool tokens or reserves could not be read
    PairReadFailed,
    /// Valid request, but the pool cannot produce a non-zero output
    InsufficientLiquidity,
}

/// Failure reading pair state from chain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderError {
    /// Transport or contract-call fault
    #[error("call to {method} failed: {message}")]
    Call {
        method: &'static str,
        message: String,
    },

    /// Call returned data that does not match the pair ABI
    #[error("failed to decode {method} result: {message}")]
    Decode {
        method: &'static str,
        message: String,
    },

    /// Per-call timeout elapsed
    #[error("{method} timed out after {timeout_ms}ms")]
    Timeout { method: &'static str, timeout_ms: u64 },

    /// Request deadline elapsed before the reader answered
    #[error("request deadline exceeded during {operation}")]
    DeadlineExceeded { operation: &'static str },

    /// Several concurrent calls failed; all causes are kept
    #[error("{}", join_messages(.0))]
    Multiple(Vec<ReaderError>),
}

fn join_messages(errors: &[ReaderError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ReaderError {
    /// Combine branch failures, flattening a single failure
    pub fn combine(mut errors: Vec<ReaderError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            ReaderError::Multiple(errors)
        }
    }
}

/// Rejected caller input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidArgument {
    #[error("missing parameter: {name}")]
    MissingParam { name: &'static str },

    #[error("bad address format for {field}: {value}")]
    MalformedAddress { field: &'static str, value: String },

    #[error("bad src_amount: {value}")]
    MalformedAmount { value: String },

    #[error("{field} must not be the zero address")]
    ZeroAddress { field: &'static str },

    #[error("src and dst must differ")]
    SameToken,

    #[error("src_amount is required")]
    MissingAmount,

    #[error("src_amount must be positive")]
    NonPositiveAmount,

    #[error("tokens {src}/{dst} do not form pool {pool} (token0 {token0}, token1 {token1})")]
    NotInPool {
        pool: Address,
        src: Address,
        dst: Address,
        token0: Address,
        token1: Address,
    },
}

/// Main error type for estimation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimateError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),

    #[error("pair read failed: {operation}: {source}")]
    PairReadFailed {
        /// Reader operation that failed ("tokens" or "reserves")
        operation: &'static str,
        source: ReaderError,
    },

    #[error("insufficient liquidity")]
    InsufficientLiquidity,
}

impl EstimateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EstimateError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            EstimateError::PairReadFailed { .. } => ErrorKind::PairReadFailed,
            EstimateError::InsufficientLiquidity => ErrorKind::InsufficientLiquidity,
        }
    }

    pub(crate) fn pair_read(operation: &'static str, source: ReaderError) -> Self {
        EstimateError::PairReadFailed { operation, source }
    }
}
