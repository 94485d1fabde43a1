//! Swap estimation engine
//!
//! Validates the request, resolves the pool's tokens, binds reserves to the
//! swap direction and runs the constant-product calculation. Every request
//! reads fresh pool state; nothing is cached between calls.

use crate::error::{EstimateError, InvalidArgument, ReaderError, Result};
use crate::reader::PairStateReader;
use crate::request::EstimateRequest;
use amm::{FeeRate, V2Math, DEFAULT_SCRATCH_CAPACITY};
use num_bigint::BigInt;
use num_traits::Zero;
use std::future::Future;
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

/// Calculation settings for [`EstimationEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub fee: FeeRate,
    /// Idle big-integer scratch slots kept between calculations
    pub scratch_pool_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee: FeeRate::default(),
            scratch_pool_size: DEFAULT_SCRATCH_CAPACITY,
        }
    }
}

pub struct EstimationEngine {
    reader: Arc<dyn PairStateReader>,
    math: V2Math,
}

impl EstimationEngine {
    pub fn new(reader: Arc<dyn PairStateReader>, config: EngineConfig) -> Self {
        Self {
            reader,
            math: V2Math::with_scratch_capacity(config.fee, config.scratch_pool_size),
        }
    }

    pub fn fee(&self) -> FeeRate {
        self.math.fee()
    }

    /// Amount of `dst` received for `src_amount` of `src`
    ///
    /// Pair reads that do not finish by `deadline` fail as
    /// [`EstimateError::PairReadFailed`]. A computed output of zero is
    /// reported as [`EstimateError::InsufficientLiquidity`].
    pub async fn estimate(&self, request: &EstimateRequest, deadline: Instant) -> Result<BigInt> {
        let amount_in = request.validate()?;
        let pool = request.pool;

        let tokens = bounded("tokens", deadline, self.reader.tokens(pool, deadline)).await?;

        let orientation = tokens.orient(request.src, request.dst).ok_or_else(|| {
            InvalidArgument::NotInPool {
                pool,
                src: request.src,
                dst: request.dst,
                token0: tokens.token0,
                token1: tokens.token1,
            }
        })?;

        let reserves = bounded("reserves", deadline, self.reader.reserves(pool, deadline)).await?;
        let (reserve_in, reserve_out) = orientation.select(&reserves);

        debug!(
            "Pool {} {:?}: amount_in={} reserve_in={} reserve_out={}",
            pool, orientation, amount_in, reserve_in, reserve_out
        );

        match self.math.get_amount_out(amount_in, reserve_in, reserve_out) {
            Some(amount_out) if !amount_out.is_zero() => Ok(amount_out),
            _ => {
                warn!(
                    "Insufficient liquidity in pool {} for {} of {}",
                    pool, amount_in, request.src
                );
                Err(EstimateError::InsufficientLiquidity)
            }
        }
    }
}

/// Await a reader call, failing it once the request deadline passes
async fn bounded<T>(
    operation: &'static str,
    deadline: Instant,
    call: impl Future<Output = std::result::Result<T, ReaderError>>,
) -> Result<T> {
    match timeout_at(deadline, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(EstimateError::pair_read(operation, e)),
        Err(_) => Err(EstimateError::pair_read(
            operation,
            ReaderError::DeadlineExceeded { operation },
        )),
    }
}
