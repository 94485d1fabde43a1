//! Pair state capability consumed by the estimation engine

use crate::address::Address;
use crate::error::ReaderError;
use async_trait::async_trait;
use num_bigint::BigInt;
use std::sync::Arc;
use tokio::time::Instant;

/// Token addresses in the order the pool contract stores them.
/// Not necessarily sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairTokens {
    pub token0: Address,
    pub token1: Address,
}

/// Reserves index-aligned with [`PairTokens`]: `reserve0` belongs to `token0`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairReserves {
    pub reserve0: BigInt,
    pub reserve1: BigInt,
}

/// Swap direction relative to the pool's canonical ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// src is token0, dst is token1
    ZeroForOne,
    /// src is token1, dst is token0
    OneForZero,
}

impl PairTokens {
    /// Direction of a `src -> dst` swap, or `None` unless `{src, dst}` is
    /// exactly this pair
    pub fn orient(&self, src: Address, dst: Address) -> Option<Orientation> {
        if src == self.token0 && dst == self.token1 {
            Some(Orientation::ZeroForOne)
        } else if src == self.token1 && dst == self.token0 {
            Some(Orientation::OneForZero)
        } else {
            None
        }
    }
}

impl Orientation {
    /// `(reserve_in, reserve_out)` for this direction
    pub fn select<'a>(&self, reserves: &'a PairReserves) -> (&'a BigInt, &'a BigInt) {
        match self {
            Orientation::ZeroForOne => (&reserves.reserve0, &reserves.reserve1),
            Orientation::OneForZero => (&reserves.reserve1, &reserves.reserve0),
        }
    }
}

/// Read access to a pair contract's tokens and reserves
///
/// Implementations must return reserves in the same order as tokens.
#[async_trait]
pub trait PairStateReader: Send + Sync {
    async fn tokens(&self, pool: Address, deadline: Instant) -> Result<PairTokens, ReaderError>;

    async fn reserves(&self, pool: Address, deadline: Instant)
        -> Result<PairReserves, ReaderError>;
}

#[async_trait]
impl<T: PairStateReader + ?Sized> PairStateReader for Arc<T> {
    async fn tokens(&self, pool: Address, deadline: Instant) -> Result<PairTokens, ReaderError> {
        (**self).tokens(pool, deadline).await
    }

    async fn reserves(
        &self,
        pool: Address,
        deadline: Instant,
    ) -> Result<PairReserves, ReaderError> {
        (**self).reserves(pool, deadline).await
    }
}
