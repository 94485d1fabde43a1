//! Uniswap V2 AMM math with exact integer calculations
//!
//! Output amounts are computed in arbitrary precision and truncated once, at
//! the final division, so there is no intermediate rounding and no overflow
//! regardless of reserve size.

use num_bigint::{BigInt, Sign};
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scratch::{Scratch, ScratchPool, DEFAULT_SCRATCH_CAPACITY};

/// Rejected fee configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeRateError {
    #[error("Fee denominator must be non-zero")]
    ZeroDenominator,

    #[error("Fee numerator must be non-zero")]
    ZeroNumerator,

    #[error("Fee numerator {numerator} exceeds denominator {denominator}")]
    NumeratorExceedsDenominator { numerator: u32, denominator: u32 },
}

/// Share of the input amount that counts toward the invariant, as an integer
/// ratio. `997/1000` keeps 99.7% of the input, i.e. a 0.3% trading fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRate {
    numerator: u32,
    denominator: u32,
}

impl FeeRate {
    /// Standard 0.3% V2 pool fee
    pub const UNISWAP_V2: FeeRate = FeeRate {
        numerator: 997,
        denominator: 1000,
    };

    pub fn new(numerator: u32, denominator: u32) -> Result<Self, FeeRateError> {
        if denominator == 0 {
            return Err(FeeRateError::ZeroDenominator);
        }
        if numerator == 0 {
            return Err(FeeRateError::ZeroNumerator);
        }
        if numerator > denominator {
            return Err(FeeRateError::NumeratorExceedsDenominator {
                numerator,
                denominator,
            });
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }
}

impl Default for FeeRate {
    fn default() -> Self {
        Self::UNISWAP_V2
    }
}

/// Constant-product output calculator
///
/// Safe to share between threads: the only shared state is the scratch pool,
/// and taking a scratch slot never waits.
#[derive(Debug)]
pub struct V2Math {
    fee: FeeRate,
    scratch: ScratchPool,
}

impl V2Math {
    pub fn new(fee: FeeRate) -> Self {
        Self::with_scratch_capacity(fee, DEFAULT_SCRATCH_CAPACITY)
    }

    /// Calculator keeping at most `capacity` idle scratch slots
    pub fn with_scratch_capacity(fee: FeeRate, capacity: usize) -> Self {
        Self {
            fee,
            scratch: ScratchPool::new(capacity),
        }
    }

    pub fn fee(&self) -> FeeRate {
        self.fee
    }

    /// Calculate exact output amount using the x*y=k formula
    ///
    /// `amount_out = floor(amount_in * fee_num * reserve_out / (reserve_in * fee_den + amount_in * fee_num))`
    ///
    /// Writes the result into `out` and returns `true`. When any input is not
    /// strictly positive, or the denominator comes out zero, `out` is set to
    /// zero and `false` is returned. A `true` result may still be zero for a
    /// dust input against deep reserves.
    pub fn get_amount_out_into(
        &self,
        out: &mut BigInt,
        amount_in: &BigInt,
        reserve_in: &BigInt,
        reserve_out: &BigInt,
    ) -> bool {
        if amount_in.sign() != Sign::Plus
            || reserve_in.sign() != Sign::Plus
            || reserve_out.sign() != Sign::Plus
        {
            out.set_zero();
            return false;
        }

        let mut guard = self.scratch.acquire();
        let Scratch {
            effective_in,
            numerator,
            denominator,
        } = &mut *guard;

        // amount_in * fee_num
        effective_in.clone_from(amount_in);
        *effective_in *= self.fee.numerator;

        // effective_in * reserve_out
        numerator.clone_from(effective_in);
        *numerator *= reserve_out;

        // reserve_in * fee_den + effective_in
        denominator.clone_from(reserve_in);
        *denominator *= self.fee.denominator;
        *denominator += &*effective_in;

        if denominator.is_zero() {
            out.set_zero();
            return false;
        }

        out.clone_from(numerator);
        *out /= &*denominator;
        true
    }

    /// Allocating form of [`V2Math::get_amount_out_into`]; `None` is the
    /// not-computable signal.
    pub fn get_amount_out(
        &self,
        amount_in: &BigInt,
        reserve_in: &BigInt,
        reserve_out: &BigInt,
    ) -> Option<BigInt> {
        let mut out = BigInt::zero();
        self.get_amount_out_into(&mut out, amount_in, reserve_in, reserve_out)
            .then_some(out)
    }
}

impl Default for V2Math {
    fn default() -> Self {
        Self::new(FeeRate::default())
    }
}
