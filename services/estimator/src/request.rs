//! Estimate request parsing and validation
//!
//! Parsing turns raw query strings into typed values; validation checks the
//! structural rules that need no chain access.

use crate::address::Address;
use crate::error::InvalidArgument;
use num_bigint::{BigInt, Sign};
use serde::Deserialize;

/// Raw `/estimate` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EstimateQuery {
    pub pool: Option<String>,
    pub src: Option<String>,
    pub dst: Option<String>,
    pub src_amount: Option<String>,
}

/// Swap of `src_amount` of `src` into `dst` through `pool`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimateRequest {
    pub pool: Address,
    pub src: Address,
    pub dst: Address,
    pub src_amount: Option<BigInt>,
}

impl EstimateRequest {
    pub fn new(pool: Address, src: Address, dst: Address, src_amount: BigInt) -> Self {
        Self {
            pool,
            src,
            dst,
            src_amount: Some(src_amount),
        }
    }

    /// Parse query parameters. Every parameter must be present and
    /// well-formed; semantic rules are left to [`EstimateRequest::validate`].
    pub fn from_query(query: &EstimateQuery) -> Result<Self, InvalidArgument> {
        let pool = parse_address("pool", query.pool.as_deref())?;
        let src = parse_address("src", query.src.as_deref())?;
        let dst = parse_address("dst", query.dst.as_deref())?;
        let src_amount = parse_amount(query.src_amount.as_deref())?;

        Ok(Self::new(pool, src, dst, src_amount))
    }

    /// Structural checks, returning the validated input amount
    pub fn validate(&self) -> Result<&BigInt, InvalidArgument> {
        for (field, address) in [("pool", &self.pool), ("src", &self.src), ("dst", &self.dst)] {
            if address.is_zero() {
                return Err(InvalidArgument::ZeroAddress { field });
            }
        }
        if self.src == self.dst {
            return Err(InvalidArgument::SameToken);
        }

        let amount = self
            .src_amount
            .as_ref()
            .ok_or(InvalidArgument::MissingAmount)?;
        if amount.sign() != Sign::Plus {
            return Err(InvalidArgument::NonPositiveAmount);
        }
        Ok(amount)
    }
}

fn required<'a>(name: &'static str, value: Option<&'a str>) -> Result<&'a str, InvalidArgument> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(InvalidArgument::MissingParam { name }),
    }
}

fn parse_address(field: &'static str, value: Option<&str>) -> Result<Address, InvalidArgument> {
    let value = required(field, value)?;
    value
        .parse()
        .map_err(|_| InvalidArgument::MalformedAddress {
            field,
            value: value.to_string(),
        })
}

/// Plain base-10 integer with an optional sign; no separators or exponents
fn parse_amount(value: Option<&str>) -> Result<BigInt, InvalidArgument> {
    let value = required("src_amount", value)?;
    let malformed = || InvalidArgument::MalformedAmount {
        value: value.to_string(),
    };

    let digits = value
        .strip_prefix('-')
        .or_else(|| value.strip_prefix('+'))
        .unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    BigInt::parse_bytes(value.as_bytes(), 10).ok_or_else(malformed)
}
