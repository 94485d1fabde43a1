//! RPC-backed pair state reader
//!
//! Reads `token0()`, `token1()` and `getReserves()` from a Uniswap V2 style
//! pair contract. The two token lookups are independent calls and run
//! concurrently; the reserve lookup is a single call.

use anyhow::{Context, Result};
use async_trait::async_trait;
use num_bigint::{BigInt, Sign};
use tokio::time::{timeout_at, Duration, Instant};
use tracing::{debug, warn};
use web3::contract::{Contract, Options};
use web3::transports::Http;
use web3::types::{H160, U256};
use web3::Web3;

use crate::address::Address;
use crate::error::ReaderError;
use crate::fanout;
use crate::reader::{PairReserves, PairStateReader, PairTokens};

/// Uniswap V2 Pair ABI for token0(), token1() and getReserves()
const PAIR_ABI: &str = r#"[
    {"constant":true,"inputs":[],"name":"token0","outputs":[{"name":"","type":"address"}],"type":"function"},
    {"constant":true,"inputs":[],"name":"token1","outputs":[{"name":"","type":"address"}],"type":"function"},
    {"constant":true,"inputs":[],"name":"getReserves","outputs":[{"name":"_reserve0","type":"uint112"},{"name":"_reserve1","type":"uint112"},{"name":"_blockTimestampLast","type":"uint32"}],"type":"function"}
]"#;

const GET_RESERVES: &str = "getReserves";

/// Token position within a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSlot {
    Token0,
    Token1,
}

impl TokenSlot {
    pub fn method(&self) -> &'static str {
        match self {
            TokenSlot::Token0 => "token0",
            TokenSlot::Token1 => "token1",
        }
    }
}

/// Single contract calls against a pair; the transport seam of [`ChainPairReader`]
#[async_trait]
pub trait PairCaller: Send + Sync {
    async fn token(&self, pair: Address, slot: TokenSlot) -> Result<Address, ReaderError>;

    /// `(reserve0, reserve1)` as stored by the pair
    async fn reserves(&self, pair: Address) -> Result<(BigInt, BigInt), ReaderError>;
}

/// [`PairCaller`] over a JSON-RPC HTTP endpoint
pub struct Web3PairCaller {
    web3: Web3<Http>,
}

impl Web3PairCaller {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let transport = Http::new(rpc_url).context("Failed to create RPC transport")?;
        Ok(Self {
            web3: Web3::new(transport),
        })
    }

    fn contract(&self, pair: Address, method: &'static str) -> Result<Contract<Http>, ReaderError> {
        Contract::from_json(self.web3.eth(), H160::from(*pair.as_bytes()), PAIR_ABI.as_bytes())
            .map_err(|e| ReaderError::Decode {
                method,
                message: e.to_string(),
            })
    }
}

fn query_error(method: &'static str, error: web3::contract::Error) -> ReaderError {
    match error {
        web3::contract::Error::Api(e) => ReaderError::Call {
            method,
            message: e.to_string(),
        },
        other => ReaderError::Decode {
            method,
            message: other.to_string(),
        },
    }
}

fn u256_to_bigint(value: U256) -> BigInt {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    BigInt::from_bytes_be(Sign::Plus, &bytes)
}

#[async_trait]
impl PairCaller for Web3PairCaller {
    async fn token(&self, pair: Address, slot: TokenSlot) -> Result<Address, ReaderError> {
        let method = slot.method();
        let token: H160 = self
            .contract(pair, method)?
            .query(method, (), None, Options::default(), None)
            .await
            .map_err(|e| query_error(method, e))?;
        Ok(Address::from(token.to_fixed_bytes()))
    }

    async fn reserves(&self, pair: Address) -> Result<(BigInt, BigInt), ReaderError> {
        let (reserve0, reserve1, _block_timestamp_last): (U256, U256, U256) = self
            .contract(pair, GET_RESERVES)?
            .query(GET_RESERVES, (), None, Options::default(), None)
            .await
            .map_err(|e| query_error(GET_RESERVES, e))?;
        Ok((u256_to_bigint(reserve0), u256_to_bigint(reserve1)))
    }
}

/// [`PairStateReader`] that issues every call under a per-call timeout,
/// itself capped by the request deadline. No retries.
pub struct ChainPairReader<C> {
    caller: C,
    call_timeout: Duration,
}

impl<C: PairCaller> ChainPairReader<C> {
    pub fn new(caller: C, call_timeout: Duration) -> Self {
        Self {
            caller,
            call_timeout,
        }
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }
}

impl ChainPairReader<Web3PairCaller> {
    /// Reader over the HTTP JSON-RPC endpoint at `rpc_url`
    pub fn connect(rpc_url: &str, call_timeout: Duration) -> Result<Self> {
        Ok(Self::new(Web3PairCaller::new(rpc_url)?, call_timeout))
    }
}

#[async_trait]
impl<C: PairCaller> PairStateReader for ChainPairReader<C> {
    async fn tokens(&self, pool: Address, deadline: Instant) -> Result<PairTokens, ReaderError> {
        let [token0, token1] = fanout::join_all(
            deadline,
            self.call_timeout,
            [
                (
                    TokenSlot::Token0.method(),
                    self.caller.token(pool, TokenSlot::Token0),
                ),
                (
                    TokenSlot::Token1.method(),
                    self.caller.token(pool, TokenSlot::Token1),
                ),
            ],
        )
        .await
        .map_err(|e| {
            warn!("Failed to read tokens of pool {}: {}", pool, e);
            e
        })?;

        debug!("Pool {} tokens: {}/{}", pool, token0, token1);
        Ok(PairTokens { token0, token1 })
    }

    async fn reserves(
        &self,
        pool: Address,
        deadline: Instant,
    ) -> Result<PairReserves, ReaderError> {
        let started = Instant::now();
        let call_deadline = deadline.min(started + self.call_timeout);

        let (reserve0, reserve1) = timeout_at(call_deadline, self.caller.reserves(pool))
            .await
            .map_err(|_| ReaderError::Timeout {
                method: GET_RESERVES,
                timeout_ms: call_deadline.saturating_duration_since(started).as_millis() as u64,
            })
            .and_then(|read| read)
            .map_err(|e| {
                warn!("Failed to read reserves of pool {}: {}", pool, e);
                e
            })?;

        debug!("Pool {} reserves: {}/{}", pool, reserve0, reserve1);
        Ok(PairReserves { reserve0, reserve1 })
    }
}
