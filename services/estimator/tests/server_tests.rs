//! HTTP surface of the estimator

use async_trait::async_trait;
use num_bigint::BigInt;
use std::sync::Arc;
use swap_estimator::server::status_for;
use swap_estimator::{
    Address, EngineConfig, ErrorKind, EstimationEngine, EstimatorServer, PairReserves,
    PairStateReader, PairTokens, ReaderError,
};
use tokio::time::{Duration, Instant};
use warp::http::StatusCode;

const POOL: &str = "0x6e7a5fafcec6bb1e78bae2a1f0b612012bf14827";
const WMATIC: &str = "0x0d500b1d8e8ef31e21c99d1db9a6444d3adf1270";
const USDC: &str = "0x2791bca1f2de4661ed88a30c99a7a9449aa84174";
const WETH: &str = "0x7ceb23fd6bc0add59e62ac25578270cff1b9f619";

struct FixedPool {
    reserves: (u64, u64),
    rpc_down: bool,
}

#[async_trait]
impl PairStateReader for FixedPool {
    async fn tokens(&self, _pool: Address, _deadline: Instant) -> Result<PairTokens, ReaderError> {
        if self.rpc_down {
            return Err(ReaderError::Call {
                method: "token0",
                message: "connection refused".to_string(),
            });
        }
        Ok(PairTokens {
            token0: WMATIC.parse().unwrap(),
            token1: USDC.parse().unwrap(),
        })
    }

    async fn reserves(
        &self,
        _pool: Address,
        _deadline: Instant,
    ) -> Result<PairReserves, ReaderError> {
        Ok(PairReserves {
            reserve0: BigInt::from(self.reserves.0),
            reserve1: BigInt::from(self.reserves.1),
        })
    }
}

fn server(reader: FixedPool) -> EstimatorServer {
    let engine = EstimationEngine::new(Arc::new(reader), EngineConfig::default());
    EstimatorServer::new(Arc::new(engine), Duration::from_secs(5))
}

fn healthy() -> EstimatorServer {
    server(FixedPool {
        reserves: (10_000, 20_000),
        rpc_down: false,
    })
}

async fn get(server: &EstimatorServer, path: &str) -> (StatusCode, String) {
    let response = warp::test::request()
        .method("GET")
        .path(path)
        .reply(&server.routes())
        .await;
    (
        response.status(),
        String::from_utf8(response.body().to_vec()).unwrap(),
    )
}

fn estimate_path(src: &str, dst: &str, amount: &str) -> String {
    format!("/estimate?pool={POOL}&src={src}&dst={dst}&src_amount={amount}")
}

#[tokio::test]
async fn test_estimate_ok() {
    let (status, body) = get(&healthy(), &estimate_path(WMATIC, USDC, "1000")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1813");
}

#[tokio::test]
async fn test_estimate_large_amount_is_exact() {
    let server = server(FixedPool {
        reserves: (u64::MAX, u64::MAX),
        rpc_down: false,
    });
    let amount = "340282366920938463463374607431768211456"; // 2^128
    let (status, body) = get(&server, &estimate_path(WMATIC, USDC, amount)).await;
    assert_eq!(status, StatusCode::OK);
    let out: BigInt = body.parse().unwrap();
    assert!(out > BigInt::from(0));
    assert!(out < BigInt::from(u64::MAX));
}

#[tokio::test]
async fn test_missing_parameter_is_bad_request() {
    let path = format!("/estimate?pool={POOL}&src={WMATIC}&src_amount=1000");
    let (status, body) = get(&healthy(), &path).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("dst"));
}

#[tokio::test]
async fn test_malformed_input_is_bad_request() {
    let server = healthy();
    for path in [
        estimate_path("0x1234", USDC, "1000"),
        estimate_path(WMATIC, USDC, "12abc"),
        estimate_path(WMATIC, USDC, "1.5"),
        estimate_path(WMATIC, USDC, "0"),
        estimate_path(WMATIC, USDC, "-10"),
        estimate_path(WMATIC, WMATIC, "1000"),
    ] {
        let (status, _) = get(&server, &path).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
    }
}

#[tokio::test]
async fn test_undecodable_query_is_bad_request() {
    let path = format!("/estimate?pool={POOL}&src={WMATIC}&src={WMATIC}&dst={USDC}&src_amount=1000");
    let (status, body) = get(&healthy(), &path).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_ne!(body, "internal error");
}

#[tokio::test]
async fn test_unknown_parameter_is_ignored() {
    let path = format!("{}&slippage=5", estimate_path(WMATIC, USDC, "1000"));
    let (status, body) = get(&healthy(), &path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1813");
}

#[tokio::test]
async fn test_token_outside_pool_is_bad_request() {
    let (status, body) = get(&healthy(), &estimate_path(WMATIC, WETH, "1000")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains(WETH));
}

#[tokio::test]
async fn test_insufficient_liquidity_is_bad_request() {
    let server = server(FixedPool {
        reserves: (0, 20_000),
        rpc_down: false,
    });
    let (status, body) = get(&server, &estimate_path(WMATIC, USDC, "1000")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "insufficient liquidity");
}

#[tokio::test]
async fn test_rpc_failure_is_bad_gateway() {
    let server = server(FixedPool {
        reserves: (10_000, 20_000),
        rpc_down: true,
    });
    let (status, body) = get(&server, &estimate_path(WMATIC, USDC, "1000")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("connection refused"));
}

#[tokio::test]
async fn test_ping_and_health() {
    let server = healthy();
    assert_eq!(get(&server, "/ping").await, (StatusCode::OK, "pong".to_string()));
    assert_eq!(get(&server, "/health").await, (StatusCode::OK, "OK".to_string()));
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (status, _) = get(&healthy(), "/quote").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_is_rejected() {
    let response = warp::test::request()
        .method("POST")
        .path(&estimate_path(WMATIC, USDC, "1000"))
        .reply(&healthy().routes())
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn test_status_mapping() {
    assert_eq!(status_for(ErrorKind::InvalidArgument), StatusCode::BAD_REQUEST);
    assert_eq!(status_for(ErrorKind::InsufficientLiquidity), StatusCode::BAD_REQUEST);
    assert_eq!(status_for(ErrorKind::PairReadFailed), StatusCode::BAD_GATEWAY);
}
