//! HTTP server exposing the estimation engine
//!
//! `GET /estimate?pool=&src=&dst=&src_amount=` answers with the output amount
//! as a plain-text decimal string.

use crate::engine::EstimationEngine;
use crate::error::ErrorKind;
use crate::request::{EstimateQuery, EstimateRequest};
use anyhow::{Context, Result};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant};
use tracing::{error, info, warn};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

/// Response status for each engine error kind
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidArgument | ErrorKind::InsufficientLiquidity => StatusCode::BAD_REQUEST,
        ErrorKind::PairReadFailed => StatusCode::BAD_GATEWAY,
    }
}

pub struct EstimatorServer {
    engine: Arc<EstimationEngine>,
    request_timeout: Duration,
}

impl EstimatorServer {
    pub fn new(engine: Arc<EstimationEngine>, request_timeout: Duration) -> Self {
        Self {
            engine,
            request_timeout,
        }
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone + Send + Sync + 'static
    {
        let engine = self.engine.clone();
        let request_timeout = self.request_timeout;

        let estimate = warp::path("estimate")
            .and(warp::path::end())
            .and(warp::get())
            .and(warp::query::<EstimateQuery>())
            .and_then(move |query: EstimateQuery| {
                handle_estimate(engine.clone(), request_timeout, query)
            });

        let ping = warp::path("ping")
            .and(warp::path::end())
            .and(warp::get())
            .map(|| "pong");

        let health = warp::path("health")
            .and(warp::path::end())
            .and(warp::get())
            .map(|| warp::reply::with_status("OK", StatusCode::OK));

        estimate
            .or(ping)
            .or(health)
            .recover(handle_rejection)
            .with(warp::log::custom(|info| {
                info!(
                    "{} {} {} {:?}",
                    info.method(),
                    info.path(),
                    info.status().as_u16(),
                    info.elapsed()
                );
            }))
    }

    /// Serve on `addr` until `shutdown` resolves, then give in-flight
    /// requests up to `grace` to finish.
    pub async fn run(
        self,
        addr: SocketAddr,
        grace: Duration,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let (bound, server) = warp::serve(self.routes())
            .try_bind_with_graceful_shutdown(addr, async move {
                let _ = stop_rx.await;
            })
            .with_context(|| format!("Failed to bind {}", addr))?;

        info!("HTTP server listening on {}", bound);
        let server = tokio::spawn(server);
        let abort = server.abort_handle();

        shutdown.await;
        info!("Shutting down HTTP server");
        let _ = stop_tx.send(());

        match tokio::time::timeout(grace, server).await {
            Ok(Ok(())) => info!("HTTP server stopped gracefully"),
            Ok(Err(e)) => error!("HTTP server task failed: {}", e),
            Err(_) => {
                warn!("Grace period of {:?} elapsed, dropping open connections", grace);
                abort.abort();
            }
        }
        Ok(())
    }
}

async fn handle_estimate(
    engine: Arc<EstimationEngine>,
    request_timeout: Duration,
    query: EstimateQuery,
) -> std::result::Result<Response, Infallible> {
    let request = match EstimateRequest::from_query(&query) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected estimate query: {}", e);
            return Ok(text(e.to_string(), StatusCode::BAD_REQUEST));
        }
    };

    let deadline = Instant::now() + request_timeout;
    match engine.estimate(&request, deadline).await {
        Ok(amount_out) => Ok(text(amount_out.to_string(), StatusCode::OK)),
        Err(e) => {
            let status = status_for(e.kind());
            warn!("Estimate failed ({}): {}", status.as_u16(), e);
            Ok(text(e.to_string(), status))
        }
    }
}

async fn handle_rejection(rejection: Rejection) -> std::result::Result<Response, Infallible> {
    let response = if rejection.is_not_found() {
        text("not found".to_string(), StatusCode::NOT_FOUND)
    } else if let Some(invalid) = rejection.find::<warp::reject::InvalidQuery>() {
        warn!("Rejected estimate query: {}", invalid);
        text(format!("bad query: {}", invalid), StatusCode::BAD_REQUEST)
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        text("method not allowed".to_string(), StatusCode::METHOD_NOT_ALLOWED)
    } else {
        error!("Unhandled rejection: {:?}", rejection);
        text("internal error".to_string(), StatusCode::INTERNAL_SERVER_ERROR)
    };
    Ok(response)
}

fn text(body: String, status: StatusCode) -> Response {
    warp::reply::with_status(body, status).into_response()
}
