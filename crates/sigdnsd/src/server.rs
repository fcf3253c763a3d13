//! HTTP surface of the verifier daemon
//!
//! A single route: `POST /` carrying the protocol headers. This layer
//! only extracts the headers and the caller's transport address and
//! converts the pipeline's verdict into a warp reply; all verification
//! and DNS logic lives in sigdns-core.

use std::net::SocketAddr;
use std::sync::Arc;

use sigdns_core::Verifier;
use sigdns_core::verifier::{InboundRequest, ResponseBody, VerifierResponse};
use tracing::error;
use warp::Filter;
use warp::http::StatusCode;
use warp::reply::Reply;

/// Build the daemon's routes around an injected verifier pipeline
pub fn routes(
    verifier: Arc<Verifier>,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    // POST / with X-Signature and (optionally) X-Timestamp
    warp::post()
        .and(warp::path::end())
        .and(warp::header::optional::<String>("x-signature"))
        .and(warp::header::optional::<String>("x-timestamp"))
        .and(warp::addr::remote())
        .and_then(
            move |signature: Option<String>,
                  timestamp: Option<String>,
                  remote: Option<SocketAddr>| {
                let verifier = verifier.clone();
                async move {
                    Ok::<_, warp::Rejection>(handle(verifier, signature, timestamp, remote).await)
                }
            },
        )
}

/// Run one request through the pipeline and build the reply
async fn handle(
    verifier: Arc<Verifier>,
    signature: Option<String>,
    timestamp: Option<String>,
    remote: Option<SocketAddr>,
) -> warp::reply::Response {
    let response = match remote {
        Some(addr) => {
            verifier
                .handle(InboundRequest {
                    signature,
                    timestamp,
                    source_ip: addr.ip(),
                })
                .await
        }
        None => {
            // No transport-level peer address; there is nothing to point
            // the record at
            error!("Request without a source address");
            VerifierResponse {
                status: 500,
                body: ResponseBody::Failure {
                    success: false,
                    error: "Source address unavailable".to_string(),
                },
            }
        }
    };

    into_reply(response)
}

fn into_reply(response: VerifierResponse) -> warp::reply::Response {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    warp::reply::with_status(warp::reply::json(&response.body), status).into_response()
}
