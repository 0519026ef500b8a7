//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one task per connection.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::logging::AuditLogger;
use crate::onboarding::RoleService;
use crate::permissions::{PermissionResolver, ResolverConfig};
use crate::policy::PolicyOracle;
use crate::records::RecordService;
use crate::routes;
use crate::shares::ShareRegistry;
use crate::store::Stores;
use crate::types::CareShareError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub jwt: JwtValidator,
    /// Fail-closed capability resolution for viewers
    pub resolver: Arc<PermissionResolver>,
    pub shares: ShareRegistry,
    pub records: RecordService,
    pub roles: RoleService,
    /// Storage backend in use ("mongodb" or "memory")
    pub store_backend: &'static str,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        args: Args,
        jwt: JwtValidator,
        oracle: Arc<dyn PolicyOracle>,
        stores: Stores,
        audit: AuditLogger,
    ) -> Self {
        let resolver = Arc::new(PermissionResolver::new(
            Arc::clone(&oracle),
            audit.clone(),
            ResolverConfig {
                check_timeout: args.policy_timeout(),
                ..Default::default()
            },
        ));
        let shares = ShareRegistry::new(
            Arc::clone(&stores.shares),
            Arc::clone(&stores.users),
            audit.clone(),
        );
        let records = RecordService::new(
            Arc::clone(&resolver),
            shares.clone(),
            Arc::clone(&stores.records),
            Arc::clone(&stores.users),
        );
        let roles = RoleService::new(
            oracle,
            Arc::clone(&stores.users),
            audit,
            args.policy_timeout(),
        );

        Self {
            args,
            jwt,
            resolver,
            shares,
            records,
            roles,
            store_backend: stores.backend,
            started_at: Instant::now(),
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), CareShareError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "CareShare listening on {} (store: {})",
        state.args.listen, state.store_backend
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - do not use with real health data");
    }

    serve(listener, state).await
}

/// Accept connections on an already bound listener until Ctrl+C
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), CareShareError> {
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, addr, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            error!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, stopping listener");
                return Ok(());
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("[{}] {} {}", addr, method, path);

    let response = match (&method, path.as_str()) {
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state))
        }

        (&Method::OPTIONS, _) => routes::preflight_response(),

        (_, p) if p.starts_with("/api/") => routes::handle_api_request(req, state).await,

        _ => routes::not_found_response(&path),
    };

    Ok(to_boxed(response))
}

/// Convert a Full<Bytes> body to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}
