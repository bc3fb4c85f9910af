//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with health, service and fallback routes
//! - Wire up middleware (request ID, tracing, access log, CORS, timeout)
//! - Gate every proxied route behind bearer authentication
//! - Bind server to listener and drain on shutdown

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware,
    response::Response,
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{Authenticator, TokenManager};
use crate::config::GatewayConfig;
use crate::http::middleware::{access_log, require_auth};
use crate::http::response::{error_response, health};
use crate::lifecycle::{drain, DrainOutcome, StartupError};
use crate::net::ClientConnection;
use crate::proxy::{ProxyRegistry, ReverseProxy};
use crate::routing::{DispatchPlan, ServicePrefix};
use crate::security::cors::{cors, CorsPolicy};

pub const HEALTH_PATH: &str = "/health";

/// Per-route handler state.
#[derive(Clone)]
struct ServiceRoute {
    proxy: ReverseProxy,
    /// `None` for the catch-all route, which forwards paths unchanged.
    prefix: Option<ServicePrefix>,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Build the registry, token manager and router. Any failure is fatal.
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let registry = ProxyRegistry::build(config.targets()?, config.proxy.timeout())?;
        let manager = TokenManager::new(config.jwt.token_config())?;
        let authenticator = Authenticator::Ready(Arc::new(manager));

        let router = build_router(&config, &registry, Arc::new(authenticator));
        Ok(Self { router, config })
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve until `shutdown` fires, then drain for the configured grace period.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), StartupError> {
        let addr = listener.local_addr().map_err(StartupError::Serve)?;
        let grace = self.config.server.shutdown_grace();
        tracing::info!(address = %addr, "Gateway starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<ClientConnection>();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.await;
                })
                .await
        });

        tokio::select! {
            result = &mut server => {
                return match result {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(StartupError::Serve(e)),
                    Err(e) => Err(StartupError::Serve(std::io::Error::other(e))),
                };
            }
            _ = shutdown.recv() => {}
        }

        tracing::info!(
            grace_secs = grace.as_secs(),
            "Shutdown requested, draining in-flight requests"
        );
        let _ = stop_tx.send(());

        match drain(server, grace).await {
            DrainOutcome::Completed => tracing::info!("Gateway stopped"),
            DrainOutcome::Aborted => {
                tracing::warn!("Grace period elapsed, aborted remaining requests")
            }
        }
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(
    config: &GatewayConfig,
    registry: &ProxyRegistry,
    authenticator: Arc<Authenticator>,
) -> Router {
    let plan = DispatchPlan::from_names(registry.names());
    let skip_auth = config.auth.skip_prefixed_routes;
    if skip_auth {
        tracing::warn!("auth.skip_prefixed_routes is set: prefixed routes are NOT authenticated");
    }
    tracing::info!(mode = ?plan.mode(), services = ?registry.names(), "Dispatch plan ready");

    let mut app = Router::new().route(HEALTH_PATH, get(health));

    for prefix in plan.prefixes() {
        if prefix.as_str() == HEALTH_PATH {
            tracing::error!(service = %prefix.service(), "Service name collides with health route, skipping");
            continue;
        }
        let Some(proxy) = registry.get(prefix.service()) else {
            continue;
        };

        let base = prefix.as_str();
        let mut routes = Router::new()
            .route(base, any(proxy_handler))
            .route(&format!("{base}/"), any(proxy_handler))
            .route(&format!("{base}/{{*rest}}"), any(proxy_handler))
            .with_state(ServiceRoute {
                proxy: proxy.clone(),
                prefix: Some(prefix.clone()),
            });
        if !skip_auth {
            routes = routes.route_layer(middleware::from_fn_with_state(
                authenticator.clone(),
                require_auth,
            ));
        }
        app = app.merge(routes);
    }

    if let Some(proxy) = plan.fallback().and_then(|name| registry.get(name)) {
        let fallback = Router::new()
            .fallback(proxy_handler)
            .with_state(ServiceRoute {
                proxy: proxy.clone(),
                prefix: None,
            })
            .layer(middleware::from_fn_with_state(authenticator, require_auth));
        app = app.fallback_service(fallback);
    }

    let cors_policy = Arc::new(CorsPolicy::from_config(&config.cors));

    app.layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(middleware::from_fn_with_state(cors_policy, cors))
        .layer(middleware::from_fn(access_log))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Strip the service prefix (if any) and forward.
async fn proxy_handler(
    State(route): State<ServiceRoute>,
    ConnectInfo(conn): ConnectInfo<ClientConnection>,
    mut req: Request<Body>,
) -> Response {
    if let Some(prefix) = &route.prefix {
        match prefix.strip_uri(req.uri()) {
            Some(uri) => *req.uri_mut() = uri,
            None => return error_response(StatusCode::NOT_FOUND, "not found"),
        }
    }
    route.proxy.forward(req, &conn).await
}
