//! HTTP server wiring and handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use volley_common::Signal;
use volley_dispatch::Dispatcher;
use volley_relay::Mailer;

use crate::error::{ApiError, ServeError};
use crate::types::{SendEmailRequest, SendEmailResponse};

/// Builds the application router around a shared dispatcher.
///
/// The probe route carries its own timeout; `/send_email` does not,
/// since a paced batch legitimately runs for minutes.
pub fn router<M: Mailer + 'static>(dispatcher: Arc<Dispatcher<M>>) -> Router {
    Router::new()
        .route("/send_email", post(send_email::<M>))
        .with_state(dispatcher)
        .merge(Router::new().route(
            "/health/live",
            get(liveness).layer(TimeoutLayer::new(Duration::from_secs(1))),
        ))
}

/// The dispatch engine's HTTP server.
pub struct ApiServer {
    listener: TcpListener,
    router: Router,
}

impl ApiServer {
    /// Binds the listener and prepares the router.
    ///
    /// # Errors
    ///
    /// [`ServeError::Bind`] when the address cannot be bound.
    pub async fn bind<M: Mailer + 'static>(
        address: &str,
        dispatcher: Arc<Dispatcher<M>>,
    ) -> Result<Self, ServeError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| ServeError::Bind {
                address: address.to_string(),
                source,
            })?;

        tracing::info!(address, "dispatch API bound");

        Ok(Self {
            listener,
            router: router(dispatcher),
        })
    }

    /// The bound address, useful when binding to port 0.
    ///
    /// # Errors
    ///
    /// Propagates the underlying socket error.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// [`ServeError::Server`] when the server fails at runtime.
    pub async fn serve(
        self,
        mut shutdown: tokio::sync::broadcast::Receiver<Signal>,
    ) -> Result<(), ServeError> {
        tracing::info!("dispatch API starting");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("dispatch API received shutdown signal");
            })
            .await
            .map_err(|e| ServeError::Server(e.to_string()))?;

        tracing::info!("dispatch API stopped");
        Ok(())
    }
}

/// `POST /send_email`: validate, run the batch to completion, answer
/// with the per-recipient results.
///
/// Pre-flight failures return a single error before any send is
/// attempted. An aborted batch still answers 200 with the outcomes
/// collected so far; the status strings carry the failure detail.
async fn send_email<M: Mailer + 'static>(
    State(dispatcher): State<Arc<Dispatcher<M>>>,
    Json(request): Json<SendEmailRequest>,
) -> Result<Json<SendEmailResponse>, ApiError> {
    let request = request.into_dispatch_request()?;

    tracing::info!(
        recipients = request.total(),
        interval_secs = request.interval().as_secs(),
        relay = %request.credentials().endpoint(),
        "batch accepted"
    );

    let result = dispatcher.dispatch(&request).await;

    tracing::info!(
        succeeded = result.succeeded,
        failed = result.failed,
        aborted = result.is_aborted(),
        "batch finished"
    );

    Ok(Json(result.into()))
}

/// `GET /health/live`: the process is up and serving.
async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
