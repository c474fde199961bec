use crate::config::ServerConfig;
use crate::lifecycle::ConnectionManager;
use crate::signaling::api_error::ApiError;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use pushtalk_core::{ConnectionId, IceCandidate, SessionDescription};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

/// Ответ на `get_offer`: идентификатор соединения и серверный offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferResponse {
    pub id: ConnectionId,
    pub offer: SessionDescription,
}

/// HTTP-сигналинг поверх `ConnectionManager`.
/// Никакого состояния, кроме менеджера, здесь нет.
#[derive(Clone)]
pub struct SignalingService {
    manager: ConnectionManager,
}

impl SignalingService {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Маршруты `/webrtc/*`. CORS открыт: браузерный клиент обычно живет на другом origin.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/webrtc/get_offer", get(get_offer))
            .route("/webrtc/set_remote/{id}", post(set_remote))
            .route("/webrtc/add_candidate/{id}", post(add_candidate))
            .route("/webrtc/get_candidates/{id}", get(get_candidates))
            .layer(cors)
            .with_state(self.clone())
    }

    /// Слушать `config.bind`, пока не завершится `shutdown`.
    pub async fn serve(
        self,
        config: &ServerConfig,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(config.bind).await?;
        info!("Signaling server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

async fn get_offer(State(service): State<SignalingService>) -> Result<Json<OfferResponse>, ApiError> {
    let (offer, id) = service.manager.create_offer().await?;
    Ok(Json(OfferResponse { id, offer }))
}

async fn set_remote(
    State(service): State<SignalingService>,
    Path(id): Path<ConnectionId>,
    Json(description): Json<SessionDescription>,
) -> Result<(), ApiError> {
    debug!("Remote description for {}", id);
    service
        .manager
        .set_remote_description(&id, description)
        .await?;
    Ok(())
}

async fn add_candidate(
    State(service): State<SignalingService>,
    Path(id): Path<ConnectionId>,
    Json(candidate): Json<IceCandidate>,
) -> Result<(), ApiError> {
    debug!("Remote ICE candidate for {}: {}", id, candidate.candidate);
    service.manager.add_ice_candidate(&id, candidate).await?;
    Ok(())
}

async fn get_candidates(
    State(service): State<SignalingService>,
    Path(id): Path<ConnectionId>,
) -> Result<Json<Vec<IceCandidate>>, ApiError> {
    let candidates = service.manager.get_ice_candidates(&id)?;
    Ok(Json(candidates))
}
