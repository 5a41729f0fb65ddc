//! HTTP 진입점.
//!
//! - `GET /`: 수집 호출 1회 (`verbose=1`, `dry=1` 쿼리 지원)
//! - `GET /health`: 생존 확인

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::pipeline::{Collector, RunOptions};

/// 호출 쿼리 파라미터. 값이 정확히 `"1"`일 때만 켜집니다.
#[derive(Debug, Default, Deserialize)]
pub struct InvokeQuery {
    pub verbose: Option<String>,
    pub dry: Option<String>,
}

impl InvokeQuery {
    pub fn options(&self) -> RunOptions {
        RunOptions {
            dry: self.dry.as_deref() == Some("1"),
            verbose: self.verbose.as_deref() == Some("1"),
        }
    }
}

/// 라우터 생성.
pub fn router(collector: Arc<Collector>) -> Router {
    Router::new()
        .route("/", get(invoke))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(collector)
}

async fn invoke(
    State(collector): State<Arc<Collector>>,
    Query(query): Query<InvokeQuery>,
) -> impl IntoResponse {
    let response = collector.invoke(query.options()).await;
    (
        response.status_code(),
        [(header::CONTENT_TYPE, "application/json")],
        response.to_pretty_json(),
    )
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 서버 실행 (Ctrl+C 또는 SIGTERM까지).
pub async fn serve(collector: Arc<Collector>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(collector))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped gracefully");
    Ok(())
}

/// 종료 시그널 대기. 핸들러 설치에 실패한 시그널은 무시합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
