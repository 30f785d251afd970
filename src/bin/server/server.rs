//! HTTP server for text extraction and translation.

use crate::config::ServerConfig;
use crate::ocr::{
    DetectLanguageRequest, DetectLanguageResponse, ExtractRequest, ExtractResponse, LipiEngine,
    ServiceError, TranslateRequest, TranslateResponse, decode_base64_image, download_bytes,
    parse_language,
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use lipi::core::OCRError;
use lipi::core::traits::Availability;
use lipi::domain::language_name;
use lipi::pipeline::NoopObserver;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers
struct AppState {
    engine: LipiEngine,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    backend: String,
    translator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ollama: Option<Availability>,
}

/// Run the HTTP server
pub async fn run_server(
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Initializing extraction engine...");
    let engine = LipiEngine::new(&config.extract)?;
    info!("Extraction engine initialized successfully");

    let state = Arc::new(AppState { engine });

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/extract", post(extract_handler))
        .route("/api/v1/translate", post(translate_handler))
        .route("/api/v1/detect-language", post(detect_language_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {e}"))?;

    info!("Server listening on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /health                  - Health check and Ollama status");
    info!("  POST /api/v1/extract          - Text extraction");
    info!("  POST /api/v1/translate        - Translation");
    info!("  POST /api/v1/detect-language  - Language detection");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// HTTP status for a failed request.
fn status_for(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::Download(_) | ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        ServiceError::Pipeline(OCRError::Decode(_) | OCRError::InvalidInput { .. }) => {
            StatusCode::BAD_REQUEST
        }
        ServiceError::Pipeline(OCRError::ModelLoad { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Pipeline(OCRError::Generation { .. } | OCRError::Http(_)) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.engine.backend_name().to_string(),
        translator: state.engine.translator_name().to_string(),
        ollama: state.engine.ollama_status().await,
    })
}

async fn request_bytes(request: &ExtractRequest) -> Result<Vec<u8>, ServiceError> {
    match (&request.url, &request.image) {
        (Some(url), None) => download_bytes(url).await,
        (None, Some(image)) => decode_base64_image(image),
        _ => Err(ServiceError::InvalidRequest(
            "provide exactly one of 'url' or 'image'".to_string(),
        )),
    }
}

/// Text extraction endpoint
async fn extract_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExtractRequest>,
) -> impl IntoResponse {
    let request_id = uuid::Uuid::new_v4().to_string();
    info!(
        request_id = %request_id,
        url = request.url.as_deref().unwrap_or("<inline>"),
        language = request.language.as_deref().unwrap_or("auto"),
        "Processing extraction request"
    );

    let start = Instant::now();
    let outcome: Result<ExtractResponse, ServiceError> = async {
        let language = request.language.as_deref().map(parse_language).transpose()?;
        let bytes = request_bytes(&request).await?;
        info!(
            request_id = %request_id,
            bytes = bytes.len(),
            load_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image loaded"
        );
        state
            .engine
            .extract_response(
                &bytes,
                language,
                request.translate_to.as_deref(),
                Arc::new(NoopObserver),
                start,
            )
            .await
    }
    .await;

    match outcome {
        Ok(response) => {
            info!(
                request_id = %request_id,
                chars = response.text.chars().count(),
                languages = %response.languages,
                total_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Extraction completed"
            );
            (StatusCode::OK, Json(response))
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Extraction failed");
            (status_for(&e), Json(ExtractResponse::error(e.user_message())))
        }
    }
}

/// Translation endpoint
async fn translate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TranslateRequest>,
) -> impl IntoResponse {
    let request_id = uuid::Uuid::new_v4().to_string();
    info!(
        request_id = %request_id,
        target = %request.target,
        chars = request.text.chars().count(),
        "Processing translation request"
    );

    match state
        .engine
        .translate(&request.text, &request.target, request.source.as_deref())
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Translation failed");
            (status_for(&e), Json(TranslateResponse::error(e.user_message())))
        }
    }
}

/// Language detection endpoint
async fn detect_language_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DetectLanguageRequest>,
) -> Json<DetectLanguageResponse> {
    let language = state.engine.detect_language(&request.text).await;
    let name = language_name(&language).to_string();
    Json(DetectLanguageResponse { language, name })
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}
