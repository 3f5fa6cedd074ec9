#![forbid(unsafe_code)]

use std::{
    env,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use guard_adapter::{
    AdapterError, AdapterRuntime, HistoryAdapterResponse, LoginAdapterRequest,
    LoginAdapterResponse, LogoutAdapterRequest, RegisterAdapterRequest, ScanTurnAdapterRequest,
    ScanTurnAdapterResponse, StatusResponse,
};
use guard_contracts::provider_secrets::ProviderSecretId;
use guard_engines::classifier_client::{ClassifierConfig, LiveSpamClassifier};
use guard_engines::token_vault::TokenVault;

type SharedRuntime = Arc<Mutex<AdapterRuntime>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bind = env::var("PHISHGUARD_HTTP_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let addr: SocketAddr = bind.parse()?;

    let classifier = LiveSpamClassifier::new(classifier_config_from_env());
    let runtime: SharedRuntime = Arc::new(Mutex::new(AdapterRuntime::new(Box::new(classifier))));

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/login", post(auth_login))
        .route("/v1/auth/logout", post(auth_logout))
        .route("/v1/scan/turn", post(scan_turn))
        .route("/v1/scan/history", get(scan_history))
        .with_state(runtime);

    println!("guard_adapter_http listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn classifier_config_from_env() -> ClassifierConfig {
    let token = env::var("PHISHGUARD_HF_API_TOKEN").ok().or_else(|| {
        TokenVault::default_local()
            .resolve_secret(ProviderSecretId::HuggingFaceApiToken.as_str())
            .ok()
            .flatten()
    });
    let mut config = ClassifierConfig::mvp_v1(token);
    if let Ok(endpoint) = env::var("PHISHGUARD_CLASSIFIER_ENDPOINT") {
        config.endpoint = endpoint;
    }
    if let Ok(model_id) = env::var("PHISHGUARD_CLASSIFIER_MODEL") {
        config.model_id = model_id;
    }
    config.with_fixture_json(env::var("PHISHGUARD_CLASSIFIER_FIXTURE_JSON").ok())
}

fn now_unix_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
        .max(1)
}

fn error_status(err: &AdapterError) -> StatusCode {
    match err {
        AdapterError::Unauthorized | AdapterError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AdapterError::UsernameExists => StatusCode::CONFLICT,
        AdapterError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AdapterError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_reason(err: AdapterError) -> String {
    match err {
        AdapterError::Unauthorized => "session token is not valid".to_string(),
        AdapterError::UsernameExists => "Username exists.".to_string(),
        AdapterError::InvalidCredentials => "Invalid credentials.".to_string(),
        AdapterError::InvalidInput(detail) => detail,
        AdapterError::Internal(detail) => detail,
    }
}

async fn healthz() -> (StatusCode, Json<StatusResponse>) {
    (StatusCode::OK, Json(StatusResponse::ok()))
}

async fn register(
    State(runtime): State<SharedRuntime>,
    Json(request): Json<RegisterAdapterRequest>,
) -> (StatusCode, Json<StatusResponse>) {
    let mut runtime = match runtime.lock() {
        Ok(runtime) => runtime,
        Err(_) => return lock_poisoned(),
    };
    match runtime.register(&request, now_unix_ns()) {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(err) => (
            error_status(&err),
            Json(StatusResponse::error(error_reason(err))),
        ),
    }
}

async fn auth_login(
    State(runtime): State<SharedRuntime>,
    Json(request): Json<LoginAdapterRequest>,
) -> (StatusCode, Json<LoginAdapterResponse>) {
    let mut runtime = match runtime.lock() {
        Ok(runtime) => runtime,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(LoginAdapterResponse {
                    status: "error".to_string(),
                    session_token: None,
                    reason: Some("adapter runtime lock poisoned".to_string()),
                }),
            )
        }
    };
    match runtime.login(&request, now_unix_ns()) {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(err) => (
            error_status(&err),
            Json(LoginAdapterResponse {
                status: "error".to_string(),
                session_token: None,
                reason: Some(error_reason(err)),
            }),
        ),
    }
}

async fn auth_logout(
    State(runtime): State<SharedRuntime>,
    Json(request): Json<LogoutAdapterRequest>,
) -> (StatusCode, Json<StatusResponse>) {
    let mut runtime = match runtime.lock() {
        Ok(runtime) => runtime,
        Err(_) => return lock_poisoned(),
    };
    match runtime.logout(&request.session_token, now_unix_ns()) {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(err) => (
            error_status(&err),
            Json(StatusResponse::error(error_reason(err))),
        ),
    }
}

async fn scan_turn(
    State(runtime): State<SharedRuntime>,
    Json(request): Json<ScanTurnAdapterRequest>,
) -> (StatusCode, Json<ScanTurnAdapterResponse>) {
    let mut runtime = match runtime.lock() {
        Ok(runtime) => runtime,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(refused_response("adapter runtime lock poisoned".to_string())),
            )
        }
    };
    match runtime.scan_turn(&request, now_unix_ns()) {
        // A refused turn is a provider-side failure, not a verdict.
        Ok(response) if response.outcome == "REFUSED" => {
            (StatusCode::BAD_GATEWAY, Json(response))
        }
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(err) => {
            let status = error_status(&err);
            (status, Json(refused_response(error_reason(err))))
        }
    }
}

async fn scan_history(
    State(runtime): State<SharedRuntime>,
    Query(query): Query<HistoryQuery>,
) -> (StatusCode, Json<HistoryAdapterResponse>) {
    let runtime = match runtime.lock() {
        Ok(runtime) => runtime,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HistoryAdapterResponse {
                    status: "error".to_string(),
                    rows: Vec::new(),
                }),
            )
        }
    };
    match runtime.history(&query.session_token) {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(err) => (
            error_status(&err),
            Json(HistoryAdapterResponse {
                status: "error".to_string(),
                rows: Vec::new(),
            }),
        ),
    }
}

#[derive(Debug, serde::Deserialize)]
struct HistoryQuery {
    session_token: String,
}

fn refused_response(reason: String) -> ScanTurnAdapterResponse {
    ScanTurnAdapterResponse {
        status: "error".to_string(),
        outcome: "REFUSED".to_string(),
        reply_text: None,
        label: None,
        confidence_pct: None,
        report: None,
        impact: None,
        reason: Some(reason),
    }
}

fn lock_poisoned() -> (StatusCode, Json<StatusResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(StatusResponse::error(
            "adapter runtime lock poisoned".to_string(),
        )),
    )
}
