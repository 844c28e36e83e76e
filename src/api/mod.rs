use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::core::{ForecastError, WhatIfAdjustments};
use crate::service::{ForecastService, GenerateOutcome, GenerateRequest};
use crate::store::{LocalStore, UserHistory};

pub type LocalForecastService = ForecastService<Arc<LocalStore>, Arc<LocalStore>>;

pub struct AppState {
    pub service: LocalForecastService,
    pub store: Arc<LocalStore>,
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratePayload {
    user_id: String,
    #[serde(flatten)]
    request: GenerateRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestQuery {
    user_id: String,
    horizon_months: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WhatIfPayload {
    user_id: String,
    horizon_months: u32,
    #[serde(flatten)]
    adjustments: WhatIfAdjustments,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
enum GenerateStatus {
    Generated,
    InsufficientData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    status: GenerateStatus,
    horizon_months: u32,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/users/:user_id/history", put(history_handler))
        .route("/api/forecasts", post(generate_handler))
        .route("/api/forecasts/latest", get(latest_handler))
        .route("/api/forecasts/what-if", post(what_if_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16, state: SharedState) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "forecast HTTP API listening");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn history_handler(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    Json(history): Json<UserHistory>,
) -> Response {
    let count = history.snapshots.len();
    match state.store.record_history(&user_id, history) {
        Ok(()) => json_response(
            StatusCode::OK,
            serde_json::json!({ "userId": user_id, "snapshots": count }),
        ),
        Err(e) => forecast_error_response(&ForecastError::Store(e)),
    }
}

async fn generate_handler(
    State(state): State<SharedState>,
    Json(payload): Json<GeneratePayload>,
) -> Response {
    let horizon_months = payload.request.horizon_months;
    match state.service.generate(&payload.user_id, &payload.request) {
        Ok(GenerateOutcome::Generated(_)) => json_response(
            StatusCode::CREATED,
            GenerateResponse {
                status: GenerateStatus::Generated,
                horizon_months,
            },
        ),
        Ok(GenerateOutcome::InsufficientData { .. }) => json_response(
            StatusCode::ACCEPTED,
            GenerateResponse {
                status: GenerateStatus::InsufficientData,
                horizon_months,
            },
        ),
        Err(e) => forecast_error_response(&e),
    }
}

async fn latest_handler(
    State(state): State<SharedState>,
    Query(query): Query<LatestQuery>,
) -> Response {
    match state.service.latest(&query.user_id, query.horizon_months) {
        Ok(Some(snapshot)) => json_response(StatusCode::OK, snapshot),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "No forecast for this horizon"),
        Err(e) => forecast_error_response(&e),
    }
}

async fn what_if_handler(
    State(state): State<SharedState>,
    Json(payload): Json<WhatIfPayload>,
) -> Response {
    match state
        .service
        .what_if(&payload.user_id, &payload.adjustments, payload.horizon_months)
    {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(e) => forecast_error_response(&e),
    }
}

fn forecast_error_response(err: &ForecastError) -> Response {
    let status = match err {
        ForecastError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ForecastError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ForecastError::Store(_) => {
            error!(error = %err, "forecast storage failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, &err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ForecastSnapshot, WhatIfResult, monthly_series};
    use crate::service::ForecastSettings;

    const REFERENCE: [f64; 6] = [100_000.0, 101_200.0, 101_800.0, 103_100.0, 104_300.0, 105_000.0];

    fn state() -> SharedState {
        let store = Arc::new(LocalStore::in_memory());
        let settings = ForecastSettings {
            trials: 100,
            seed: Some(3),
            ..ForecastSettings::default()
        };
        let service = ForecastService::new(store.clone(), store.clone(), settings)
            .expect("valid settings");
        Arc::new(AppState { service, store })
    }

    fn seeded_state() -> SharedState {
        let state = state();
        state
            .store
            .record_history(
                "u1",
                UserHistory {
                    snapshots: monthly_series(&REFERENCE),
                    avg_monthly_expenses: 3_000.0,
                },
            )
            .expect("write");
        state
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn generate_payload(json: &str) -> GeneratePayload {
        serde_json::from_str(json).expect("payload should parse")
    }

    #[test]
    fn generate_payload_parses_optional_rates() {
        let payload = generate_payload(
            r#"{ "userId": "u1", "horizonMonths": 24, "withdrawalRate": 0.035, "inflationRate": 0.025 }"#,
        );
        assert_eq!(payload.user_id, "u1");
        assert_eq!(payload.request.horizon_months, 24);
        assert_eq!(payload.request.withdrawal_rate, Some(0.035));
        assert_eq!(payload.request.inflation_rate, Some(0.025));

        let minimal = generate_payload(r#"{ "userId": "u2", "horizonMonths": 12 }"#);
        assert_eq!(minimal.request.withdrawal_rate, None);
        assert_eq!(minimal.request.inflation_rate, None);
    }

    #[test]
    fn what_if_payload_defaults_missing_adjustments_to_zero() {
        let payload: WhatIfPayload = serde_json::from_str(
            r#"{ "userId": "u1", "horizonMonths": 6, "incomeChangePct": 5 }"#,
        )
        .expect("payload should parse");
        assert_eq!(payload.adjustments.income_change_pct, 5.0);
        assert_eq!(payload.adjustments.expense_change_pct, 0.0);
        assert_eq!(payload.adjustments.extra_monthly_savings, 0.0);
    }

    #[tokio::test]
    async fn generate_then_latest_returns_persisted_forecast() {
        let state = seeded_state();
        let response = generate_handler(
            State(state.clone()),
            Json(generate_payload(r#"{ "userId": "u1", "horizonMonths": 24 }"#)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );

        let response = latest_handler(
            State(state),
            Query(LatestQuery {
                user_id: "u1".to_string(),
                horizon_months: 24,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let snapshot: ForecastSnapshot = body_json(response).await;
        assert_eq!(snapshot.horizon_months, 24);
        assert_eq!(snapshot.scenarios.scenarios.base.len(), 24);
        assert_eq!(snapshot.summary.fire_number, 900_000.0);
    }

    #[tokio::test]
    async fn generate_without_history_is_accepted_but_stores_nothing() {
        let state = state();
        let response = generate_handler(
            State(state.clone()),
            Json(generate_payload(r#"{ "userId": "new", "horizonMonths": 24 }"#)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body: serde_json::Value = body_json(response).await;
        assert_eq!(body["status"], "insufficient-data");

        let response = latest_handler(
            State(state),
            Query(LatestQuery {
                user_id: "new".to_string(),
                horizon_months: 24,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_horizon_is_a_bad_request() {
        let response = generate_handler(
            State(seeded_state()),
            Json(generate_payload(r#"{ "userId": "u1", "horizonMonths": 0 }"#)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = body_json(response).await;
        assert!(body["error"].as_str().expect("message").contains("horizonMonths"));
    }

    #[tokio::test]
    async fn history_upload_feeds_what_if() {
        let state = state();
        let history = UserHistory {
            snapshots: monthly_series(&REFERENCE),
            avg_monthly_expenses: 3_000.0,
        };
        let response = history_handler(
            State(state.clone()),
            Path("u9".to_string()),
            Json(history),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let payload: WhatIfPayload = serde_json::from_str(
            r#"{ "userId": "u9", "horizonMonths": 12, "extraMonthlySavings": 500 }"#,
        )
        .expect("payload should parse");
        let response = what_if_handler(State(state), Json(payload)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let result: WhatIfResult = body_json(response).await;
        assert_eq!(result.what_if.len(), 12);
        assert!((result.assumptions.monthly_improvement_vs_baseline - 500.0).abs() < 1e-9);
        assert!(result.what_if[11].net_worth > result.baseline[11].net_worth);
    }

    #[tokio::test]
    async fn what_if_without_history_is_unprocessable() {
        let payload: WhatIfPayload =
            serde_json::from_str(r#"{ "userId": "ghost", "horizonMonths": 12 }"#)
                .expect("payload should parse");
        let response = what_if_handler(State(state()), Json(payload)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let response = not_found_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = body_json(response).await;
        assert_eq!(body["error"], "Not found");
    }
}
