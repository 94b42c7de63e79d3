use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::info;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::config::{Config, Limits};
use crate::data::{SolveResponse, Slot};
use crate::error::{Error, Result};
use crate::pipeline;
use crate::solver::{HighsAdapter, SolverAdapter};
use crate::validation::{self, ValidationError, ValidationErrorKind};

const INDEX_HTML: &str = include_str!("../static/index.html");
const APP_JS: &str = include_str!("../static/app.js");

/// Per-process settings shared by all requests. Holds no per-request state.
#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<dyn SolverAdapter>,
    pub limits: Limits,
    pub default_slots: Arc<[Slot]>,
    pub solve_timeout: Duration,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            adapter: Arc::new(HighsAdapter::new(Some(config.solve_timeout()), config.solver_log)),
            limits: config.limits(),
            default_slots: config.default_slots.clone().into(),
            solve_timeout: config.solve_timeout(),
        }
    }
}

async fn solve_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<SolveResponse>> {
    let Json(body) = body.map_err(|rejection| {
        Error::Input(vec![ValidationError::new(
            ValidationErrorKind::WrongType,
            format!("body: {}", rejection.body_text()),
        )])
    })?;

    let instance = validation::validate_request(&body, &state.limits, &state.default_slots)
        .map_err(Error::Input)?;
    info!(
        "Solving request with {} rooms, {} groups, {} slots.",
        instance.rooms.len(),
        instance.groups.len(),
        instance.slots.len()
    );

    let output = pipeline::run_bounded(instance, state.adapter.clone(), state.solve_timeout).await?;
    info!(
        "Request finished with status {} and {} assignments.",
        output.status,
        output.assignments.len()
    );
    Ok(Json(output.into()))
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn app_js_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], APP_JS)
}

pub fn router(state: AppState) -> Router {
    // the form may be served from another origin than the API
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/static/app.js", get(app_js_handler))
        .route("/solve", post(solve_handler))
        .with_state(state)
        .layer(cors)
}

pub async fn run_server(config: &Config) -> std::io::Result<()> {
    let app = router(AppState::from_config(config));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState {
            adapter: Arc::new(HighsAdapter::default()),
            limits: Limits::default(),
            default_slots: vec!["T1".to_string()].into(),
            solve_timeout: Duration::from_secs(30),
        })
    }

    async fn post_solve(body: Body) -> (StatusCode, Value) {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/solve")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn solves_scenario_a() {
        let (status, body) = post_solve(Body::from(
            json!({
                "rooms": [{"name": "A", "capacity": 30}, {"name": "B", "capacity": 20}],
                "groups": [{"name": "G1", "size": 25}, {"name": "G2", "size": 18}],
                "slots": ["T1"],
                "parameters": {"delta": 0.2, "lambda": 1.0}
            })
            .to_string(),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["estado"], "Optimal");
        assert!((body["valor_objetivo"].as_f64().unwrap() - 43.0).abs() < 1e-6);
        assert_eq!(body["resultados"], json!(["G1 -> A -> T1", "G2 -> B -> T1"]));
    }

    #[tokio::test]
    async fn infeasible_is_a_normal_response() {
        let (status, body) = post_solve(Body::from(
            json!({
                "rooms": [{"name": "A", "capacity": 10}],
                "groups": [{"name": "G", "size": 15}]
            })
            .to_string(),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"estado": "Infeasible", "valor_objetivo": null, "resultados": []})
        );
    }

    #[tokio::test]
    async fn invalid_fields_are_bad_request() {
        let (status, body) = post_solve(Body::from(
            json!({
                "rooms": [{"name": "A", "capacity": -4}],
                "groups": [{"name": "G", "size": 15}]
            })
            .to_string(),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"][0].as_str().unwrap().starts_with("rooms[0].capacity"));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (status, body) = post_solve(Body::from("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("invalid input"));
    }

    #[tokio::test]
    async fn serves_static_page() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("/static/app.js"));
    }

    #[tokio::test]
    async fn answers_cors_preflight() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/solve")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn nothing_usable_left_is_unprocessable() {
        let (status, body) = post_solve(Body::from(
            json!({
                "rooms": [{"name": "  ", "capacity": 10}],
                "groups": [{"name": "G", "size": 4}]
            })
            .to_string(),
        ))
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "at least one room is required");
    }
}
