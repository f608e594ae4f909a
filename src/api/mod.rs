mod payload;

pub use payload::{
    ApiError, CalculatePayload, CalculateResponse, CliCalculator, CliMode, calculate,
};

use axum::{
    Router,
    extract::{Json, Query, State},
    handler::HandlerWithoutStateExt,
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tower_http::{
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, warn};

use crate::core::CalculatorKind;
use crate::lookup::{LookupConfig, LookupError, RegionalCostClient};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub base_path: String,
    pub public_dir: PathBuf,
    pub lookup: LookupConfig,
}

#[derive(Clone)]
struct AppState {
    base_path: String,
    lookup: Option<RegionalCostClient>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegionalCostsPayload {
    #[serde(default)]
    zip_code: String,
    #[serde(flatten)]
    calculation: CalculatePayload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupSummary {
    message: String,
    location: String,
    applied: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegionalCostsResponse {
    lookup: LookupSummary,
    #[serde(flatten)]
    calculation: CalculateResponse,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// `"calc"`, `"/calc/"` and `"/calc"` all mean `/calc`; blank means root.
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

pub fn build_router(config: &ServerConfig) -> Router {
    let base_path = normalize_base_path(&config.base_path);
    let lookup = match RegionalCostClient::new(config.lookup.clone()) {
        Ok(client) => Some(client),
        Err(LookupError::MissingCredential) => {
            info!("no lookup API key configured; regional cost lookups disabled");
            None
        }
        Err(err) => {
            warn!(error = %err, "regional cost client unavailable");
            None
        }
    };
    let state = AppState {
        base_path: base_path.clone(),
        lookup,
    };

    let static_files = ServeDir::new(&config.public_dir)
        .not_found_service(not_found_handler.into_service());

    let app = Router::new()
        .route(
            "/api/car-loan/calculate",
            get(car_loan_get_handler).post(car_loan_post_handler),
        )
        .route(
            "/api/mortgage/calculate",
            get(mortgage_get_handler).post(mortgage_post_handler),
        )
        .route("/api/mortgage/regional-costs", post(regional_costs_handler))
        .route("/car-loan", get(page_redirect_handler))
        .route("/mortgage", get(page_redirect_handler))
        .fallback_service(static_files)
        .with_state(state);

    let app = if base_path.is_empty() {
        app
    } else {
        Router::new()
            .nest(&base_path, app)
            .fallback(not_found_handler)
    };
    app.layer(TraceLayer::new_for_http().on_response(DefaultOnResponse::new().level(Level::INFO)))
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = build_router(&config);

    let listener = TcpListener::bind(addr).await?;
    let base_path = normalize_base_path(&config.base_path);
    info!(%addr, base_path = %base_path, public_dir = %config.public_dir.display(), "loan calculators listening");
    info!("Local access: http://127.0.0.1:{}{}/", config.port, base_path);

    axum::serve(listener, app).await
}

/// Page routes without a trailing slash redirect so relative asset links
/// resolve against the page directory.
async fn page_redirect_handler(State(state): State<AppState>, uri: axum::http::Uri) -> Redirect {
    let page = uri.path().trim_end_matches('/');
    Redirect::permanent(&format!("{}{page}/", state.base_path))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn car_loan_get_handler(Query(payload): Query<CalculatePayload>) -> Response {
    calculate_handler_impl(CalculatorKind::CarLoan, payload)
}

async fn car_loan_post_handler(Json(payload): Json<CalculatePayload>) -> Response {
    calculate_handler_impl(CalculatorKind::CarLoan, payload)
}

async fn mortgage_get_handler(Query(payload): Query<CalculatePayload>) -> Response {
    calculate_handler_impl(CalculatorKind::Mortgage, payload)
}

async fn mortgage_post_handler(Json(payload): Json<CalculatePayload>) -> Response {
    calculate_handler_impl(CalculatorKind::Mortgage, payload)
}

fn calculate_handler_impl(kind: CalculatorKind, payload: CalculatePayload) -> Response {
    match calculate(kind, &payload) {
        Ok((_, response)) => json_response(StatusCode::OK, response),
        Err(err) => api_error_response(&err),
    }
}

async fn regional_costs_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegionalCostsPayload>,
) -> Response {
    let (mut calc, _) = match calculate(CalculatorKind::Mortgage, &payload.calculation) {
        Ok(built) => built,
        Err(err) => return api_error_response(&err),
    };
    let Some(client) = state.lookup.as_ref() else {
        return api_error_response(&LookupError::MissingCredential.into());
    };

    let estimate = match client
        .estimate(&payload.zip_code, calc.inputs().price)
        .await
    {
        Ok(estimate) => estimate,
        Err(err) => {
            warn!(error = %err, zip_code = %payload.zip_code, "regional cost lookup failed");
            return api_error_response(&err.into());
        }
    };

    let applied = calc.apply_extra_costs(&estimate.updates());
    let lookup = LookupSummary {
        message: estimate.status_message(),
        location: estimate.location_label().to_string(),
        applied,
    };
    json_response(
        StatusCode::OK,
        RegionalCostsResponse {
            lookup,
            calculation: CalculateResponse::of(&calc),
        },
    )
}

fn api_error_response(err: &ApiError) -> Response {
    let status = match err {
        ApiError::InvalidField { .. } | ApiError::UnsupportedField { .. } => {
            StatusCode::BAD_REQUEST
        }
        ApiError::Lookup(LookupError::InvalidZip) => StatusCode::BAD_REQUEST,
        ApiError::Lookup(LookupError::MissingCredential) => StatusCode::SERVICE_UNAVAILABLE,
        ApiError::Lookup(_) => StatusCode::BAD_GATEWAY,
    };
    error_response(status, &err.message())
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
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn test_config(base_path: &str) -> ServerConfig {
        ServerConfig {
            port: 0,
            base_path: base_path.to_string(),
            public_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/public")),
            lookup: LookupConfig::default(),
        }
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, header::HeaderMap, Vec<u8>) {
        let response = router.oneshot(request).await.expect("router responds");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        (status, headers, body.to_vec())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request")
    }

    fn json_body(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).expect("json body")
    }

    #[test]
    fn base_path_is_normalized() {
        assert_eq!(normalize_base_path(""), "");
        assert_eq!(normalize_base_path("/"), "");
        assert_eq!(normalize_base_path("calc"), "/calc");
        assert_eq!(normalize_base_path(" /calc/ "), "/calc");
        assert_eq!(normalize_base_path("/tools/calc"), "/tools/calc");
    }

    #[tokio::test]
    async fn car_loan_get_reads_query_parameters() {
        let router = build_router(&test_config(""));
        let (status, headers, body) = send(
            router,
            get_request("/api/car-loan/calculate?price=30000&downPayment=5000&loanTerm=60"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
        let json = json_body(&body);
        assert_eq!(json["calculator"], "car-loan");
        assert_eq!(json["derived"]["loanAmount"], 25_000.0);
        assert_eq!(json["display"]["mainResultLabel"], "Monthly Payment");
    }

    #[tokio::test]
    async fn mortgage_post_solves_affordable_price() {
        let router = build_router(&test_config(""));
        let (status, _, body) = send(
            router,
            post_json(
                "/api/mortgage/calculate",
                json!({ "mode": "affordability", "targetPayment": 2000 }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let json = json_body(&body);
        let price = json["inputs"]["price"].as_f64().expect("price");
        assert!((price - 295_461.35).abs() < 0.01);
        assert_eq!(json["display"]["mainResultLabel"], "Affordable Home Price");
    }

    #[tokio::test]
    async fn invalid_payload_is_a_json_error() {
        let router = build_router(&test_config(""));
        let (status, headers, body) = send(
            router,
            post_json("/api/car-loan/calculate", json!({ "hoa": 50 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
        assert_eq!(
            json_body(&body)["error"],
            "hoa is not an input of the car-loan calculator"
        );
    }

    #[tokio::test]
    async fn regional_costs_without_a_key_is_unavailable() {
        let router = build_router(&test_config(""));
        let (status, _, body) = send(
            router,
            post_json("/api/mortgage/regional-costs", json!({ "zipCode": "30301" })),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(
            json_body(&body)["error"]
                .as_str()
                .expect("message")
                .starts_with("API key not configured")
        );
    }

    #[tokio::test]
    async fn regional_costs_apply_through_the_calculator() {
        let stub = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                Json(json!({
                    "choices": [{ "message": { "content":
                        "{\"propertyTax\": 410.4, \"homeInsurance\": 130, \"hoa\": 60, \"location\": \"Atlanta, GA\"}"
                    } }]
                }))
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            axum::serve(listener, stub).await.expect("stub server");
        });

        let mut config = test_config("/calc");
        config.lookup = LookupConfig {
            base_url: format!("http://{addr}/v1"),
            api_key: Some("test-key".to_string()),
            ..LookupConfig::default()
        };
        let router = build_router(&config);
        let (status, _, body) = send(
            router,
            post_json(
                "/calc/api/mortgage/regional-costs",
                json!({ "zipCode": "30301", "price": 400000, "downPayment": 100000 }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let json = json_body(&body);
        assert_eq!(json["lookup"]["message"], "✓ Data loaded for Atlanta, GA");
        assert_eq!(json["lookup"]["applied"], 3);
        assert_eq!(json["derived"]["extraCostsTotal"], 600.0);
        assert_eq!(json["inputs"]["price"], 400_000.0);
    }

    #[tokio::test]
    async fn regional_costs_reject_bad_zip_codes() {
        let mut config = test_config("");
        config.lookup.api_key = Some("test-key".to_string());
        let router = build_router(&config);
        let (status, _, body) = send(
            router,
            post_json("/api/mortgage/regional-costs", json!({ "zipCode": "3030" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&body)["error"], "Please enter a valid 5-digit zip code");
    }

    #[tokio::test]
    async fn pages_are_served_under_the_base_path() {
        let (status, _, body) = send(build_router(&test_config("/calc")), get_request("/calc/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&body).contains("Loan Calculators"));

        let (status, headers, _) =
            send(build_router(&test_config("/calc")), get_request("/calc/mortgage")).await;
        assert_eq!(status, StatusCode::PERMANENT_REDIRECT);
        assert_eq!(headers[header::LOCATION], "/calc/mortgage/");

        let (status, _, body) =
            send(build_router(&test_config("/calc")), get_request("/calc/car-loan/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&body).contains("data-calculator=\"car-loan\""));
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let (status, _, body) =
            send(build_router(&test_config("/calc")), get_request("/api/car-loan/calculate")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(&body)["error"], "Not found");

        let (status, _, _) =
            send(build_router(&test_config("")), get_request("/no-such-page.html")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
