//! Integration tests for the FHIR metadata server.
//!
//! These tests build the Axum router around an in-memory binding registry
//! and exercise the HTTP endpoints without binding a TCP port.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value as JsonValue;
use tower::ServiceExt;

use fhir_core::{
    MethodBinding, OperationMethodBinding, OperationParameter, ResourceBinding, ResourceCatalog,
    RestOperationType, SearchMethodBinding, SearchParamType, SearchParameter, ServerConfiguration,
};
use fhir_server::config::Config;
use fhir_server::conformance::CapabilityStatementProvider;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_config() -> Config {
    Config {
        bind_address: "0.0.0.0:0".to_string(),
        bindings_file: None,
        server_base_url: None,
        publisher: Some("Test Publisher".to_string()),
        capability_cache: true,
        cors_origins: vec!["*".to_string()],
    }
}

fn registry() -> ServerConfiguration {
    let mut everything = OperationMethodBinding::new("$everything");
    everything.instance = true;
    everything.idempotent = true;
    everything.description = Some("Patient record".to_string());
    everything.parameters = vec![OperationParameter::new("_count").of_type("integer")];
    everything.return_params = vec![
        OperationParameter::new("return")
            .of_type("Bundle")
            .cardinality(1, Some(1)),
    ];

    let search = SearchMethodBinding {
        description: None,
        includes: vec!["Patient:organization".to_string()],
        parameters: vec![
            SearchParameter::new("name", SearchParamType::String),
            SearchParameter::new("identifier", SearchParamType::Token).required(),
        ],
    };

    let mut config = ServerConfiguration::default()
        .with_resource(
            ResourceBinding::new("Patient")
                .with_method(MethodBinding::interaction(RestOperationType::Read))
                .with_method(MethodBinding::conditional(RestOperationType::Create))
                .with_method(MethodBinding::Search(search))
                .with_method(MethodBinding::Operation(everything)),
        )
        .with_server_method(MethodBinding::interaction(RestOperationType::Transaction));
    config.server_name = "Integration Server".to_string();
    config
}

/// Build the app router with test configuration.
fn test_app(config: &Config, registry: ServerConfiguration) -> Router {
    let provider = CapabilityStatementProvider::new(registry, ResourceCatalog::r4b())
        .expect("registry should be valid")
        .with_cache(config.capability_cache)
        .with_publisher(config.publisher.clone());
    fhir_server::build_app(provider, config)
}

/// Send a request to the app and return (status, content type, body as JSON).
async fn request(app: &Router, req: Request<Body>) -> (StatusCode, String, JsonValue) {
    let response = app.clone().oneshot(req).await.expect("Request failed");
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();

    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };

    (status, content_type, body)
}

/// Build a GET request against `host`.
fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Host", "fhir.test:8080")
        .body(Body::empty())
        .unwrap()
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

#[tokio::test]
async fn metadata_returns_capability_statement() {
    let app = test_app(&test_config(), registry());
    let (status, content_type, body) = request(&app, get("/metadata")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "application/fhir+json");
    assert_eq!(body["resourceType"], "CapabilityStatement");
    assert_eq!(body["status"], "active");
    assert_eq!(body["kind"], "instance");
    assert_eq!(body["fhirVersion"], "4.3.0");
    assert_eq!(body["publisher"], "Test Publisher");
    assert_eq!(body["software"]["name"], "Integration Server");
    assert_eq!(body["implementation"]["url"], "http://fhir.test:8080");

    let rest = &body["rest"][0];
    assert_eq!(rest["mode"], "server");
    assert_eq!(rest["interaction"][0]["code"], "transaction");

    let patient = &rest["resource"][0];
    assert_eq!(patient["type"], "Patient");
    assert_eq!(
        patient["profile"],
        "http://hl7.org/fhir/StructureDefinition/Patient"
    );
    let codes: Vec<_> = patient["interaction"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["read", "create", "search-type"]);
    assert_eq!(patient["conditionalCreate"], true);
    assert!(patient.get("conditionalUpdate").is_none());
    assert_eq!(patient["searchInclude"][0], "Patient:organization");
    assert_eq!(patient["searchParam"][0]["name"], "identifier");
    assert_eq!(patient["searchParam"][0]["type"], "token");
    assert_eq!(patient["searchParam"][0]["documentation"], "A patient identifier");
    assert_eq!(patient["searchParam"][1]["name"], "name");

    assert_eq!(rest["operation"][0]["name"], "everything");
    assert_eq!(
        rest["operation"][0]["definition"],
        "http://fhir.test:8080/OperationDefinition/everything"
    );
}

#[tokio::test]
async fn metadata_uses_fixed_base_url() {
    let mut config = test_config();
    config.server_base_url = Some("https://api.example.org/fhir/".to_string());
    let app = test_app(&config, registry());

    let (status, _, body) = request(&app, get("/metadata")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["implementation"]["url"], "https://api.example.org/fhir");
}

#[tokio::test]
async fn metadata_without_cache_follows_request_host() {
    let mut config = test_config();
    config.capability_cache = false;
    let app = test_app(&config, registry());

    let (_, _, first) = request(&app, get("/metadata")).await;
    let req = Request::builder()
        .uri("/metadata")
        .header("Host", "other.test")
        .body(Body::empty())
        .unwrap();
    let (_, _, second) = request(&app, req).await;

    assert_eq!(first["implementation"]["url"], "http://fhir.test:8080");
    assert_eq!(second["implementation"]["url"], "http://other.test");
}

#[tokio::test]
async fn empty_registry_still_serves_statement() {
    let app = test_app(&test_config(), ServerConfiguration::default());
    let (status, _, body) = request(&app, get("/metadata")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rest"][0]["mode"], "server");
    assert!(body["rest"][0].get("resource").is_none());
}

// ---------------------------------------------------------------------------
// OperationDefinition
// ---------------------------------------------------------------------------

#[tokio::test]
async fn read_operation_definition() {
    let app = test_app(&test_config(), registry());
    let (status, content_type, body) =
        request(&app, get("/OperationDefinition/everything")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "application/fhir+json");
    assert_eq!(body["resourceType"], "OperationDefinition");
    assert_eq!(body["id"], "everything");
    assert_eq!(body["code"], "everything");
    assert_eq!(body["description"], "Patient record");
    assert_eq!(body["affectsState"], false);
    assert_eq!(body["instance"], true);
    assert_eq!(body["system"], false);
    assert_eq!(body["resource"][0], "Patient");
    assert_eq!(body["parameter"][0]["name"], "_count");
    assert_eq!(body["parameter"][0]["use"], "in");
    assert_eq!(body["parameter"][1]["name"], "return");
    assert_eq!(body["parameter"][1]["use"], "out");
    assert_eq!(body["parameter"][1]["min"], 1);
    assert_eq!(body["parameter"][1]["max"], "1");
}

#[tokio::test]
async fn unknown_operation_definition_is_not_found() {
    let app = test_app(&test_config(), registry());
    let (status, _, body) = request(&app, get("/OperationDefinition/unknown")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["resourceType"], "OperationOutcome");
    assert_eq!(body["issue"][0]["code"], "not-found");
}

// ---------------------------------------------------------------------------
// Ambient endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_registry_size() {
    let app = test_app(&test_config(), registry());
    let (status, _, body) = request(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["resources"], 1);
    assert_eq!(body["operations"], 1);
}

#[tokio::test]
async fn metrics_are_prometheus_text() {
    let app = test_app(&test_config(), registry());
    let (status, content_type, _) = request(&app, get("/metrics")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/plain; version=0.0.4"));
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = test_app(&test_config(), registry());
    let req = Request::builder()
        .uri("/health")
        .header("X-Request-ID", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    let response = app.oneshot(get("/health")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn example_registry_loads() {
    let mut config = test_config();
    config.bindings_file = Some(format!(
        "{}/bindings.example.json",
        env!("CARGO_MANIFEST_DIR")
    ));

    let provider = fhir_server::load_provider(&config).expect("example registry should load");
    assert_eq!(provider.resource_count(), 3);
    assert_eq!(
        provider.operation_names(),
        vec!["everything", "validate-registry"]
    );

    let app = fhir_server::build_app(provider, &config);
    let (status, _, body) = request(&app, get("/metadata")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], "2026-01-15");

    let resources: Vec<_> = body["rest"][0]["resource"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["type"].as_str().unwrap())
        .collect();
    assert_eq!(resources, vec!["Observation", "Organization", "Patient"]);

    let observation = &body["rest"][0]["resource"][0];
    assert_eq!(observation["searchParam"][0]["name"], "subject");
    assert_eq!(observation["searchParam"][0]["target"][0], "Patient");
    assert_eq!(observation["searchParam"][0]["target"][1], "Group");
}
