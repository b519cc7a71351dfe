//! Integration tests for the customers service router.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use clients::{ClientConfig, HttpCustomerDirectory};
use common::CustomerId;
use customers::{InMemoryCustomerStore, create_app};
use domain::CustomerDirectory;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{Value, json};
use tower::ServiceExt;

const TOKEN: &str = "s3cret";

struct TestApp {
    router: Router,
    store: InMemoryCustomerStore,
}

impl TestApp {
    fn new() -> Self {
        Self::with_token(Some(TOKEN))
    }

    fn with_token(service_token: Option<&str>) -> Self {
        let store = InMemoryCustomerStore::new();
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let router = create_app(
            Arc::new(store.clone()),
            handle,
            service_token.map(String::from),
        );
        Self { router, store }
    }

    async fn json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn register(&self, name: &str, email: &str) -> i64 {
        let (status, body) = self
            .json(post_json(
                "/customers",
                json!({"name": name, "email": email, "phone": "555-0100"}),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn internal(id: i64, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(format!("/internal/customers/{id}"));
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

mod registration {
    use super::*;

    #[tokio::test]
    async fn test_register_returns_created_customer() {
        let app = TestApp::new();

        let (status, body) = app
            .json(post_json(
                "/customers",
                json!({"name": "Ada Lovelace", "email": "ada@example.com", "phone": "555-0100"}),
            ))
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 1);
        assert_eq!(body["name"], "Ada Lovelace");
        assert_eq!(body["email"], "ada@example.com");
        assert_eq!(body["phone"], "555-0100");
    }

    #[tokio::test]
    async fn test_invalid_fields_are_rejected() {
        let app = TestApp::new();

        let (status, body) = app
            .json(post_json(
                "/customers",
                json!({"name": "", "email": "nope", "phone": "12"}),
            ))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("Invalid email"), "{message}");
        assert!(message.contains("Name is required"), "{message}");
        assert_eq!(app.store.customer_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_field_is_a_bad_request() {
        let app = TestApp::new();
        let (status, _) = app
            .json(post_json("/customers", json!({"name": "Ada"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let app = TestApp::new();
        app.register("Ada", "ada@example.com").await;

        let (status, body) = app
            .json(post_json(
                "/customers",
                json!({"name": "Other", "email": "Ada@Example.com", "phone": "555-0199"}),
            ))
            .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Email already exists");
    }
}

mod lookup {
    use super::*;

    #[tokio::test]
    async fn test_get_customer_and_not_found() {
        let app = TestApp::new();
        let id = app.register("Ada", "ada@example.com").await;

        let (status, body) = app.json(get(&format!("/customers/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ada@example.com");
        assert!(body["created_at"].is_string());

        let (status, body) = app.json(get("/customers/999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Customer not found");

        let (status, _) = app.json(get("/customers/abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_and_limit() {
        let app = TestApp::new();
        app.register("Ada Lovelace", "ada@example.com").await;
        app.register("Grace Hopper", "grace@navy.mil").await;
        app.register("Alan Turing", "alan@example.com").await;

        let (status, body) = app.json(get("/customers?search=navy")).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Grace Hopper"]);

        let (_, body) = app.json(get("/customers?limit=2")).await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (_, body) = app.json(get("/customers")).await;
        assert_eq!(body.as_array().unwrap().len(), 3);

        let (status, _) = app.json(get("/customers?limit=many")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod internal_lookup {
    use super::*;

    #[tokio::test]
    async fn test_requires_service_token() {
        let app = TestApp::new();
        let id = app.register("Ada", "ada@example.com").await;

        let (status, body) = app.json(internal(id, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");

        let (status, _) = app.json(internal(id, Some("wrong"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app.json(internal(id, Some(TOKEN))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Ada");

        let (status, _) = app.json(internal(404, Some(TOKEN))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_public_routes_and_health_stay_open() {
        let app = TestApp::new();
        let (status, _) = app.json(get("/customers")).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = app.json(get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_open_without_configured_token() {
        let app = TestApp::with_token(None);
        let id = app.register("Ada", "ada@example.com").await;
        let (status, _) = app.json(internal(id, None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_http_directory_resolves_through_internal_route() {
        let app = TestApp::new();
        let id = app.register("Ada Lovelace", "ada@example.com").await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = app.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = ClientConfig::new(format!("http://{addr}")).with_service_token(TOKEN);
        let directory = HttpCustomerDirectory::new(config).unwrap();

        let found = directory
            .find_customer(CustomerId::new(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "Ada Lovelace");
        assert_eq!(found.phone.as_deref(), Some("555-0100"));
        assert!(
            directory
                .find_customer(CustomerId::new(999))
                .await
                .unwrap()
                .is_none()
        );
    }
}
