//! Integration tests for the orchestrator.
//!
//! The orders side runs in process through `LocalOrderGateway` over the
//! in-memory store, wrapped to count calls and inject failures.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain::{
    CancellationResponse, ConfirmationResponse, CustomerDirectory, CustomerDirectoryError,
    DomainError, FixedClock, InMemoryCustomerDirectory, OrderLine, OrderService,
    OrderServiceConfig, OrderView,
};
use domain::{Customer, CustomerId, OrderId, OrderStatus, ProductId};
use metrics_exporter_prometheus::PrometheusBuilder;
use orchestrator::{
    CompensationPolicy, GatewayError, LocalOrderGateway, OrchestrationRequest, OrchestratorError,
    OrderGateway, OrderOrchestrator, create_app, handle,
};
use order_store::{InMemoryOrderStore, NewProduct, OrderStore};
use serde_json::{Value, json};
use tower::ServiceExt;

type Local = LocalOrderGateway<InMemoryOrderStore, InMemoryCustomerDirectory, FixedClock>;

/// Gateway wrapper recording every call, with an optional confirm failure.
#[derive(Clone)]
struct Recording {
    inner: Local,
    creates: Arc<AtomicUsize>,
    confirms: Arc<AtomicUsize>,
    cancels: Arc<AtomicUsize>,
    fail_confirm: Arc<AtomicBool>,
}

#[async_trait]
impl OrderGateway for Recording {
    async fn create_order(
        &self,
        customer_id: CustomerId,
        items: &[OrderLine],
    ) -> Result<OrderView, GatewayError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create_order(customer_id, items).await
    }

    async fn confirm_order(
        &self,
        order_id: OrderId,
        idempotency_key: &str,
    ) -> Result<ConfirmationResponse, GatewayError> {
        self.confirms.fetch_add(1, Ordering::SeqCst);
        if self.fail_confirm.load(Ordering::SeqCst) {
            return Err(GatewayError::Domain(DomainError::Store(
                order_store::StoreError::InvalidData("connection reset".into()),
            )));
        }
        self.inner.confirm_order(order_id, idempotency_key).await
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<CancellationResponse, GatewayError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.inner.cancel_order(order_id).await
    }
}

/// Customer directory that is always down.
struct Unavailable;

#[async_trait]
impl CustomerDirectory for Unavailable {
    async fn find_customer(
        &self,
        _id: CustomerId,
    ) -> Result<Option<Customer>, CustomerDirectoryError> {
        Err(CustomerDirectoryError::Timeout)
    }
}

struct Harness {
    store: InMemoryOrderStore,
    customers: InMemoryCustomerDirectory,
    gateway: Recording,
    product: ProductId,
}

impl Harness {
    async fn new() -> Self {
        let store = InMemoryOrderStore::new();
        let product = store
            .insert_product(NewProduct {
                sku: "SKU-001".to_string(),
                name: "Widget".to_string(),
                price_cents: 1500,
                stock: 5,
            })
            .await
            .unwrap()
            .id;

        let customers = InMemoryCustomerDirectory::new();
        customers.add(CustomerId::new(1), "Ada Lovelace").await;

        let service = OrderService::with_clock(
            store.clone(),
            customers.clone(),
            FixedClock::default(),
            OrderServiceConfig::default(),
        );
        let gateway = Recording {
            inner: LocalOrderGateway::new(Arc::new(service)),
            creates: Arc::default(),
            confirms: Arc::default(),
            cancels: Arc::default(),
            fail_confirm: Arc::default(),
        };

        Self {
            store,
            customers,
            gateway,
            product,
        }
    }

    fn orchestrator(&self) -> OrderOrchestrator<InMemoryCustomerDirectory, Recording> {
        OrderOrchestrator::new(self.customers.clone(), self.gateway.clone())
    }

    fn request(&self, customer_id: i64, qty: i64, key: &str) -> OrchestrationRequest {
        OrchestrationRequest {
            customer_id: CustomerId::new(customer_id),
            items: vec![OrderLine::new(self.product, qty)],
            idempotency_key: key.to_string(),
            correlation_id: Some("corr-123".to_string()),
        }
    }

    async fn stock(&self) -> i64 {
        self.store.get_product(self.product).await.unwrap().unwrap().stock
    }

    fn calls(&self) -> (usize, usize, usize) {
        (
            self.gateway.creates.load(Ordering::SeqCst),
            self.gateway.confirms.load(Ordering::SeqCst),
            self.gateway.cancels.load(Ordering::SeqCst),
        )
    }
}

mod orchestration {
    use super::*;

    #[tokio::test]
    async fn happy_path_returns_customer_and_confirmed_order() {
        let h = Harness::new().await;

        let result = h
            .orchestrator()
            .orchestrate(h.request(1, 2, "k1"))
            .await
            .unwrap();

        assert_eq!(result.correlation_id, "corr-123");
        assert_eq!(result.data.customer.name, "Ada Lovelace");
        assert_eq!(result.data.order.status, OrderStatus::Confirmed);
        assert_eq!(result.data.order.total_cents, 3000);
        assert_eq!(h.stock().await, 3);
        assert_eq!(h.calls(), (1, 1, 0));
    }

    #[tokio::test]
    async fn unknown_customer_creates_nothing_and_never_confirms() {
        let h = Harness::new().await;

        let failure = h
            .orchestrator()
            .orchestrate(h.request(404, 1, "k1"))
            .await
            .unwrap_err();

        assert_eq!(failure.correlation_id, "corr-123");
        assert!(matches!(
            failure.error,
            OrchestratorError::CustomerNotFound(_)
        ));
        assert_eq!(h.calls(), (0, 0, 0));
        assert_eq!(h.store.order_count().await, 0);
        assert_eq!(h.stock().await, 5);
    }

    #[tokio::test]
    async fn customer_service_outage_stops_the_sequence() {
        let h = Harness::new().await;
        let orchestrator = OrderOrchestrator::new(Unavailable, h.gateway.clone());

        let failure = orchestrator
            .orchestrate(h.request(1, 1, "k1"))
            .await
            .unwrap_err();

        assert!(matches!(
            failure.error,
            OrchestratorError::CustomerLookup(CustomerDirectoryError::Timeout)
        ));
        assert_eq!(h.calls(), (0, 0, 0));
    }

    #[tokio::test]
    async fn blank_idempotency_key_fails_before_any_call() {
        let h = Harness::new().await;

        let failure = h
            .orchestrator()
            .orchestrate(h.request(1, 1, "   "))
            .await
            .unwrap_err();

        assert!(matches!(failure.error, OrchestratorError::InvalidRequest(_)));
        assert_eq!(h.calls(), (0, 0, 0));
    }

    #[tokio::test]
    async fn insufficient_stock_surfaces_create_failure() {
        let h = Harness::new().await;

        let failure = h
            .orchestrator()
            .orchestrate(h.request(1, 9, "k1"))
            .await
            .unwrap_err();

        assert!(matches!(failure.error, OrchestratorError::CreateOrder(_)));
        assert!(failure.to_string().contains("Insufficient stock"));
        assert_eq!(h.calls(), (1, 0, 0));
    }

    #[tokio::test]
    async fn confirm_failure_leaves_order_created_by_default() {
        let h = Harness::new().await;
        h.gateway.fail_confirm.store(true, Ordering::SeqCst);

        let failure = h
            .orchestrator()
            .orchestrate(h.request(1, 2, "k1"))
            .await
            .unwrap_err();

        let OrchestratorError::ConfirmOrder { order_id, .. } = failure.error else {
            panic!("expected confirm failure, got {:?}", failure.error);
        };
        let order = h.store.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.order.status, OrderStatus::Created);
        assert_eq!(h.stock().await, 3);
        assert_eq!(h.calls(), (1, 1, 0));
    }

    #[tokio::test]
    async fn confirm_failure_is_compensated_when_enabled() {
        let h = Harness::new().await;
        h.gateway.fail_confirm.store(true, Ordering::SeqCst);

        let failure = h
            .orchestrator()
            .with_compensation(CompensationPolicy::CancelOrder)
            .orchestrate(h.request(1, 2, "k1"))
            .await
            .unwrap_err();

        let OrchestratorError::ConfirmOrder { order_id, .. } = failure.error else {
            panic!("expected confirm failure");
        };
        let order = h.store.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.order.status, OrderStatus::Canceled);
        assert_eq!(h.stock().await, 5);
        assert_eq!(h.calls(), (1, 1, 1));
    }

    #[tokio::test]
    async fn missing_correlation_id_gets_generated() {
        let h = Harness::new().await;
        let mut request = h.request(1, 1, "k1");
        request.correlation_id = None;

        let result = h.orchestrator().orchestrate(request).await.unwrap();
        assert_eq!(result.correlation_id.len(), 36);
    }
}

mod handler {
    use super::*;

    #[tokio::test]
    async fn accepts_string_body_and_returns_201() {
        let h = Harness::new().await;
        let raw = json!({
            "customer_id": 1,
            "items": [{"product_id": h.product, "qty": 1}],
            "idempotency_key": "k1",
            "correlation_id": "corr-9"
        })
        .to_string();

        let response = handle(&h.orchestrator(), Value::String(raw)).await;

        assert_eq!(response.status_code, 201);
        assert_eq!(response.body["success"], json!(true));
        assert_eq!(response.body["correlationId"], json!("corr-9"));
        assert_eq!(response.body["data"]["order"]["status"], json!("CONFIRMED"));
        assert_eq!(response.body["data"]["customer"]["id"], json!(1));
    }

    #[tokio::test]
    async fn failures_map_to_500_with_correlation_id() {
        let h = Harness::new().await;
        let body = json!({
            "customer_id": 77,
            "items": [{"product_id": h.product, "qty": 1}],
            "idempotency_key": "k1",
            "correlation_id": "corr-10"
        });

        let response = handle(&h.orchestrator(), body).await;

        assert_eq!(response.status_code, 500);
        assert_eq!(response.body["success"], json!(false));
        assert_eq!(response.body["correlationId"], json!("corr-10"));
        assert!(
            response.body["error"]
                .as_str()
                .unwrap()
                .contains("Customer not found")
        );
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let h = Harness::new().await;
        let response = handle(&h.orchestrator(), Value::String("{not json".into())).await;

        assert_eq!(response.status_code, 500);
        assert_eq!(response.body["success"], json!(false));
        assert_eq!(h.calls(), (0, 0, 0));
    }
}

mod http {
    use super::*;

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn post_orchestrate_runs_the_sequence() {
        let h = Harness::new().await;
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let app = create_app(Arc::new(h.orchestrator()), handle);

        let body = json!({
            "customer_id": 1,
            "items": [{"product_id": h.product, "qty": 2}],
            "idempotency_key": "http-key"
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/orchestrate")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["success"], json!(true));
        assert!(json["correlationId"].is_string());
    }

    #[tokio::test]
    async fn health_is_ok() {
        let h = Harness::new().await;
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let app = create_app(Arc::new(h.orchestrator()), handle);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }
}
