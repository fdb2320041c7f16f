use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt; // for .oneshot()

use fieldops::{
    common::clock::FakeClock,
    config::{AppState, Settings},
    router::build_router,
};

struct TestApp {
    router: Router,
    clock: FakeClock,
    dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            documents_dir: dir.path().join("documents"),
            exports_dir: dir.path().join("exports"),
            // sem fontes: a geração de PDF falha de propósito
            fonts_dir: dir.path().join("fonts"),
            ..Settings::default()
        };
        let clock = FakeClock::new(Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap());
        let state = AppState::in_memory(settings, Arc::new(clock.clone()));

        Self {
            router: build_router(state),
            clock,
            dir,
        }
    }

    async fn request(&self, method: &str, uri: &str, body: Option<Value>, lang: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(lang) = lang {
            builder = builder.header("accept-language", lang);
        }
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request("GET", uri, None, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(body), None).await
    }

    async fn customer(&self, email: Option<&str>) -> String {
        let (status, body) = self
            .post("/api/customers", json!({ "fullName": "Maria Souza", "email": email, "phone": "+55 11 91234-5678" }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    async fn draft_quote(&self, customer_id: &str) -> String {
        let (status, body) = self
            .post(
                "/api/quotes",
                json!({
                    "customerId": customer_id,
                    "title": "Revisão elétrica",
                    "items": [
                        { "description": "Troca de disjuntor", "quantity": 2, "unitPrice": 85.0 },
                        { "description": "Mão de obra", "quantity": 1, "unitPrice": 120.5 }
                    ],
                    "taxRate": 0.08
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn health_check_responds() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".into()));
}

#[tokio::test]
async fn quote_goes_from_draft_to_job() {
    let app = TestApp::new();
    let customer_id = app.customer(Some("maria@example.com")).await;
    let quote_id = app.draft_quote(&customer_id).await;

    let (_, quote) = app.get(&format!("/api/quotes/{quote_id}")).await;
    assert_eq!(quote["status"], "draft");
    assert_eq!(quote["subtotal"].as_f64(), Some(290.5));
    assert_eq!(quote["tax"].as_f64(), Some(23.24));
    assert_eq!(quote["total"].as_f64(), Some(313.74));

    let (status, sent) = app.post(&format!("/api/quotes/{quote_id}/send"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["status"], "sent");
    assert_eq!(sent["expiresAt"], "2026-11-17T12:00:00Z");

    let (status, approved) = app.post(&format!("/api/quotes/{quote_id}/approve"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["signedBy"], "Customer");
    assert!(approved["signatureId"].is_string());

    let (status, scheduled) = app
        .post(
            &format!("/api/quotes/{quote_id}/schedule"),
            json!({ "date": "2026-11-03", "time": "14:30:00" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scheduled["status"], "scheduled");
    assert!(scheduled["calendarEventId"].is_string());

    let (status, conversion) = app.post(&format!("/api/quotes/{quote_id}/convert"), json!({})).await;
    assert_eq!(status, StatusCode::CREATED, "{conversion}");
    assert_eq!(conversion["quote"]["status"], "converted");
    assert_eq!(conversion["job"]["status"], "scheduled");
    assert_eq!(conversion["job"]["priority"], "medium");
    assert_eq!(conversion["job"]["scheduledDate"], "2026-11-03");
    assert_eq!(conversion["job"]["scheduledTime"], "14:30:00");
    assert_eq!(conversion["job"]["quoteId"], quote_id.as_str());
    assert_eq!(conversion["quote"]["jobId"], conversion["job"]["id"]);

    // Segunda conversão: conflito, nenhum job extra
    let (status, body) = app.post(&format!("/api/quotes/{quote_id}/convert"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let (_, jobs) = app.get("/api/jobs").await;
    assert_eq!(jobs.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn job_status_follows_its_table() {
    let app = TestApp::new();
    let customer_id = app.customer(None).await;

    let (status, job) = app
        .post(
            "/api/jobs",
            json!({ "customerId": customer_id, "title": "Instalação", "scheduledDate": "2026-10-20", "priority": "high" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{job}");
    assert_eq!(job["scheduledTime"], "09:00:00");
    let job_uri = format!("/api/jobs/{}", job["id"].as_str().unwrap());

    let status_uri = format!("{job_uri}/status");
    let (status, _) = app
        .request("PUT", &status_uri, Some(json!({ "status": "completed" })), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .request("PUT", &status_uri, Some(json!({ "status": "in_progress" })), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, done) = app
        .request("PUT", &status_uri, Some(json!({ "status": "completed" })), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["completedAt"], "2026-10-18T12:00:00Z");

    let (_, completed) = app.get("/api/jobs?status=completed").await;
    assert_eq!(completed.as_array().unwrap().len(), 1);

    let (status, _) = app
        .request("PUT", &status_uri, Some(json!({ "status": "paused" })), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.request("DELETE", &job_uri, None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&job_uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn illegal_transition_is_localized() {
    let app = TestApp::new();
    let customer_id = app.customer(None).await;
    let quote_id = app.draft_quote(&customer_id).await;
    let uri = format!("/api/quotes/{quote_id}/approve");

    let (status, body) = app.request("POST", &uri, Some(json!({})), Some("en-US,en;q=0.9")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "invalid_transition");
    assert_eq!(body["error"], "Invalid quote transition: draft -> approved");

    let (_, body) = app.request("POST", &uri, Some(json!({})), None).await;
    assert!(body["error"].as_str().unwrap().starts_with("Transição inválida"));

    let (_, quote) = app.get(&format!("/api/quotes/{quote_id}")).await;
    assert_eq!(quote["status"], "draft");
}

#[tokio::test]
async fn lapsed_quote_reads_as_expired_and_cannot_be_approved() {
    let app = TestApp::new();
    let customer_id = app.customer(None).await;
    let quote_id = app.draft_quote(&customer_id).await;
    app.post(&format!("/api/quotes/{quote_id}/send"), json!({})).await;

    app.clock.advance(Duration::days(31));

    let (_, quote) = app.get(&format!("/api/quotes/{quote_id}")).await;
    assert_eq!(quote["status"], "expired");

    let (_, expired) = app.get("/api/quotes?status=expired").await;
    assert_eq!(expired.as_array().unwrap().len(), 1);
    let (_, sent) = app.get("/api/quotes?status=sent").await;
    assert!(sent.as_array().unwrap().is_empty());

    let (status, body) = app.post(&format!("/api/quotes/{quote_id}/approve"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "invalid_transition");
}

#[tokio::test]
async fn rejection_reason_is_appended_to_notes() {
    let app = TestApp::new();
    let customer_id = app.customer(None).await;
    let (_, quote) = app
        .post(
            "/api/quotes",
            json!({ "customerId": customer_id, "title": "Pintura", "notes": "Cliente prefere manhã" }),
        )
        .await;
    let quote_id = quote["id"].as_str().unwrap();
    app.post(&format!("/api/quotes/{quote_id}/send"), json!({})).await;

    let (status, rejected) = app
        .post(&format!("/api/quotes/{quote_id}/reject"), json!({ "reason": "Preço alto" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "rejected");
    assert_eq!(rejected["notes"], "Cliente prefere manhã\nRejection reason: Preço alto");

    // Rejeitado é terminal
    let (status, _) = app.post(&format!("/api/quotes/{quote_id}/convert"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn items_are_frozen_after_sending() {
    let app = TestApp::new();
    let customer_id = app.customer(None).await;
    let quote_id = app.draft_quote(&customer_id).await;
    let items_uri = format!("/api/quotes/{quote_id}/items");

    let (status, body) = app
        .request(
            "PUT",
            &items_uri,
            Some(json!({ "items": [{ "description": "Visita", "quantity": 1, "unitPrice": -10 }] })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, updated) = app
        .request(
            "PUT",
            &items_uri,
            Some(json!({ "items": [{ "description": "Visita", "quantity": 1, "unitPrice": 100 }], "taxRate": 0 })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["total"].as_f64(), Some(100.0));

    app.post(&format!("/api/quotes/{quote_id}/send"), json!({})).await;
    let (status, body) = app
        .request("PUT", &items_uri, Some(json!({ "items": [] })), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "invalid_state");
}

#[tokio::test]
async fn converted_quote_cannot_be_deleted() {
    let app = TestApp::new();
    let customer_id = app.customer(None).await;
    let quote_id = app.draft_quote(&customer_id).await;
    app.post(&format!("/api/quotes/{quote_id}/send"), json!({})).await;
    app.post(&format!("/api/quotes/{quote_id}/approve"), json!({ "signedBy": "Maria" })).await;
    app.post(&format!("/api/quotes/{quote_id}/convert"), json!({})).await;

    let (status, _) = app.request("DELETE", &format!("/api/quotes/{quote_id}"), None, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let other = app.draft_quote(&customer_id).await;
    let (status, _) = app.request("DELETE", &format!("/api/quotes/{other}"), None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn unknown_ids_and_bad_input() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/quotes/6f1c2d2e-0000-4000-8000-000000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, _) = app.get("/api/quotes?status=pending").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post("/api/customers", json!({ "fullName": "A", "email": "nope" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["fullName"].is_array());
    assert!(body["details"]["email"].is_array());

    let (status, _) = app
        .post(
            "/api/quotes",
            json!({ "customerId": "6f1c2d2e-0000-4000-8000-000000000000", "title": "Sem cliente" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delivery_needs_a_sent_quote_and_working_renderer() {
    let app = TestApp::new();
    let customer_id = app.customer(Some("maria@example.com")).await;
    let quote_id = app.draft_quote(&customer_id).await;
    let uri = format!("/api/quotes/{quote_id}/deliver");

    let (status, _) = app.post(&uri, json!({ "channel": "email" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.post(&format!("/api/quotes/{quote_id}/send"), json!({})).await;
    let (status, body) = app.post(&uri, json!({ "channel": "email", "includeSignature": true })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "document_generation");

    let (status, _) = app.post(&format!("/api/quotes/{quote_id}/invoice"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn exports_write_quickbooks_files() {
    let app = TestApp::new();
    let customer_id = app.customer(None).await;

    let (status, result) = app
        .post("/api/exports", json!({ "kind": "customer", "id": customer_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{result}");
    assert_eq!(result["success"], true);

    let path = result["fileUri"].as_str().unwrap().trim_start_matches("file://");
    assert!(path.starts_with(app.dir.path().to_str().unwrap()));
    let written: Value = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
    assert_eq!(written["type"], "customer");
    assert_eq!(written["data"]["fullName"], "Maria Souza");

    let (status, _) = app
        .post("/api/exports", json!({ "kind": "purchase_order", "id": customer_id }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn approve_and_reject_accept_an_empty_body() {
    let app = TestApp::new();
    let customer_id = app.customer(None).await;

    let approved_id = app.draft_quote(&customer_id).await;
    app.post(&format!("/api/quotes/{approved_id}/send"), json!({})).await;
    let (status, approved) = app
        .request("POST", &format!("/api/quotes/{approved_id}/approve"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK, "{approved}");
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["signedBy"], "Customer");

    let rejected_id = app.draft_quote(&customer_id).await;
    app.post(&format!("/api/quotes/{rejected_id}/send"), json!({})).await;
    let (status, rejected) = app
        .request("POST", &format!("/api/quotes/{rejected_id}/reject"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK, "{rejected}");
    assert_eq!(rejected["status"], "rejected");
    assert_eq!(rejected["notes"], Value::Null);
}

#[tokio::test]
async fn oversized_amounts_are_rejected_as_bad_input() {
    let app = TestApp::new();
    let customer_id = app.customer(None).await;

    let (status, body) = app
        .post(
            "/api/quotes",
            json!({
                "customerId": customer_id,
                "title": "Usina",
                "items": [{ "description": "Gerador", "quantity": 1e20, "unitPrice": 1e18 }]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["code"], "validation");
}

