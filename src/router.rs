// src/router.rs

use axum::{
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers};

/// Todas as rotas da API, já com o estado aplicado.
pub fn build_router(app_state: AppState) -> Router {
    let customer_routes = Router::new()
        .route("/"
               ,post(handlers::customers::create_customer)
               .get(handlers::customers::list_customers)
        )
        .route("/{id}", get(handlers::customers::get_customer));

    let quote_routes = Router::new()
        .route("/"
               ,post(handlers::quotes::create_quote)
               .get(handlers::quotes::list_quotes)
        )
        .route("/{id}"
               ,get(handlers::quotes::get_quote)
               .delete(handlers::quotes::delete_quote)
        )
        .route("/{id}/items", put(handlers::quotes::update_items))
        // Fluxo
        .route("/{id}/send", post(handlers::quotes::send_quote))
        .route("/{id}/approve", post(handlers::quotes::approve_quote))
        .route("/{id}/reject", post(handlers::quotes::reject_quote))
        .route("/{id}/schedule", post(handlers::quotes::schedule_quote))
        .route("/{id}/convert", post(handlers::quotes::convert_quote))
        // Documentos
        .route("/{id}/deliver", post(handlers::documents::deliver_quote))
        .route("/{id}/invoice", post(handlers::documents::issue_invoice));

    let job_routes = Router::new()
        .route("/"
               ,post(handlers::jobs::create_job)
               .get(handlers::jobs::list_jobs)
        )
        .route("/{id}"
               ,get(handlers::jobs::get_job)
               .delete(handlers::jobs::delete_job)
        )
        .route("/{id}/status", put(handlers::jobs::update_job_status));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/exports", post(handlers::documents::export_record))
        .nest("/api/customers", customer_routes)
        .nest("/api/quotes", quote_routes)
        .nest("/api/jobs", job_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
