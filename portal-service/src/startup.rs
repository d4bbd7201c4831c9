use axum::{
    http::{header, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware, rate_limit::ip_rate_limit_middleware,
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{
        app, applications, auth, companies, internships, messages, pages, submissions, tasks,
        users,
    },
    middleware::{navigation_gate, session_middleware},
    AppState,
};

fn api_router(state: &AppState) -> Router<AppState> {
    let signin_route = Router::new()
        .route("/auth/signin", post(auth::signin))
        .layer(from_fn_with_state(
            state.signin_rate_limit.clone(),
            ip_rate_limit_middleware,
        ));

    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/signout", post(auth::signout))
        .merge(signin_route)
        .route("/me", get(users::get_me))
        .route("/admin/users", get(users::list_users))
        .route("/admin/users/:id/status", patch(users::set_user_status))
        .route("/admin/users/:id/role", patch(users::set_user_role))
        .route("/companies", post(companies::create_company))
        .route("/companies/:id", get(companies::get_company))
        .route(
            "/companies/:id/internships",
            get(companies::list_company_internships).post(companies::create_company_internship),
        )
        .route("/internships", get(internships::list_open_internships))
        .route(
            "/internships/:id",
            get(internships::get_internship).patch(internships::update_internship),
        )
        .route(
            "/internships/:id/applications",
            get(applications::list_applications).post(applications::apply),
        )
        .route("/internships/:id/tasks", post(tasks::create_task))
        .route("/applications/:id", patch(applications::review_application))
        .route("/tasks", get(tasks::list_my_tasks))
        .route(
            "/tasks/:id",
            get(tasks::get_task)
                .patch(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route(
            "/tasks/:id/submissions",
            get(submissions::list_task_submissions).post(submissions::submit),
        )
        .route(
            "/submissions/:id/review",
            patch(submissions::review_submission),
        )
        .route(
            "/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .fallback(app::api_not_found)
}

/// Every route here, including the fallback, passes the navigation gate.
fn page_router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::index))
        .route("/auth/signin", get(pages::signin_page))
        .route("/auth/signup", get(pages::signup_page))
        .route("/dashboard", get(pages::dashboard))
        .route("/dashboard/admin", get(pages::admin_dashboard))
        .route("/admin", get(pages::admin_dashboard))
        .route("/dashboard/mentor", get(pages::mentor_dashboard))
        .route("/mentor", get(pages::mentor_dashboard))
        .route("/dashboard/intern", get(pages::intern_dashboard))
        .route("/intern", get(pages::intern_dashboard))
        .fallback(pages::page_not_found)
        .layer(from_fn(navigation_gate))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(app::health_check))
        .route("/metrics", get(app::metrics))
        .nest("/api", api_router(&state))
        .merge(page_router())
        // Resolve the session once; the gate and the handlers read it.
        .layer(from_fn_with_state(state.clone(), session_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(cors_layer(&state.allowed_origins))
        .with_state(state)
}
