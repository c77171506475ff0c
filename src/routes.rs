// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, completion, quiz, scenario, survey},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public routes: sign-in and scenario listing.
/// * Participant routes (bearer token): answers, results, survey, completions.
/// * Admin routes (bearer token with admin role): scenario management.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_layer = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/guest", post(auth::guest_login))
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .route_layer(auth_layer.clone()),
        );

    let scenario_routes = Router::new()
        .route("/", get(scenario::list_scenarios))
        .route("/{id}", get(scenario::get_scenario));

    let participant_routes = Router::new()
        .route("/api/quiz/answers", post(quiz::submit_answer))
        .route("/api/results", get(quiz::get_results))
        .route("/api/survey", get(survey::get_survey).post(survey::submit_survey))
        .route("/api/completions", post(completion::record_completion))
        // Only matched routes; unknown paths still fall through to 404
        .route_layer(auth_layer.clone());

    let admin_routes = Router::new()
        .route("/scenarios", post(admin::create_scenario))
        .route("/scenarios/{id}", delete(admin::delete_scenario))
        // Auth first, then the admin check
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(auth_layer);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/scenarios", scenario_routes)
        .merge(participant_routes)
        .nest("/api/admin", admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
