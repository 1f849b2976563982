pub mod background;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{
    Router,
    routing::{delete, get, post},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth routes
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/refresh", post(routes::auth::refresh))
        .route("/me", get(routes::auth::me));

    // Meeting routes
    let meeting_routes = Router::new()
        .route("/", get(routes::meeting::list))
        .route("/", post(routes::meeting::create))
        .route("/{meeting_id}", get(routes::meeting::get))
        .route("/{meeting_id}/start", post(routes::meeting::start))
        .route("/{meeting_id}/end", post(routes::meeting::end))
        .route("/{meeting_id}/join", post(routes::meeting::join))
        .route("/{meeting_id}/leave", post(routes::meeting::leave))
        .route(
            "/{meeting_id}/participants",
            get(routes::meeting::participants),
        )
        .route("/{meeting_id}/live", get(routes::attendance::live))
        .route("/{meeting_id}/attendance", get(routes::attendance::report))
        .route(
            "/{meeting_id}/webhook-roster",
            get(routes::attendance::webhook_roster),
        )
        .route(
            "/{meeting_id}/roster/import",
            post(routes::attendance::import_roster),
        )
        .route(
            "/{meeting_id}/export",
            get(routes::export::attendance_csv),
        );

    // Join tracking routes
    let join_tracking_routes = Router::new()
        .route("/", get(routes::join_tracking::list))
        .route("/", post(routes::join_tracking::track))
        .route("/", delete(routes::join_tracking::clear));

    // Webhook routes (signature auth, no JWT)
    let webhook_routes = Router::new().route("/zoom", post(routes::webhook::zoom));

    // Participant linking
    let participant_routes =
        Router::new().route("/link", post(routes::webhook::link_participant));

    // Compose API
    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/meeting", meeting_routes)
        .nest("/join-tracking", join_tracking_routes)
        .nest("/webhooks", webhook_routes)
        .nest("/participant", participant_routes);

    // Health check
    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .route("/ws", get(ws::handler::ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
