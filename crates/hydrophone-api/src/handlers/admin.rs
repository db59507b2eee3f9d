//! Administrative and liveness endpoints.
//!
//! `GET /admin/state` reports the readiness gate and `PUT /admin/state`
//! toggles it, e.g. around provisioning. `GET /health` answers whenever the
//! process is up and never consults the gate.

use axum::{extract::State, response::IntoResponse, Json};
use tracing::info;

use crate::messages::StateBody;
use crate::AppState;

pub async fn get_state(State(state): State<AppState>) -> Json<StateBody> {
    Json(StateBody {
        state: state.runtime.gate.get(),
    })
}

pub async fn put_state(
    State(state): State<AppState>,
    Json(body): Json<StateBody>,
) -> Json<StateBody> {
    let previous = state.runtime.gate.set(body.state);
    info!(
        subsystem = "api",
        component = "admin",
        from = %previous,
        to = %body.state,
        "Readiness set through admin endpoint"
    );
    Json(body)
}

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
