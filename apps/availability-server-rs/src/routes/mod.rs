pub mod availability;
pub mod health;
pub mod reports;
pub mod routers;

use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest(
            "/api",
            Router::new()
                .merge(routers::router())
                .merge(availability::router())
                .merge(reports::router())
                .merge(crate::openapi::router()),
        )
        .with_state(state)
}
