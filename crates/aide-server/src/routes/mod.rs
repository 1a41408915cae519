// Export route modules
pub mod health;
pub mod messages;

use crate::state::AppState;
use axum::Router;

// Function to configure all routes
pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(messages::routes(state))
        .merge(health::routes())
}
