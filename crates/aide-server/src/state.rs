use aide::providers::base::Provider;
use std::sync::Arc;

use crate::configuration::GraphSettings;
use crate::credential::CredentialExchange;

/// Shared application state. Everything per user lives in the request instead.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn Provider>,
    pub credentials: Arc<dyn CredentialExchange>,
    pub graph: GraphSettings,
    pub max_function_calls: usize,
}
