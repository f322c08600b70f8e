use crate::auth::AuthGate;
use crate::backend::BackendClient;
use crate::config::Config;
use crate::storage::LocalStore;
use crate::store::ViolationStore;
use reqwest::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub violations: ViolationStore,
    pub auth: AuthGate,
    pub backend: BackendClient,
}

impl AppState {
    pub fn new(config: Config, storage: LocalStore) -> Self {
        let backend = BackendClient::new(Client::new(), &config.api_base_url);
        Self {
            config: Arc::new(config),
            violations: ViolationStore::new(),
            auth: AuthGate::new(storage),
            backend,
        }
    }
}
