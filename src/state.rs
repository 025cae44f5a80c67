use crate::config::Config;

/// Shared state for the webhook server. The responder itself is a pure
/// function of the request, so the only thing handlers share is the config.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}
