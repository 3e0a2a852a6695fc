use std::sync::Arc;
use std::time::Instant;

use crate::cases::CaseCatalog;
use crate::config::Config;
use crate::evaluation::expert::ExpertSolutionProvider;
use crate::llm_client::ModelGateway;
use crate::notices::Notifier;
use crate::session::controller::FlowContext;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gateway: ModelGateway,
    pub catalog: Arc<CaseCatalog>,
    /// Pluggable expert solution source. Default: StaticExpertSolution.
    /// Swap via ENABLE_GENERATIVE_EXPERT_SOLUTION.
    pub expert_provider: Arc<dyn ExpertSolutionProvider>,
    pub sessions: SessionStore,
    pub started_at: Instant,
}

impl AppState {
    /// Fresh request-scoped notifier at the configured level.
    pub fn notifier(&self) -> Notifier {
        Notifier::new(self.config.flags.log_level)
    }

    pub fn flow<'a>(&'a self, notifier: &'a Notifier) -> FlowContext<'a> {
        FlowContext {
            gateway: &self.gateway,
            catalog: &self.catalog,
            expert_provider: self.expert_provider.as_ref(),
            notifier,
        }
    }
}
