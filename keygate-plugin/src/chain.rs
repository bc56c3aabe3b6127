use crate::context::RequestContext;
use crate::plugin::Authenticator;
use keygate_core::AuthOutcome;
use std::sync::Arc;

/// Pre-built authentication chain.
///
/// Authenticators are sorted by priority at build time (descending, ties keep
/// insertion order). Running the chain threads one `AuthOutcome` value through
/// every link; each link receives the value and returns the next one.
pub struct AuthChain {
    authenticators: Vec<Arc<dyn Authenticator>>,
}

impl AuthChain {
    /// Build a chain from a list of authenticators.
    pub fn build(mut authenticators: Vec<Arc<dyn Authenticator>>) -> Self {
        authenticators.sort_by(|a, b| b.priority().cmp(&a.priority()));
        Self { authenticators }
    }

    /// Run the chain for a request nothing has authenticated yet.
    pub fn run(&self, ctx: &mut RequestContext) -> AuthOutcome {
        self.run_from(AuthOutcome::Undetermined, ctx)
    }

    /// Run the chain starting from an outcome some earlier mechanism produced.
    pub fn run_from(&self, prior: AuthOutcome, ctx: &mut RequestContext) -> AuthOutcome {
        let mut outcome = prior;
        for auth in &self.authenticators {
            if outcome.is_definitive() {
                // Links must pass a decided outcome through untouched; checking
                // here keeps a misbehaving link from overriding it.
                let next = auth.authenticate(outcome.clone(), ctx);
                if next != outcome {
                    tracing::warn!(
                        authenticator = auth.name(),
                        decided = outcome.as_str(),
                        attempted = next.as_str(),
                        "Authenticator tried to override a decided outcome, ignoring"
                    );
                }
                continue;
            }
            outcome = auth.authenticate(outcome, ctx);
            if outcome.is_definitive() {
                tracing::debug!(authenticator = auth.name(), outcome = %outcome, "Authentication decided");
            }
        }
        outcome
    }

    /// Authenticator names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.authenticators.iter().map(|a| a.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.authenticators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authenticators.is_empty()
    }
}
