use crate::chain::AuthChain;
use crate::plugin::Authenticator;
use std::collections::HashMap;
use std::sync::Arc;

/// Authenticators available to the gate, by name.
///
/// Built once at startup; the configured chain is assembled from it.
pub struct AuthenticatorRegistry {
    authenticators: HashMap<String, Arc<dyn Authenticator>>,
}

impl AuthenticatorRegistry {
    pub fn new() -> Self {
        Self {
            authenticators: HashMap::new(),
        }
    }

    /// Register an authenticator. A later registration under the same name wins.
    pub fn register(&mut self, authenticator: Arc<dyn Authenticator>) {
        let name = authenticator.name().to_string();
        tracing::info!(authenticator = %name, "Registered authenticator");
        self.authenticators.insert(name, authenticator);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Authenticator>> {
        self.authenticators.get(name)
    }

    /// List all registered names.
    pub fn list(&self) -> Vec<&str> {
        self.authenticators.keys().map(|s| s.as_str()).collect()
    }

    /// Assemble a chain from the named authenticators. Unknown names are an error.
    pub fn build_chain<S: AsRef<str>>(&self, names: &[S]) -> anyhow::Result<AuthChain> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let auth = self
                .get(name)
                .ok_or_else(|| anyhow::anyhow!("unknown authenticator: {name}"))?;
            selected.push(Arc::clone(auth));
        }
        Ok(AuthChain::build(selected))
    }

    pub fn len(&self) -> usize {
        self.authenticators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authenticators.is_empty()
    }
}

impl Default for AuthenticatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
