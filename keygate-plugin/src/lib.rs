pub mod chain;
pub mod context;
pub mod plugin;
pub mod registry;

pub use chain::AuthChain;
pub use context::RequestContext;
pub use plugin::Authenticator;
pub use registry::AuthenticatorRegistry;
