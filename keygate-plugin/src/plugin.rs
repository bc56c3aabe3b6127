use crate::context::RequestContext;
use keygate_core::AuthOutcome;

/// One link in the authentication chain.
///
/// Authenticators are synchronous: a decision needs at most a couple of
/// option reads, never network I/O.
pub trait Authenticator: Send + Sync {
    /// Authenticator name (must be unique).
    fn name(&self) -> &str;

    /// Authenticator priority (higher = runs first).
    fn priority(&self) -> i32 {
        0
    }

    /// Take the outcome so far and return the outcome after this link.
    ///
    /// An implementation must hand back a definitive `prior` (`Granted` or
    /// `Denied`) unchanged and without side effects. Only `Undetermined`
    /// may be replaced.
    fn authenticate(&self, prior: AuthOutcome, ctx: &mut RequestContext) -> AuthOutcome;
}
