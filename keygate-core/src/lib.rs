pub mod account;
pub mod config;
pub mod error;
pub mod outcome;

pub use account::{Account, UserId};
pub use config::KeygateConfig;
pub use error::KeygateError;
pub use outcome::{AuthOutcome, Denial};
