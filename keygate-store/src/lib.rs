pub mod file;
pub mod options;
pub mod session;
pub mod token;
pub mod users;

pub use file::FileStore;
pub use options::{ConfigStore, MemoryStore};
pub use session::{Session, SessionStore};
pub use users::{MemoryDirectory, UserDirectory};
