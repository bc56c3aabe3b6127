pub mod app;
pub mod forward;
pub mod gate;

pub use app::{Gateway, build_gateway};
