pub mod config;
pub mod error;
#[cfg(feature = "http")]
pub mod module;
pub mod types;

pub use config::ServiceConfig;
pub use error::ServiceError;
#[cfg(feature = "http")]
pub use module::Module;
pub use types::{new_id, now_millis, now_rfc3339};
