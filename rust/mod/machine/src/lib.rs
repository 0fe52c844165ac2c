pub mod eligibility;
pub mod model;

#[cfg(feature = "server")]
pub mod api;
#[cfg(feature = "server")]
mod module;
#[cfg(feature = "server")]
pub mod pdf;
#[cfg(feature = "server")]
pub mod service;

#[cfg(feature = "server")]
pub use module::MachineModule;
