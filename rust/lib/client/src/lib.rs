//! Shop-floor HTTP client.
//!
//! [`ShopfloorClient`] wraps every REST endpoint with typed requests and
//! [`ClientError`] results. [`MachineBoard`] builds a reactive active-machine
//! view on top of it.
//!
//! ```ignore
//! let client = ShopfloorClient::new("http://localhost:8080")?;
//! let board = MachineBoard::new(client, 12, EligibilityPolicy::default());
//! board.refresh().await?;
//! let mut rx = board.subscribe();
//! ```

pub mod board;
pub mod client;
pub mod error;

pub use board::{BoardSnapshot, MachineBoard};
pub use client::{EligibilityView, NewMachine, PdfFile, ShopfloorClient, DEFAULT_TIMEOUT};
pub use error::{ClientError, ErrorKind};
