pub mod api_connection;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod plan;
pub mod server;
pub mod service;
pub mod sms;
pub mod storage;
pub mod week;

pub use error::{PlannerError, Result};
