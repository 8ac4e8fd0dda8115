pub mod app;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod feed;
pub mod logging;
pub mod server;
pub mod state;
pub mod sync;

pub use config::Config;
pub use error::{Error, Result};
