#![forbid(unsafe_code)]

mod config;
mod store;

pub use config::{DEFAULT_DATABASE_FILE, StoreConfig};
pub use store::*;
