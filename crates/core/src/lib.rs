#![forbid(unsafe_code)]

mod error;
pub mod ids;
pub mod model;
pub mod views;

pub use error::ValidationError;
