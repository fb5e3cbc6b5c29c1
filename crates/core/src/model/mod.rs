#![forbid(unsafe_code)]

mod assignment;
mod audit;
mod history;
mod issue;
mod project;
mod user;

pub use assignment::*;
pub use audit::*;
pub use history::*;
pub use issue::*;
pub use project::*;
pub use user::*;

#[cfg(test)]
mod tests;
