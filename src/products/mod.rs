//! Product catalog rules: payloads, errors and the service itself.

mod dtos;
pub mod error;
mod service;

pub use dtos::*;
pub use error::*;
pub use service::*;
