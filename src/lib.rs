pub mod catalog;
pub mod config;
pub mod error;
pub mod host;
pub mod model;
pub mod protocol;
pub mod services;
pub mod store;

pub use error::{LocalizeError, Result};
