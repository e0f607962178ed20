pub mod analytics;
pub mod analyze;
pub mod artifact;
pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod render;
pub mod schema;

pub use error::{GexError, Result};
