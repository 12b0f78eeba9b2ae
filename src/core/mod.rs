pub mod error;
pub mod params;

pub use error::{AppError, Result};
pub use params::ParameterSet;
