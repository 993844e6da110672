pub mod config;
pub mod error;
pub mod feed;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use feed::PriceSource;
pub use types::*;
