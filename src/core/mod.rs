mod config;
pub use config::AppConfig;
pub mod db;
mod error;
pub use error::ChatError;
