pub mod db;
pub mod error;
pub mod loader;
pub mod models;
pub mod output;
pub mod reports;
pub mod schema;
pub mod staging;
