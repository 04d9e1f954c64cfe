pub mod config;
pub mod database;
pub mod driver;
pub mod schema;
pub mod tracker;

pub use config::SqliteConfig;
pub use database::Database;
pub use driver::SqliteDriver;
pub use schema::TrackerSchema;
