pub mod config;
pub mod driver;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod memory;
pub mod revision;

pub use config::DriverConfig;
pub use driver::Driver;
pub use error::DriverError;
pub use ledger::Ledger;
pub use lifecycle::Lifecycle;
pub use memory::MemoryDriver;
pub use revision::{Direction, Revision, TrackedEntry};
