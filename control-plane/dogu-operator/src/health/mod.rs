//! Deriving, caching and invalidating the health of single dogus.

pub mod availability;
pub mod conditions;
pub mod shutdown;
pub mod startup;
pub mod status;

pub use availability::{AvailabilityChecker, DefaultAvailabilityChecker};
pub use conditions::DoguConditionUpdater;
pub use shutdown::ShutdownHandler;
pub use startup::StartupHandler;
pub use status::DoguHealthStatusUpdater;
