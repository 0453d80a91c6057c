pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::*;
pub use services::*;

use std::sync::Arc;

/// Time source shared with the handlers; tests swap in a fixed clock.
pub type SharedClock = Arc<dyn mockable::Clock + Send + Sync>;
