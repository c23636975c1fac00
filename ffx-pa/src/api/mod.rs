//! HTTP API handlers for ffx-pa

pub mod health;
pub mod pronunciation;
pub mod root;

pub use health::health_routes;
pub use pronunciation::pronunciation_routes;
pub use root::root_routes;
