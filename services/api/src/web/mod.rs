pub mod live;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod screens;
pub mod state;

// Re-export the entry points the binary needs to build the router.
pub use live::live_handler;
pub use middleware::require_device;
pub use rest::ApiDoc;
