pub mod handlers;
pub mod pending;
pub mod registry;
pub mod session;
