//! Shared-secret credentials and the guard that checks them on inbound requests.

pub mod credential;
pub mod guard;

pub use credential::*;
pub use guard::*;
