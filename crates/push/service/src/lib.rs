//! Push Service Layer
//!
//! Caller authentication, target resolution, and the request flow that ties
//! storage and delivery together.

mod aggregate;
mod auth;
mod resolver;
mod send;
mod settings;
mod traits;

pub use aggregate::aggregate;
pub use auth::resolve_caller;
pub use resolver::{ResolvedTarget, resolve_target};
pub use send::PushService;
pub use settings::*;
pub use traits::*;

#[cfg(test)]
mod testing;
