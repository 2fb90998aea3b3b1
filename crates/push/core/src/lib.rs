//! Push Core Types
//!
//! Request, identity, and result types shared by the push notification
//! service, plus the error taxonomy every layer reports through.

mod error;
mod identity;
mod outcome;
mod request;

pub use error::*;
pub use identity::*;
pub use outcome::*;
pub use request::*;
