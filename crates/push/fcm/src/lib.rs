//! Push FCM Delivery
//!
//! Service account token exchange and Firebase Cloud Messaging delivery.

mod credential;
mod dispatch;
mod exchange;
mod message;
mod sender;
mod traits;

pub use credential::*;
pub use dispatch::*;
pub use exchange::*;
pub use message::*;
pub use sender::*;
pub use traits::*;
