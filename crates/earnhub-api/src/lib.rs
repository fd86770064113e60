// earnhub-api: Async Rust client for the EarnHub referral-reward backend

pub mod client;
pub mod error;
pub mod models;
pub mod session;
pub mod transport;

mod offers;
mod trackings;
mod users;
mod wallet;

pub use client::ApiClient;
pub use error::Error;
pub use session::{Session, SessionContext, SessionEnd, SessionState};
pub use transport::{TlsMode, TransportConfig};
