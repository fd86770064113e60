// ── Domain model ──

pub mod entity_id;
pub mod offer;
pub mod tracking;
pub mod user;
pub mod wallet;

pub use entity_id::{ClickId, OfferId, TrackingId, UserId};
pub use offer::Offer;
pub use tracking::{ClickRegistration, CompletionMetadata, TrackingRecord, TrackingStatus};
pub use user::{Role, UserProfile};
pub use wallet::Wallet;
