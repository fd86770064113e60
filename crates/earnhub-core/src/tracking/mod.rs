// ── Offer tracking ──
//
// Click registration, status reconciliation, and the per-offer card
// state machine.

pub mod backend;
pub mod cache;
pub mod card;
pub mod client;

pub use backend::TrackingBackend;
pub use cache::TrackingStatusCache;
pub use card::{
    Activation, CardError, CardErrorKind, CardSettings, CardState, IgnoreReason, Navigator,
    OfferCardController, PendingCompletion,
};
pub use client::{OfferTrackingClient, resolve_redirect_target, validate_click};
