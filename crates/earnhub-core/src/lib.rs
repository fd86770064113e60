//! Offer tracking state machine between `earnhub-api` and UI consumers.
//!
//! - **[`OfferTrackingClient`]**: turns an "act on this offer" gesture into
//!   a server-side tracking record plus a navigable URL, and files the
//!   fallback completion report for clicks the backend cannot correlate.
//!
//! - **[`TrackingStatusCache`]**: offer id to most advanced status for the
//!   current user, rebuilt wholesale from the backend's tracking history.
//!
//! - **[`OfferCardController`]**: per-offer UI state machine. Ignores
//!   repeated gestures while a request is in flight and owns the fallback
//!   timer, which is cancelled when the controller is dropped.
//!
//! - **[`OfferBoard`]**: the offer list, one card per offer, periodic
//!   re-hydration, and teardown when the session ends.
//!
//! - **[`WalletView`]**: read-only wallet snapshot for the logged-in user.
//!
//! The network sits behind [`TrackingBackend`], implemented for
//! [`earnhub_api::ApiClient`].

pub mod board;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod tracking;
pub mod wallet;

#[cfg(test)]
mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use board::OfferBoard;
pub use config::{ClientConfig, DEFAULT_API_URL, TlsVerification};
pub use error::{CoreError, FailureReason};
pub use tracking::{
    Activation, CardError, CardErrorKind, CardSettings, CardState, IgnoreReason, Navigator,
    OfferCardController, OfferTrackingClient, PendingCompletion, TrackingBackend,
    TrackingStatusCache, resolve_redirect_target,
};
pub use wallet::WalletView;

pub use model::{
    ClickId, ClickRegistration, CompletionMetadata, Offer, OfferId, Role, TrackingId,
    TrackingRecord, TrackingStatus, UserId, UserProfile, Wallet,
};
