// ── Offer card controller ──
//
// Per-offer state machine behind the "act on this offer" gesture:
//
//   idle ─▶ submitting ─▶ awaiting-completion ─▶ completed
//    ▲          │              │        ▲
//    └─ error ◀─┘              ▼        │ report failed
//                   submitting-completion-report ─▶ completed
//
// State is published on a watch channel. Background work (the fallback
// timer and the cache/session watcher) runs under a cancellation token
// owned by the controller and dies with it.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use earnhub_api::SessionState;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::backend::TrackingBackend;
use super::cache::TrackingStatusCache;
use super::client::{OfferTrackingClient, resolve_redirect_target};
use crate::config::ClientConfig;
use crate::error::{CoreError, FailureReason};
use crate::model::{ClickId, CompletionMetadata, Offer, TrackingId, TrackingStatus, UserId};

/// Opens a provider URL outside the current session.
///
/// Implementations must give the target no handle back to the opener and
/// no session credentials (no referrer, no cookies, no bearer token).
pub trait Navigator: Send + Sync {
    fn open_external(&self, url: &Url);
}

/// Tuning for the fallback completion path.
#[derive(Debug, Clone, Copy)]
pub struct CardSettings {
    pub completion_delay: Duration,
    pub fallback_completion: bool,
}

impl Default for CardSettings {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for CardSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            completion_delay: config.completion_delay,
            fallback_completion: config.fallback_completion,
        }
    }
}

// ── States ───────────────────────────────────────────────────────────

/// A click that has been registered and navigated to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCompletion {
    /// User the click was registered for.
    pub owner: UserId,
    pub tracking_id: TrackingId,
    pub click_id: Option<ClickId>,
    pub target: Url,
    pub navigated_at: DateTime<Utc>,
    /// A fallback completion report will fire unless something else
    /// completes the offer first.
    pub fallback_scheduled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardErrorKind {
    /// Registration failed.
    Failed(FailureReason),
    /// Registration succeeded but there was nowhere to send the user.
    NoRedirectTarget,
}

impl fmt::Display for CardErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "{reason}"),
            Self::NoRedirectTarget => f.write_str("no-redirect-target"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardError {
    pub kind: CardErrorKind,
    pub message: String,
}

impl CardError {
    fn no_redirect_target() -> Self {
        Self {
            kind: CardErrorKind::NoRedirectTarget,
            message: "offer has no provider link".into(),
        }
    }

    /// Worth offering the user a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, CardErrorKind::Failed(FailureReason::Network))
    }
}

impl From<&CoreError> for CardError {
    fn from(err: &CoreError) -> Self {
        Self {
            kind: CardErrorKind::Failed(err.reason()),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for CardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardState {
    Idle,
    Submitting,
    AwaitingCompletion(PendingCompletion),
    SubmittingCompletionReport(PendingCompletion),
    Completed,
    Error(CardError),
}

impl CardState {
    /// A request is in flight; gestures are ignored.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Submitting | Self::SubmittingCompletionReport(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::AwaitingCompletion(_) => "awaiting-completion",
            Self::SubmittingCompletionReport(_) => "submitting-completion-report",
            Self::Completed => "completed",
            Self::Error(_) => "error",
        }
    }
}

/// Result of one user gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// A click was registered and the target opened.
    Opened(Url),
    /// The click was already registered; the same target was opened again
    /// without a new registration.
    Reopened(Url),
    Failed(CardError),
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No logged-in user or no offer id.
    MissingIdentity,
    /// A request is already in flight.
    InFlight,
    AlreadyCompleted,
    /// The session ended or the card was reset while registering.
    Superseded,
}

// ── Controller ───────────────────────────────────────────────────────

struct CardShared<B> {
    offer: Arc<Offer>,
    client: OfferTrackingClient<B>,
    cache: Arc<TrackingStatusCache>,
    navigator: Arc<dyn Navigator>,
    settings: CardSettings,
    state: watch::Sender<CardState>,
    fallback: Mutex<Option<CancellationToken>>,
}

/// Drives one offer card. Must be created inside a Tokio runtime.
///
/// Dropping the controller cancels any pending fallback report.
pub struct OfferCardController<B> {
    shared: Arc<CardShared<B>>,
    cancel: CancellationToken,
}

impl<B: TrackingBackend> OfferCardController<B> {
    pub fn new(
        offer: Arc<Offer>,
        client: OfferTrackingClient<B>,
        cache: Arc<TrackingStatusCache>,
        navigator: Arc<dyn Navigator>,
        settings: CardSettings,
        parent: &CancellationToken,
    ) -> Self {
        // Subscribe before reading so no write can slip between the two.
        let cache_rx = cache.subscribe();
        let mut session_rx = client.session().subscribe();
        let owner = session_owner(&session_rx.borrow_and_update());

        let initial = if cache.status_of(&offer.id) == Some(TrackingStatus::Completed) {
            CardState::Completed
        } else {
            CardState::Idle
        };
        let (state, _) = watch::channel(initial);

        let shared = Arc::new(CardShared {
            offer,
            client,
            cache,
            navigator,
            settings,
            state,
            fallback: Mutex::new(None),
        });
        let cancel = parent.child_token();
        tokio::spawn(sync_task(
            Arc::clone(&shared),
            cache_rx,
            session_rx,
            owner,
            cancel.clone(),
        ));

        Self { shared, cancel }
    }

    pub fn offer(&self) -> &Arc<Offer> {
        &self.shared.offer
    }

    pub fn state(&self) -> CardState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CardState> {
        self.shared.state.subscribe()
    }

    /// Handle one "act on this offer" gesture.
    ///
    /// From `idle` or `error` this registers a click and opens the
    /// resulting target. While a request is in flight, or once completed,
    /// the gesture is ignored. While awaiting completion the already
    /// registered target is reopened without a new registration.
    pub async fn activate(&self) -> Activation {
        let shared = &self.shared;
        let offer_id = &shared.offer.id;

        let Some(user_id) = shared.client.session().user_id().map(UserId::from) else {
            debug!(%offer_id, "gesture without a session ignored");
            return Activation::Ignored(IgnoreReason::MissingIdentity);
        };
        if user_id.is_blank() || offer_id.is_blank() {
            debug!(%offer_id, "gesture without identity ignored");
            return Activation::Ignored(IgnoreReason::MissingIdentity);
        }

        let mut outcome = None;
        let mut stale = false;
        shared.state.send_if_modified(|state| match state {
            CardState::Idle | CardState::Error(_) => {
                *state = CardState::Submitting;
                true
            }
            CardState::AwaitingCompletion(pending) if pending.owner != user_id => {
                stale = true;
                *state = CardState::Submitting;
                true
            }
            CardState::Submitting | CardState::SubmittingCompletionReport(_) => {
                outcome = Some(Activation::Ignored(IgnoreReason::InFlight));
                false
            }
            CardState::Completed => {
                outcome = Some(Activation::Ignored(IgnoreReason::AlreadyCompleted));
                false
            }
            CardState::AwaitingCompletion(pending) => {
                outcome = Some(Activation::Reopened(pending.target.clone()));
                false
            }
        });
        if let Some(outcome) = outcome {
            if let Activation::Reopened(target) = &outcome {
                shared.navigator.open_external(target);
            } else {
                debug!(%offer_id, ?outcome, "gesture ignored");
            }
            return outcome;
        }
        if stale {
            debug!(%offer_id, "dropping pending completion of a previous user");
            shared.replace_fallback(None);
        }

        let registration = match shared.client.register_click(offer_id, &user_id).await {
            Ok(registration) => registration,
            Err(e) => {
                warn!(%offer_id, error = %e, "click registration failed");
                let err = CardError::from(&e);
                return if shared.leave_submitting(CardState::Error(err.clone())) {
                    Activation::Failed(err)
                } else {
                    Activation::Ignored(IgnoreReason::Superseded)
                };
            }
        };

        shared.cache.record_click(&user_id, offer_id);

        let Some(target) = resolve_redirect_target(&registration, shared.offer.static_url.as_ref())
        else {
            warn!(
                %offer_id,
                tracking_id = %registration.tracking_id,
                "click registered but offer has no redirect target"
            );
            let err = CardError::no_redirect_target();
            return if shared.leave_submitting(CardState::Error(err.clone())) {
                Activation::Failed(err)
            } else {
                Activation::Ignored(IgnoreReason::Superseded)
            };
        };

        let fallback = !registration.is_correlated() && shared.settings.fallback_completion;
        let pending = PendingCompletion {
            owner: user_id.clone(),
            tracking_id: registration.tracking_id,
            click_id: registration.click_id,
            target: target.clone(),
            navigated_at: Utc::now(),
            fallback_scheduled: fallback,
        };
        if !shared.leave_submitting(CardState::AwaitingCompletion(pending.clone())) {
            return Activation::Ignored(IgnoreReason::Superseded);
        }

        shared.navigator.open_external(&target);
        if fallback {
            self.schedule_fallback(pending);
        }
        // The offer may have completed through another path meanwhile.
        shared.sync_from_cache();

        Activation::Opened(target)
    }

    fn schedule_fallback(&self, pending: PendingCompletion) {
        let token = self.cancel.child_token();
        self.shared.replace_fallback(Some(token.clone()));

        let shared = Arc::clone(&self.shared);
        let delay = shared.settings.completion_delay;
        debug!(
            offer_id = %shared.offer.id,
            delay_secs = delay.as_secs(),
            "fallback completion scheduled"
        );
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!(offer_id = %shared.offer.id, "fallback completion cancelled");
                }
                () = async {
                    tokio::time::sleep(delay).await;
                    shared.fire_fallback(pending).await;
                } => {}
            }
        });
    }
}

impl<B> Drop for OfferCardController<B> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<B: TrackingBackend> CardShared<B> {
    /// Move out of `submitting`, unless someone else already did.
    fn leave_submitting(&self, next: CardState) -> bool {
        let moved = self.state.send_if_modified(|state| {
            if matches!(state, CardState::Submitting) {
                *state = next;
                true
            } else {
                false
            }
        });
        if !moved {
            debug!(offer_id = %self.offer.id, "card reset while registering");
        }
        moved
    }

    async fn fire_fallback(&self, pending: PendingCompletion) {
        let offer_id = &self.offer.id;
        if self.client.session().user_id().as_deref() != Some(pending.owner.as_str()) {
            debug!(%offer_id, owner = %pending.owner, "session changed hands, fallback dropped");
            self.reset();
            return;
        }
        let moved = self.state.send_if_modified(|state| match state {
            CardState::AwaitingCompletion(current) if current.tracking_id == pending.tracking_id => {
                *state = CardState::SubmittingCompletionReport(current.clone());
                true
            }
            _ => false,
        });
        if !moved {
            debug!(%offer_id, "card moved on before fallback fired");
            return;
        }

        let metadata = CompletionMetadata::client_fallback(
            Some(pending.tracking_id.clone()),
            Some(pending.target.clone()),
            pending.navigated_at,
            self.settings.completion_delay.as_secs(),
        );
        match self.client.report_completion_fallback(offer_id, &metadata).await {
            Ok(record) => {
                info!(%offer_id, tracking_id = %record.id, "fallback completion reported");
                self.state.send_if_modified(|state| {
                    if matches!(state, CardState::SubmittingCompletionReport(_)) {
                        *state = CardState::Completed;
                        true
                    } else {
                        false
                    }
                });
                self.cache.mark_completed(offer_id);
            }
            Err(e) => {
                warn!(%offer_id, error = %e, "fallback completion report failed");
                self.state.send_if_modified(|state| match state {
                    CardState::SubmittingCompletionReport(current) => {
                        let mut current = current.clone();
                        current.fallback_scheduled = false;
                        *state = CardState::AwaitingCompletion(current);
                        true
                    }
                    _ => false,
                });
            }
        }
        self.replace_fallback(None);
    }

    /// Adopt a completion the cache knows about.
    fn sync_from_cache(&self) {
        if self.cache.status_of(&self.offer.id) != Some(TrackingStatus::Completed) {
            return;
        }
        let moved = self.state.send_if_modified(|state| match state {
            CardState::Idle
            | CardState::Error(_)
            | CardState::AwaitingCompletion(_)
            | CardState::SubmittingCompletionReport(_) => {
                *state = CardState::Completed;
                true
            }
            CardState::Submitting | CardState::Completed => false,
        });
        if moved {
            info!(offer_id = %self.offer.id, "offer completed");
            self.replace_fallback(None);
        }
    }

    /// Forget everything local: the session is gone.
    fn reset(&self) {
        self.replace_fallback(None);
        self.state.send_if_modified(|state| {
            if matches!(state, CardState::Idle) {
                false
            } else {
                *state = CardState::Idle;
                true
            }
        });
    }

    fn replace_fallback(&self, next: Option<CancellationToken>) {
        let previous = match self.fallback.lock() {
            Ok(mut slot) => std::mem::replace(&mut *slot, next),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), next),
        };
        if let Some(previous) = previous {
            previous.cancel();
        }
    }
}

/// User id of the active session, if any.
pub(crate) fn session_owner(state: &SessionState) -> Option<String> {
    state.session().map(|s| s.user_id().to_owned())
}

async fn sync_task<B: TrackingBackend>(
    shared: Arc<CardShared<B>>,
    mut cache_rx: watch::Receiver<u64>,
    mut session_rx: watch::Receiver<SessionState>,
    mut owner: Option<String>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = cache_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                shared.sync_from_cache();
            }
            changed = session_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = session_owner(&session_rx.borrow_and_update());
                if current != owner {
                    debug!(
                        offer_id = %shared.offer.id,
                        from = ?owner,
                        to = ?current,
                        "session user changed, resetting card"
                    );
                    shared.reset();
                    owner = current;
                }
            }
        }
    }
}
