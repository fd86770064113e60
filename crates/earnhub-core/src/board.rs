// ── Offer board ──
//
// The end-user offer list: active offers, the status cache they are
// rendered against, and one card controller per offer. Owns the
// background tasks that keep the cache fresh and tear everything down
// when the session ends.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use earnhub_api::{SessionContext, SessionState};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::model::{Offer, OfferId, TrackingStatus, UserId};
use crate::tracking::card::session_owner;
use crate::tracking::{
    CardSettings, Navigator, OfferCardController, OfferTrackingClient, TrackingBackend,
    TrackingStatusCache,
};

/// Cheaply cloneable handle to the offer board.
pub struct OfferBoard<B> {
    inner: Arc<BoardInner<B>>,
}

impl<B> Clone for OfferBoard<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct BoardInner<B> {
    client: OfferTrackingClient<B>,
    cache: Arc<TrackingStatusCache>,
    navigator: Arc<dyn Navigator>,
    settings: CardSettings,
    refresh_interval: Duration,
    offers: ArcSwap<Vec<Arc<Offer>>>,
    cards: DashMap<OfferId, Arc<OfferCardController<B>>>,
    /// Serialises hydration so two fetches never interleave their writes.
    refresh_lock: Mutex<()>,
    cancel: CancellationToken,
    /// Child token for the current set of background tasks.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<B: TrackingBackend> OfferBoard<B> {
    pub fn new(
        backend: Arc<B>,
        session: SessionContext,
        navigator: Arc<dyn Navigator>,
        config: &ClientConfig,
    ) -> Self {
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();
        Self {
            inner: Arc::new(BoardInner {
                client: OfferTrackingClient::new(backend, session, config.click_timeout),
                cache: Arc::new(TrackingStatusCache::new()),
                navigator,
                settings: CardSettings::from(config),
                refresh_interval: config.refresh_interval,
                offers: ArcSwap::from_pointee(Vec::new()),
                cards: DashMap::new(),
                refresh_lock: Mutex::new(()),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn client(&self) -> &OfferTrackingClient<B> {
        &self.inner.client
    }

    pub fn cache(&self) -> &Arc<TrackingStatusCache> {
        &self.inner.cache
    }

    /// Fetch active offers, then hydrate the status cache.
    pub async fn load(&self) -> Result<(), CoreError> {
        let offers = self.inner.client.backend().active_offers().await?;
        info!(count = offers.len(), "offers loaded");

        // Cards for offers that disappeared are dropped; cards for offers
        // that stayed keep their state.
        self.inner
            .cards
            .retain(|id, _| offers.iter().any(|o| &o.id == id));
        self.inner
            .offers
            .store(Arc::new(offers.into_iter().map(Arc::new).collect()));

        self.refresh().await
    }

    /// Re-hydrate the status cache from the backend's tracking history.
    ///
    /// A different user than the one the cache was built for discards
    /// every card first. An expired session discards everything.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let _guard = self.inner.refresh_lock.lock().await;
        let session = self.inner.client.session();

        let Some(user_id) = session.user_id().map(UserId::from) else {
            self.discard();
            return Err(CoreError::AuthExpired);
        };
        if self
            .inner
            .cache
            .owner()
            .is_some_and(|owner| owner != user_id)
        {
            info!(%user_id, "user changed, discarding offer cards");
            self.discard();
        }

        match self.inner.client.fetch_user_trackings(&user_id).await {
            Ok(records) => {
                if session.user_id().as_deref() != Some(user_id.as_str()) {
                    debug!(%user_id, "session changed during hydration, dropping result");
                    return Ok(());
                }
                self.inner.cache.hydrate(&user_id, &records);
                Ok(())
            }
            Err(e) => {
                if e.is_auth_expired() {
                    self.discard();
                }
                Err(e)
            }
        }
    }

    pub fn offers(&self) -> Arc<Vec<Arc<Offer>>> {
        self.inner.offers.load_full()
    }

    pub fn offer(&self, offer_id: &OfferId) -> Option<Arc<Offer>> {
        self.inner
            .offers
            .load()
            .iter()
            .find(|o| &o.id == offer_id)
            .cloned()
    }

    pub fn status_of(&self, offer_id: &OfferId) -> Option<TrackingStatus> {
        self.inner.cache.status_of(offer_id)
    }

    /// The card for `offer_id`, created on first use. `None` when the
    /// offer is not on the board.
    pub fn card(&self, offer_id: &OfferId) -> Option<Arc<OfferCardController<B>>> {
        if let Some(card) = self.inner.cards.get(offer_id) {
            return Some(Arc::clone(card.value()));
        }
        let offer = self.offer(offer_id)?;
        let card = self
            .inner
            .cards
            .entry(offer_id.clone())
            .or_insert_with(|| {
                Arc::new(OfferCardController::new(
                    offer,
                    self.inner.client.clone(),
                    Arc::clone(&self.inner.cache),
                    Arc::clone(&self.inner.navigator),
                    self.inner.settings,
                    &self.inner.cancel,
                ))
            });
        Some(Arc::clone(card.value()))
    }

    /// Drop every card and the cached statuses. Pending fallback reports
    /// die with their cards.
    pub fn discard(&self) {
        let cards = self.inner.cards.len();
        self.inner.cards.clear();
        self.inner.cache.clear();
        debug!(cards, "offer board discarded");
    }

    // ── Background tasks ─────────────────────────────────────────────

    /// Spawn the periodic refresh and session watcher.
    pub async fn start(&self) {
        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let mut handles = self.inner.task_handles.lock().await;
        if !self.inner.refresh_interval.is_zero() {
            handles.push(tokio::spawn(refresh_task(
                self.clone(),
                self.inner.refresh_interval,
                child.clone(),
            )));
        }
        let session_rx = self.inner.client.session().subscribe();
        handles.push(tokio::spawn(session_watch_task(self.clone(), session_rx, child)));
    }

    /// Stop background tasks and wait for them to exit.
    pub async fn shutdown(&self) {
        self.inner.cancel_child.lock().await.cancel();
        let handles: Vec<_> = self.inner.task_handles.lock().await.drain(..).collect();
        futures_util::future::join_all(handles).await;
        self.discard();
    }
}

impl<B> Drop for BoardInner<B> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn refresh_task<B: TrackingBackend>(
    board: OfferBoard<B>,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = board.refresh().await {
                    warn!(error = %e, "periodic status refresh failed");
                }
            }
        }
    }
}

async fn session_watch_task<B: TrackingBackend>(
    board: OfferBoard<B>,
    mut rx: watch::Receiver<SessionState>,
    cancel: CancellationToken,
) {
    let mut owner = session_owner(&rx.borrow_and_update());
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = session_owner(&rx.borrow_and_update());
                if current != owner {
                    info!(from = ?owner, to = ?current, "session user changed, discarding offer board state");
                    board.discard();
                    owner = current;
                }
            }
        }
    }
}
