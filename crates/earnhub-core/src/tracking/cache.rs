// ── Tracking status cache ──
//
// Per-offer status for the current user, rebuilt wholesale from the
// backend's tracking history. Reads are lock-free snapshots; every write
// bumps a version counter that card controllers subscribe to.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::watch;
use tracing::debug;

use crate::model::{OfferId, TrackingRecord, TrackingStatus, UserId};

#[derive(Debug, Default, Clone)]
struct StatusIndex {
    owner: Option<UserId>,
    statuses: HashMap<OfferId, TrackingStatus>,
}

/// Offer id -> most advanced tracking status, for exactly one user.
///
/// The backend is authoritative: [`hydrate`](Self::hydrate) replaces the
/// whole index, so nothing written locally survives a refresh unless the
/// server agrees with it.
pub struct TrackingStatusCache {
    index: ArcSwap<StatusIndex>,
    version: watch::Sender<u64>,
}

impl Default for TrackingStatusCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TrackingStatusCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let index = self.index.load();
        f.debug_struct("TrackingStatusCache")
            .field("owner", &index.owner)
            .field("entries", &index.statuses.len())
            .field("version", &*self.version.borrow())
            .finish()
    }
}

impl TrackingStatusCache {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            index: ArcSwap::from_pointee(StatusIndex::default()),
            version,
        }
    }

    /// Replace the cache with `records` for `owner`.
    ///
    /// Several records for one offer collapse to the most advanced status.
    /// Hydrating the same records twice yields the same cache.
    pub fn hydrate(&self, owner: &UserId, records: &[TrackingRecord]) {
        let mut statuses: HashMap<OfferId, TrackingStatus> = HashMap::new();
        for record in records {
            statuses
                .entry(record.offer_id.clone())
                .and_modify(|s| *s = s.most_advanced(record.status))
                .or_insert(record.status);
        }

        let previous = self.index.swap(Arc::new(StatusIndex {
            owner: Some(owner.clone()),
            statuses,
        }));
        if previous.owner.as_ref().is_some_and(|o| o != owner) {
            debug!(previous = ?previous.owner, %owner, "status cache changed owner");
        }
        debug!(%owner, records = records.len(), "status cache hydrated");
        self.bump();
    }

    pub fn status_of(&self, offer_id: &OfferId) -> Option<TrackingStatus> {
        self.index.load().statuses.get(offer_id).copied()
    }

    /// Optimistic `clicked` entry after a successful registration. Never
    /// downgrades an existing status, and ignores clicks by anyone other
    /// than the current owner.
    pub fn record_click(&self, user_id: &UserId, offer_id: &OfferId) {
        self.upsert(Some(user_id), offer_id, TrackingStatus::Clicked);
    }

    /// Local completion, e.g. after a successful fallback report.
    pub fn mark_completed(&self, offer_id: &OfferId) {
        self.upsert(None, offer_id, TrackingStatus::Completed);
    }

    /// Drop everything, including the owner.
    pub fn clear(&self) {
        self.index.store(Arc::new(StatusIndex::default()));
        self.bump();
    }

    pub fn owner(&self) -> Option<UserId> {
        self.index.load().owner.clone()
    }

    /// Copy of the current offer -> status map.
    pub fn snapshot(&self) -> HashMap<OfferId, TrackingStatus> {
        self.index.load().statuses.clone()
    }

    pub fn len(&self) -> usize {
        self.index.load().statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.load().statuses.is_empty()
    }

    /// Monotonic write counter.
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Change notifications. The value is the write counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    fn upsert(&self, user_id: Option<&UserId>, offer_id: &OfferId, status: TrackingStatus) {
        let mut changed = false;
        self.index.rcu(|current| {
            changed = false;
            if let Some(user_id) = user_id {
                if current.owner.as_ref().is_some_and(|o| o != user_id) {
                    return Arc::clone(current);
                }
            }
            let existing = current.statuses.get(offer_id).copied();
            let next = existing.map_or(status, |s| s.most_advanced(status));
            if existing == Some(next) {
                return Arc::clone(current);
            }
            let mut updated = StatusIndex::clone(current);
            if updated.owner.is_none() {
                updated.owner = user_id.cloned();
            }
            updated.statuses.insert(offer_id.clone(), next);
            changed = true;
            Arc::new(updated)
        });
        if changed {
            debug!(%offer_id, %status, "status cache updated locally");
            self.bump();
        }
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrackingId;

    fn record(offer: &str, status: TrackingStatus) -> TrackingRecord {
        TrackingRecord {
            id: TrackingId::from(format!("trk-{offer}-{status}")),
            user_id: UserId::from("u-1"),
            offer_id: OfferId::from(offer),
            offer_name: None,
            user_name: None,
            status,
            click_id: None,
            clicked_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn hydrate_keeps_the_most_advanced_status() {
        let cache = TrackingStatusCache::new();
        let owner = UserId::from("u-1");

        cache.hydrate(
            &owner,
            &[
                record("o1", TrackingStatus::Clicked),
                record("o1", TrackingStatus::Completed),
                record("o1", TrackingStatus::Started),
                record("o2", TrackingStatus::Failed),
                record("o2", TrackingStatus::Clicked),
            ],
        );

        assert_eq!(
            cache.status_of(&OfferId::from("o1")),
            Some(TrackingStatus::Completed)
        );
        assert_eq!(
            cache.status_of(&OfferId::from("o2")),
            Some(TrackingStatus::Failed)
        );
        assert_eq!(cache.status_of(&OfferId::from("o3")), None);
    }

    #[test]
    fn hydrate_is_idempotent() {
        let cache = TrackingStatusCache::new();
        let owner = UserId::from("u-1");
        let records = vec![
            record("o1", TrackingStatus::Completed),
            record("o2", TrackingStatus::Clicked),
        ];

        cache.hydrate(&owner, &records);
        let first = cache.snapshot();
        cache.hydrate(&owner, &records);

        assert_eq!(first, cache.snapshot());
    }

    #[test]
    fn hydrate_replaces_local_state() {
        let cache = TrackingStatusCache::new();
        let owner = UserId::from("u-1");
        cache.record_click(&owner, &OfferId::from("o9"));

        cache.hydrate(&owner, &[record("o1", TrackingStatus::Clicked)]);

        assert_eq!(cache.status_of(&OfferId::from("o9")), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn new_owner_starts_from_their_own_history() {
        let cache = TrackingStatusCache::new();
        cache.hydrate(&UserId::from("u-1"), &[record("o1", TrackingStatus::Completed)]);

        cache.hydrate(&UserId::from("u-2"), &[]);

        assert!(cache.is_empty());
        assert_eq!(cache.owner(), Some(UserId::from("u-2")));
    }

    #[test]
    fn record_click_never_downgrades() {
        let cache = TrackingStatusCache::new();
        let owner = UserId::from("u-1");
        cache.hydrate(&owner, &[record("o1", TrackingStatus::Completed)]);
        let version = cache.version();

        cache.record_click(&owner, &OfferId::from("o1"));

        assert_eq!(
            cache.status_of(&OfferId::from("o1")),
            Some(TrackingStatus::Completed)
        );
        assert_eq!(cache.version(), version);
    }

    #[test]
    fn record_click_from_another_user_is_ignored() {
        let cache = TrackingStatusCache::new();
        cache.hydrate(&UserId::from("u-1"), &[]);

        cache.record_click(&UserId::from("u-2"), &OfferId::from("o1"));

        assert!(cache.is_empty());
    }

    #[test]
    fn writes_notify_subscribers() {
        let cache = TrackingStatusCache::new();
        let mut rx = cache.subscribe();
        assert!(!rx.has_changed().unwrap_or(true));

        cache.mark_completed(&OfferId::from("o1"));

        assert!(rx.has_changed().unwrap_or(false));
        rx.borrow_and_update();
        cache.clear();
        assert!(rx.has_changed().unwrap_or(false));
        assert!(cache.owner().is_none());
    }
}
