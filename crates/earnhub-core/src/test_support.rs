// In-memory backend and navigator for driving the tracking flow in tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use earnhub_api::{Session, SessionContext};
use rust_decimal::Decimal;
use secrecy::SecretString;
use tokio::sync::Notify;
use url::Url;

use crate::error::CoreError;
use crate::model::{
    ClickId, ClickRegistration, CompletionMetadata, Offer, OfferId, TrackingId, TrackingRecord,
    TrackingStatus, UserId, Wallet,
};
use crate::tracking::{Navigator, TrackingBackend};

pub(crate) enum ClickReply {
    Registered(ClickRegistration),
    /// Registered, but only after [`FakeBackend::release`].
    Gated(ClickRegistration),
    Fail(CoreError),
    Hang,
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    clicks: AtomicUsize,
    reports: AtomicUsize,
    history_fetches: AtomicUsize,
    click_replies: Mutex<VecDeque<ClickReply>>,
    report_failures: Mutex<VecDeque<CoreError>>,
    history: Mutex<Vec<TrackingRecord>>,
    history_failure: Mutex<Option<CoreError>>,
    offers: Mutex<Vec<Offer>>,
    wallet: Mutex<Option<Wallet>>,
    last_metadata: Mutex<Option<CompletionMetadata>>,
    gate: Notify,
}

impl FakeBackend {
    pub fn push_click(&self, reply: ClickReply) {
        self.click_replies.lock().unwrap().push_back(reply);
    }

    pub fn fail_next_report(&self, err: CoreError) {
        self.report_failures.lock().unwrap().push_back(err);
    }

    pub fn set_history(&self, records: Vec<TrackingRecord>) {
        *self.history.lock().unwrap() = records;
    }

    pub fn fail_history(&self, err: CoreError) {
        *self.history_failure.lock().unwrap() = Some(err);
    }

    pub fn set_offers(&self, offers: Vec<Offer>) {
        *self.offers.lock().unwrap() = offers;
    }

    pub fn set_wallet(&self, wallet: Wallet) {
        *self.wallet.lock().unwrap() = Some(wallet);
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn clicks(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }

    pub fn reports(&self) -> usize {
        self.reports.load(Ordering::SeqCst)
    }

    pub fn history_fetches(&self) -> usize {
        self.history_fetches.load(Ordering::SeqCst)
    }

    pub fn last_metadata(&self) -> Option<CompletionMetadata> {
        self.last_metadata.lock().unwrap().clone()
    }
}

impl TrackingBackend for FakeBackend {
    async fn register_click(&self, _: &OfferId) -> Result<ClickRegistration, CoreError> {
        let n = self.clicks.fetch_add(1, Ordering::SeqCst) + 1;
        let reply = self.click_replies.lock().unwrap().pop_front();
        match reply {
            None => Ok(uncorrelated(&format!("trk-{n}"))),
            Some(ClickReply::Registered(reg)) => Ok(reg),
            Some(ClickReply::Gated(reg)) => {
                self.gate.notified().await;
                Ok(reg)
            }
            Some(ClickReply::Fail(err)) => Err(err),
            Some(ClickReply::Hang) => std::future::pending().await,
        }
    }

    async fn report_completion(
        &self,
        offer_id: &OfferId,
        metadata: &CompletionMetadata,
    ) -> Result<TrackingRecord, CoreError> {
        self.reports.fetch_add(1, Ordering::SeqCst);
        *self.last_metadata.lock().unwrap() = Some(metadata.clone());
        let failure = self.report_failures.lock().unwrap().pop_front();
        if let Some(err) = failure {
            return Err(err);
        }
        let mut rec = record("u-1", offer_id.as_str(), TrackingStatus::Completed);
        if let Some(id) = &metadata.tracking_id {
            rec.id = id.clone();
        }
        Ok(rec)
    }

    async fn user_trackings(&self, _: &UserId) -> Result<Vec<TrackingRecord>, CoreError> {
        self.history_fetches.fetch_add(1, Ordering::SeqCst);
        let failure = self.history_failure.lock().unwrap().take();
        if let Some(err) = failure {
            return Err(err);
        }
        Ok(self.history.lock().unwrap().clone())
    }

    async fn active_offers(&self) -> Result<Vec<Offer>, CoreError> {
        Ok(self.offers.lock().unwrap().clone())
    }

    async fn wallet(&self, _: &UserId) -> Result<Wallet, CoreError> {
        let wallet = self.wallet.lock().unwrap().clone();
        wallet.ok_or_else(|| CoreError::Server {
            status: 404,
            message: "Wallet not found".into(),
        })
    }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    opened: Mutex<Vec<Url>>,
}

impl RecordingNavigator {
    pub fn opened(&self) -> Vec<Url> {
        self.opened.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn open_external(&self, url: &Url) {
        self.opened.lock().unwrap().push(url.clone());
    }
}

pub(crate) fn logged_in(user_id: &str) -> SessionContext {
    SessionContext::with_session(session_for(user_id))
}

pub(crate) fn session_for(user_id: &str) -> Session {
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"userId":"{user_id}"}}"#));
    let token = format!("eyJhbGciOiJIUzI1NiJ9.{payload}.signature");
    Session::from_token(SecretString::from(token)).unwrap()
}

pub(crate) fn correlated(tracking_id: &str, click_id: &str, redirect: &str) -> ClickRegistration {
    ClickRegistration {
        tracking_id: TrackingId::from(tracking_id),
        click_id: Some(ClickId::from(click_id)),
        redirect_url: Some(Url::parse(redirect).unwrap()),
    }
}

pub(crate) fn uncorrelated(tracking_id: &str) -> ClickRegistration {
    ClickRegistration {
        tracking_id: TrackingId::from(tracking_id),
        click_id: None,
        redirect_url: None,
    }
}

pub(crate) fn offer(id: &str, static_url: Option<&str>) -> Offer {
    Offer {
        id: OfferId::from(id),
        name: format!("Offer {id}"),
        amount: Decimal::new(5000, 2),
        description: None,
        logo: None,
        static_url: static_url.map(|u| Url::parse(u).unwrap()),
        active: true,
        order: 0,
        created_at: None,
    }
}

pub(crate) fn record(user_id: &str, offer_id: &str, status: TrackingStatus) -> TrackingRecord {
    TrackingRecord {
        id: TrackingId::from(format!("trk-{offer_id}")),
        user_id: UserId::from(user_id),
        offer_id: OfferId::from(offer_id),
        offer_name: None,
        user_name: None,
        status,
        click_id: None,
        clicked_at: None,
        completed_at: None,
    }
}
