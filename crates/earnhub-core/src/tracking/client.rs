// ── Offer tracking client ──
//
// Turns an "act on this offer" gesture into a server-side tracking record
// plus a navigable URL. Every failure comes back as a tagged `CoreError`;
// deciding what the user sees is the card controller's job.

use std::sync::Arc;
use std::time::Duration;

use earnhub_api::SessionContext;
use tracing::{debug, info};
use url::Url;

use super::backend::TrackingBackend;
use crate::error::CoreError;
use crate::model::{ClickRegistration, CompletionMetadata, OfferId, TrackingRecord, UserId};

/// Orchestrates click registration, fallback completion, and history
/// fetches for the session it was built with.
pub struct OfferTrackingClient<B> {
    backend: Arc<B>,
    session: SessionContext,
    click_timeout: Duration,
}

impl<B> Clone for OfferTrackingClient<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            session: self.session.clone(),
            click_timeout: self.click_timeout,
        }
    }
}

impl<B: TrackingBackend> OfferTrackingClient<B> {
    pub fn new(backend: Arc<B>, session: SessionContext, click_timeout: Duration) -> Self {
        Self {
            backend,
            session,
            click_timeout,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Register one click. Issues exactly one network call, or none when
    /// either id is blank.
    ///
    /// A registration that outlives `click_timeout` is reported as a
    /// network failure.
    pub async fn register_click(
        &self,
        offer_id: &OfferId,
        user_id: &UserId,
    ) -> Result<ClickRegistration, CoreError> {
        validate_click(offer_id, user_id)?;

        debug!(%offer_id, %user_id, "registering click");
        let registration =
            match tokio::time::timeout(self.click_timeout, self.backend.register_click(offer_id))
                .await
            {
                Ok(result) => result?,
                Err(_) => {
                    return Err(CoreError::Network {
                        message: format!(
                            "click registration timed out after {}s",
                            self.click_timeout.as_secs()
                        ),
                    });
                }
            };

        info!(
            %offer_id,
            tracking_id = %registration.tracking_id,
            correlated = registration.is_correlated(),
            "click registered"
        );
        Ok(registration)
    }

    /// Optimistic completion report for a click the backend cannot
    /// correlate with a provider webhook.
    pub async fn report_completion_fallback(
        &self,
        offer_id: &OfferId,
        metadata: &CompletionMetadata,
    ) -> Result<TrackingRecord, CoreError> {
        if offer_id.is_blank() {
            return Err(CoreError::validation("offer id is required"));
        }
        debug!(%offer_id, "reporting fallback completion");
        self.backend.report_completion(offer_id, metadata).await
    }

    /// Tracking history of `user_id`, used to hydrate the status cache.
    pub async fn fetch_user_trackings(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<TrackingRecord>, CoreError> {
        if user_id.is_blank() {
            return Err(CoreError::validation("user id is required"));
        }
        self.backend.user_trackings(user_id).await
    }
}

/// Precondition check for [`OfferTrackingClient::register_click`], usable
/// without awaiting anything.
pub fn validate_click(offer_id: &OfferId, user_id: &UserId) -> Result<(), CoreError> {
    if user_id.is_blank() {
        return Err(CoreError::validation("user id is required to track a click"));
    }
    if offer_id.is_blank() {
        return Err(CoreError::validation("offer id is required to track a click"));
    }
    Ok(())
}

/// Pick where to send the user after a click.
///
/// The per-click URL from the backend wins because only it carries the
/// click-correlation id back to the provider. The offer's static URL is a
/// last resort. `None` means there is nowhere to go.
pub fn resolve_redirect_target(
    registration: &ClickRegistration,
    static_url: Option<&Url>,
) -> Option<Url> {
    registration
        .redirect_url
        .clone()
        .or_else(|| static_url.cloned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::model::{Offer, TrackingId, TrackingStatus, Wallet};

    #[derive(Default)]
    struct CountingBackend {
        clicks: AtomicUsize,
        hang: bool,
    }

    impl TrackingBackend for CountingBackend {
        async fn register_click(&self, _: &OfferId) -> Result<ClickRegistration, CoreError> {
            self.clicks.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            Ok(ClickRegistration {
                tracking_id: TrackingId::from("trk-1"),
                click_id: None,
                redirect_url: None,
            })
        }

        async fn report_completion(
            &self,
            offer_id: &OfferId,
            _: &CompletionMetadata,
        ) -> Result<TrackingRecord, CoreError> {
            Ok(TrackingRecord {
                id: TrackingId::from("trk-1"),
                user_id: UserId::from("u-1"),
                offer_id: offer_id.clone(),
                offer_name: None,
                user_name: None,
                status: TrackingStatus::Completed,
                click_id: None,
                clicked_at: None,
                completed_at: None,
            })
        }

        async fn user_trackings(&self, _: &UserId) -> Result<Vec<TrackingRecord>, CoreError> {
            Ok(Vec::new())
        }

        async fn active_offers(&self) -> Result<Vec<Offer>, CoreError> {
            Ok(Vec::new())
        }

        async fn wallet(&self, _: &UserId) -> Result<Wallet, CoreError> {
            Err(CoreError::Internal("unused".into()))
        }
    }

    fn client(backend: CountingBackend) -> OfferTrackingClient<CountingBackend> {
        OfferTrackingClient::new(
            Arc::new(backend),
            SessionContext::new(),
            Duration::from_secs(15),
        )
    }

    fn registration(redirect: Option<&str>) -> ClickRegistration {
        ClickRegistration {
            tracking_id: TrackingId::from("trk-1"),
            click_id: redirect.map(|_| "clk-1".into()),
            redirect_url: redirect.map(|u| Url::parse(u).unwrap()),
        }
    }

    #[test]
    fn per_click_url_beats_static_url() {
        let static_url = Url::parse("https://partner.example/static").unwrap();
        let reg = registration(Some("https://partner.example/go?click=clk-1"));
        assert_eq!(
            resolve_redirect_target(&reg, Some(&static_url)).unwrap().as_str(),
            "https://partner.example/go?click=clk-1"
        );
        assert_eq!(
            resolve_redirect_target(&reg, None).unwrap().as_str(),
            "https://partner.example/go?click=clk-1"
        );
    }

    #[test]
    fn static_url_is_the_fallback() {
        let static_url = Url::parse("https://partner.example/static").unwrap();
        let reg = registration(None);
        assert_eq!(
            resolve_redirect_target(&reg, Some(&static_url)),
            Some(static_url)
        );
    }

    #[test]
    fn no_target_resolves_to_none() {
        assert!(resolve_redirect_target(&registration(None), None).is_none());
    }

    #[tokio::test]
    async fn blank_user_never_reaches_the_network() {
        let client = client(CountingBackend::default());

        let result = client
            .register_click(&OfferId::from("offer-1"), &UserId::from(""))
            .await;

        assert!(matches!(result, Err(CoreError::Validation { .. })));
        assert_eq!(client.backend().clicks.load(Ordering::SeqCst), 0);
        assert!(validate_click(&OfferId::from("offer-1"), &UserId::from(" ")).is_err());
    }

    #[tokio::test]
    async fn blank_offer_never_reaches_the_network() {
        let client = client(CountingBackend::default());

        let result = client
            .register_click(&OfferId::from(""), &UserId::from("u-1"))
            .await;

        assert!(matches!(result, Err(CoreError::Validation { .. })));
        assert_eq!(client.backend().clicks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_registration_times_out_as_network_error() {
        let client = client(CountingBackend {
            hang: true,
            ..CountingBackend::default()
        });

        let result = client
            .register_click(&OfferId::from("offer-1"), &UserId::from("u-1"))
            .await;

        match result {
            Err(e @ CoreError::Network { .. }) => assert!(e.is_retryable()),
            other => panic!("expected network error, got {other:?}"),
        }
        assert_eq!(client.backend().clicks.load(Ordering::SeqCst), 1);
    }
}
