// ── Wallet view ──
//
// Read-only wallet snapshot for the logged-in user. Credits come from
// completed tracking records on the backend; this side only fetches and
// publishes.

use std::sync::Arc;

use earnhub_api::SessionContext;
use tokio::sync::watch;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{UserId, Wallet};
use crate::tracking::TrackingBackend;

pub struct WalletView<B> {
    backend: Arc<B>,
    session: SessionContext,
    latest: watch::Sender<Option<Arc<Wallet>>>,
}

impl<B: TrackingBackend> WalletView<B> {
    pub fn new(backend: Arc<B>, session: SessionContext) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            backend,
            session,
            latest,
        }
    }

    /// Fetch the current user's wallet and publish it.
    pub async fn refresh(&self) -> Result<Arc<Wallet>, CoreError> {
        let Some(user_id) = self.session.user_id().map(UserId::from) else {
            self.latest.send_replace(None);
            return Err(CoreError::AuthExpired);
        };

        let wallet = match self.backend.wallet(&user_id).await {
            Ok(wallet) => Arc::new(wallet),
            Err(e) => {
                if e.is_auth_expired() {
                    self.latest.send_replace(None);
                }
                return Err(e);
            }
        };
        debug!(
            %user_id,
            balance = %wallet.balance,
            locked = %wallet.locked,
            "wallet refreshed"
        );
        self.latest.send_replace(Some(Arc::clone(&wallet)));
        Ok(wallet)
    }

    /// Last successfully fetched wallet.
    pub fn latest(&self) -> Option<Arc<Wallet>> {
        self.latest.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Wallet>>> {
        self.latest.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::test_support::{FakeBackend, logged_in};
    use earnhub_api::SessionEnd;

    fn wallet() -> Wallet {
        Wallet {
            user_id: Some(UserId::from("u-1")),
            balance: dec!(250.00),
            locked: dec!(50.00),
            currency: "INR".into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn refresh_publishes_the_wallet() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_wallet(wallet());
        let view = WalletView::new(backend, logged_in("u-1"));
        let mut rx = view.subscribe();

        let fetched = view.refresh().await.unwrap();

        assert_eq!(fetched.available(), dec!(200.00));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_deref(), Some(&wallet()));
        assert_eq!(view.latest().unwrap().currency, "INR");
    }

    #[tokio::test]
    async fn missing_wallet_surfaces_as_server_error() {
        let view = WalletView::new(Arc::new(FakeBackend::default()), logged_in("u-1"));

        let err = view.refresh().await.unwrap_err();

        assert!(matches!(err, CoreError::Server { status: 404, .. }));
        assert!(view.latest().is_none());
    }

    #[tokio::test]
    async fn no_session_clears_the_view() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_wallet(wallet());
        let session = logged_in("u-1");
        let view = WalletView::new(backend, session.clone());
        view.refresh().await.unwrap();

        session.destroy(SessionEnd::LoggedOut);
        let err = view.refresh().await.unwrap_err();

        assert!(err.is_auth_expired());
        assert!(view.latest().is_none());
    }
}
