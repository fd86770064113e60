use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{WalletData, WalletDto};

impl ApiClient {
    /// Fetch a user's wallet snapshot.
    pub async fn wallet_by_user_id(&self, user_id: &str) -> Result<WalletDto, Error> {
        let data: WalletData = self
            .get(&format!("v1/wallet/{user_id}/wallet-by-user-id"))
            .await?;
        Ok(data.wallet)
    }
}
