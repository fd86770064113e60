// Tracking endpoints: click registration, fallback completion report,
// and tracking history.

use crate::client::{ApiClient, Auth};
use crate::error::Error;
use crate::models::{
    ClickDto, ClickRequest, CompletionRequest, TrackingData, TrackingDto, TrackingsData,
};

impl ApiClient {
    /// Register a click on an offer for the logged-in user. The user is
    /// implied by the bearer token.
    pub async fn track_click(&self, offer_id: &str) -> Result<ClickDto, Error> {
        let data: TrackingData<ClickDto> = self
            .post(
                "v1/tracking/click",
                &ClickRequest { offer_id },
                Auth::Required,
            )
            .await?;
        Ok(data.tracking)
    }

    /// Client-side completion report for offers without a provider webhook.
    pub async fn report_completion(
        &self,
        offer_id: &str,
        metadata: &serde_json::Value,
    ) -> Result<TrackingDto, Error> {
        let data: TrackingData<TrackingDto> = self
            .post(
                "v1/tracking/complete",
                &CompletionRequest { offer_id, metadata },
                Auth::Required,
            )
            .await?;
        Ok(data.tracking)
    }

    /// The logged-in user's tracking history.
    pub async fn my_trackings(&self) -> Result<Vec<TrackingDto>, Error> {
        let data: TrackingsData = self.get("v1/tracking/my-trackings").await?;
        Ok(data.trackings)
    }

    /// All tracking records (admin), optionally filtered by status.
    pub async fn list_trackings(
        &self,
        status: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Result<Vec<TrackingDto>, Error> {
        let mut params = vec![("page", page.to_string()), ("limit", limit.to_string())];
        if let Some(status) = status {
            params.push(("status", status.to_owned()));
        }
        let data: TrackingsData = self
            .get_with_params("v1/tracking/get-all-trackings", &params)
            .await?;
        Ok(data.trackings)
    }
}
