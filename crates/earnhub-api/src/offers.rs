// Offer endpoints.

use crate::client::{ApiClient, Auth};
use crate::error::Error;
use crate::models::{CreateOfferRequest, MessageData, OfferData, OfferDto, OffersData};

impl ApiClient {
    /// List offers. `active_only` maps to the `isActive=true` filter.
    pub async fn list_offers(&self, active_only: bool) -> Result<Vec<OfferDto>, Error> {
        let params = if active_only {
            vec![("isActive", "true".to_owned())]
        } else {
            Vec::new()
        };
        let data: OffersData = self
            .get_with_params("v1/offer/get-all-offers", &params)
            .await?;
        Ok(data.offers)
    }

    /// Create an offer (admin).
    pub async fn create_offer(&self, request: &CreateOfferRequest) -> Result<OfferDto, Error> {
        let data: OfferData = self
            .post("v1/offer/create-offer", request, Auth::Required)
            .await?;
        Ok(data.offer)
    }

    /// Hard-delete an offer (admin).
    pub async fn delete_offer(&self, offer_id: &str) -> Result<(), Error> {
        let _: MessageData = self
            .delete(&format!("v1/offer/{offer_id}/delete-offer"))
            .await?;
        Ok(())
    }
}
