//! Parking endpoints of the backend

use crate::api::{fill_path, ApiClient};
use crate::auth::AuthToken;
use crate::config::EndpointsConfig;
use crate::error::Result;

use super::{Parking, ParkingForm};

/// Parking lot CRUD for the signed-in partner
#[derive(Clone)]
pub struct ParkingApi {
    client: ApiClient,
    endpoints: EndpointsConfig,
}

impl ParkingApi {
    pub fn new(client: ApiClient, endpoints: EndpointsConfig) -> Self {
        Self { client, endpoints }
    }

    /// Lots owned by a user
    pub async fn list_for_user(&self, token: &AuthToken, user_id: &str) -> Result<Vec<Parking>> {
        let path = fill_path(&self.endpoints.parking_by_user, &[("userId", user_id)]);
        let lots: Vec<Parking> = self
            .client
            .get(&path, Some(token))
            .await?
            .into_data("List parking")?;
        tracing::debug!("Fetched {} parking lots for {}", lots.len(), user_id);
        Ok(lots)
    }

    pub async fn get(&self, token: &AuthToken, id: &str) -> Result<Parking> {
        let path = fill_path(&self.endpoints.parking_by_id, &[("id", id)]);
        self.client
            .get(&path, Some(token))
            .await?
            .into_data("Get parking")
    }

    /// Validate and create a lot
    pub async fn add(&self, token: &AuthToken, form: &ParkingForm) -> Result<Parking> {
        form.validate()?;
        let parking: Parking = self
            .client
            .post(&self.endpoints.add_parking, Some(form), Some(token))
            .await?
            .into_data("Add parking")?;
        tracing::info!("Added parking lot {}", parking.name);
        Ok(parking)
    }

    /// Validate and update an existing lot
    pub async fn update(&self, token: &AuthToken, id: &str, form: &ParkingForm) -> Result<Parking> {
        form.validate()?;
        let path = fill_path(&self.endpoints.update_parking, &[("id", id)]);
        let parking: Parking = self
            .client
            .put(&path, form, Some(token))
            .await?
            .into_data("Update parking")?;
        tracing::info!("Updated parking lot {}", id);
        Ok(parking)
    }
}
