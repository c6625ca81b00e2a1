//! Subscription plans and slot pricing

use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::auth::AuthToken;
use crate::config::EndpointsConfig;
use crate::error::{Error, Result};

/// Slots preselected when a partner opens the plan sheet
pub const DEFAULT_SLOTS: u32 = 5;

/// Step used by the slot picker's increment button
pub const SLOT_STEP: u32 = 5;

/// Subscription plan offered to partners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub id: String,
    /// Price per slot
    pub price: f64,
    /// Discount per slot, in percent
    #[serde(default)]
    pub discount: f64,
}

/// Price breakdown for a number of slots
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub slots: u32,
    pub original: f64,
    pub discounted: i64,
}

impl PriceQuote {
    pub fn savings(&self) -> f64 {
        self.original - self.discounted as f64
    }
}

impl Plan {
    /// Quote `slots` slots on this plan.
    ///
    /// The discounted total is rounded to the nearest whole currency unit.
    pub fn quote(&self, slots: u32) -> Result<PriceQuote> {
        if slots == 0 {
            return Err(Error::Validation("At least one slot is required".to_string()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(Error::Validation(format!("Invalid plan price {}", self.price)));
        }
        if !(0.0..=100.0).contains(&self.discount) {
            return Err(Error::Validation(format!(
                "Discount must be between 0 and 100, got {}",
                self.discount
            )));
        }

        let slots_f = f64::from(slots);
        let original = self.price * slots_f;
        let discount_per_slot = self.price * (self.discount / 100.0);
        let discounted = (original - slots_f * discount_per_slot).round() as i64;

        Ok(PriceQuote {
            slots,
            original,
            discounted,
        })
    }
}

/// Next slot count when stepping the picker down; never below one
pub fn decrement_slots(slots: u32) -> u32 {
    slots.saturating_sub(1).max(1)
}

/// Next slot count when stepping the picker up
pub fn increment_slots(slots: u32) -> u32 {
    slots.saturating_add(SLOT_STEP)
}

/// Body of the subscribe call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    /// Sent as a string, as the backend expects
    pub slot: String,
    pub parking_lot_id: String,
    pub user_id: String,
}

impl SubscribeRequest {
    pub fn new(slots: u32, parking_lot_id: &str, user_id: &str) -> Result<Self> {
        if slots == 0 {
            return Err(Error::Validation("At least one slot is required".to_string()));
        }
        if parking_lot_id.trim().is_empty() {
            return Err(Error::Validation("Parking lot id is required".to_string()));
        }
        Ok(Self {
            slot: slots.to_string(),
            parking_lot_id: parking_lot_id.to_string(),
            user_id: user_id.to_string(),
        })
    }
}

/// Subscription created by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
}

/// Plan endpoints of the backend
#[derive(Clone)]
pub struct PlanApi {
    client: ApiClient,
    endpoints: EndpointsConfig,
}

impl PlanApi {
    pub fn new(client: ApiClient, endpoints: EndpointsConfig) -> Self {
        Self { client, endpoints }
    }

    /// Plan currently offered to the signed-in partner
    pub async fn current(&self, token: &AuthToken) -> Result<Plan> {
        self.client
            .get(&self.endpoints.plan, Some(token))
            .await?
            .into_data("Get plan")
    }

    pub async fn subscribe(
        &self,
        token: &AuthToken,
        request: &SubscribeRequest,
    ) -> Result<Subscription> {
        let subscription: Subscription = self
            .client
            .post(&self.endpoints.subscribe, Some(request), Some(token))
            .await?
            .into_data("Subscribe")?;
        tracing::info!(
            "Subscribed {} slots on parking lot {}",
            request.slot,
            request.parking_lot_id
        );
        Ok(subscription)
    }
}
