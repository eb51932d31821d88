pub mod stripe;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use stripe::StripeClient;

pub const DEFAULT_CURRENCY: &str = "usd";

/// Smallest amount accepted, in major units
pub const MIN_AMOUNT: f64 = 1.0;

/// Largest amount the provider accepts for a single charge, in major units
pub const MAX_AMOUNT: f64 = 999_999.99;

const INTENT_ID_PREFIX: &str = "pi_";

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Amount must be at least 1, got {0}")]
    InvalidAmount(f64),
    #[error("Amount must be at most 999999.99, got {0}")]
    AmountTooLarge(f64),
    #[error("Invalid payment intent id")]
    InvalidIntentId,
    #[error("Invalid payment API URL: {0}")]
    InvalidUrl(String),
    #[error("Payment provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message}")]
    Provider { message: String },
}

/// Validated payment intent, amount already in minor units (cents)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    pub amount_minor: i64,
    pub currency: String,
    pub description: Option<String>,
}

impl PaymentIntentRequest {
    pub fn new(
        amount: f64,
        currency: Option<&str>,
        description: Option<String>,
    ) -> Result<Self, PaymentError> {
        Ok(Self {
            amount_minor: to_minor_units(amount)?,
            currency: currency
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(DEFAULT_CURRENCY)
                .to_lowercase(),
            description,
        })
    }
}

/// Convert a major-unit amount to the provider's integer representation
pub fn to_minor_units(amount: f64) -> Result<i64, PaymentError> {
    if !amount.is_finite() || amount < MIN_AMOUNT {
        return Err(PaymentError::InvalidAmount(amount));
    }
    if amount > MAX_AMOUNT {
        return Err(PaymentError::AmountTooLarge(amount));
    }
    Ok((amount * 100.0).round() as i64)
}

/// Provider intent ids are `pi_` followed by ASCII letters, digits and underscores
pub fn validate_intent_id(id: &str) -> Result<(), PaymentError> {
    let valid = id.strip_prefix(INTENT_ID_PREFIX).is_some_and(|rest| {
        !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
    });

    if valid {
        Ok(())
    } else {
        Err(PaymentError::InvalidIntentId)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Success,
    Failed,
}

impl PaymentStatus {
    /// Interpret the `payment_intent_status` the provider appends on redirect.
    /// Anything other than an explicit failure counts as success.
    pub fn from_redirect(status: Option<&str>) -> Self {
        match status {
            Some("failed") => PaymentStatus::Failed,
            _ => PaymentStatus::Success,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub payment_method: String,
    pub return_url: Option<String>,
}

/// Hosted payments API
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError>;

    /// Confirm an intent; returns the provider's resulting status string
    async fn confirm_intent(
        &self,
        intent_id: &str,
        request: &ConfirmRequest,
    ) -> Result<String, PaymentError>;
}
