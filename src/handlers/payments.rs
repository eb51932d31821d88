use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::payment::{self, ConfirmRequest, PaymentIntentRequest, PaymentStatus};

/// Shown to the rider when an intent can't be created
pub const PAYMENT_INIT_FAILED: &str = "Failed to initialize payment. Please try again.";

#[derive(Debug, Deserialize)]
pub struct CreatePaymentIntentRequest {
    /// Major units; the configured ride fare when omitted
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentIntentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub payment_method: String,
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmPaymentResponse {
    pub intent_id: String,
    pub provider_status: String,
    pub payment: PaymentStatus,
}

/// Create a payment intent with the hosted provider
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentIntentRequest>,
) -> AppResult<(StatusCode, Json<PaymentIntentResponse>)> {
    let payment = &state.config.payment;
    let request = PaymentIntentRequest::new(
        payload.amount.unwrap_or(payment.ride_fare),
        payload.currency.as_deref().or(Some(payment.currency.as_str())),
        payload.description,
    )?;

    match state.payments.create_intent(&request).await {
        Ok(intent) => Ok((
            StatusCode::OK,
            Json(PaymentIntentResponse {
                success: true,
                intent_id: Some(intent.id),
                client_secret: Some(intent.client_secret),
                amount: Some(intent.amount),
                error: None,
            }),
        )),
        Err(e) => {
            tracing::error!(error = %e, amount = request.amount_minor, "Error creating payment intent");
            Ok((
                StatusCode::BAD_GATEWAY,
                Json(PaymentIntentResponse {
                    success: false,
                    intent_id: None,
                    client_secret: None,
                    amount: None,
                    error: Some(PAYMENT_INIT_FAILED.to_string()),
                }),
            ))
        }
    }
}

/// Confirm a payment intent; provider rejections are returned verbatim
pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(intent_id): Path<String>,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> AppResult<Json<ConfirmPaymentResponse>> {
    payment::validate_intent_id(&intent_id)?;
    if payload.payment_method.trim().is_empty() {
        return Err(AppError::BadRequest(
            "A payment method is required".to_string(),
        ));
    }

    let request = ConfirmRequest {
        payment_method: payload.payment_method,
        return_url: payload.return_url,
    };

    let provider_status = state.payments.confirm_intent(&intent_id, &request).await?;
    tracing::info!(intent_id = %intent_id, status = %provider_status, "Payment confirmed");

    Ok(Json(ConfirmPaymentResponse {
        payment: PaymentStatus::from_redirect(Some(provider_status.as_str())),
        intent_id,
        provider_status,
    }))
}
