use async_trait::async_trait;
use serde::Deserialize;

use crate::payment::{
    ConfirmRequest, PaymentError, PaymentIntent, PaymentIntentRequest, PaymentProvider,
};

/// Client for a Stripe-compatible payment intents API
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct IntentBody {
    id: String,
    client_secret: Option<String>,
    amount: i64,
    currency: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

impl StripeClient {
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        }
    }

    /// Join path segments onto the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, PaymentError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| PaymentError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| PaymentError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post_form(
        &self,
        segments: &[&str],
        form: &[(&str, String)],
    ) -> Result<IntentBody, PaymentError> {
        let url = self.endpoint(segments)?;
        let response = self
            .http
            .post(url.clone())
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response.json::<IntentBody>().await?);
        }

        let status = response.status();
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error.message)
            .unwrap_or_else(|| "An error occurred".to_string());

        tracing::warn!(status = %status, path = %url.path(), message = %message, "Payment provider rejected request");
        Err(PaymentError::Provider { message })
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut form = vec![
            ("amount", request.amount_minor.to_string()),
            ("currency", request.currency.clone()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];
        if let Some(description) = &request.description {
            form.push(("description", description.clone()));
        }

        let body = self.post_form(&["v1", "payment_intents"], &form).await?;
        let client_secret = body.client_secret.ok_or_else(|| PaymentError::Provider {
            message: "Payment intent has no client secret".to_string(),
        })?;

        tracing::info!(intent_id = %body.id, amount = body.amount, "Payment intent created");

        Ok(PaymentIntent {
            id: body.id,
            client_secret,
            amount: body.amount,
            currency: body.currency,
        })
    }

    async fn confirm_intent(
        &self,
        intent_id: &str,
        request: &ConfirmRequest,
    ) -> Result<String, PaymentError> {
        let mut form = vec![("payment_method", request.payment_method.clone())];
        if let Some(return_url) = &request.return_url {
            form.push(("return_url", return_url.clone()));
        }

        let body = self
            .post_form(&["v1", "payment_intents", intent_id, "confirm"], &form)
            .await?;

        Ok(body.status.unwrap_or_else(|| "unknown".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Form, Json, Router,
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use std::collections::HashMap;

    /// Minimal stand-in for the hosted API, served on an ephemeral port
    async fn fake_provider() -> String {
        async fn create(
            headers: HeaderMap,
            Form(form): Form<HashMap<String, String>>,
        ) -> (StatusCode, Json<serde_json::Value>) {
            let authorized = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                == Some("Bearer sk_test");
            if !authorized {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({ "error": { "message": "Invalid API Key provided" } })),
                );
            }
            if form.get("automatic_payment_methods[enabled]").map(String::as_str) != Some("true") {
                return (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": {} })));
            }

            let amount: i64 = form["amount"].parse().unwrap_or_default();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "id": "pi_123",
                    "client_secret": format!("pi_123_secret_{}", amount),
                    "amount": amount,
                    "currency": form["currency"],
                    "status": "requires_payment_method",
                })),
            )
        }

        async fn confirm(
            Path(id): Path<String>,
            Form(form): Form<HashMap<String, String>>,
        ) -> (StatusCode, Json<serde_json::Value>) {
            if id != "pi_123" {
                return (
                    StatusCode::NOT_FOUND,
                    Json(serde_json::json!({
                        "error": { "message": format!("No such payment_intent: '{}'", id) }
                    })),
                );
            }
            if form.get("payment_method").map(String::as_str) == Some("pm_card_chargeDeclined") {
                return (
                    StatusCode::PAYMENT_REQUIRED,
                    Json(serde_json::json!({ "error": { "message": "Your card was declined." } })),
                );
            }
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "id": id,
                    "client_secret": null,
                    "amount": 1875,
                    "currency": "usd",
                    "status": "succeeded",
                })),
            )
        }

        let app = Router::new()
            .route("/v1/payment_intents", post(create))
            .route("/v1/payment_intents/{id}/confirm", post(confirm));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_create_intent_sends_minor_units() {
        let client = StripeClient::new(fake_provider().await, "sk_test");
        let request = PaymentIntentRequest::new(18.75, None, Some("Ride payment".into())).unwrap();

        let intent = client.create_intent(&request).await.unwrap();
        assert_eq!(intent.amount, 1875);
        assert_eq!(intent.currency, "usd");
        assert_eq!(intent.client_secret, "pi_123_secret_1875");
    }

    #[tokio::test]
    async fn test_create_intent_surfaces_provider_error() {
        let client = StripeClient::new(fake_provider().await, "sk_wrong");
        let request = PaymentIntentRequest::new(18.75, None, None).unwrap();

        match client.create_intent(&request).await {
            Err(PaymentError::Provider { message }) => {
                assert_eq!(message, "Invalid API Key provided")
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_confirm_intent() {
        let client = StripeClient::new(fake_provider().await, "sk_test");

        let status = client
            .confirm_intent(
                "pi_123",
                &ConfirmRequest {
                    payment_method: "pm_card_visa".into(),
                    return_url: Some("http://localhost/ride/status".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(status, "succeeded");

        let declined = client
            .confirm_intent(
                "pi_123",
                &ConfirmRequest {
                    payment_method: "pm_card_chargeDeclined".into(),
                    return_url: None,
                },
            )
            .await;
        assert!(
            matches!(declined, Err(PaymentError::Provider { message }) if message == "Your card was declined.")
        );
    }

    #[tokio::test]
    async fn test_confirm_keeps_intent_id_in_one_segment() {
        let client = StripeClient::new(fake_provider().await, "sk_test");
        let request = ConfirmRequest {
            payment_method: "pm_card_visa".into(),
            return_url: None,
        };

        for id in ["pi_1?expand=x#", "pi_1/../../v1/setup_intents/seti_9"] {
            match client.confirm_intent(id, &request).await {
                Err(PaymentError::Provider { message }) => {
                    assert_eq!(message, format!("No such payment_intent: '{}'", id))
                }
                other => panic!("expected unknown intent for {:?}, got {:?}", id, other),
            }
        }
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = StripeClient::new("https://api.example.com/", "sk_test");

        let url = client
            .endpoint(&["v1", "payment_intents", "pi_1/x?y", "confirm"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/payment_intents/pi_1%2Fx%3Fy/confirm"
        );
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_http_error() {
        let client = StripeClient::new("http://127.0.0.1:1", "sk_test");
        let request = PaymentIntentRequest::new(5.0, None, None).unwrap();

        assert!(matches!(
            client.create_intent(&request).await,
            Err(PaymentError::Http(_))
        ));
    }
}
