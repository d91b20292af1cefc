//! Checkout service
//!
//! Each checkout authorizes a payment through a [`ResilientCall`]: the
//! breaker guards every single attempt and the retry policy re-attempts
//! failed ones. The two resilience failures map to distinct responses, 503
//! when the breaker is open and 504 when all attempts failed.

use crate::config::CheckoutConfig;
use crate::error::{ApiError, ShopError, ShopResult};
use crate::payment::{AuthorizeRequest, AuthorizeResponse};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use entropy_interceptor::{protect, EntropyInterceptor, EntropyState, RequestMetrics};
use entropy_resilience::{
    CallStats, CircuitBreakerStats, ResilienceError, ResilientCall,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Card used for every demo checkout
const DEMO_CARD: &str = "1234";

/// Failure of a single payment attempt
#[derive(Debug, Error)]
pub enum PaymentCallError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("payment service returned HTTP {0}")]
    Status(u16),
}

/// Checkout response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub message: String,
    pub order_id: String,
    pub transaction_id: String,
}

/// Resilience state of the payment dependency
#[derive(Debug, Serialize)]
pub struct ResilienceResponse {
    pub breaker: CircuitBreakerStats,
    pub calls: CallStats,
}

/// Places orders, authorizing each through the payment service
#[derive(Clone)]
pub struct CheckoutService {
    client: reqwest::Client,
    authorize_url: String,
    payment: ResilientCall,
}

impl CheckoutService {
    pub fn new(config: &CheckoutConfig) -> ShopResult<Self> {
        let payment = ResilientCall::new(
            "payment-api",
            (&config.breaker).into(),
            (&config.retry).into(),
        )
        .with_attempt_timeout(config.attempt_timeout());

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ShopError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            authorize_url: format!("{}/authorize", config.payment_url.trim_end_matches('/')),
            payment,
        })
    }

    /// The resilient call guarding payment
    pub fn payment_call(&self) -> &ResilientCall {
        &self.payment
    }

    /// Run one checkout
    pub async fn checkout(&self) -> Result<CheckoutResponse, ApiError> {
        let request = AuthorizeRequest {
            card_number: DEMO_CARD.to_string(),
            expiry_date: "12/25".to_string(),
            cvv: "123".to_string(),
            amount: 100.0,
        };

        let result = self
            .payment
            .execute(|| {
                let pending = self.client.post(&self.authorize_url).json(&request).send();
                async move {
                    let response = pending.await?;
                    let status = response.status();
                    if !status.is_success() {
                        return Err(PaymentCallError::Status(status.as_u16()));
                    }
                    Ok(response)
                }
            })
            .await;

        let response = match result {
            Ok(response) => response,
            Err(ResilienceError::CircuitOpen { .. }) => {
                tracing::error!(outcome = "circuit_open", "Payment service unavailable");
                return Err(ApiError::PaymentUnavailable);
            }
            Err(e @ ResilienceError::RetryExhausted { .. }) => {
                tracing::error!(outcome = "retry_exhausted", error = %e, "Payment service timed out");
                return Err(ApiError::PaymentTimedOut);
            }
        };

        let authorization: AuthorizeResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Checkout failed");
            ApiError::Internal(e.to_string())
        })?;

        let order_id = uuid::Uuid::new_v4().to_string();
        tracing::info!(
            order_id = %order_id,
            transaction_id = %authorization.transaction_id,
            "Checkout successful"
        );

        Ok(CheckoutResponse {
            message: "Checkout successful".to_string(),
            order_id,
            transaction_id: authorization.transaction_id,
        })
    }

    pub fn resilience(&self) -> ResilienceResponse {
        ResilienceResponse {
            breaker: self.payment.breaker().stats(),
            calls: self.payment.stats(),
        }
    }
}

async fn checkout(
    State(service): State<CheckoutService>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    service.checkout().await.map(Json)
}

async fn resilience(State(service): State<CheckoutService>) -> Json<ResilienceResponse> {
    Json(service.resilience())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Checkout routes behind the entropy interceptor
pub fn checkout_router(service: CheckoutService, interceptor: EntropyInterceptor) -> Router {
    let business = Router::new()
        .route("/checkout", post(checkout))
        .route("/resilience", get(resilience))
        .route("/health", get(health_check))
        .with_state(service);

    protect(business, interceptor)
}

/// Build the checkout router from configuration
pub fn build(config: &CheckoutConfig) -> ShopResult<Router> {
    let metrics = RequestMetrics::new("checkout")?;
    Ok(checkout_router(
        CheckoutService::new(config)?,
        EntropyInterceptor::new(EntropyState::new(), metrics),
    ))
}
