//! Payment service
//!
//! Authorizes card payments against a simulated external provider. The
//! provider is chosen from the card number prefix; each one has its own
//! latency range and decline rate.

use crate::config::PaymentConfig;
use crate::error::{ApiError, ShopResult};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use entropy_interceptor::{protect, EntropyInterceptor, EntropyState, RequestMetrics};
use prometheus::{HistogramOpts, HistogramVec, IntCounter};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Simulated card provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Visa,
    Mastercard,
    Amex,
    Other,
}

impl Provider {
    /// Provider for a card number
    pub fn for_card(card_number: &str) -> Self {
        match card_number.chars().next() {
            Some('4') => Provider::Visa,
            Some('5') => Provider::Mastercard,
            Some('3') => Provider::Amex,
            _ => Provider::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Visa => "visa",
            Provider::Mastercard => "mastercard",
            Provider::Amex => "amex",
            Provider::Other => "default",
        }
    }

    /// Range of the provider's network latency in seconds
    pub fn latency_range(&self) -> (f64, f64) {
        match self {
            Provider::Visa => (0.1, 0.3),
            Provider::Mastercard => (0.2, 0.5),
            Provider::Amex => (0.3, 0.7),
            Provider::Other => (0.1, 0.4),
        }
    }

    /// Probability that the provider declines an authorization
    pub fn decline_rate(&self) -> f64 {
        match self {
            Provider::Visa => 0.05,
            Provider::Mastercard => 0.08,
            Provider::Amex => 0.1,
            Provider::Other => 0.07,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizeRequest {
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
    pub amount: f64,
}

/// Authorization response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    pub message: String,
    pub transaction_id: String,
}

#[derive(Clone)]
struct PaymentMetrics {
    provider_latency: HistogramVec,
    authorized: IntCounter,
    declined: IntCounter,
}

impl PaymentMetrics {
    fn register(registry: &prometheus::Registry) -> ShopResult<Self> {
        let provider_latency = HistogramVec::new(
            HistogramOpts::new(
                "provider_latency_seconds",
                "Latency of the external payment provider",
            ),
            &["provider"],
        )?;
        let authorized = IntCounter::new(
            "authorizations_success_total",
            "Total successful payment authorizations",
        )?;
        let declined = IntCounter::new(
            "authorizations_failure_total",
            "Total failed payment authorizations",
        )?;

        registry.register(Box::new(provider_latency.clone()))?;
        registry.register(Box::new(authorized.clone()))?;
        registry.register(Box::new(declined.clone()))?;

        Ok(Self {
            provider_latency,
            authorized,
            declined,
        })
    }
}

/// Payment authorization logic
#[derive(Clone)]
pub struct PaymentService {
    simulate_provider: bool,
    metrics: PaymentMetrics,
}

impl PaymentService {
    /// Create the service, registering its metrics next to the request metrics
    pub fn new(config: &PaymentConfig, registry: &prometheus::Registry) -> ShopResult<Self> {
        Ok(Self {
            simulate_provider: config.simulate_provider,
            metrics: PaymentMetrics::register(registry)?,
        })
    }

    /// Authorize one payment
    pub async fn authorize(
        &self,
        request: &AuthorizeRequest,
    ) -> Result<AuthorizeResponse, ApiError> {
        let provider = Provider::for_card(&request.card_number);
        let transaction_id = uuid::Uuid::new_v4().to_string();

        if self.simulate_provider {
            let (delay, declined) = {
                let mut rng = rand::thread_rng();
                let (low, high) = provider.latency_range();
                let delay = rng.gen_range(low..high) + rng.gen_range(0.1..0.5);
                (delay, rng.gen::<f64>() < provider.decline_rate())
            };

            let started = Instant::now();
            tokio::time::sleep(Duration::from_secs_f64(delay)).await;
            self.metrics
                .provider_latency
                .with_label_values(&[provider.as_str()])
                .observe(started.elapsed().as_secs_f64());

            if declined {
                self.metrics.declined.inc();
                tracing::warn!(
                    transaction_id = %transaction_id,
                    provider = %provider,
                    "Payment authorization declined"
                );
                return Err(ApiError::AuthorizationFailed(provider.to_string()));
            }
        }

        self.metrics.authorized.inc();
        tracing::info!(
            transaction_id = %transaction_id,
            provider = %provider,
            amount = request.amount,
            "Payment authorized"
        );

        Ok(AuthorizeResponse {
            message: "Payment authorized".to_string(),
            transaction_id,
        })
    }
}

async fn authorize(
    State(service): State<PaymentService>,
    Json(request): Json<AuthorizeRequest>,
) -> Result<Json<AuthorizeResponse>, ApiError> {
    service.authorize(&request).await.map(Json)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Payment routes behind the entropy interceptor
pub fn payment_router(service: PaymentService, interceptor: EntropyInterceptor) -> Router {
    let business = Router::new()
        .route("/authorize", post(authorize))
        .route("/health", get(health_check))
        .with_state(service);

    protect(business, interceptor)
}

/// Build the payment router from configuration
pub fn build(config: &PaymentConfig) -> ShopResult<Router> {
    let metrics = RequestMetrics::new("payment")?;
    let service = PaymentService::new(config, metrics.registry())?;
    Ok(payment_router(
        service,
        EntropyInterceptor::new(EntropyState::new(), metrics),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_card_prefix() {
        assert_eq!(Provider::for_card("4111111111111111"), Provider::Visa);
        assert_eq!(Provider::for_card("5500000000000004"), Provider::Mastercard);
        assert_eq!(Provider::for_card("340000000000009"), Provider::Amex);
        assert_eq!(Provider::for_card("1234"), Provider::Other);
        assert_eq!(Provider::for_card(""), Provider::Other);
        assert_eq!(Provider::Other.to_string(), "default");
    }

    #[tokio::test]
    async fn test_authorize_without_simulation() {
        let registry = prometheus::Registry::new();
        let service = PaymentService::new(
            &PaymentConfig {
                simulate_provider: false,
                ..PaymentConfig::default()
            },
            &registry,
        )
        .unwrap();

        let response = service
            .authorize(&AuthorizeRequest {
                card_number: "4111".into(),
                expiry_date: "12/25".into(),
                cvv: "123".into(),
                amount: 100.0,
            })
            .await
            .unwrap();
        assert_eq!(response.message, "Payment authorized");
        assert_eq!(service.metrics.authorized.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_provider_adds_latency() {
        let registry = prometheus::Registry::new();
        let service = PaymentService::new(&PaymentConfig::default(), &registry).unwrap();

        let started = Instant::now();
        let _ = service
            .authorize(&AuthorizeRequest {
                card_number: "3400".into(),
                expiry_date: "12/25".into(),
                cvv: "123".into(),
                amount: 10.0,
            })
            .await;
        assert!(started.elapsed() >= Duration::from_millis(400));
        assert_eq!(
            service.metrics.authorized.get() + service.metrics.declined.get(),
            1
        );
    }
}
