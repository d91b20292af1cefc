//! Demo shop services
//!
//! Two services protected by the entropy interceptor:
//! - payment: authorizes card payments against a simulated provider
//! - checkout: places orders, calling payment through a resilient call

pub mod checkout;
pub mod config;
pub mod error;
pub mod payment;
pub mod server;

pub use checkout::{checkout_router, CheckoutService};
pub use config::ShopConfig;
pub use error::{ApiError, ShopError};
pub use payment::{payment_router, PaymentService, Provider};
