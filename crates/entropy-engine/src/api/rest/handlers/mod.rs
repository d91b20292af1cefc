//! API request handlers

mod containers;
mod entropy;
mod health;
mod scenarios;
mod services;

pub use containers::*;
pub use entropy::*;
pub use health::*;
pub use scenarios::*;
pub use services::*;
