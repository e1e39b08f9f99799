//! Resilience patterns for fete-runtime.
//!
//! This module provides:
//! - Circuit breaker per recognition stage
//! - Retry with exponential backoff for text recognition

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState, Stage};
pub use retry::backoff;
