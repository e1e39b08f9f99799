//! Circuit breaker to prevent cascade failures.
//!
//! When a recognition stage fails repeatedly, its circuit opens and
//! subsequent inspections skip the external engine until it has had time
//! to recover.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// A pipeline stage backed by an external engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Optical character recognition (image to text)
    TextRecognition,

    /// Named-entity recognition (text to labeled values)
    EntityRecognition,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::TextRecognition => f.write_str("text recognition"),
            Stage::EntityRecognition => f.write_str("entity recognition"),
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit
    pub failure_threshold: u32,

    /// Time before attempting recovery
    #[serde(with = "crate::config::duration_str")]
    pub recovery_timeout: Duration,

    /// Successes needed to close the circuit again
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

/// State of a circuit.
#[derive(Debug, Clone)]
pub enum CircuitState {
    /// Normal operation
    Closed { failures: u32 },

    /// Circuit is open, calls bypass the engine
    Open { opened_at: Instant },

    /// Testing if circuit can close
    HalfOpen { successes: u32 },
}

/// Circuit breaker, one circuit per stage.
pub struct CircuitBreaker {
    states: RwLock<HashMap<Stage, CircuitState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Check if the circuit is open for a stage.
    ///
    /// An open circuit whose recovery timeout has passed moves to half-open
    /// and lets the call through.
    pub fn is_open(&self, stage: Stage) -> bool {
        let states = self.states.read();
        match states.get(&stage) {
            Some(CircuitState::Open { opened_at }) => {
                if opened_at.elapsed() >= self.config.recovery_timeout {
                    drop(states);
                    self.transition_to_half_open(stage);
                    false
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    /// Record a successful engine call.
    pub fn record_success(&self, stage: Stage) {
        let mut states = self.states.write();
        match states.get(&stage).cloned() {
            Some(CircuitState::HalfOpen { successes }) => {
                if successes + 1 >= self.config.success_threshold {
                    states.insert(stage, CircuitState::Closed { failures: 0 });
                    tracing::info!(stage = %stage, "Circuit closed after successful recovery");
                } else {
                    states.insert(
                        stage,
                        CircuitState::HalfOpen {
                            successes: successes + 1,
                        },
                    );
                }
            }
            Some(CircuitState::Closed { .. }) => {
                states.insert(stage, CircuitState::Closed { failures: 0 });
            }
            _ => {}
        }
    }

    /// Record a failed or timed-out engine call.
    pub fn record_failure(&self, stage: Stage) {
        let mut states = self.states.write();
        let current = states
            .get(&stage)
            .cloned()
            .unwrap_or(CircuitState::Closed { failures: 0 });

        match current {
            CircuitState::Closed { failures } => {
                if failures + 1 >= self.config.failure_threshold {
                    states.insert(
                        stage,
                        CircuitState::Open {
                            opened_at: Instant::now(),
                        },
                    );
                    tracing::warn!(
                        stage = %stage,
                        failures = failures + 1,
                        "Circuit opened after repeated failures"
                    );
                } else {
                    states.insert(
                        stage,
                        CircuitState::Closed {
                            failures: failures + 1,
                        },
                    );
                }
            }
            CircuitState::HalfOpen { .. } => {
                states.insert(
                    stage,
                    CircuitState::Open {
                        opened_at: Instant::now(),
                    },
                );
                tracing::warn!(stage = %stage, "Circuit reopened after failed recovery attempt");
            }
            CircuitState::Open { .. } => {}
        }
    }

    fn transition_to_half_open(&self, stage: Stage) {
        let mut states = self.states.write();
        if matches!(states.get(&stage), Some(CircuitState::Open { .. })) {
            states.insert(stage, CircuitState::HalfOpen { successes: 0 });
            tracing::info!(stage = %stage, "Circuit half-open, allowing a recovery attempt");
        }
    }

    /// Current state of a stage's circuit.
    pub fn state(&self, stage: Stage) -> CircuitState {
        self.states
            .read()
            .get(&stage)
            .cloned()
            .unwrap_or(CircuitState::Closed { failures: 0 })
    }

    /// Reset all circuits to closed.
    pub fn reset(&self) {
        self.states.write().clear();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
