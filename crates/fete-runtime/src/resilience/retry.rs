//! Retry with exponential backoff.

use backon::ExponentialBuilder;

use crate::config::RetryConfig;

/// Backoff schedule for a retry policy: the initial delay, doubled on each
/// retry, at most `max_retries` times.
pub fn backoff(config: &RetryConfig) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_factor(2.0)
        .with_max_times(config.max_retries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use backon::BackoffBuilder;
    use std::time::Duration;

    #[test]
    fn test_backoff_doubles_and_stops() {
        let config = RetryConfig {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
        };
        let delays: Vec<Duration> = backoff(&config).build().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
            ]
        );
    }

    #[test]
    fn test_zero_retries() {
        let config = RetryConfig {
            max_retries: 0,
            initial_delay: Duration::from_millis(100),
        };
        assert_eq!(backoff(&config).build().count(), 0);
    }
}
