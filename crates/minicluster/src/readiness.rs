//! Readiness probing for a freshly started front end.

use log::{debug, info, warn};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::MiniClusterError;
use crate::frontend::SessionClient;

pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(1000);

pub const PROBE_USER: &str = "foo";
pub const PROBE_PASSWORD: &str = "bar";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_PROBE_INTERVAL,
            timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }
}

impl ProbeSettings {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    pub fn validate(&self) -> Result<(), MiniClusterError> {
        if self.interval.is_zero() {
            return Err(MiniClusterError::configuration(
                "readiness probe interval must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Polls a front end with trial sessions until one opens or time runs out.
pub struct ReadinessProbe<'a> {
    client: &'a dyn SessionClient,
    endpoint: String,
    settings: ProbeSettings,
}

impl<'a> ReadinessProbe<'a> {
    pub fn new(
        client: &'a dyn SessionClient,
        endpoint: impl Into<String>,
        settings: ProbeSettings,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            settings,
        }
    }

    /// Wait at most the configured timeout.
    pub async fn wait(&self) -> Result<u32, MiniClusterError> {
        self.wait_until(Instant::now() + self.settings.timeout).await
    }

    /// Probe until a session opens, returning the number of attempts made.
    ///
    /// Each round sleeps one interval first, then gives up if the deadline
    /// has passed. An attempt in flight is cut off at the deadline.
    pub async fn wait_until(&self, deadline: Instant) -> Result<u32, MiniClusterError> {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            tokio::time::sleep(self.settings.interval).await;
            if Instant::now() >= deadline {
                return Err(MiniClusterError::StartupTimeout {
                    endpoint: self.endpoint.clone(),
                    waited: started.elapsed(),
                });
            }

            attempts += 1;
            let attempt = tokio::time::timeout_at(
                deadline,
                self.client.open_session(PROBE_USER, PROBE_PASSWORD),
            )
            .await;

            match attempt {
                Ok(Ok(session)) => {
                    if let Err(e) = self.client.close_session(session).await {
                        warn!("Probe session opened but failed to close: {e}");
                    }
                    info!(
                        "Front end at {} ready after {attempts} attempt(s)",
                        self.endpoint
                    );
                    return Ok(attempts);
                }
                Ok(Err(e)) => debug!("Readiness attempt {attempts} failed: {e}"),
                Err(_) => debug!("Readiness attempt {attempts} cut off at deadline"),
            }
        }
    }
}
