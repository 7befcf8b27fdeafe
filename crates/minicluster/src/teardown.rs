//! Best-effort, ordered shutdown.

use log::{info, warn};
use std::fmt;

use crate::service::ManagedService;

/// A service that failed to stop cleanly.
#[derive(Debug, Clone, PartialEq)]
pub struct TeardownWarning {
    pub service: String,
    pub reason: String,
}

impl fmt::Display for TeardownWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.service, self.reason)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeardownReport {
    pub stopped: Vec<String>,
    pub warnings: Vec<TeardownWarning>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.stopped.is_empty() && self.warnings.is_empty()
    }
}

/// Stop every service in the given order. A failure is recorded and the
/// remaining services are still stopped.
pub async fn stop_in_order(services: Vec<Box<dyn ManagedService>>) -> TeardownReport {
    let mut report = TeardownReport::default();
    for mut service in services {
        let name = service.name();
        match service.shutdown().await {
            Ok(()) => {
                info!("Stopped {name}");
                report.stopped.push(name.to_string());
            }
            Err(e) => {
                warn!("Failed to stop {name}: {e}");
                report.warnings.push(TeardownWarning {
                    service: name.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MiniClusterError;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct MockService {
        name: &'static str,
        fail: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl ManagedService for MockService {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_running(&self) -> bool {
            true
        }

        async fn shutdown(&mut self) -> Result<(), MiniClusterError> {
            self.log.lock().unwrap().push(self.name);
            if self.fail {
                return Err(MiniClusterError::from_shutdown_error("boom", self.name));
            }
            Ok(())
        }
    }

    fn mock(
        name: &'static str,
        fail: bool,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Box<dyn ManagedService> {
        Box::new(MockService {
            name,
            fail,
            log: Arc::clone(log),
        })
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_remaining_services() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let report = stop_in_order(vec![
            mock("front end", true, &log),
            mock("compute", false, &log),
            mock("dfs", false, &log),
        ])
        .await;

        assert_eq!(*log.lock().unwrap(), vec!["front end", "compute", "dfs"]);
        assert_eq!(report.stopped, vec!["compute", "dfs"]);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].service, "front end");
        assert!(report.warnings[0].reason.contains("boom"));
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_nothing_to_stop() {
        let report = stop_in_order(Vec::new()).await;
        assert!(report.is_empty());
        assert!(report.is_clean());
    }
}
