//! Services manager for long-running services.
//!
//! Services register with the manager and are started/stopped together.
//! Start order respects [dependencies](Service::dependencies); a service is only
//! started after all of its dependencies. Stop runs in reverse start order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Health status of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of a service health check.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ServiceHealth {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
        }
    }
}

/// A service that can be started, stopped and health-checked by the manager.
///
/// Use [tracing] for lifecycle logging and include the service name as a
/// field (e.g. `tracing::info!(service = "database", "Started")`).
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Unique name for logging and lookup (e.g. "database", "events").
    fn name(&self) -> &str;

    /// Names of services that must be started before this one.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    async fn start(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    async fn health(&self) -> Result<ServiceHealth> {
        Ok(ServiceHealth::healthy())
    }
}

/// Owns the registered services and their start order.
#[derive(Default)]
pub struct ServicesManager {
    services: Vec<Arc<dyn Service>>,
    started: RwLock<Vec<String>>,
}

impl ServicesManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service. Names must be unique.
    pub fn register(&mut self, service: Arc<dyn Service>) -> Result<()> {
        if self.services.iter().any(|s| s.name() == service.name()) {
            return Err(anyhow!("service '{}' registered twice", service.name()));
        }
        self.services.push(service);
        Ok(())
    }

    /// Registered services ordered so every dependency precedes its dependents.
    fn start_order(&self) -> Result<Vec<Arc<dyn Service>>> {
        let by_name: HashMap<&str, &Arc<dyn Service>> =
            self.services.iter().map(|s| (s.name(), s)).collect();

        let mut ordered: Vec<Arc<dyn Service>> = Vec::with_capacity(self.services.len());
        let mut done: HashSet<String> = HashSet::new();

        while ordered.len() < self.services.len() {
            let ready = self.services.iter().find(|s| {
                !done.contains(s.name())
                    && s.dependencies().iter().all(|d| done.contains(d.as_str()))
            });

            match ready {
                Some(service) => {
                    done.insert(service.name().to_string());
                    ordered.push(service.clone());
                }
                None => {
                    let blocked: Vec<String> = self
                        .services
                        .iter()
                        .filter(|s| !done.contains(s.name()))
                        .map(|s| {
                            let missing: Vec<String> = s
                                .dependencies()
                                .into_iter()
                                .filter(|d| !by_name.contains_key(d.as_str()))
                                .collect();
                            if missing.is_empty() {
                                s.name().to_string()
                            } else {
                                format!("{} (missing: {})", s.name(), missing.join(", "))
                            }
                        })
                        .collect();
                    return Err(anyhow!(
                        "cannot order services, unresolved dependencies: {}",
                        blocked.join("; ")
                    ));
                }
            }
        }

        Ok(ordered)
    }

    /// Start every service in dependency order.
    pub async fn start_all(&self) -> Result<()> {
        for service in self.start_order()? {
            let name = service.name().to_string();
            service
                .start()
                .await
                .with_context(|| format!("failed to start service '{}'", name))?;
            info!(service = %name, "Service started");
            self.started.write().await.push(name);
        }
        Ok(())
    }

    /// Stop started services in reverse order. Errors are logged, not returned,
    /// so one failing service does not keep the others running.
    pub async fn stop_all(&self) {
        let started: Vec<String> = self.started.write().await.drain(..).rev().collect();
        for name in started {
            let Some(service) = self.services.iter().find(|s| s.name() == name) else {
                continue;
            };
            match service.stop().await {
                Ok(()) => info!(service = %name, "Service stopped"),
                Err(e) => warn!(service = %name, error = %e, "Service failed to stop"),
            }
        }
    }

    /// Health of every registered service, keyed by name.
    pub async fn health_all(&self) -> HashMap<String, ServiceHealth> {
        let mut report = HashMap::new();
        for service in &self.services {
            let health = match service.health().await {
                Ok(h) => h,
                Err(e) => ServiceHealth::unhealthy(e.to_string()),
            };
            report.insert(service.name().to_string(), health);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use super::*;

    struct Recorder {
        name: &'static str,
        deps: Vec<&'static str>,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Service for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn dependencies(&self) -> Vec<String> {
            self.deps.iter().map(|d| d.to_string()).collect()
        }

        async fn start(&self) -> Result<()> {
            self.log.lock().push(format!("start {}", self.name));
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            self.log.lock().push(format!("stop {}", self.name));
            Ok(())
        }
    }

    fn recorder(
        name: &'static str,
        deps: &[&'static str],
        log: &Arc<Mutex<Vec<String>>>,
    ) -> Arc<dyn Service> {
        Arc::new(Recorder {
            name,
            deps: deps.to_vec(),
            log: log.clone(),
        })
    }

    #[tokio::test]
    async fn starts_in_dependency_order_and_stops_in_reverse() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = ServicesManager::new();
        manager.register(recorder("graphql", &["database", "events"], &log)).unwrap();
        manager.register(recorder("events", &[], &log)).unwrap();
        manager.register(recorder("database", &[], &log)).unwrap();

        manager.start_all().await.unwrap();
        manager.stop_all().await;

        assert_eq!(
            *log.lock(),
            vec![
                "start events",
                "start database",
                "start graphql",
                "stop graphql",
                "stop database",
                "stop events",
            ]
        );
    }

    #[tokio::test]
    async fn missing_dependency_is_reported() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = ServicesManager::new();
        manager.register(recorder("graphql", &["database"], &log)).unwrap();

        let err = manager.start_all().await.unwrap_err();
        assert!(err.to_string().contains("graphql (missing: database)"));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = ServicesManager::new();
        manager.register(recorder("events", &[], &log)).unwrap();
        assert!(manager.register(recorder("events", &[], &log)).is_err());
    }

    #[tokio::test]
    async fn health_reports_every_service() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = ServicesManager::new();
        manager.register(recorder("events", &[], &log)).unwrap();

        let report = manager.health_all().await;
        assert_eq!(report["events"].status, HealthStatus::Healthy);
    }
}
