//! Load-balanced container service configuration.

use super::{ManagedPolicy, ServiceRef};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// The container the service runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSpec {
    /// Container name; the deployment manifest refers to it.
    pub name: String,
    /// Initial image reference, replaced by each deployment.
    pub image: String,
    /// Port the container listens on.
    pub port: u16,
}

impl Default for ContainerSpec {
    fn default() -> Self {
        Self {
            name: "monthly-payslip-with-cdk".to_string(),
            image: "timxii/monthlypayslip:latest".to_string(),
            port: 8080,
        }
    }
}

/// A container service behind an application load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerService {
    /// Cluster name.
    pub cluster_name: String,
    /// Service name.
    pub service_name: String,
    /// CPU units (1024 = one vCPU).
    pub cpu: u32,
    /// Memory in MiB.
    pub memory_mib: u32,
    /// Number of tasks to keep running.
    pub desired_count: u32,
    /// Give tasks public IP addresses.
    pub assign_public_ip: bool,
    /// Put the load balancer on the internet.
    pub public_load_balancer: bool,
    /// Load balancer listener port.
    pub listener_port: u16,
    /// The container.
    pub container: ContainerSpec,
    /// Policies attached to the task execution role.
    pub execution_policies: Vec<ManagedPolicy>,
}

impl Default for ContainerService {
    fn default() -> Self {
        Self {
            cluster_name: "payslip-cluster".to_string(),
            service_name: "myLbFargateService".to_string(),
            cpu: 256,
            memory_mib: 512,
            desired_count: 1,
            assign_public_ip: true,
            public_load_balancer: true,
            listener_port: 80,
            container: ContainerSpec::default(),
            execution_policies: vec![ManagedPolicy::ContainerRegistryPowerUser],
        }
    }
}

/// Returns the memory sizes (MiB) the platform accepts for `cpu` units.
fn memory_options(cpu: u32) -> Option<Vec<u32>> {
    let options = match cpu {
        256 => vec![512, 1024, 2048],
        512 => (1..=4).map(|gb| gb * 1024).collect(),
        1024 => (2..=8).map(|gb| gb * 1024).collect(),
        2048 => (4..=16).map(|gb| gb * 1024).collect(),
        4096 => (8..=30).map(|gb| gb * 1024).collect(),
        _ => return None,
    };
    Some(options)
}

impl ContainerService {
    /// Returns the reference the deploy action targets.
    #[must_use]
    pub fn service_ref(&self) -> ServiceRef {
        ServiceRef::new(&self.cluster_name, &self.service_name)
    }

    /// Checks sizing and naming against the container platform.
    ///
    /// # Errors
    ///
    /// Returns an error for an unsupported CPU/memory pairing, a zero port,
    /// or blank names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("service.cluster_name", &self.cluster_name),
            ("service.service_name", &self.service_name),
            ("service.container.name", &self.container.name),
            ("service.container.image", &self.container.image),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid(field, "must not be empty"));
            }
        }

        let options = memory_options(self.cpu).ok_or_else(|| {
            ConfigError::invalid(
                "service.cpu",
                format!("{} is not one of 256, 512, 1024, 2048, 4096", self.cpu),
            )
        })?;
        if !options.contains(&self.memory_mib) {
            return Err(ConfigError::invalid(
                "service.memory_mib",
                format!("{} MiB is not available with {} CPU units", self.memory_mib, self.cpu),
            ));
        }

        if self.container.port == 0 || self.listener_port == 0 {
            return Err(ConfigError::invalid("service.container.port", "ports must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_is_valid() {
        let service = ContainerService::default();
        assert!(service.validate().is_ok());
        assert_eq!(service.service_ref().to_string(), "payslip-cluster/myLbFargateService");
    }

    #[test]
    fn test_cpu_memory_pairing() {
        let mut service = ContainerService::default();
        service.cpu = 1024;
        service.memory_mib = 512;
        let err = service.validate().unwrap_err();
        assert!(err.to_string().contains("service.memory_mib"));

        service.memory_mib = 2048;
        assert!(service.validate().is_ok());

        service.cpu = 300;
        assert!(service.validate().unwrap_err().to_string().contains("service.cpu"));
    }

    #[test]
    fn test_blank_image_rejected() {
        let mut service = ContainerService::default();
        service.container.image = String::new();
        assert!(service.validate().is_err());
    }
}
