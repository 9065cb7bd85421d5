//! # Runtime Configuration Module
//!
//! Environment variable based configuration for the external tools gatewayctl
//! drives. None of these are needed in the common case; they exist so a
//! non-standard install (or a test) can point gatewayctl at other binaries.
//!
//! ## Environment Variables
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GATEWAYCTL_TRANSLATOR_BIN` | `/usr/local/bin/gen-istio-swagger` |
//! | `GATEWAYCTL_DOCKER_BIN` | `docker` |
//! | `GATEWAYCTL_KUBECTL_BIN` | `kubectl` |
//! | `GATEWAYCTL_ISTIOCTL_BIN` | `istioctl` |
//! | `GATEWAYCTL_SCRATCH_DIR` | `/tmp/gatewayctl/api-server/<pid>` |
//! | `GATEWAYCTL_DISCOVERY_IMAGE` | `docker.io/istio/pilot:latest` |
//! | `GATEWAYCTL_PROXY_IMAGE` | `docker.io/istio/proxyv2:latest` |
//!
//! Empty values are treated as unset.
//!
//! ## Usage
//!
//! ```rust
//! use gatewayctl::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("translator: {}", config.translator_bin);
//! ```

use std::env;

/// Scratch directory template; `<pid>` is replaced with the process id.
pub const DEFAULT_SCRATCH_DIR: &str = "/tmp/gatewayctl/api-server/<pid>";

/// Default location of the Swagger → Istio translator.
pub const DEFAULT_TRANSLATOR_BIN: &str = "/usr/local/bin/gen-istio-swagger";

pub const DEFAULT_DISCOVERY_IMAGE: &str = "docker.io/istio/pilot:latest";
pub const DEFAULT_PROXY_IMAGE: &str = "docker.io/istio/proxyv2:latest";

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub translator_bin: String,
    pub docker_bin: String,
    pub kubectl_bin: String,
    pub istioctl_bin: String,
    pub scratch_template: String,
    pub discovery_image: String,
    pub proxy_image: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        RuntimeConfig {
            translator_bin: get("GATEWAYCTL_TRANSLATOR_BIN", DEFAULT_TRANSLATOR_BIN),
            docker_bin: get("GATEWAYCTL_DOCKER_BIN", "docker"),
            kubectl_bin: get("GATEWAYCTL_KUBECTL_BIN", "kubectl"),
            istioctl_bin: get("GATEWAYCTL_ISTIOCTL_BIN", "istioctl"),
            scratch_template: get("GATEWAYCTL_SCRATCH_DIR", DEFAULT_SCRATCH_DIR),
            discovery_image: get("GATEWAYCTL_DISCOVERY_IMAGE", DEFAULT_DISCOVERY_IMAGE),
            proxy_image: get("GATEWAYCTL_PROXY_IMAGE", DEFAULT_PROXY_IMAGE),
        }
    }
}
