//! # Session Configuration
//!
//! Immutable inputs to a [`ProvisioningSession`](crate::session::ProvisioningSession).
//!
//! Addresses are parsed into [`Address`], whose only constructor validates that
//! the URL carries both a host and a port. A [`SessionConfig`] can therefore never
//! hold an address the target environments cannot wire up, and malformed input is
//! rejected before any file is written or any container is started.
//!
//! ```rust
//! use gatewayctl::config::Address;
//!
//! let serve: Address = "http://demo.local:9080".parse().unwrap();
//! assert_eq!(serve.host(), "demo.local");
//! assert_eq!(serve.port(), 9080);
//!
//! // Scheme default ports count as a port.
//! let plain: Address = "http://demo.local".parse().unwrap();
//! assert_eq!(plain.port(), 80);
//!
//! assert!("demo.local:9080".parse::<Address>().is_err());
//! ```

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Placeholder replaced by the current process id in path templates.
pub const PID_PLACEHOLDER: &str = "<pid>";

/// Why a string was rejected as an [`Address`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Not a URL at all.
    #[error("invalid URL '{input}': {source}")]
    Parse {
        input: String,
        #[source]
        source: url::ParseError,
    },
    /// URL without a host, e.g. `file:///tmp` or `mailto:x`.
    #[error("URL '{0}' has no host")]
    MissingHost(String),
    /// URL with a scheme that has no known default port and no explicit one.
    #[error("URL '{0}' has no port and its scheme has no default port")]
    MissingPort(String),
}

/// An absolute URL known to have a host and a port.
///
/// Displays as the operator wrote it: `http://demo.local:9080` stays without
/// the trailing `/` that [`Url`] serialization would add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    url: Url,
    host: String,
    port: u16,
    text: String,
}

impl Address {
    /// Validate an already parsed URL.
    pub fn from_url(url: Url) -> Result<Self, AddressError> {
        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => return Err(AddressError::MissingHost(url.to_string())),
        };
        let port = url
            .port_or_known_default()
            .ok_or_else(|| AddressError::MissingPort(url.to_string()))?;
        let text = url.as_str().to_string();
        Ok(Self {
            url,
            host,
            port,
            text,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Hostname without port, e.g. `demo.local`.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit port, or the scheme's default when none was given.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s).map_err(|source| AddressError::Parse {
            input: s.to_string(),
            source,
        })?;
        let mut addr = Self::from_url(url)?;
        addr.text = s.trim().to_string();
        Ok(addr)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Replace every [`PID_PLACEHOLDER`] in `template` with `pid`.
pub fn expand_pid_template(template: &str, pid: u32) -> PathBuf {
    PathBuf::from(template.replace(PID_PLACEHOLDER, &pid.to_string()))
}

/// Everything a provisioning session needs to know up front.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Address the gateway listens on.
    pub listen_addr: Address,
    /// Address of the backend application being served.
    pub serve_addr: Address,
    /// Swagger/OpenAPI file fed to the translator.
    pub swagger_file: PathBuf,
    /// Where generated gateway config goes. `None` means a fresh
    /// directory inside the scratch space.
    pub gen_config_dir: Option<PathBuf>,
    /// Where the mesh config is written. `None` means inside the scratch space.
    pub mesh_config_file: Option<PathBuf>,
    /// Generate everything, apply nothing.
    pub dry_run: bool,
    /// Leave applied config in place after termination.
    pub skip_revert: bool,
    /// Scratch directory template; [`PID_PLACEHOLDER`] is expanded at session start.
    pub scratch_template: String,
}

impl SessionConfig {
    pub fn new(listen_addr: Address, serve_addr: Address, swagger_file: impl Into<PathBuf>) -> Self {
        Self {
            listen_addr,
            serve_addr,
            swagger_file: swagger_file.into(),
            gen_config_dir: None,
            mesh_config_file: None,
            dry_run: false,
            skip_revert: false,
            scratch_template: crate::runtime_config::DEFAULT_SCRATCH_DIR.to_string(),
        }
    }

    pub fn with_gen_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.gen_config_dir = Some(dir.into());
        self
    }

    pub fn with_mesh_config_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.mesh_config_file = Some(file.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_skip_revert(mut self, skip_revert: bool) -> Self {
        self.skip_revert = skip_revert;
        self
    }

    pub fn with_scratch_template(mut self, template: impl Into<String>) -> Self {
        self.scratch_template = template.into();
        self
    }

    /// Checks that [`Address`] cannot guarantee on its own.
    ///
    /// The scratch template must contain [`PID_PLACEHOLDER`]: the scratch
    /// directory is removed recursively at session end, so it has to be a
    /// path only this process owns.
    pub fn validate(&self) -> Result<(), String> {
        if !self.scratch_template.contains(PID_PLACEHOLDER) {
            return Err(format!(
                "scratch directory template '{}' must contain '{PID_PLACEHOLDER}'",
                self.scratch_template
            ));
        }
        if !is_file(&self.swagger_file) {
            return Err(format!(
                "swagger file '{}' does not exist or is not a file",
                self.swagger_file.display()
            ));
        }
        Ok(())
    }
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}
