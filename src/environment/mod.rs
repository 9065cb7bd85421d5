//! # Target Environments
//!
//! A target environment turns the generated gateway configuration into
//! running infrastructure and removes it again. The session drives every
//! environment through the same three verbs:
//!
//! | Verb | May touch | Must retain |
//! |------|-----------|-------------|
//! | [`generate_env_config`](TargetEnvironment::generate_env_config) | local files only | nothing |
//! | [`apply_config`](TargetEnvironment::apply_config) | containers, clusters | whatever revert needs |
//! | [`revert_config`](TargetEnvironment::revert_config) | what apply created | nothing |
//!
//! ## Implementations
//!
//! - [`LocalContainerEnvironment`] - `pilot-discovery` and `pilot-agent`
//!   containers on the local Docker daemon
//! - [`ClusterEnvironment`] - manifests applied with `kubectl`, optionally
//!   with an Istio control plane installed by `istioctl`
//!
//! ## Revert After Partial Apply
//!
//! When apply fails the session calls revert straight away. An environment
//! must therefore cope with being reverted in any state: after a partial
//! apply, after a failed apply, or without apply having run at all. Only
//! failures removing something that is known to exist are errors.

mod kubernetes;
mod local;
pub mod templates;

pub use kubernetes::{ClusterEnvironment, ClusterSettings};
pub use local::{LocalContainerEnvironment, LocalSettings, PILOT_AGENT_HOSTNAME, PILOT_DISCOVERY_HOSTNAME};

use crate::config::Address;
use crate::exec::ExecError;
use crate::generator::GeneratedConfigBundle;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the service registration manifest inside the config dir.
pub const SERVICE_ENTRY_FILE: &str = "service-entry.yaml";

/// Everything an environment verb gets to see.
#[derive(Debug, Clone, Copy)]
pub struct ProvisionContext<'a> {
    pub bundle: &'a GeneratedConfigBundle,
    pub listen_addr: &'a Address,
    pub serve_addr: &'a Address,
}

impl ProvisionContext<'_> {
    pub fn service_entry_file(&self) -> PathBuf {
        self.bundle.config_dir.join(SERVICE_ENTRY_FILE)
    }
}

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("unable to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to remove '{}': {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("template rendering failed: {0}")]
    Template(#[from] minijinja::Error),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("`{command}` succeeded but printed no container id")]
    MissingContainerId { command: String },
}

/// Environment-specific materialization of generated gateway config.
pub trait TargetEnvironment {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Write environment-specific artifacts. Local files only.
    fn generate_env_config(&mut self, ctx: &ProvisionContext<'_>) -> Result<(), EnvironmentError>;

    /// Bring the configuration up.
    fn apply_config(&mut self, ctx: &ProvisionContext<'_>) -> Result<(), EnvironmentError>;

    /// Tear down whatever apply brought up and remove generated artifacts.
    fn revert_config(&mut self, ctx: &ProvisionContext<'_>) -> Result<(), EnvironmentError>;
}

pub(crate) fn write_artifact(path: &Path, contents: &str) -> Result<(), EnvironmentError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| EnvironmentError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| EnvironmentError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Remove a generated file. A file that is already gone is fine.
pub(crate) fn remove_artifact(path: &Path) -> Result<(), EnvironmentError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(EnvironmentError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}
