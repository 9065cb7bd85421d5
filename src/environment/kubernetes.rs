//! Kubernetes environment.
//!
//! Generated manifests are applied with `kubectl apply -f <config-dir>` and
//! deleted with the matching `kubectl delete`. With `deploy_istio` set, the
//! Istio control plane is installed with `istioctl` before the manifests
//! and uninstalled after they are deleted.

use super::templates::{self, ServiceEntryHost};
use super::{remove_artifact, write_artifact, EnvironmentError, ProvisionContext, TargetEnvironment};
use crate::exec::{CommandRunner, CommandSpec};
use crate::runtime_config::RuntimeConfig;
use std::sync::Arc;
use tracing::{error, info};

/// Istio install profile used for `--deploy-istio`.
pub const ISTIO_PROFILE: &str = "preview";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSettings {
    pub kubectl_bin: String,
    pub istioctl_bin: String,
    /// Namespace manifests are applied to.
    pub namespace: String,
    /// Install (and later uninstall) the Istio control plane.
    pub deploy_istio: bool,
}

impl ClusterSettings {
    pub fn from_runtime(config: &RuntimeConfig, namespace: impl Into<String>, deploy_istio: bool) -> Self {
        Self {
            kubectl_bin: config.kubectl_bin.clone(),
            istioctl_bin: config.istioctl_bin.clone(),
            namespace: namespace.into(),
            deploy_istio,
        }
    }
}

pub struct ClusterEnvironment {
    settings: ClusterSettings,
    runner: Arc<dyn CommandRunner>,
    control_plane_installed: bool,
    manifests_submitted: bool,
}

impl ClusterEnvironment {
    pub fn new(settings: ClusterSettings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            settings,
            runner,
            control_plane_installed: false,
            manifests_submitted: false,
        }
    }

    fn run(&self, command: CommandSpec) -> Result<(), EnvironmentError> {
        info!(command = %command, "running");
        self.runner.run(&command)?;
        Ok(())
    }

    fn kubectl(&self, verb: &str) -> CommandSpec {
        CommandSpec::new(&self.settings.kubectl_bin)
            .arg(verb)
            .arg("--namespace")
            .arg(&self.settings.namespace)
    }

    fn install_control_plane(&self) -> Result<(), EnvironmentError> {
        self.run(
            CommandSpec::new(&self.settings.istioctl_bin)
                .args(["install", "--skip-confirmation", "--set"])
                .arg(format!("profile={ISTIO_PROFILE}")),
        )
    }

    fn uninstall_control_plane(&self) -> Result<(), EnvironmentError> {
        self.run(
            CommandSpec::new(&self.settings.istioctl_bin).args(["uninstall", "--purge", "--skip-confirmation"]),
        )
    }
}

impl TargetEnvironment for ClusterEnvironment {
    fn name(&self) -> &'static str {
        "kubernetes"
    }

    fn generate_env_config(&mut self, ctx: &ProvisionContext<'_>) -> Result<(), EnvironmentError> {
        let entry = templates::render_service_entry(&ServiceEntryHost {
            host: ctx.serve_addr.host(),
            port: ctx.serve_addr.port(),
        })?;
        write_artifact(&ctx.service_entry_file(), &entry)
    }

    fn apply_config(&mut self, ctx: &ProvisionContext<'_>) -> Result<(), EnvironmentError> {
        if self.settings.deploy_istio {
            // Marked before running: a half-finished install still needs uninstalling.
            self.control_plane_installed = true;
            self.install_control_plane()?;
            info!("installed istio control plane");
        }
        self.manifests_submitted = true;
        self.run(
            self.kubectl("apply")
                .arg("-f")
                .arg(ctx.bundle.config_dir.to_string_lossy()),
        )
    }

    fn revert_config(&mut self, ctx: &ProvisionContext<'_>) -> Result<(), EnvironmentError> {
        let mut first_err = None;

        if std::mem::take(&mut self.manifests_submitted) {
            let delete = self
                .kubectl("delete")
                .arg("--ignore-not-found")
                .arg("-f")
                .arg(ctx.bundle.config_dir.to_string_lossy());
            if let Err(e) = self.run(delete) {
                error!(error = %e, "unable to delete applied manifests");
                first_err.get_or_insert(e);
            }
        }

        if std::mem::take(&mut self.control_plane_installed) {
            if let Err(e) = self.uninstall_control_plane() {
                error!(error = %e, "unable to uninstall istio control plane");
                first_err.get_or_insert(e);
            }
        }

        // After `kubectl delete`, which reads the manifests from disk.
        if let Err(e) = remove_artifact(&ctx.service_entry_file()) {
            error!(error = %e, "unable to remove generated artifact");
            first_err.get_or_insert(e);
        }

        first_err.map_or(Ok(()), Err)
    }
}
