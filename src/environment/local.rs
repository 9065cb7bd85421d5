//! Local Docker environment.
//!
//! Runs Istio's discovery component (`pilot-discovery`) and an Envoy proxy
//! (`pilot-agent` in router mode) as two containers on the default bridge
//! network:
//!
//! ```text
//!   host :<listen-port> ──► pilot-agent ──xDS──► pilot-discovery
//!                               │                    ▲
//!                               ▼                    │ fs config source
//!                         <backend host>      <config-dir>, mesh-config
//! ```
//!
//! The backend must be a container on the same bridge network whose name
//! matches the serve address hostname; both containers are `--link`ed to it.

use super::templates::{self, ServiceEntryHost, CONFIG_MOUNT_PATH, MESH_CONFIG_MOUNT_PATH};
use super::{remove_artifact, write_artifact, EnvironmentError, ProvisionContext, TargetEnvironment};
use crate::exec::{CommandRunner, CommandSpec};
use crate::runtime_config::RuntimeConfig;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

pub const PILOT_DISCOVERY_HOSTNAME: &str = "pilot-discovery";
pub const PILOT_AGENT_HOSTNAME: &str = "pilot-agent";

const AGENT_ENV: &[&str] = &[
    "ENABLE_CA_SERVER=false",
    "FILE_MOUNTED_CERTS=true",
    "ISTIO_META_NAMESPACE=default",
    r#"ISTIO_METAJSON_LABELS={"app": "istio-ingressgateway", "api": "demo"}"#,
];

/// Docker binary, images and network used by [`LocalContainerEnvironment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSettings {
    pub docker_bin: String,
    pub discovery_image: String,
    pub proxy_image: String,
    pub network: String,
}

impl LocalSettings {
    pub fn from_runtime(config: &RuntimeConfig) -> Self {
        Self {
            docker_bin: config.docker_bin.clone(),
            discovery_image: config.discovery_image.clone(),
            proxy_image: config.proxy_image.clone(),
            network: "bridge".to_string(),
        }
    }
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self::from_runtime(&RuntimeConfig::default())
    }
}

pub struct LocalContainerEnvironment {
    settings: LocalSettings,
    runner: Arc<dyn CommandRunner>,
    discovery_container: Option<String>,
    agent_container: Option<String>,
}

impl LocalContainerEnvironment {
    pub fn new(settings: LocalSettings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            settings,
            runner,
            discovery_container: None,
            agent_container: None,
        }
    }

    /// Id of the running discovery container, if apply got that far.
    pub fn discovery_container(&self) -> Option<&str> {
        self.discovery_container.as_deref()
    }

    /// Id of the running proxy container, if apply got that far.
    pub fn agent_container(&self) -> Option<&str> {
        self.agent_container.as_deref()
    }

    fn docker(&self) -> CommandSpec {
        CommandSpec::new(&self.settings.docker_bin)
    }

    fn pull(&self, image: &str) -> Result<(), EnvironmentError> {
        debug!(image, "pulling docker image");
        self.runner.run(&self.docker().arg("pull").arg(image))?;
        Ok(())
    }

    /// `docker run --detach` and return the new container id.
    fn run_detached(&self, command: CommandSpec) -> Result<String, EnvironmentError> {
        let output = self.runner.run(&command)?;
        // `docker run -d` may print pull progress first; the id is the last line.
        output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .map(str::to_string)
            .ok_or_else(|| EnvironmentError::MissingContainerId {
                command: command.to_string(),
            })
    }

    fn base_run(&self, name: &str) -> CommandSpec {
        self.docker().args([
            "run",
            "--detach",
            "--rm",
            "--name",
            name,
            "--hostname",
            name,
            "--network",
            self.settings.network.as_str(),
        ])
    }

    fn discovery_command(&self, ctx: &ProvisionContext<'_>) -> CommandSpec {
        let mut cmd = self.base_run(PILOT_DISCOVERY_HOSTNAME);
        if let Some(link) = backend_link(ctx.serve_addr.host()) {
            cmd = cmd.arg("--link").arg(link);
        }
        cmd.arg("--volume")
            .arg(bind(&ctx.bundle.config_dir, CONFIG_MOUNT_PATH))
            .arg("--volume")
            .arg(bind(&ctx.bundle.mesh_config_file, MESH_CONFIG_MOUNT_PATH))
            .arg(&self.settings.discovery_image)
            .args(["discovery", "--registries=", "--log_output_level=debug"])
    }

    fn agent_command(&self, ctx: &ProvisionContext<'_>) -> CommandSpec {
        let port = ctx.listen_addr.port();
        let mut cmd = self
            .base_run(PILOT_AGENT_HOSTNAME)
            .arg("--link")
            .arg(format!("{PILOT_DISCOVERY_HOSTNAME}:{PILOT_DISCOVERY_HOSTNAME}"));
        if let Some(link) = backend_link(ctx.serve_addr.host()) {
            cmd = cmd.arg("--link").arg(link);
        }
        cmd = cmd
            .arg("--volume")
            .arg(bind(&ctx.bundle.mesh_config_file, MESH_CONFIG_MOUNT_PATH))
            .arg("--publish")
            .arg(format!("0.0.0.0:{port}:{port}/tcp"));
        for env in AGENT_ENV {
            cmd = cmd.arg("--env").arg(*env);
        }
        cmd.arg(&self.settings.proxy_image)
            .args(["proxy", "router", "--proxyLogLevel=debug"])
    }

    fn stop(&self, label: &str, id: &str) -> Result<(), EnvironmentError> {
        debug!(container = label, id, "stopping container");
        self.runner.run(&self.docker().arg("stop").arg(id))?;
        info!(container = label, "stopped container");
        Ok(())
    }
}

impl TargetEnvironment for LocalContainerEnvironment {
    fn name(&self) -> &'static str {
        "local"
    }

    fn generate_env_config(&mut self, ctx: &ProvisionContext<'_>) -> Result<(), EnvironmentError> {
        let mesh = templates::render_mesh_config(PILOT_DISCOVERY_HOSTNAME)?;
        write_artifact(&ctx.bundle.mesh_config_file, &mesh)?;

        let entry = templates::render_service_entry(&ServiceEntryHost {
            host: ctx.serve_addr.host(),
            port: ctx.serve_addr.port(),
        })?;
        write_artifact(&ctx.service_entry_file(), &entry)?;
        debug!(
            mesh_config = %ctx.bundle.mesh_config_file.display(),
            service_entry = %ctx.service_entry_file().display(),
            "wrote local environment config"
        );
        Ok(())
    }

    fn apply_config(&mut self, ctx: &ProvisionContext<'_>) -> Result<(), EnvironmentError> {
        self.pull(&self.settings.discovery_image)?;
        let id = self.run_detached(self.discovery_command(ctx))?;
        info!(id = %id, "started pilot-discovery container");
        self.discovery_container = Some(id);

        self.pull(&self.settings.proxy_image)?;
        let id = self.run_detached(self.agent_command(ctx))?;
        info!(id = %id, port = ctx.listen_addr.port(), "started pilot-agent container");
        self.agent_container = Some(id);
        Ok(())
    }

    fn revert_config(&mut self, ctx: &ProvisionContext<'_>) -> Result<(), EnvironmentError> {
        let mut first_err = None;

        // Proxy first: it depends on discovery.
        for (label, slot) in [
            (PILOT_AGENT_HOSTNAME, self.agent_container.take()),
            (PILOT_DISCOVERY_HOSTNAME, self.discovery_container.take()),
        ] {
            let Some(id) = slot else { continue };
            if let Err(e) = self.stop(label, &id) {
                error!(container = label, error = %e, "unable to stop container");
                first_err.get_or_insert(e);
            }
        }

        for path in [ctx.service_entry_file(), ctx.bundle.mesh_config_file.clone()] {
            if let Err(e) = remove_artifact(&path) {
                error!(error = %e, "unable to remove generated artifact");
                first_err.get_or_insert(e);
            }
        }

        first_err.map_or(Ok(()), Err)
    }
}

fn bind(source: &Path, target: &str) -> String {
    format!("{}:{}", source.display(), target)
}

/// `--link` argument for the backend, or `None` when the backend is
/// addressed by IP and there is no container name to link.
fn backend_link(host: &str) -> Option<String> {
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return None;
    }
    Some(format!("{host}:{host}"))
}
