use crate::config::{expand_pid_template, Address, SessionConfig};
use crate::environment::{
    ClusterEnvironment, ClusterSettings, LocalContainerEnvironment, LocalSettings, TargetEnvironment,
};
use crate::exec::{CommandRunner, SystemRunner};
use crate::generator::ExternalTranslator;
use crate::runtime_config::RuntimeConfig;
use crate::scratch::ScratchSpace;
use crate::session::{ProvisioningSession, SessionOutcome};
use crate::signal::OperatorInterrupt;
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Command-line interface for gatewayctl
#[derive(Parser, Debug)]
#[command(name = "gatewayctl")]
#[command(version, about = "Provision Envoy based API gateways", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Log format: compact, pretty or json (overrides GATEWAYCTL_LOG_FORMAT)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an Envoy based API Server.
    ///
    /// Run a preconfigured API Gateway by specifying a Swagger file as an input.
    /// The file is used to generate configuration that Istio consumes and programs
    /// into Envoy, allowing it to function as a gateway.
    ApiServer {
        #[command(subcommand)]
        sub: ApiServerCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ApiServerCommand {
    /// Run the API Server locally to access an application running in a docker container
    Local(LocalArgs),
    /// Run the API Server in kubernetes
    Kubernetes(KubernetesArgs),
}

/// Flags shared by both environments.
#[derive(Args, Debug, Clone)]
pub struct SessionFlags {
    /// Generate the configuration without applying it
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Leave the applied configuration in place after Ctrl+C
    #[arg(long, default_value_t = false)]
    pub skip_revert: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LocalArgs {
    /// Address on which the API Server is listening on e.g. http://0.0.0.0:8080
    #[arg(long)]
    pub listen_addr: Address,

    /// URL of the backend application being served e.g. http://demo.com:9080.
    /// Make sure the application container's name matches the hostname (demo.com
    /// in this case) and is attached to the default docker bridge.
    #[arg(long)]
    pub serve_addr: Address,

    /// Location of the Swagger file
    #[arg(long)]
    pub swagger_file: PathBuf,

    /// Location of the directory where the generated config is stored
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    #[command(flatten)]
    pub flags: SessionFlags,
}

#[derive(Args, Debug, Clone)]
pub struct KubernetesArgs {
    /// Address on which the API Server is listening on
    #[arg(long, default_value = "http://0.0.0.0:8080")]
    pub listen_addr: Address,

    /// Address of the backend application being served
    #[arg(long, default_value = "http://0.0.0.0:9080")]
    pub serve_addr: Address,

    /// Location of the Swagger file
    #[arg(long, default_value = "swagger.json")]
    pub swagger_file: PathBuf,

    /// Location of the directory where the generated config is stored
    /// [default: /tmp/gatewayctl/api-server/<pid>/gen-istio-config, following GATEWAYCTL_SCRATCH_DIR]
    #[arg(long)]
    pub config_dir: Option<String>,

    /// Kubernetes namespace to deploy the istio based api-gateway deployment and service
    #[arg(long, default_value = "istio-system")]
    pub namespace: String,

    /// Deploy the istio control plane component istiod as well as the dataplane
    /// component ingress-gateway to the kubernetes cluster
    #[arg(long, default_value_t = false)]
    pub deploy_istio: bool,

    #[command(flatten)]
    pub flags: SessionFlags,
}

impl LocalArgs {
    /// Bind mounts need absolute paths, so `--config-dir` is resolved here.
    pub fn session_config(&self, runtime: &RuntimeConfig) -> anyhow::Result<SessionConfig> {
        let mut config = base_config(
            &self.listen_addr,
            &self.serve_addr,
            &self.swagger_file,
            &self.flags,
            runtime,
        );
        if let Some(dir) = &self.config_dir {
            let dir = expand_pid_template(&dir.to_string_lossy(), std::process::id());
            let abs = std::path::absolute(&dir)
                .with_context(|| format!("unable to get absolute path of '{}'", dir.display()))?;
            config = config.with_gen_config_dir(abs);
        }
        Ok(config)
    }
}

impl KubernetesArgs {
    pub fn session_config(&self, runtime: &RuntimeConfig) -> SessionConfig {
        base_config(
            &self.listen_addr,
            &self.serve_addr,
            &self.swagger_file,
            &self.flags,
            runtime,
        )
        .with_gen_config_dir(self.gen_config_dir(runtime))
    }

    /// `--config-dir` with `<pid>` expanded, or the translator output
    /// directory inside the scratch space so it is removed with it.
    pub fn gen_config_dir(&self, runtime: &RuntimeConfig) -> PathBuf {
        match &self.config_dir {
            Some(dir) => expand_pid_template(dir, std::process::id()),
            None => ScratchSpace::for_current_process(&runtime.scratch_template).gen_config_dir(),
        }
    }
}

fn base_config(
    listen_addr: &Address,
    serve_addr: &Address,
    swagger_file: &std::path::Path,
    flags: &SessionFlags,
    runtime: &RuntimeConfig,
) -> SessionConfig {
    SessionConfig::new(listen_addr.clone(), serve_addr.clone(), swagger_file)
        .with_dry_run(flags.dry_run)
        .with_skip_revert(flags.skip_revert)
        .with_scratch_template(runtime.scratch_template.clone())
}

/// Execute the parsed CLI command
///
/// # Errors
///
/// Returns the session error (with its cause chain) when provisioning,
/// generation or revert fails.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let runtime = RuntimeConfig::from_env();
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);

    match cli.command {
        Commands::ApiServer { sub } => match sub {
            ApiServerCommand::Local(args) => {
                let config = args.session_config(&runtime)?;
                let mut env =
                    LocalContainerEnvironment::new(LocalSettings::from_runtime(&runtime), Arc::clone(&runner));
                run_session(config, &runtime, runner, &mut env)
            }
            ApiServerCommand::Kubernetes(args) => {
                let config = args.session_config(&runtime);
                let settings = ClusterSettings::from_runtime(&runtime, args.namespace.clone(), args.deploy_istio);
                let mut env = ClusterEnvironment::new(settings, Arc::clone(&runner));
                run_session(config, &runtime, runner, &mut env)
            }
        },
    }
}

fn run_session(
    config: SessionConfig,
    runtime: &RuntimeConfig,
    runner: Arc<dyn CommandRunner>,
    env: &mut dyn TargetEnvironment,
) -> anyhow::Result<()> {
    let translator = ExternalTranslator::new(runtime.translator_bin.clone(), runner);
    let mut session = ProvisioningSession::new(config, Box::new(translator), Box::new(OperatorInterrupt));
    match session.run(env)? {
        SessionOutcome::DryRun(bundle) => info!(
            config_dir = %bundle.config_dir.display(),
            "dry run complete"
        ),
        SessionOutcome::Completed { reverted } => info!(reverted, "api server session ended"),
    }
    Ok(())
}
