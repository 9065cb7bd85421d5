//! # gatewayctl
//!
//! **gatewayctl** stands up a temporary Envoy based API gateway from a
//! [Swagger/OpenAPI](https://swagger.io/specification/) file and tears it down again
//! when you are done with it.
//!
//! ## Overview
//!
//! The Swagger file is translated into Istio configuration, which an Istio discovery
//! component programs into an Envoy proxy. Two target environments are supported:
//!
//! - **local** - `pilot-discovery` and `pilot-agent` containers on the local Docker daemon
//! - **kubernetes** - manifests applied to the current cluster, optionally installing
//!   the Istio control plane first
//!
//! gatewayctl is a lifecycle tool, not a service. A session generates config, applies
//! it, waits for Ctrl+C, then reverts what it applied.
//!
//! ## Architecture
//!
//! - **[`session`]** - The provisioning state machine
//! - **[`environment`]** - The [`TargetEnvironment`] trait and its local/kubernetes implementations
//! - **[`generator`]** - External Swagger → Istio translator invocation
//! - **[`scratch`]** - Per-process scratch directory
//! - **[`exec`]** - Process execution seam used for every external tool
//! - **[`signal`]** - Operator termination (SIGINT/SIGTERM)
//! - **[`config`]** / **[`runtime_config`]** - Session inputs and tool locations
//! - **[`cli`]** - `gatewayctl api-server local|kubernetes`
//! - **[`otel`]** - Logging setup
//!
//! ### Session Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant User
//!     participant CLI as CLI<br/>(gatewayctl)
//!     participant Session as ProvisioningSession
//!     participant Gen as ExternalTranslator
//!     participant Env as TargetEnvironment
//!     participant Infra as Docker / Kubernetes
//!
//!     User->>CLI: gatewayctl api-server local ...
//!     CLI->>Session: run(env)
//!     Session->>Session: create scratch dir
//!     Session->>Gen: translate(swagger, out_dir, serve_addr)
//!     Gen-->>Session: GeneratedConfigBundle
//!     Session->>Env: generate_env_config(ctx)
//!     Env->>Env: write mesh-config, service-entry.yaml
//!
//!     alt dry run
//!         Session-->>CLI: DryRun(bundle)
//!     end
//!
//!     Session->>Env: apply_config(ctx)
//!     Env->>Infra: pull images, start discovery then proxy
//!
//!     alt apply failed
//!         Session->>Env: revert_config(ctx)
//!         Session->>Session: remove scratch dir
//!         Session-->>CLI: Err(apply error)
//!     end
//!
//!     Session->>Session: wait for Ctrl+C
//!     User->>Session: SIGINT
//!     Session->>Env: revert_config(ctx)
//!     Env->>Infra: stop containers / delete manifests
//!     Session->>Session: remove scratch dir
//!     Session-->>CLI: Completed
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # The backend container's name must match the serve address host.
//! docker run -d --name demo.local my-backend:latest
//!
//! gatewayctl api-server local \
//!   --listen-addr http://0.0.0.0:8080 \
//!   --serve-addr http://demo.local:9080 \
//!   --swagger-file swagger.json
//! ```
//!
//! Generated config can be inspected without touching Docker:
//!
//! ```bash
//! gatewayctl api-server local ... --dry-run --config-dir ./generated
//! ```
//!
//! ## Using the Library
//!
//! Any type implementing [`TargetEnvironment`] can be driven by a session:
//!
//! ```rust,ignore
//! use gatewayctl::{ProvisioningSession, SessionConfig};
//! use gatewayctl::generator::ExternalTranslator;
//! use gatewayctl::signal::OperatorInterrupt;
//!
//! let config = SessionConfig::new(listen, serve, "swagger.json");
//! let translator = ExternalTranslator::new("/usr/local/bin/gen-istio-swagger", runner);
//! let mut session = ProvisioningSession::new(config, Box::new(translator), Box::new(OperatorInterrupt));
//! session.run(&mut my_environment)?;
//! ```

pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod exec;
pub mod generator;
pub mod otel;
pub mod runtime_config;
pub mod scratch;
pub mod session;
pub mod signal;

pub use config::{Address, SessionConfig};
pub use environment::{ClusterEnvironment, LocalContainerEnvironment, ProvisionContext, TargetEnvironment};
pub use error::SessionError;
pub use generator::{ConfigTranslator, GeneratedConfigBundle};
pub use session::{ProvisioningSession, SessionOutcome, SessionState};
