//! # CLI Module
//!
//! Command-line interface for the `gatewayctl` binary.
//!
//! ## Commands
//!
//! ### `api-server local`
//!
//! Run the gateway as two Docker containers next to a backend container:
//!
//! ```bash
//! gatewayctl api-server local \
//!     --listen-addr http://0.0.0.0:8080 \
//!     --serve-addr http://demo.local:9080 \
//!     --swagger-file swagger.json
//! ```
//!
//! Options:
//! - `--listen-addr <URL>` - Address the gateway listens on (required)
//! - `--serve-addr <URL>` - Backend address; its host must be a container name (required)
//! - `--swagger-file <FILE>` - Swagger/OpenAPI file (required)
//! - `--config-dir <DIR>` - Keep generated config here instead of the scratch dir
//!
//! ### `api-server kubernetes`
//!
//! Apply the generated manifests to the current kubectl context:
//!
//! ```bash
//! gatewayctl api-server kubernetes --swagger-file swagger.json --deploy-istio
//! ```
//!
//! Options (all have defaults):
//! - `--listen-addr <URL>` - `http://0.0.0.0:8080`
//! - `--serve-addr <URL>` - `http://0.0.0.0:9080`
//! - `--swagger-file <FILE>` - `swagger.json`
//! - `--config-dir <DIR>` - `gen-istio-config` inside the scratch dir
//!   (`/tmp/gatewayctl/api-server/<pid>/gen-istio-config` unless `GATEWAYCTL_SCRATCH_DIR` is set)
//! - `--namespace <NS>` - `istio-system`
//! - `--deploy-istio` - install the Istio control plane first, uninstall it on exit
//!
//! Both subcommands also accept `--dry-run` and `--skip-revert`.
//!
//! ## Exit Codes
//!
//! `0` when the session completes (including dry runs), `1` on any error.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, ApiServerCommand, Cli, Commands, KubernetesArgs, LocalArgs, SessionFlags};
