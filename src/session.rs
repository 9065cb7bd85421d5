//! # Provisioning Session
//!
//! The session drives one gateway through its whole life:
//!
//! ```mermaid
//! stateDiagram-v2
//!     [*] --> Init
//!     Init --> ScratchReady: create scratch dir (failure logged)
//!     ScratchReady --> ConfigGenerated: translator
//!     ConfigGenerated --> EnvConfigured: generate_env_config
//!     EnvConfigured --> DryRunComplete: dry run
//!     EnvConfigured --> Applied: apply_config
//!     EnvConfigured --> AbortedApply: apply_config failed / revert + cleanup
//!     Applied --> AwaitingTermination
//!     AwaitingTermination --> Reverted: revert_config (unless skip-revert)
//!     Reverted --> Done: remove scratch dir (failure logged)
//!     DryRunComplete --> [*]
//!     AbortedApply --> [*]
//!     Done --> [*]
//! ```
//!
//! ## Error Policy
//!
//! - Before apply, any failure is returned as is. Nothing outside the scratch
//!   directory has been touched.
//! - A failed apply triggers a compensating revert and scratch cleanup. Their
//!   failures are logged; the apply error is what the caller sees.
//! - After termination, a failed revert is returned, but scratch cleanup is
//!   still attempted first.
//! - Scratch creation and removal never fail a session.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gatewayctl::session::ProvisioningSession;
//! use gatewayctl::signal::OperatorInterrupt;
//!
//! let session = ProvisioningSession::new(config, Box::new(translator), Box::new(OperatorInterrupt));
//! session.run(&mut environment)?;
//! ```

use crate::config::SessionConfig;
use crate::environment::{ProvisionContext, TargetEnvironment};
use crate::error::{Result, SessionError};
use crate::generator::{ConfigTranslator, GeneratedConfigBundle};
use crate::scratch::ScratchSpace;
use crate::signal::TerminationSignal;
use tracing::{debug, error, info, warn};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    ScratchReady,
    ConfigGenerated,
    EnvConfigured,
    DryRunComplete,
    Applied,
    AbortedApply,
    AwaitingTermination,
    Reverted,
    Done,
}

/// How a successful session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Config was generated but not applied. The bundle is left on disk.
    DryRun(GeneratedConfigBundle),
    /// Config was applied, the operator terminated, and revert ran unless skipped.
    Completed { reverted: bool },
}

pub struct ProvisioningSession {
    config: SessionConfig,
    translator: Box<dyn ConfigTranslator>,
    termination: Box<dyn TerminationSignal>,
    scratch: Option<ScratchSpace>,
    state: SessionState,
}

impl ProvisioningSession {
    pub fn new(
        config: SessionConfig,
        translator: Box<dyn ConfigTranslator>,
        termination: Box<dyn TerminationSignal>,
    ) -> Self {
        Self {
            config,
            translator,
            termination,
            scratch: None,
            state: SessionState::Init,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "session state");
        self.state = next;
    }

    /// Run the session to completion against `env`.
    ///
    /// Blocks between apply and revert until the termination signal fires.
    pub fn run<E>(&mut self, env: &mut E) -> Result<SessionOutcome>
    where
        E: TargetEnvironment + ?Sized,
    {
        self.config.validate().map_err(SessionError::InvalidInput)?;

        info!("generating istio based configuration from the swagger file");
        self.create_scratch();

        let bundle = self.generate_config()?;
        let config = self.config.clone();
        let ctx = ProvisionContext {
            bundle: &bundle,
            listen_addr: &config.listen_addr,
            serve_addr: &config.serve_addr,
        };

        env.generate_env_config(&ctx)
            .map_err(|source| SessionError::EnvConfig {
                environment: env.name(),
                source,
            })?;
        self.transition(SessionState::EnvConfigured);

        if config.dry_run {
            info!(
                config_dir = %bundle.config_dir.display(),
                mesh_config = %bundle.mesh_config_file.display(),
                "dry run, configuration generated but not applied"
            );
            self.transition(SessionState::DryRunComplete);
            return Ok(SessionOutcome::DryRun(bundle));
        }

        info!(environment = env.name(), "applying the generated configuration");
        if let Err(source) = env.apply_config(&ctx) {
            error!(environment = env.name(), error = %source, "apply failed, reverting");
            if let Err(e) = env.revert_config(&ctx) {
                error!(environment = env.name(), error = %e, "compensating revert failed");
            }
            self.remove_scratch();
            self.transition(SessionState::AbortedApply);
            return Err(SessionError::Apply {
                environment: env.name(),
                source,
            });
        }
        self.transition(SessionState::Applied);

        info!("Press Ctrl+C to end");
        self.transition(SessionState::AwaitingTermination);
        // Even if waiting fails, the applied config is still torn down.
        let waited = self.termination.wait();
        if let Err(e) = &waited {
            error!(error = %e, "unable to wait for termination, reverting now");
        }

        let reverted = if config.skip_revert {
            info!("skipping revert, applied configuration is left in place");
            Ok(false)
        } else {
            info!(environment = env.name(), "reverting the generated configuration");
            env.revert_config(&ctx)
                .map(|()| true)
                .map_err(|source| SessionError::Revert {
                    environment: env.name(),
                    source,
                })
        };
        self.transition(SessionState::Reverted);

        self.remove_scratch();
        self.transition(SessionState::Done);

        waited.map_err(SessionError::Termination)?;
        Ok(SessionOutcome::Completed { reverted: reverted? })
    }

    fn create_scratch(&mut self) {
        let scratch = ScratchSpace::for_current_process(&self.config.scratch_template);
        match scratch.create() {
            Ok(()) => debug!(path = %scratch.path().display(), "created scratch dir"),
            Err(e) => warn!(
                path = %scratch.path().display(),
                error = %e,
                "unable to create scratch dir, continuing"
            ),
        }
        self.scratch = Some(scratch);
        self.transition(SessionState::ScratchReady);
    }

    fn remove_scratch(&mut self) {
        let Some(scratch) = self.scratch.take() else {
            return;
        };
        let path = scratch.path().to_path_buf();
        match scratch.remove() {
            Ok(()) => debug!(path = %path.display(), "removed scratch dir"),
            Err(e) => warn!(path = %path.display(), error = %e, "unable to delete scratch dir"),
        }
    }

    fn generate_config(&mut self) -> Result<GeneratedConfigBundle> {
        let scratch = self
            .scratch
            .get_or_insert_with(|| ScratchSpace::for_current_process(&self.config.scratch_template));
        let bundle = GeneratedConfigBundle {
            config_dir: self
                .config
                .gen_config_dir
                .clone()
                .unwrap_or_else(|| scratch.gen_config_dir()),
            mesh_config_file: self
                .config
                .mesh_config_file
                .clone()
                .unwrap_or_else(|| scratch.mesh_config_file()),
        };

        self.translator
            .translate(&self.config.swagger_file, &bundle.config_dir, &self.config.serve_addr)
            .map_err(SessionError::Generate)?;
        self.transition(SessionState::ConfigGenerated);
        Ok(bundle)
    }
}
