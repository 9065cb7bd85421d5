#![allow(dead_code)]

pub mod temp_files {
    use std::path::{Path, PathBuf};

    pub const SWAGGER: &str = r#"{
  "swagger": "2.0",
  "info": { "title": "demo", "version": "1.0" },
  "paths": {
    "/pets": { "get": { "responses": { "200": { "description": "OK" } } } }
  }
}"#;

    /// Writes a minimal swagger file into `dir`.
    pub fn write_swagger(dir: &Path) -> PathBuf {
        let path = dir.join("swagger.json");
        std::fs::write(&path, SWAGGER).unwrap();
        path
    }

    /// Scratch template rooted in `dir`, so parallel tests in one process never collide.
    pub fn scratch_template(dir: &Path) -> String {
        format!("{}/scratch/<pid>", dir.display())
    }

    pub fn scratch_path(dir: &Path) -> PathBuf {
        dir.join("scratch").join(std::process::id().to_string())
    }
}

pub mod recording {
    use gatewayctl::config::Address;
    use gatewayctl::environment::{EnvironmentError, ProvisionContext, TargetEnvironment};
    use gatewayctl::exec::{CommandOutput, CommandRunner, CommandSpec, ExecError};
    use gatewayctl::generator::{ConfigTranslator, GenerateError};
    use gatewayctl::signal::TerminationSignal;
    use parking_lot::Mutex;
    use std::path::Path;

    fn injected(command: &CommandSpec) -> ExecError {
        ExecError::NonZeroExit {
            command: command.to_string(),
            exit_code: Some(1),
            stderr: "injected failure".to_string(),
        }
    }

    /// Records every command instead of running it.
    ///
    /// `docker run` prints `<name>-id` so environments get a container id back.
    /// Any command whose rendered line contains a registered pattern fails.
    #[derive(Default)]
    pub struct RecordingRunner {
        calls: Mutex<Vec<CommandSpec>>,
        failures: Mutex<Vec<String>>,
    }

    impl RecordingRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_on(self, pattern: &str) -> Self {
            self.failures.lock().push(pattern.to_string());
            self
        }

        pub fn calls(&self) -> Vec<CommandSpec> {
            self.calls.lock().clone()
        }

        /// Rendered command lines, in call order.
        pub fn lines(&self) -> Vec<String> {
            self.calls.lock().iter().map(ToString::to_string).collect()
        }

        /// Index of the first recorded command line containing `pattern`.
        pub fn position(&self, pattern: &str) -> Option<usize> {
            self.lines().iter().position(|l| l.contains(pattern))
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ExecError> {
            self.calls.lock().push(command.clone());
            let line = command.to_string();
            if self.failures.lock().iter().any(|p| line.contains(p.as_str())) {
                return Err(injected(command));
            }
            let mut stdout = String::new();
            if command.args.first().map(String::as_str) == Some("run") {
                if let Some(pos) = command.args.iter().position(|a| a == "--name") {
                    if let Some(name) = command.args.get(pos + 1) {
                        stdout = format!("{name}-id\n");
                    }
                }
            }
            Ok(CommandOutput {
                stdout,
                stderr: String::new(),
            })
        }
    }

    /// Creates the output directory and drops one artifact in it, or fails.
    #[derive(Default)]
    pub struct StubTranslator {
        pub fail: bool,
        pub calls: Mutex<usize>,
    }

    impl StubTranslator {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    impl ConfigTranslator for StubTranslator {
        fn translate(&self, _swagger: &Path, output_dir: &Path, backend: &Address) -> Result<(), GenerateError> {
            *self.calls.lock() += 1;
            if self.fail {
                return Err(GenerateError::Translator(injected(&CommandSpec::new(
                    "gen-istio-swagger",
                ))));
            }
            std::fs::create_dir_all(output_dir).unwrap();
            std::fs::write(output_dir.join("gateway.yaml"), format!("backend: {backend}\n")).unwrap();
            Ok(())
        }
    }

    /// Returns at once, as if the operator pressed Ctrl+C straight after apply.
    pub struct ImmediateTermination;

    impl TerminationSignal for ImmediateTermination {
        fn wait(&self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Event {
        Generate,
        Apply,
        Revert,
    }

    /// Environment that only records which verbs were called.
    #[derive(Default)]
    pub struct RecordingEnv {
        pub events: Vec<Event>,
        pub fail_generate: bool,
        pub fail_apply: bool,
        pub fail_revert: bool,
        /// Whether the generated config dir existed when `generate_env_config` ran.
        pub bundle_seen: Option<bool>,
    }

    impl RecordingEnv {
        fn outcome(&self, fail: bool, verb: &str) -> Result<(), EnvironmentError> {
            if fail {
                return Err(EnvironmentError::Exec(injected(&CommandSpec::new(verb))));
            }
            Ok(())
        }

        pub fn count(&self, event: Event) -> usize {
            self.events.iter().filter(|e| **e == event).count()
        }
    }

    impl TargetEnvironment for RecordingEnv {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn generate_env_config(&mut self, ctx: &ProvisionContext<'_>) -> Result<(), EnvironmentError> {
            self.events.push(Event::Generate);
            self.bundle_seen = Some(ctx.bundle.config_dir.is_dir());
            self.outcome(self.fail_generate, "generate")
        }

        fn apply_config(&mut self, _ctx: &ProvisionContext<'_>) -> Result<(), EnvironmentError> {
            self.events.push(Event::Apply);
            self.outcome(self.fail_apply, "apply")
        }

        fn revert_config(&mut self, _ctx: &ProvisionContext<'_>) -> Result<(), EnvironmentError> {
            self.events.push(Event::Revert);
            self.outcome(self.fail_revert, "revert")
        }
    }
}
