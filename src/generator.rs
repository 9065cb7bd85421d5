//! # Gateway Config Generation
//!
//! Turns a Swagger/OpenAPI file plus a backend address into a directory of
//! Istio configuration (gateway, virtual services, destination rules). The
//! translation itself is done by an external program, `gen-istio-swagger`
//! by default:
//!
//! ```text
//! gen-istio-swagger -i <swagger-file> -o <output-dir> -s <backend-url>
//! ```
//!
//! The translator must exit zero and populate the output directory. When it
//! fails nothing can be assumed about the output directory's contents.

use crate::config::Address;
use crate::exec::{CommandRunner, CommandSpec, ExecError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Generated configuration consumed by the target environment.
///
/// Built once per session and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedConfigBundle {
    /// Directory of gateway config artifacts.
    pub config_dir: PathBuf,
    /// Mesh config file for the discovery component.
    pub mesh_config_file: PathBuf,
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("unable to create output directory '{}': {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("translator failed: {0}")]
    Translator(#[from] ExecError),
}

/// Swagger → gateway config translation.
pub trait ConfigTranslator {
    fn translate(
        &self,
        swagger_file: &Path,
        output_dir: &Path,
        backend: &Address,
    ) -> Result<(), GenerateError>;
}

/// Runs the translator as a subprocess.
pub struct ExternalTranslator {
    program: String,
    runner: Arc<dyn CommandRunner>,
}

impl ExternalTranslator {
    pub fn new(program: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    fn command(&self, swagger_file: &Path, output_dir: &Path, backend: &Address) -> CommandSpec {
        CommandSpec::new(&self.program)
            .arg("-i")
            .arg(swagger_file.to_string_lossy())
            .arg("-o")
            .arg(output_dir.to_string_lossy())
            .arg("-s")
            .arg(backend.to_string())
    }
}

impl ConfigTranslator for ExternalTranslator {
    fn translate(
        &self,
        swagger_file: &Path,
        output_dir: &Path,
        backend: &Address,
    ) -> Result<(), GenerateError> {
        std::fs::create_dir_all(output_dir).map_err(|source| GenerateError::OutputDir {
            path: output_dir.to_path_buf(),
            source,
        })?;
        info!(
            swagger = %swagger_file.display(),
            out = %output_dir.display(),
            "translating swagger file into istio configuration"
        );
        self.runner
            .run(&self.command(swagger_file, output_dir, backend))?;
        Ok(())
    }
}
