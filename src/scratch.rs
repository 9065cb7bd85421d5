//! Per-process scratch directory.
//!
//! The path comes from a template containing `<pid>`, so concurrent
//! gatewayctl processes on one host never share a directory. Both
//! [`ScratchSpace::create`] and [`ScratchSpace::remove`] return plain
//! `io::Result`s; the session decides that failures here are only logged.

use crate::config::expand_pid_template;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchSpace {
    path: PathBuf,
}

impl ScratchSpace {
    /// Scratch space for the running process.
    pub fn for_current_process(template: &str) -> Self {
        Self::for_pid(template, std::process::id())
    }

    pub fn for_pid(template: &str, pid: u32) -> Self {
        Self {
            path: expand_pid_template(template, pid),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Default output directory for translator artifacts.
    pub fn gen_config_dir(&self) -> PathBuf {
        self.path.join("gen-istio-config")
    }

    /// Default mesh config location.
    pub fn mesh_config_file(&self) -> PathBuf {
        self.path.join("mesh-config")
    }

    pub fn create(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.path)
    }

    /// Remove the directory and everything in it. Consumes `self` so a
    /// scratch space is removed at most once.
    pub fn remove(self) -> io::Result<()> {
        match std::fs::remove_dir_all(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_derived_from_pid() {
        let scratch = ScratchSpace::for_pid("/tmp/gatewayctl/api-server/<pid>", 1234);
        assert_eq!(scratch.path(), Path::new("/tmp/gatewayctl/api-server/1234"));
        assert_eq!(
            scratch.gen_config_dir(),
            PathBuf::from("/tmp/gatewayctl/api-server/1234/gen-istio-config")
        );
        assert_eq!(
            scratch.mesh_config_file(),
            PathBuf::from("/tmp/gatewayctl/api-server/1234/mesh-config")
        );
    }

    #[test]
    fn test_create_and_remove_with_contents() {
        let root = tempfile::tempdir().unwrap();
        let template = format!("{}/<pid>", root.path().display());
        let scratch = ScratchSpace::for_current_process(&template);
        scratch.create().unwrap();
        std::fs::create_dir_all(scratch.gen_config_dir()).unwrap();
        std::fs::write(scratch.mesh_config_file(), "x").unwrap();

        let path = scratch.path().to_path_buf();
        scratch.remove().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::for_pid(&format!("{}/never-made-<pid>", root.path().display()), 7);
        assert!(scratch.remove().is_ok());
    }
}
