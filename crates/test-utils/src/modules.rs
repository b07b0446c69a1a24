#![allow(dead_code)]

//! Throwaway shell-script modules for exercising the process runner.

use std::fs;
use std::path::{Path, PathBuf};

use modrun::args::TaskDescriptor;
use tempfile::TempDir;

/// A `/bin/sh` script living in its own temporary directory.
///
/// The script is run as `sh <script> args...` rather than executed
/// directly, which sidesteps `ETXTBSY` when tests spawn processes in
/// parallel while another test is still writing its script.
pub struct ScriptModule {
    dir: TempDir,
    script: PathBuf,
}

impl ScriptModule {
    pub fn new(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir for module script");
        let script = dir.path().join("module.sh");
        fs::write(&script, format!("#!/bin/sh\n{body}\n")).expect("write module script");
        Self { dir, script }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Path to a file inside the script's directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn descriptor(&self, args: &[&str]) -> TaskDescriptor {
        let mut argv = vec![self.script.display().to_string()];
        argv.extend(args.iter().map(|arg| arg.to_string()));
        TaskDescriptor::new("/bin/sh", argv)
    }

    /// Make the script directly executable and return its path.
    #[cfg(unix)]
    pub fn executable(&self) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(&self.script)
            .expect("stat module script")
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&self.script, perms).expect("chmod module script");
        self.script.clone()
    }
}
