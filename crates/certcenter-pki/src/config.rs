//! CA toolchain configuration.

use std::path::PathBuf;

/// Where the toolchain lives and how it is invoked.
#[derive(Debug, Clone)]
pub struct CaConfig {
    /// Directory holding the toolchain scripts and `custom_config.sh`.
    /// Scripts run with this as their working directory.
    pub utils_dir: PathBuf,
    /// Fixed path of the process-wide advisory lock file.
    pub lock_path: PathBuf,
    /// Interpreter used for the toolchain scripts.
    pub shell: String,
    /// OpenSSL binary used for inspection and verification.
    pub openssl: String,
}

impl Default for CaConfig {
    fn default() -> Self {
        Self {
            utils_dir: PathBuf::from("utils"),
            lock_path: PathBuf::from("locks/lock"),
            shell: "bash".into(),
            openssl: "openssl".into(),
        }
    }
}

impl CaConfig {
    /// Path of the provisioning config written by the installer.
    pub fn provisioning_path(&self) -> PathBuf {
        self.utils_dir.join(crate::provisioning::PROVISIONING_FILE)
    }
}
