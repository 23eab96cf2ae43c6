//! Argument builders for the toolchain contracts and parsers for their
//! output. Nothing here touches the filesystem or spawns a process.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::CaConfig;
use crate::runner::CommandLine;

/// Line marker the issuing scripts print next to the new artifact's path.
pub const OUTPUT_MARKER: &str = "[OUTPUTDATA_CERT]";

static ARTIFACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^/\s]*?)\.cert\.pem\.(\d+)").expect("artifact regex"));

/// Builds [`CommandLine`]s for the toolchain scripts and OpenSSL.
#[derive(Debug, Clone)]
pub struct Toolchain {
    utils_dir: PathBuf,
    shell: String,
    openssl: String,
}

impl Toolchain {
    pub fn new(config: &CaConfig) -> Self {
        Self {
            utils_dir: config.utils_dir.clone(),
            shell: config.shell.clone(),
            openssl: config.openssl.clone(),
        }
    }

    fn script(&self, name: &str) -> CommandLine {
        CommandLine::new(&self.shell)
            .arg(format!("./{name}"))
            .current_dir(&self.utils_dir)
    }

    pub fn create_server_cert(&self, days: u32, subjects: &[String]) -> CommandLine {
        self.script("make_server_cert.sh")
            .args(["-t".to_string(), days.to_string()])
            .args(subjects.iter().cloned())
    }

    pub fn create_client_cert(&self, server_domain: &str, client_id: &str, days: u32) -> CommandLine {
        self.script("make_client_cert.sh")
            .args(["-s", server_domain, "-c", client_id, "-d"])
            .arg(days.to_string())
    }

    pub fn revoke_server_cert(&self, server_domain: &str, sequence: Option<&str>) -> CommandLine {
        let cmd = self.script("make_server_revoke.sh");
        let cmd = match sequence {
            Some(seq) => cmd.args(["-n", seq]),
            None => cmd,
        };
        cmd.args(["-s", server_domain])
    }

    pub fn revoke_client_cert(
        &self,
        server_domain: &str,
        client_id: &str,
        sequence: Option<&str>,
    ) -> CommandLine {
        let cmd = self
            .script("make_client_revoke.sh")
            .args(["-s", server_domain, "-c", client_id]);
        match sequence {
            Some(seq) => cmd.args(["-n", seq]),
            None => cmd,
        }
    }

    pub fn inspect(&self, certificate: &Path) -> CommandLine {
        CommandLine::new(&self.openssl)
            .args(["x509", "-in"])
            .arg(path_arg(certificate))
            .args(["-text", "-noout"])
    }

    pub fn verify(&self, certificate: &Path, chain: &Path, crl: &Path) -> CommandLine {
        CommandLine::new(&self.openssl)
            .args(["verify", "-crl_check_all", "-CAfile"])
            .arg(path_arg(chain))
            .arg("-CRLfile")
            .arg(path_arg(crl))
            .arg(path_arg(certificate))
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// `<name>.cert.pem.<seq>` as reported by an issuing script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedArtifact {
    pub name: String,
    pub sequence: String,
}

/// Find the first marker line naming a new artifact.
pub fn find_issued_artifact(output: &str) -> Option<IssuedArtifact> {
    output
        .lines()
        .filter(|line| line.contains(OUTPUT_MARKER))
        .find_map(|line| ARTIFACT.captures(line))
        .map(|caps| IssuedArtifact {
            name: caps[1].to_string(),
            sequence: caps[2].to_string(),
        })
}

/// Split free-form subject input on whitespace and commas, dropping
/// empties and duplicates while keeping first-seen order.
pub fn parse_subjects(input: &str) -> Vec<String> {
    normalize_subjects(input.split(|c: char| c.is_whitespace() || c == ','))
}

pub fn normalize_subjects<I, S>(subjects: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for subject in subjects {
        let subject = subject.as_ref().trim();
        if !subject.is_empty() && !out.iter().any(|s| s == subject) {
            out.push(subject.to_string());
        }
    }
    out
}
