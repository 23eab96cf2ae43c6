//! Scratch CA tree plus a fake toolchain that edits the ledger on disk the
//! way the real scripts do.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use certcenter_core::authz::AuthorizationContext;
use certcenter_core::models::principal::Principal;
use certcenter_core::models::role::Role;
use certcenter_pki::config::CaConfig;
use certcenter_pki::lifecycle::CertManager;
use certcenter_pki::provisioning::REQUIRED_UTILITIES;
use certcenter_pki::runner::{CommandLine, CommandOutput, CommandRunner};
use tempfile::TempDir;

pub const ORGANIZATION: &str = "Acme";
const NOT_AFTER: &str = "991231235959Z";
const REVOKED_AT: &str = "250101000000Z";

/// One recorded invocation with its start and end instants.
#[derive(Debug, Clone)]
pub struct Call {
    pub program: String,
    pub args: Vec<String>,
    pub started: Instant,
    pub finished: Instant,
}

#[derive(Default)]
struct FakeState {
    next_serial: u32,
    sequences: HashMap<String, u32>,
    calls: Vec<Call>,
    fail_revoke: bool,
    skip_ledger: bool,
}

#[derive(Clone)]
pub struct FakeToolchain {
    root: PathBuf,
    delay: Duration,
    state: Arc<Mutex<FakeState>>,
}

impl FakeToolchain {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            delay: Duration::ZERO,
            state: Arc::new(Mutex::new(FakeState {
                next_serial: 1,
                ..Default::default()
            })),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fail_revocations(&self) {
        self.state.lock().unwrap().fail_revoke = true;
    }

    /// Issue files and report success without writing the ledger line.
    pub fn skip_ledger_writes(&self) {
        self.state.lock().unwrap().skip_ledger = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    fn ledger(&self) -> PathBuf {
        self.root.join("ca/intermediate/index.txt")
    }

    fn next(&self, key: String) -> (u32, u32) {
        let mut state = self.state.lock().unwrap();
        let serial = state.next_serial;
        state.next_serial += 1;
        let seq = state.sequences.entry(key).or_insert(0);
        *seq += 1;
        (serial, *seq)
    }

    fn append(&self, serial: u32, subject: &str) {
        if self.state.lock().unwrap().skip_ledger {
            return;
        }
        let mut text = std::fs::read_to_string(self.ledger()).unwrap();
        text.push_str(&format!(
            "V\t{NOT_AFTER}\t\t{serial:02X}\tunknown\t{subject}\n"
        ));
        std::fs::write(self.ledger(), text).unwrap();
    }

    fn mark_revoked(&self, subject: &str) -> bool {
        let text = std::fs::read_to_string(self.ledger()).unwrap();
        let mut found = false;
        let lines: Vec<String> = text
            .lines()
            .map(|line| {
                let fields: Vec<&str> = line.split('\t').collect();
                if fields[0] == "V" && fields[5] == subject {
                    found = true;
                    format!(
                        "R\t{}\t{REVOKED_AT}\t{}\t{}\t{}",
                        fields[1], fields[3], fields[4], fields[5]
                    )
                } else {
                    line.to_string()
                }
            })
            .collect();
        std::fs::write(self.ledger(), lines.join("\n") + "\n").unwrap();
        found
    }

    fn write(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn execute(&self, command: &CommandLine) -> CommandOutput {
        let args = &command.args;
        let flag = |name: &str| {
            args.iter()
                .position(|a| a == name)
                .and_then(|i| args.get(i + 1))
                .cloned()
        };

        if command.program == "openssl" {
            return match args[0].as_str() {
                "x509" => match std::fs::read_to_string(&args[2]) {
                    Ok(pem) => ok(format!("Certificate:\n    Data: {pem}\n")),
                    Err(_) => failed(format!("Could not open file {}", args[2])),
                },
                _ => ok(format!("{}: OK\n", args.last().unwrap())),
            };
        }

        match args[0].as_str() {
            "./make_server_cert.sh" => {
                let cn = args[3].clone();
                let (serial, seq) = self.next(format!("server:{cn}"));
                self.append(serial, &format!("/O={ORGANIZATION}:{seq}/CN={cn}"));
                let cert = self
                    .root
                    .join(format!("ca/intermediate/certs/{cn}.cert.pem.{seq}"));
                Self::write(&cert, &format!("server {cn} #{seq}"));
                Self::write(
                    &self.root.join(format!("ca/intermediate/private/{cn}.key.pem")),
                    "KEY",
                );
                ok(format!(
                    "Generating RSA key\n{} {}\ndone\n",
                    certcenter_pki::command::OUTPUT_MARKER,
                    cert.display()
                ))
            }
            "./make_client_cert.sh" => {
                let server = flag("-s").unwrap();
                let client = flag("-c").unwrap();
                let (serial, seq) = self.next(format!("client:{server}:{client}"));
                self.append(serial, &format!("/O={client}:{seq}/CN={server}"));
                let dir = self.root.join(format!("ca/client_certs/{server}"));
                let cert = dir.join(format!("{client}.cert.pem.{seq}"));
                Self::write(&cert, &format!("client {client}@{server} #{seq}"));
                Self::write(
                    &dir.join(format!("private/{client}_private.key.pem")),
                    "KEY",
                );
                ok(format!(
                    "{} {}\n",
                    certcenter_pki::command::OUTPUT_MARKER,
                    cert.display()
                ))
            }
            "./make_server_revoke.sh" | "./make_client_revoke.sh" => {
                if self.state.lock().unwrap().fail_revoke {
                    return failed("ERROR: index.txt is locked by another process\n".into());
                }
                let server = flag("-s").unwrap();
                let seq = flag("-n");
                let name = flag("-c").unwrap_or_else(|| ORGANIZATION.to_string());
                let org = match seq {
                    Some(seq) => format!("{name}:{seq}"),
                    None => name,
                };
                if self.mark_revoked(&format!("/O={org}/CN={server}")) {
                    ok("Revoking certificate. Data Base Updated\n".into())
                } else {
                    failed("no such certificate\n".into())
                }
            }
            other => failed(format!("{other}: command not found\n")),
        }
    }
}

fn ok(output: String) -> CommandOutput {
    CommandOutput {
        output,
        exit_status: 0,
    }
}

fn failed(output: String) -> CommandOutput {
    CommandOutput {
        output,
        exit_status: 1,
    }
}

impl CommandRunner for FakeToolchain {
    async fn run(&self, command: &CommandLine) -> std::io::Result<CommandOutput> {
        let started = Instant::now();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let output = self.execute(command);
        self.state.lock().unwrap().calls.push(Call {
            program: command.program.clone(),
            args: command.args.clone(),
            started,
            finished: Instant::now(),
        });
        Ok(output)
    }
}

/// A provisioned CA under a temporary directory.
pub struct TestCa {
    pub dir: TempDir,
    pub config: CaConfig,
    pub root: PathBuf,
}

impl TestCa {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let utils = dir.path().join("utils");
        let root = dir.path().join("pki");

        std::fs::create_dir_all(&utils).unwrap();
        for util in REQUIRED_UTILITIES {
            std::fs::write(utils.join(util), "#!/bin/bash\n").unwrap();
        }
        std::fs::write(
            utils.join("custom_config.sh"),
            format!(
                "ROOT_DIR=\"{}\"\nCOUNTRY_NAME=\"NL\"\nORG_NAME=\"{ORGANIZATION}\"\n\
                 COMM_NAME=\"{ORGANIZATION} Root\"\nSERT_PASS=\"s3cret\"\nVAL_DAYS=\"3650\"\n",
                root.display()
            ),
        )
        .unwrap();

        for (path, contents) in [
            ("ca/intermediate/index.txt", ""),
            ("ca/intermediate/certs/ca-chain.cert.pem", "CHAIN"),
            ("ca/intermediate/crl/ca-full.crl.pem", "CRL"),
            ("ca/root/certs/ca.cert.pem", "ROOT"),
            ("ca/root/crl/ca.crl.pem", "ROOT CRL"),
        ] {
            let path = root.join(path);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        }

        let config = CaConfig {
            utils_dir: utils,
            lock_path: dir.path().join("locks").join("lock"),
            ..CaConfig::default()
        };
        Self { dir, config, root }
    }

    pub fn toolchain(&self) -> FakeToolchain {
        FakeToolchain::new(&self.root)
    }

    pub fn manager(&self, toolchain: FakeToolchain) -> CertManager<FakeToolchain> {
        CertManager::new(self.config.clone(), toolchain)
    }
}

pub fn context(role: Role) -> AuthorizationContext {
    AuthorizationContext::from_session(Some(Principal {
        login: format!("{role:?}").to_lowercase(),
        password_hash: String::new(),
        email: None,
        role,
    }))
}

pub fn creator() -> AuthorizationContext {
    context(Role::Creator)
}

pub fn subjects(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
