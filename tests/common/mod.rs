//! Shared test utilities and fixtures

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

use anchorage_types::AccountId;

pub const GENESIS: u64 = 1000;

/// Hex form of a labelled test account, as written in config and scripts.
pub fn account(label: &str) -> String {
    AccountId::from_label(label).to_string()
}

/// A tempdir holding a config file and the path of a (not yet created) state file.
pub struct Workspace {
    dir: TempDir,
    pub config: PathBuf,
    pub state: PathBuf,
}

impl Workspace {
    /// Roles go to `curator`, `linker`, `timekeeper`; fees (25 bps) to `treasurer`.
    pub fn new() -> Self {
        Self::with_linker("linker")
    }

    pub fn with_linker(linker: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = dir.path().join("config.toml");
        let state = dir.path().join("registry.json");
        let workspace = Self { dir, config, state };
        workspace.write_config(linker);
        workspace
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_config(&self, linker: &str) {
        let body = format!(
            "genesis_block = {GENESIS}\n\n\
             [roles]\n\
             curator = \"{}\"\n\
             linker = \"{}\"\n\
             timekeeper = \"{}\"\n\n\
             [treasury]\n\
             fee_recipient = \"{}\"\n",
            account("curator"),
            account(linker),
            account("timekeeper"),
            account("treasurer"),
        );
        fs::write(&self.config, body).expect("write config");
    }

    /// Run the binary against this workspace's config.
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_anchorage"))
            .arg("--config")
            .arg(&self.config)
            .args(args)
            .env("RUST_LOG", "warn")
            .output()
            .expect("spawn anchorage")
    }

    pub fn init(&self) {
        let output = self.run(&["init", "--state", path_str(&self.state)]);
        assert!(output.status.success(), "init failed: {}", stderr(&output));
    }

    /// Write `calls` as a JSON-lines script, apply it, and return the parsed stdout lines.
    pub fn apply(&self, calls: &[Value]) -> Vec<Value> {
        let output = self.apply_raw(&script_body(calls));
        assert!(output.status.success(), "apply failed: {}", stderr(&output));
        stdout_lines(&output)
    }

    pub fn apply_raw(&self, body: &str) -> Output {
        let script = self.dir.path().join("calls.jsonl");
        fs::write(&script, body).expect("write script");
        self.run(&[
            "apply",
            "--state",
            path_str(&self.state),
            "--script",
            path_str(&script),
        ])
    }

    pub fn show(&self) -> Value {
        let output = self.run(&["show", "--state", path_str(&self.state)]);
        assert!(output.status.success(), "show failed: {}", stderr(&output));
        serde_json::from_slice(&output.stdout).expect("snapshot json")
    }
}

/// One script line: `caller` is a label, `op` the tagged operation.
pub fn call(caller: &str, block: u64, op: Value) -> Value {
    serde_json::json!({ "caller": account(caller), "block": block, "op": op })
}

pub fn call_with_value(caller: &str, block: u64, value: u64, op: Value) -> Value {
    serde_json::json!({ "caller": account(caller), "block": block, "value": value, "op": op })
}

pub fn script_body(calls: &[Value]) -> String {
    calls.iter().map(|line| format!("{line}\n")).collect()
}

pub fn stdout_lines(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line is json"))
        .collect()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}
