// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the integration specs: a fluent wrapper around the
//! `muster` binary and a tempdir-backed fleet fixture.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// A `muster` invocation with no fleet behind it.
pub fn cli() -> Cmd {
    Cmd { cmd: bin(), args: Vec::new() }
}

fn bin() -> assert_cmd::Command {
    #[allow(clippy::unwrap_used)]
    assert_cmd::Command::cargo_bin("muster").unwrap()
}

pub struct Cmd {
    cmd: assert_cmd::Command,
    args: Vec<String>,
}

impl Cmd {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn passes(mut self) -> Checked {
        Checked(self.cmd.args(&self.args).assert().success())
    }

    pub fn fails_with(mut self, code: i32) -> Checked {
        Checked(self.cmd.args(&self.args).assert().failure().code(code))
    }
}

pub struct Checked(assert_cmd::assert::Assert);

impl Checked {
    pub fn stdout_has(self, needle: &str) -> Self {
        let out = String::from_utf8_lossy(&self.0.get_output().stdout).to_string();
        assert!(out.contains(needle), "stdout missing '{}':\n{}", needle, out);
        self
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.0.get_output().stdout).to_string()
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let err = String::from_utf8_lossy(&self.0.get_output().stderr).to_string();
        assert!(err.contains(needle), "stderr missing '{}':\n{}", needle, err);
        self
    }
}

/// A fleet fixture: manifest plus isolated state dir under one tempdir.
pub struct Fleet {
    dir: tempfile::TempDir,
}

impl Fleet {
    pub fn new(manifest: &str) -> Self {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {}", e));
        let fleet = Self { dir };
        fleet.file("muster.toml", manifest);
        fleet
    }

    /// Write an auxiliary file (e.g. a worker script) into the fleet dir.
    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {}", name, e));
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_dir(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    pub fn sink_file(&self, worker: &str) -> PathBuf {
        self.state_dir().join("logs").join(format!("{}.log", worker))
    }

    /// A `muster` invocation wired to this fleet's manifest and state dir.
    pub fn muster(&self) -> Cmd {
        let manifest = self.dir.path().join("muster.toml");
        cli().args(&[
            "-f",
            &manifest.display().to_string(),
            "--state-dir",
            &self.state_dir().display().to_string(),
        ])
    }

    /// Raw std `Command` for long-lived invocations (`muster run`).
    pub fn muster_raw(&self, args: &[&str]) -> std::process::Command {
        let mut cmd = std::process::Command::new(assert_cmd::cargo::cargo_bin("muster"));
        cmd.arg("-f")
            .arg(self.dir.path().join("muster.toml"))
            .arg("--state-dir")
            .arg(self.state_dir())
            .args(args);
        cmd
    }
}
