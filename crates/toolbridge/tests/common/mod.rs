//! Common test utilities for toolbridge integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// Isolated home directory holding `.toolbridge/config.json`
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub config_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let config_dir = temp_dir.path().join(".toolbridge");

        Ok(Self {
            temp_dir,
            config_dir,
        })
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    pub fn write_config(&self, config: &Value) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::write(self.config_path(), serde_json::to_string_pretty(config)?)?;
        Ok(())
    }

    /// Binary invocation with HOME pointed at the temp dir and no key in the environment
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_toolbridge"));
        cmd.env("HOME", self.temp_dir.path())
            .env_remove("GEMINI_API_KEY")
            .env_remove("RUST_LOG");
        cmd
    }
}

/// Config running the tool server as an inline shell script
pub fn script_config(script: &str, api_base: &str) -> Value {
    json!({
        "model": {
            "api_key": "test-key",
            "api_base": api_base,
            "name": "gemini-test"
        },
        "server": {
            "command": "sh",
            "args": ["-c", script]
        }
    })
}

/// Fake server answering initialize, tools/list and one tools/call
pub const CALCULATOR_SERVER: &str = r#"
read line
echo '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2025-06-18","serverInfo":{"name":"fake-tools","version":"0.0.1"}}}'
read line
read line
echo '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"calculator","description":"Basic arithmetic","inputSchema":{"type":"object","properties":{"operation":{"type":"string","enum":["add","subtract"]},"a":{"type":"number"},"b":{"type":"number"}},"required":["operation","a","b"]}}]}}'
read line
echo '{"jsonrpc":"2.0","id":3,"result":{"content":[{"type":"text","text":"4"}]}}'
read line
"#;
