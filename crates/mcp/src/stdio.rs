//! Stdio transport
//!
//! Newline-delimited JSON-RPC 2.0 over the stdin/stdout of a spawned tool
//! server. One request is in flight at a time; server notifications and
//! requests arriving meanwhile are handled inline while waiting.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use toolbridge_config::ServerConfig;

use crate::{CallToolResult, McpError, RemoteTool, Result, ToolServer};

pub const PROTOCOL_VERSION: &str = "2025-06-18";

struct Connection {
    writer: BufWriter<ChildStdin>,
    lines: Lines<BufReader<ChildStdout>>,
}

/// MCP client bound to one spawned server process
pub struct McpClient {
    command: String,
    connection: Mutex<Option<Connection>>,
    child: Mutex<Option<Child>>,
    id_counter: AtomicU64,
    instructions: Option<String>,
    server_name: Option<String>,
}

impl McpClient {
    /// Spawn the configured server and complete the initialize handshake
    pub async fn spawn(config: &ServerConfig) -> Result<Self> {
        let command_line = config.command_line();

        let mut command = Command::new(&config.command);
        command
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &config.workdir {
            command.current_dir(dir);
        }
        for (key, value) in &config.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|source| McpError::Spawn {
            command: command_line.clone(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Transport("failed to capture server stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Transport("failed to capture server stdout".to_string()))?;

        let mut client = Self {
            command: command_line,
            connection: Mutex::new(Some(Connection {
                writer: BufWriter::new(stdin),
                lines: BufReader::new(stdout).lines(),
            })),
            child: Mutex::new(Some(child)),
            id_counter: AtomicU64::new(1),
            instructions: None,
            server_name: None,
        };

        if let Err(err) = client.initialize().await {
            client.shutdown().await;
            return Err(err);
        }

        info!(
            command = %client.command,
            server = client.server_name.as_deref().unwrap_or("unknown"),
            "connected to tool server"
        );
        Ok(client)
    }

    /// Instructions advertised by the server during initialize
    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    /// Server name from `serverInfo`
    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Close the pipes, then kill and reap the child
    pub async fn shutdown(&self) {
        self.connection.lock().await.take();

        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(err) = child.kill().await {
                debug!(%err, "failed to kill tool server (may have already exited)");
            }
            let _ = child.wait().await;
            debug!(command = %self.command, "tool server stopped");
        }
    }

    async fn initialize(&mut self) -> Result<()> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION")
            },
            "capabilities": {}
        });

        let result = self.request("initialize", params).await?;
        self.instructions = result
            .get("instructions")
            .and_then(Value::as_str)
            .map(str::to_string);
        self.server_name = result
            .pointer("/serverInfo/name")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(version) = result.get("protocolVersion").and_then(Value::as_str) {
            if version != PROTOCOL_VERSION {
                debug!(
                    requested = PROTOCOL_VERSION,
                    negotiated = version,
                    "server negotiated a different protocol version"
                );
            }
        }

        self.notify("notifications/initialized", json!({})).await
    }

    fn next_id(&self) -> u64 {
        self.id_counter.fetch_add(1, Ordering::SeqCst)
    }

    async fn notify(&self, method: &str, params: Value) -> Result<()> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        });

        let mut guard = self.connection.lock().await;
        let connection = guard.as_mut().ok_or(McpError::Terminated)?;
        write_message(connection, &payload).await
    }

    /// Send a request and wait for the response carrying the same id
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id();
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });

        let mut guard = self.connection.lock().await;
        let connection = guard.as_mut().ok_or(McpError::Terminated)?;

        debug!(id, method, "sending request to tool server");
        write_message(connection, &payload).await?;

        loop {
            let line = match connection.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    guard.take();
                    return Err(McpError::Terminated);
                }
                Err(err) => return Err(McpError::Transport(err.to_string())),
            };

            let Some(message) = parse_line(&line) else {
                continue;
            };

            if message.get("method").is_some() {
                handle_server_message(connection, message).await?;
                continue;
            }

            let is_ours = message
                .get("id")
                .map(|response_id| id_matches(response_id, id))
                .unwrap_or(false);
            if is_ours {
                return into_result(message);
            }
            debug!(response = %message, expected = id, "ignoring response for unknown request");
        }
    }
}

#[async_trait]
impl ToolServer for McpClient {
    async fn list_tools(&self) -> Result<Vec<RemoteTool>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let result = self.request("tools/list", params).await?;

            let page = result
                .get("tools")
                .cloned()
                .ok_or_else(|| McpError::InvalidResponse("tools/list without tools".to_string()))?;
            let page: Vec<RemoteTool> = serde_json::from_value(page)?;
            tools.extend(page);

            cursor = result
                .get("nextCursor")
                .and_then(Value::as_str)
                .filter(|next| !next.is_empty())
                .map(str::to_string);
            if cursor.is_none() {
                break;
            }
        }

        debug!(count = tools.len(), "listed tools");
        Ok(tools)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let params = json!({
            "name": name,
            "arguments": match arguments {
                Value::Null => Value::Object(Default::default()),
                other => other,
            }
        });

        let result = self.request("tools/call", params).await?;
        let result: CallToolResult = serde_json::from_value(result)?;
        Ok(result)
    }
}

async fn write_message(connection: &mut Connection, message: &Value) -> Result<()> {
    let encoded = serde_json::to_string(message)?;
    let transport = |err: std::io::Error| McpError::Transport(err.to_string());

    connection
        .writer
        .write_all(encoded.as_bytes())
        .await
        .map_err(transport)?;
    connection.writer.write_all(b"\n").await.map_err(transport)?;
    connection.writer.flush().await.map_err(transport)?;
    Ok(())
}

/// Parse one stdout line; blank, ANSI and non-JSON lines yield `None`
fn parse_line(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('\u{1b}') {
        debug!(line = trimmed, "skipping ANSI log line from tool server");
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => {
            warn!(line = trimmed, "skipping non-object JSON from tool server");
            None
        }
        Err(err) => {
            warn!(line = trimmed, %err, "received invalid JSON from tool server");
            None
        }
    }
}

/// Answer server-initiated requests, log notifications
async fn handle_server_message(connection: &mut Connection, message: Value) -> Result<()> {
    let method = message
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let Some(id) = message.get("id").cloned() else {
        debug!(method = %method, "received notification from tool server");
        return Ok(());
    };

    let reply = if method == "ping" {
        json!({ "jsonrpc": "2.0", "id": id, "result": {} })
    } else {
        warn!(method = %method, "tool server sent unsupported request");
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {
                "code": -32601,
                "message": format!("client does not implement method '{method}'")
            }
        })
    };
    write_message(connection, &reply).await
}

fn id_matches(response_id: &Value, expected: u64) -> bool {
    match response_id {
        Value::Number(num) => num.as_u64() == Some(expected),
        Value::String(text) => text.parse::<u64>().ok() == Some(expected),
        _ => false,
    }
}

fn into_result(message: Value) -> Result<Value> {
    if let Some(error) = message.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(-32000);
        let text = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(McpError::Rpc {
            code,
            message: text,
        });
    }

    Ok(message.get("result").cloned().unwrap_or(Value::Null))
}
