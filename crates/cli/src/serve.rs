//! Daemon mode – minimal JSON-RPC-ish protocol over a Unix socket.
//!
//! One calculator is owned by the daemon. Connections are served one at a
//! time and each line is handled to completion before the next is read.

use anyhow::Context;
use engine::types::*;
use engine::{Calculator, CommandRegistry};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

pub async fn run_daemon(
    socket_path: PathBuf,
    calc: Calculator,
    registry: CommandRegistry,
) -> anyhow::Result<()> {
    let listener = bind(&socket_path)?;
    tracing::info!(socket = %socket_path.display(), "calcctl daemon listening");
    serve(listener, calc, registry).await;
    Ok(())
}

pub fn bind(socket_path: &Path) -> anyhow::Result<UnixListener> {
    // Remove stale socket if it exists
    let _ = std::fs::remove_file(socket_path);
    UnixListener::bind(socket_path)
        .with_context(|| format!("cannot bind socket {}", socket_path.display()))
}

pub async fn serve(listener: UnixListener, mut calc: Calculator, registry: CommandRegistry) {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                if let Err(e) = serve_connection(stream, &mut calc, &registry).await {
                    tracing::warn!(error = %e, "connection closed with error");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "accept error");
            }
        }
    }
}

async fn serve_connection(
    stream: UnixStream,
    calc: &mut Calculator,
    registry: &CommandRegistry,
) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_request(&line, calc, registry);
        let mut resp_json = serde_json::to_string(&response).unwrap_or_else(|_| "{}".into());
        resp_json.push('\n');
        writer.write_all(resp_json.as_bytes()).await?;
    }
    Ok(())
}

fn error_response(id: String, message: String) -> DaemonResponse {
    DaemonResponse {
        id,
        result: None,
        error: Some(ErrorInfo {
            code: ErrorCode::InvalidInput,
            message,
            details: serde_json::Value::Null,
        }),
    }
}

pub fn handle_request(
    line: &str,
    calc: &mut Calculator,
    registry: &CommandRegistry,
) -> DaemonResponse {
    let req: DaemonRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            return error_response("unknown".into(), format!("invalid JSON request: {}", e));
        }
    };
    tracing::debug!(id = %req.id, method = %req.method, "daemon request");

    let result = match req.method.as_str() {
        "call" => {
            let cmd_name = req.params.get("cmd").and_then(|v| v.as_str()).unwrap_or("");
            let args = req
                .params
                .get("args")
                .cloned()
                .unwrap_or(serde_json::Value::Object(Default::default()));
            registry.execute(cmd_name, args, calc)
        }
        "press" => registry.execute("press", req.params.clone(), calc),
        "state" => registry.execute("state", serde_json::Value::Null, calc),
        other => {
            return error_response(req.id, format!("unknown method: {}", other));
        }
    };

    DaemonResponse {
        id: req.id,
        result: Some(result),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_handle_press_and_state() {
        let mut calc = Calculator::default();
        let reg = CommandRegistry::new();

        let resp = handle_request(
            r#"{"id":"1","method":"press","params":{"keys":"2+3="}}"#,
            &mut calc,
            &reg,
        );
        assert_eq!(resp.id, "1");
        let result = resp.result.unwrap();
        assert_eq!(result.status, Status::Pass);
        assert_eq!(result.data.unwrap()["display"], "5");

        let resp = handle_request(r#"{"id":"2","method":"state"}"#, &mut calc, &reg);
        let data = resp.result.unwrap().data.unwrap();
        assert_eq!(data["history"][0]["result"], "5");
    }

    #[test]
    fn test_handle_call() {
        let mut calc = Calculator::default();
        let reg = CommandRegistry::new();
        let line = json!({
            "id": "c",
            "method": "call",
            "params": { "cmd": "evaluate", "args": { "expression": "9 % 4" } }
        })
        .to_string();
        let resp = handle_request(&line, &mut calc, &reg);
        assert_eq!(resp.result.unwrap().data.unwrap()["result"], "1");
    }

    #[test]
    fn test_handle_bad_requests() {
        let mut calc = Calculator::default();
        let reg = CommandRegistry::new();

        let resp = handle_request("not json", &mut calc, &reg);
        assert_eq!(resp.id, "unknown");
        assert_eq!(resp.error.unwrap().code, ErrorCode::InvalidInput);

        let resp = handle_request(r#"{"id":"x","method":"reboot"}"#, &mut calc, &reg);
        assert_eq!(resp.id, "x");
        assert!(resp.result.is_none());
        assert!(resp.error.unwrap().message.contains("reboot"));
    }

    #[tokio::test]
    async fn test_daemon_round_trip_over_socket() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("calc.sock");
        let listener = bind(&socket).unwrap();
        let server = tokio::spawn(serve(listener, Calculator::default(), CommandRegistry::new()));

        let stream = UnixStream::connect(&socket).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer
            .write_all(b"{\"id\":\"a\",\"method\":\"press\",\"params\":{\"keys\":\"6*7=\"}}\n")
            .await
            .unwrap();
        let line = lines.next_line().await.unwrap().unwrap();
        let resp: DaemonResponse = serde_json::from_str(&line).unwrap();
        assert_eq!(resp.result.unwrap().data.unwrap()["display"], "42");

        // State persists across requests on the same daemon.
        writer
            .write_all(b"{\"id\":\"b\",\"method\":\"state\"}\n")
            .await
            .unwrap();
        let line = lines.next_line().await.unwrap().unwrap();
        let resp: DaemonResponse = serde_json::from_str(&line).unwrap();
        assert_eq!(resp.id, "b");
        assert_eq!(resp.result.unwrap().data.unwrap()["display"], "42");

        server.abort();
    }
}
