use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::transport::channel::Channel;
use crate::transport::message::Request;

/// Ready line printed by the bridge once it can take requests.
#[derive(Debug, Deserialize)]
struct ReadySignal {
    ok: bool,
    #[serde(default)]
    ready: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

/// Reply tagged with the request type it answers.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Envelope {
    reply_to: String,
    #[serde(default)]
    body: Value,
}

/// Channel to an external bridge process (e.g. a page driver).
///
/// Requests are written as one JSON line on the child's stdin; each reply is
/// one JSON line on its stdout. A reader thread forwards stdout lines so that
/// every request can be bounded by a timeout.
pub struct ProcessChannel {
    program: String,
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<std::io::Result<String>>,
}

impl ProcessChannel {
    /// Spawn `program args..` and wait up to `ready_timeout` for its ready line.
    pub fn launch(program: &str, args: &[String], ready_timeout: Duration) -> Result<Self, TransportError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| TransportError::Io(format!("failed to spawn {}: {}", program, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Io(format!("failed to capture stdin of {}", program)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Io(format!("failed to capture stdout of {}", program)))?;

        let (tx, lines) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        });

        let mut channel = ProcessChannel {
            program: program.to_string(),
            child,
            stdin,
            lines,
        };

        let line = channel.next_line("ready signal", ready_timeout)?;
        let signal: ReadySignal =
            serde_json::from_str(line.trim()).map_err(|e| TransportError::Json {
                context: format!("{} ready signal", program),
                source: e,
            })?;

        if !signal.ok || signal.ready != Some(true) {
            return Err(TransportError::Remote(signal.error.unwrap_or_else(|| {
                format!("did not receive ready signal from {}", program)
            })));
        }

        info!(program, "bridge process ready");
        Ok(channel)
    }

    fn next_line(&mut self, context: &str, timeout: Duration) -> Result<String, TransportError> {
        loop {
            let line = match self.lines.recv_timeout(timeout) {
                Ok(Ok(line)) => line,
                Ok(Err(e)) => {
                    return Err(TransportError::Io(format!(
                        "failed to read from {}: {}",
                        self.program, e
                    )));
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(TransportError::Timeout {
                        context: context.to_string(),
                        timeout,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(TransportError::NoResponse(self.program.clone()));
                }
            };

            // Blank keep-alive lines
            if !line.trim().is_empty() {
                return Ok(line);
            }
        }
    }

    /// Best-effort shutdown of the child.
    pub fn close(&mut self) {
        if let Err(e) = self.child.kill() {
            debug!(program = %self.program, error = %e, "bridge process already gone");
        }
        let _ = self.child.wait();
    }
}

impl Channel for ProcessChannel {
    fn request(&mut self, request: &Request, timeout: Duration) -> Result<Value, TransportError> {
        let json = serde_json::to_string(request).map_err(|e| TransportError::Json {
            context: request.kind().to_string(),
            source: e,
        })?;

        // Late replies to requests that already timed out
        while let Ok(stale) = self.lines.try_recv() {
            debug!(program = %self.program, line = ?stale, "discarding stale bridge output");
        }

        writeln!(self.stdin, "{}", json)
            .and_then(|_| self.stdin.flush())
            .map_err(|e| {
                TransportError::Io(format!("failed to write to {}: {}", self.program, e))
            })?;

        // A bare reply cannot be told apart from a late answer to an earlier
        // request that lands after this write. Bridges that wrap replies as
        // `{"replyTo": "<TYPE>", "body": ...}` let mismatches be skipped.
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let line = match self.next_line(request.kind(), remaining) {
                Ok(line) => line,
                Err(e) => {
                    let e = match e {
                        TransportError::Timeout { context, .. } => TransportError::Timeout { context, timeout },
                        other => other,
                    };
                    warn!(program = %self.program, kind = request.kind(), error = %e, "bridge request failed");
                    return Err(e);
                }
            };

            let value: Value = serde_json::from_str(line.trim()).map_err(|e| TransportError::Json {
                context: format!("{} response", request.kind()),
                source: e,
            })?;

            let body = match serde_json::from_value::<Envelope>(value.clone()) {
                Ok(envelope) if envelope.reply_to != request.kind() => {
                    debug!(program = %self.program, expected = request.kind(), got = %envelope.reply_to, "skipping reply to another request");
                    continue;
                }
                Ok(envelope) => envelope.body,
                Err(_) => value,
            };

            // `null` is the bridge's way of saying "no reply"
            if body.is_null() {
                return Err(TransportError::NoResponse(self.program.clone()));
            }
            return Ok(body);
        }
    }
}

impl Drop for ProcessChannel {
    fn drop(&mut self) {
        self.close();
    }
}
