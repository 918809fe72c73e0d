// Test doubles for the collaborators at the edge of the crate: the HTTP
// transport, the terminal and the browser. Used by the unit tests and by
// the integration tests under `tests/`.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Mutex, MutexGuard};

use crate::api::{Params, RawResponse, Transport};
use crate::error::{Error, Result};
use crate::terminal::{Browser, LineConsole};

/// One request seen by [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub url: String,
    pub params: Params,
}

impl RecordedCall {
    /// The `actions` field of a `send` request, decoded.
    pub fn actions(&self) -> Option<serde_json::Value> {
        self.params
            .get("actions")
            .and_then(|a| serde_json::from_str(a).ok())
    }
}

#[derive(Default)]
struct Script {
    responses: Vec<(String, VecDeque<RawResponse>)>,
    calls: Vec<RecordedCall>,
}

/// Transport that answers from canned responses, per operation and in the
/// order they were queued, and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a 200 response with `body` for `operation`.
    pub fn ok(self, operation: &str, body: &str) -> Self {
        self.respond(
            operation,
            RawResponse {
                status: 200,
                x_error: None,
                x_error_code: None,
                body: body.to_string(),
            },
        )
    }

    /// Queue an arbitrary response for `operation`.
    pub fn respond(self, operation: &str, response: RawResponse) -> Self {
        {
            let mut script = self.lock();
            match script.responses.iter_mut().find(|(op, _)| op == operation) {
                Some((_, queue)) => queue.push_back(response),
                None => script
                    .responses
                    .push((operation.to_string(), VecDeque::from([response]))),
            }
        }
        self
    }

    /// Every request made so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Requests whose URL ends with `/<operation>`.
    pub fn calls_to(&self, operation: &str) -> Vec<RecordedCall> {
        let suffix = format!("/{operation}");
        self.calls()
            .into_iter()
            .filter(|c| c.url.ends_with(&suffix))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Transport for ScriptedTransport {
    fn post_form(&self, url: &str, form: &Params) -> Result<RawResponse> {
        let mut script = self.lock();
        script.calls.push(RecordedCall {
            url: url.to_string(),
            params: form.clone(),
        });

        script
            .responses
            .iter_mut()
            .find(|(op, _)| url.ends_with(&format!("/{op}")))
            .and_then(|(_, queue)| queue.pop_front())
            .ok_or_else(|| Error::Transport {
                url: url.to_string(),
                source: format!("no scripted response for {url}").into(),
            })
    }
}

/// Browser that only remembers what it was asked to open.
#[derive(Debug, Default)]
pub struct RecordingBrowser {
    pub opened: Vec<String>,
}

impl Browser for RecordingBrowser {
    fn open(&mut self, url: &str) {
        self.opened.push(url.to_string());
    }
}

pub type ScriptedConsole = LineConsole<Cursor<Vec<u8>>, Vec<u8>>;

/// Console fed from `input` that captures everything printed.
pub fn scripted_console(input: &str) -> ScriptedConsole {
    LineConsole::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
}

/// Everything written to a scripted console so far.
pub fn console_output(console: &ScriptedConsole) -> String {
    String::from_utf8_lossy(console.output()).into_owned()
}
