// crates/mg-gradio/src/sse.rs

use std::io::BufRead;
use log::debug;
use serde_json::Value;
use mg_core::ServiceError;

/// How a call's event stream ended
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    Complete(Vec<Value>),
    /// The app raised; the message is only present when it chose to show it
    Error(Option<String>),
}

/// Read a `/call/{endpoint}/{event_id}` event stream until its terminal event.
///
/// Anything other than `complete` or `error` (heartbeats, `generating`
/// updates) is skipped.
pub fn read_outcome<R: BufRead>(reader: R, endpoint: &str) -> Result<StreamOutcome, ServiceError> {
    let mut event: Option<String> = None;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');

        if line.is_empty() {
            event = None;
        } else if let Some(name) = field(line, "event") {
            event = Some(name.to_string());
        } else if let Some(data) = field(line, "data") {
            match event.as_deref() {
                Some("complete") => {
                    let outputs: Vec<Value> = serde_json::from_str(data).map_err(|e| {
                        ServiceError::protocol(endpoint, format!("malformed outputs: {}", e))
                    })?;
                    return Ok(StreamOutcome::Complete(outputs));
                }
                Some("error") => return Ok(StreamOutcome::Error(error_message(data))),
                other => debug!("{}: skipping '{}' event", endpoint, other.unwrap_or("message")),
            }
        }
    }

    Err(ServiceError::protocol(endpoint, "event stream ended before the call completed"))
}

fn field<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let value = line.strip_prefix(name)?.strip_prefix(':')?;
    Some(value.strip_prefix(' ').unwrap_or(value))
}

fn error_message(data: &str) -> Option<String> {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::Null) => None,
        Ok(Value::String(message)) => Some(message),
        Ok(other) => Some(other.to_string()),
        Err(_) if data.trim().is_empty() => None,
        Err(_) => Some(data.to_string()),
    }
}
