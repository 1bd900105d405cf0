use cosmos_common::ObjectCode;
use cosmos_nav::{NavError, Reply};
use serde::{Deserialize, Serialize};

/// Longest accepted request line, in bytes, excluding the newline.
pub const MAX_LINE_LEN: usize = 4096;

/// One response line on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    /// Session location after the command; `None` is the root.
    pub location: Option<ObjectCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<Reply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn from_result(result: Result<Reply, NavError>, location: Option<ObjectCode>) -> Self {
        match result {
            Ok(reply) => Self {
                ok: true,
                location,
                reply: Some(reply),
                error: None,
            },
            Err(e) => Self::error(e.to_string(), location),
        }
    }

    pub fn error(message: impl Into<String>, location: Option<ObjectCode>) -> Self {
        Self {
            ok: false,
            location,
            reply: None,
            error: Some(message.into()),
        }
    }

    /// Encode as a single JSON line, newline included.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
