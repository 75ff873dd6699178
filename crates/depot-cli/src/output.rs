use atty::Stream;
use color_eyre::Result;
use serde::Serialize;
use serde_json::{json, Value};

use crate::style::Style;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Ok,
    NotFound,
    UserError,
    Failure,
}

impl Status {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::NotFound | Self::UserError => 1,
            Self::Failure => 2,
        }
    }
}

/// Result of one command, rendered either for humans or as JSON.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub status: Status,
    pub message: String,
    pub details: Value,
    /// Printed after the status line in human mode.
    #[serde(skip)]
    pub body: Option<String>,
}

impl Outcome {
    pub fn new(status: Status, message: impl Into<String>, details: Value) -> Self {
        Self {
            status,
            message: message.into(),
            details,
            body: None,
        }
    }

    pub fn ok(message: impl Into<String>, details: Value) -> Self {
        Self::new(Status::Ok, message, details)
    }

    /// An error with a diagnostic code, e.g. `DP102`.
    pub fn error(status: Status, code: &str, message: impl Into<String>) -> Self {
        Self::new(status, message, json!({ "code": code }))
    }

    #[must_use]
    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }
}

pub fn emit(outcome: &Outcome, json: bool, no_color: bool) -> Result<i32> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        let style = Style::new(no_color, atty::is(Stream::Stdout));
        println!("{}", style.status(outcome.status, &outcome.message));
        if let Some(hint) = outcome.details.get("hint").and_then(Value::as_str) {
            println!("{}", style.info(&format!("Hint: {hint}")));
        }
        if let Some(body) = &outcome.body {
            print!("{body}");
        }
    }
    Ok(outcome.status.exit_code())
}
