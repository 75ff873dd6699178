use std::env;

use color_eyre::owo_colors::OwoColorize;

use crate::output::Status;

pub struct Style {
    enabled: bool,
}

impl Style {
    pub fn new(force_no_color: bool, is_tty: bool) -> Self {
        let env_no_color = env::var_os("NO_COLOR").is_some();
        Self {
            enabled: !(force_no_color || env_no_color) && is_tty,
        }
    }

    pub fn status(&self, status: Status, text: &str) -> String {
        let (symbol, tone) = match status {
            Status::Ok => ("✔", Tone::Green),
            Status::NotFound | Status::UserError => ("✗", Tone::Yellow),
            Status::Failure => ("✖", Tone::Red),
        };
        let line = format!("{symbol} {text}");
        self.paint(&line, tone)
    }

    pub fn info(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        text.cyan().to_string()
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.enabled {
            return text.to_string();
        }
        match tone {
            Tone::Green => text.green().bold().to_string(),
            Tone::Yellow => text.yellow().bold().to_string(),
            Tone::Red => text.red().bold().to_string(),
        }
    }
}

enum Tone {
    Green,
    Yellow,
    Red,
}
