use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ClassifiedParseError, ParseError};
use crate::event::LircEvent;

/// Turns one delimiter-stripped line into an event.
pub trait LineParser {
    type Event;
    type Error: ClassifiedParseError;

    fn parse_line(&mut self, line: &str) -> Result<Self::Event, Self::Error>;
}

/// Parser for the lircd broadcast format `<code> <repeat> <key> <remote>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LircLineParser;

impl LircLineParser {
    pub fn new() -> Self {
        Self
    }
}

impl LineParser for LircLineParser {
    type Event = LircEvent;
    type Error = ParseError;

    fn parse_line(&mut self, line: &str) -> Result<LircEvent, ParseError> {
        parse_line(line)
    }
}

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<code>[0-9a-f]+) (?P<count>[0-9a-f]+) (?P<key>\S+) (?P<remote>\S+)$")
            .expect("lircd line pattern compiles")
    })
}

/// Parses a single lircd line (without its trailing newline).
///
/// The whole line must match; fields are separated by exactly one space.
pub fn parse_line(line: &str) -> Result<LircEvent, ParseError> {
    let Some(caps) = line_pattern().captures(line) else {
        return Err(ParseError::Malformed {
            line: line.to_string(),
        });
    };
    Ok(LircEvent {
        code: caps["code"].to_string(),
        repeat_count: caps["count"].to_string(),
        key: caps["key"].to_string(),
        remote: caps["remote"].to_string(),
    })
}
