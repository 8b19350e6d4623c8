use std::num::ParseIntError;

use serde::{Deserialize, Serialize};

/// One decoded lircd status line.
///
/// Fields are kept as the text the daemon sent; `repeat_count` is only
/// interpreted numerically when a dispatcher throttles.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct LircEvent {
    /// Raw IR code, hexadecimal.
    pub code: String,
    /// Repeat counter for a held button, as sent.
    pub repeat_count: String,
    /// Button name as configured in `lircd.conf`.
    pub key: String,
    /// Remote name as configured in `lircd.conf`.
    pub remote: String,
}

impl LircEvent {
    pub fn new(
        code: impl Into<String>,
        repeat_count: impl Into<String>,
        key: impl Into<String>,
        remote: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            repeat_count: repeat_count.into(),
            key: key.into(),
            remote: remote.into(),
        }
    }

    /// The repeat counter as a decimal integer; counts with hex digits fail.
    pub fn repeat_count_value(&self) -> Result<u64, ParseIntError> {
        self.repeat_count.parse::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_count_is_read_as_decimal() {
        let ev = LircEvent::new("a3f", "10", "KEY_UP", "sony_tv");
        assert_eq!(ev.repeat_count_value().unwrap(), 10);
        let ev = LircEvent::new("a3f", "05", "KEY_UP", "sony_tv");
        assert_eq!(ev.repeat_count_value().unwrap(), 5);
    }

    #[test]
    fn repeat_count_with_hex_digits_is_rejected() {
        let ev = LircEvent::new("a3f", "0a", "KEY_UP", "sony_tv");
        assert!(ev.repeat_count_value().is_err());
    }

    #[test]
    fn repeat_count_rejects_garbage() {
        let ev = LircEvent::new("a3f", "zz", "KEY_UP", "sony_tv");
        assert!(ev.repeat_count_value().is_err());
    }

    #[test]
    fn serializes_with_field_names() {
        let ev = LircEvent::new("a3f", "05", "KEY_UP", "sony_tv");
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["code"], "a3f");
        assert_eq!(json["repeat_count"], "05");
        assert_eq!(json["key"], "KEY_UP");
        assert_eq!(json["remote"], "sony_tv");
    }
}
