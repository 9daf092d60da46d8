//! # INI configuration
//!
//! A small INI reader for application settings:
//!
//! ```text
//! [project]
//! project = demo
//! logpath = "/var/log/demo/"
//!
//! [server]
//! addr = 0.0.0.0:9999
//! ```
//!
//! Lines are trimmed. Blank lines and lines starting with `#` or `;` are
//! skipped, as is anything before the first section header. A header must end
//! in `]`; any other line must contain `=`. Keys and values are trimmed and a
//! value longer than two characters loses a surrounding pair of `"` or `'`.
//! Declaring a section again starts it afresh.
//!
//! A malformed file fails the whole load; nothing is partially applied.
//!
//! ```
//! use xia::config::IniConfig;
//!
//! let cfg = IniConfig::parse_str("[s]\nk = v\n").unwrap();
//! assert_eq!(cfg.get_value("s", "k", ""), "v");
//! assert_eq!(cfg.get_value("s", "missing", "dflt"), "dflt");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug)]
pub enum ConfigError {
    /// Malformed line, 1-based
    Format { line: usize, message: String },
    Io { path: PathBuf, source: io::Error },
    /// A value is present but does not parse as the requested type
    InvalidValue {
        section: String,
        key: String,
        value: String,
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Format { line, message } => write!(f, "line {line}: {message}"),
            ConfigError::Io { path, source } => {
                write!(f, "cannot read config {}: {source}", path.display())
            }
            ConfigError::InvalidValue {
                section,
                key,
                value,
                expected,
            } => write!(f, "[{section}] {key} = {value:?} is not a valid {expected}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

type Section = HashMap<String, String>;

/// Parsed INI file: section name to key/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniConfig {
    sections: HashMap<String, Section>,
}

impl IniConfig {
    /// Read and parse the file at `path`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Format`] on the first malformed line.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::parse_str(&text)?;
        debug!(path = %path.display(), sections = cfg.sections.len(), "Config loaded");
        Ok(cfg)
    }

    /// Parse INI text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Format`] on the first malformed line.
    pub fn parse_str(text: &str) -> Result<Self, ConfigError> {
        let mut sections: HashMap<String, Section> = HashMap::new();
        let mut current: Option<String> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header.strip_suffix(']').ok_or_else(|| ConfigError::Format {
                    line: idx + 1,
                    message: format!("section header {line:?} is missing ']'"),
                })?;
                let name = name.trim().to_string();
                sections.insert(name.clone(), Section::new());
                current = Some(name);
                continue;
            }

            let Some(section) = current.as_ref() else {
                continue;
            };

            let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::Format {
                line: idx + 1,
                message: format!("expected key = value, got {line:?}"),
            })?;
            sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_string(), unquote(value.trim()).to_string());
        }

        Ok(Self { sections })
    }

    /// Raw value, if both section and key exist.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(String::as_str)
    }

    /// Value or `default` when absent.
    #[must_use]
    pub fn get_value(&self, section: &str, key: &str, default: &str) -> String {
        self.get(section, key).unwrap_or(default).to_string()
    }

    /// Integer value or `default` when absent.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] when present but not an integer.
    pub fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, ConfigError> {
        self.parsed(section, key, default, "integer")
    }

    /// Float value or `default` when absent.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] when present but not a number.
    pub fn get_float(&self, section: &str, key: &str, default: f64) -> Result<f64, ConfigError> {
        self.parsed(section, key, default, "float")
    }

    /// Boolean value or `default` when absent.
    ///
    /// Accepts `true`/`false`, `yes`/`no`, `on`/`off` and `1`/`0`,
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for anything else.
    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(value) = self.get(section, key) else {
            return Ok(default);
        };
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(self.invalid(section, key, value, "boolean")),
        }
    }

    /// Section names, sorted.
    #[must_use]
    pub fn sections(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn parsed<T: std::str::FromStr>(
        &self,
        section: &str,
        key: &str,
        default: T,
        expected: &'static str,
    ) -> Result<T, ConfigError> {
        match self.get(section, key) {
            None => Ok(default),
            Some(value) => value
                .parse()
                .map_err(|_| self.invalid(section, key, value, expected)),
        }
    }

    fn invalid(&self, section: &str, key: &str, value: &str, expected: &'static str) -> ConfigError {
        ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            expected,
        }
    }
}

/// Strip one leading and one trailing quote, each side on its own.
fn unquote(value: &str) -> &str {
    if value.len() <= 2 {
        return value;
    }
    let is_quote = |c: char| c == '"' || c == '\'';
    let value = value.strip_prefix(is_quote).unwrap_or(value);
    value.strip_suffix(is_quote).unwrap_or(value).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_basic_section() {
        let cfg = IniConfig::parse_str("[s]\nk = v").unwrap();
        assert_eq!(cfg.get_value("s", "k", ""), "v");
        assert_eq!(cfg.get_value("s", "nope", "d"), "d");
        assert_eq!(cfg.get_value("other", "k", "d"), "d");
    }

    #[test]
    fn test_comments_blank_lines_and_preamble() {
        let cfg = IniConfig::parse_str(
            "orphan = 1\n\n# comment\n; also comment\n[a]\n  x =  1  \n",
        )
        .unwrap();
        assert_eq!(cfg.sections(), vec!["a"]);
        assert_eq!(cfg.get("a", "x"), Some("1"));
        assert_eq!(cfg.get("a", "orphan"), None);
    }

    #[test]
    fn test_quotes_are_stripped() {
        let cfg = IniConfig::parse_str("[q]\na = \"hello\"\nb = 'x y'\nc = \"\"\nd = 'x\"\n").unwrap();
        assert_eq!(cfg.get("q", "a"), Some("hello"));
        assert_eq!(cfg.get("q", "b"), Some("x y"));
        // Too short to strip.
        assert_eq!(cfg.get("q", "c"), Some("\"\""));
        assert_eq!(cfg.get("q", "d"), Some("x"));
    }

    #[test]
    fn test_unbalanced_quote_is_stripped_on_its_own() {
        let cfg = IniConfig::parse_str("[p]\nlogpath = \"/var/log/\nname = xia'\nmixed = \" padded '\n").unwrap();
        assert_eq!(cfg.get("p", "logpath"), Some("/var/log/"));
        assert_eq!(cfg.get("p", "name"), Some("xia"));
        assert_eq!(cfg.get("p", "mixed"), Some("padded"));
    }

    #[test]
    fn test_value_may_contain_equals() {
        let cfg = IniConfig::parse_str("[db]\ndsn = user=a;pass=b\n").unwrap();
        assert_eq!(cfg.get("db", "dsn"), Some("user=a;pass=b"));
    }

    #[test]
    fn test_redeclared_section_starts_fresh() {
        let cfg = IniConfig::parse_str("[s]\na = 1\n[t]\n[s]\nb = 2\n").unwrap();
        assert_eq!(cfg.get("s", "a"), None);
        assert_eq!(cfg.get("s", "b"), Some("2"));
    }

    #[test]
    fn test_bad_header_reports_line() {
        let err = IniConfig::parse_str("[ok]\n\n[broken\n").unwrap_err();
        match err {
            ConfigError::Format { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_line_without_equals_is_error() {
        let err = IniConfig::parse_str("[s]\njustakey\n").unwrap_err();
        assert!(matches!(err, ConfigError::Format { line: 2, .. }));
    }

    #[test]
    fn test_typed_accessors() {
        let cfg = IniConfig::parse_str("[n]\ni = 42\nf = 2.5\nb = Yes\nbad = x\n").unwrap();
        assert_eq!(cfg.get_int("n", "i", 0).unwrap(), 42);
        assert_eq!(cfg.get_int("n", "missing", 7).unwrap(), 7);
        assert!((cfg.get_float("n", "f", 0.0).unwrap() - 2.5).abs() < f64::EPSILON);
        assert!(cfg.get_bool("n", "b", false).unwrap());
        assert!(matches!(
            cfg.get_int("n", "bad", 0),
            Err(ConfigError::InvalidValue { expected: "integer", .. })
        ));
        assert!(cfg.get_bool("n", "bad", false).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "[project]\nproject = demo\n").unwrap();
        let cfg = IniConfig::load(file.path()).unwrap();
        assert_eq!(cfg.get("project", "project"), Some("demo"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = IniConfig::load("/definitely/not/here.ini").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.ini"));
    }
}
