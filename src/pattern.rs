use std::path::Path;
use std::time::Duration;

use config_file::FromConfigFile;
use serde::Deserialize;
use thiserror::Error;

use crate::colors::Palette;

const DEFAULT_INTERVAL_MS: u64 = 500;

// Same record layout the widget always shipped with: "pattern" holds the
// palette indices, "interval" the tick length in milliseconds.
const EMBEDDED_PATTERNS: &str = r#"
[
    {"pattern": [0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1], "interval": 500},
    {"pattern": [0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4], "interval": 500}
]
"#;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("no patterns defined")]
    NoPatterns,
    #[error("pattern '{0}' has an empty sequence")]
    EmptySequence(String),
    #[error("pattern '{0}' has a zero interval")]
    ZeroInterval(String),
    #[error("pattern '{name}' uses color {index} at position {position}, but the palette only has {palette_len} colors")]
    ColorOutOfRange {
        name: String,
        index: u64,
        position: usize,
        palette_len: usize,
    },
    #[error("malformed pattern definitions: {0}")]
    Parse(String),
    #[error("cannot read pattern file {path}: {reason}")]
    File { path: String, reason: String },
}

/// A named, immutable sequence of palette indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    name: String,
    sequence: Vec<u8>,
    interval: Duration,
}

impl Pattern {
    pub fn new(
        name: &str,
        sequence: &[u64],
        interval_ms: u64,
        palette: &Palette,
    ) -> Result<Pattern, PatternError> {
        if sequence.is_empty() {
            return Err(PatternError::EmptySequence(name.to_string()));
        }
        if interval_ms == 0 {
            return Err(PatternError::ZeroInterval(name.to_string()));
        }

        let mut indices = Vec::with_capacity(sequence.len());
        for (position, &index) in sequence.iter().enumerate() {
            match u8::try_from(index) {
                Ok(color) if palette.contains(index) => indices.push(color),
                _ => {
                    return Err(PatternError::ColorOutOfRange {
                        name: name.to_string(),
                        index,
                        position,
                        palette_len: palette.len(),
                    })
                }
            }
        }

        Ok(Pattern {
            name: name.to_string(),
            sequence: indices,
            interval: Duration::from_millis(interval_ms),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

/// One `[[pattern]]` table of a pattern file.
#[derive(Debug, Deserialize)]
struct PatternDefinition {
    name: Option<String>,
    sequence: Vec<u64>,
    #[serde(default = "default_interval_ms")]
    interval_ms: u64,
}

#[derive(Debug, Deserialize)]
struct PatternFile {
    #[serde(default)]
    pattern: Vec<PatternDefinition>,
}

fn build_patterns(
    definitions: Vec<PatternDefinition>,
    palette: &Palette,
) -> Result<Vec<Pattern>, PatternError> {
    if definitions.is_empty() {
        return Err(PatternError::NoPatterns);
    }

    definitions
        .into_iter()
        .enumerate()
        .map(|(i, definition)| {
            let name = definition
                .name
                .unwrap_or_else(|| format!("pattern-{}", i + 1));
            Pattern::new(&name, &definition.sequence, definition.interval_ms, palette)
        })
        .collect()
}

fn parse_json_definitions(source: &str) -> Result<Vec<PatternDefinition>, PatternError> {
    let parsed = json::parse(source).map_err(|err| PatternError::Parse(err.to_string()))?;
    if !parsed.is_array() {
        return Err(PatternError::Parse(
            "expected a list of pattern records".to_string(),
        ));
    }

    let mut definitions = Vec::new();
    for (i, entry) in parsed.members().enumerate() {
        if !entry["pattern"].is_array() {
            return Err(PatternError::Parse(format!(
                "record {} has no \"pattern\" list",
                i + 1
            )));
        }

        let mut sequence = Vec::new();
        for value in entry["pattern"].members() {
            match value.as_u64() {
                Some(index) => sequence.push(index),
                None => {
                    return Err(PatternError::Parse(format!(
                        "record {} contains a non-integer color index: {}",
                        i + 1,
                        value
                    )))
                }
            }
        }

        let interval_ms = if entry.has_key("interval") {
            match entry["interval"].as_u64() {
                Some(interval_ms) => interval_ms,
                None => {
                    return Err(PatternError::Parse(format!(
                        "record {} has an invalid interval: {}",
                        i + 1,
                        entry["interval"]
                    )))
                }
            }
        } else {
            DEFAULT_INTERVAL_MS
        };

        definitions.push(PatternDefinition {
            name: entry["name"].as_str().map(str::to_string),
            sequence,
            interval_ms,
        });
    }

    Ok(definitions)
}

/// Parses a JSON list of `{"pattern": [...], "interval": ms}` records.
pub fn parse_json(source: &str, palette: &Palette) -> Result<Vec<Pattern>, PatternError> {
    build_patterns(parse_json_definitions(source)?, palette)
}

/// The pattern set compiled into the binary.
pub fn load_embedded(palette: &Palette) -> Result<Vec<Pattern>, PatternError> {
    parse_json(EMBEDDED_PATTERNS, palette)
}

/// Loads `[[pattern]]` tables from a TOML or JSON file, picked by extension.
pub fn load_file(path: &Path, palette: &Palette) -> Result<Vec<Pattern>, PatternError> {
    let file = PatternFile::from_config_file(path).map_err(|err| PatternError::File {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    build_patterns(file.pattern, palette)
}
