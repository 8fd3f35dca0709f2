// Line-oriented extraction of step-indexed numeric vectors from controller logs.
use std::io::BufRead;

use regex::Regex;
use thiserror::Error;

use crate::config::DataKind;

const STEP_PATTERN: &str = r"Step (\d+):";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid pattern for kind '{kind}': {source}")]
    Pattern {
        kind: String,
        source: regex::Error,
    },
    #[error("malformed value '{token}' at step {step}")]
    BadToken { token: String, step: u64 },
    #[error("row width {got} at step {step} does not match first row width {expected}")]
    RaggedRow {
        step: u64,
        got: usize,
        expected: usize,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Compiled matcher for one data kind.
#[derive(Debug)]
pub struct KindMatcher {
    pub name: String,
    pub label: String,
    data_re: Regex,
}

impl KindMatcher {
    pub fn compile(kind: &DataKind) -> Result<Self, ParseError> {
        let data_re = Regex::new(&kind.pattern).map_err(|source| ParseError::Pattern {
            kind: kind.name.clone(),
            source,
        })?;
        Ok(Self {
            name: kind.name.clone(),
            label: kind.label.clone(),
            data_re,
        })
    }
}

/// Step list and value matrix extracted for one data kind.
/// `steps.len() == matrix.len()` and all rows share the same width.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Extraction {
    pub steps: Vec<u64>,
    pub matrix: Vec<Vec<f64>>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    pub fn channels(&self) -> usize {
        self.matrix.first().map(|row| row.len()).unwrap_or(0)
    }
}

/// Scan the log line by line, carrying the most recently seen step index.
/// A data line seen before the first step line produces no record. A line may
/// match both the step rule and the data rule; the step rule applies first.
pub fn extract<R: BufRead>(reader: R, kind: &KindMatcher) -> Result<Extraction, ParseError> {
    let step_re = Regex::new(STEP_PATTERN).expect("step pattern");
    let mut out = Extraction::default();
    let mut current_step: Option<u64> = None;

    for line in reader.lines() {
        let line = line?;
        if let Some(caps) = step_re.captures(&line) {
            if let Ok(step) = caps[1].parse::<u64>() {
                current_step = Some(step);
            }
        }
        if let Some(caps) = kind.data_re.captures(&line) {
            if let Some(step) = current_step {
                let row = split_values(&caps[1], step)?;
                if let Some(first) = out.matrix.first() {
                    if row.len() != first.len() {
                        return Err(ParseError::RaggedRow {
                            step,
                            got: row.len(),
                            expected: first.len(),
                        });
                    }
                }
                out.steps.push(step);
                out.matrix.push(row);
            }
        }
    }
    Ok(out)
}

fn split_values(list: &str, step: u64) -> Result<Vec<f64>, ParseError> {
    list.split(", ")
        .map(|token| {
            token.trim().parse::<f64>().map_err(|_| ParseError::BadToken {
                token: token.to_string(),
                step,
            })
        })
        .collect()
}
