//! Natural ("human") ordering of file names.
//!
//! `2.css` sorts before `10.css` and version `1.9` before `1.10`. Each name
//! is turned into a [`NaturalKey`] once and the keys are compared, so the
//! order is total and transitive by construction.

use std::cmp::Ordering;
use std::path::Path;

use drape_types::Result;

/// A run of ASCII digits, compared by numeric value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumberRun {
    /// Digits with leading zeros stripped (`"0"` for all zeros).
    value: String,
    /// Original width, so `01` and `1` stay distinct.
    width: usize,
}

impl NumberRun {
    fn new(digits: &str) -> Self {
        let trimmed = digits.trim_start_matches('0');
        Self {
            value: if trimmed.is_empty() {
                "0".to_string()
            } else {
                trimmed.to_string()
            },
            width: digits.len(),
        }
    }
}

impl Ord for NumberRun {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .len()
            .cmp(&other.value.len())
            .then_with(|| self.value.cmp(&other.value))
            .then_with(|| self.width.cmp(&other.width))
    }
}

impl PartialOrd for NumberRun {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One alternating run of a name. Numbers sort before text when the kinds
/// differ at the same position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NaturalPart {
    Number(NumberRun),
    Text(String),
}

/// Composite sort key for a name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NaturalKey(Vec<NaturalPart>);

impl NaturalKey {
    pub fn parts(&self) -> &[NaturalPart] {
        &self.0
    }
}

/// Split `name` into alternating digit and non-digit runs.
pub fn natural_key(name: &str) -> NaturalKey {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_digits = None;
    for (i, ch) in name.char_indices() {
        let digit = ch.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != digit => {
                parts.push(make_part(&name[start..i], prev));
                start = i;
            },
            _ => {},
        }
        in_digits = Some(digit);
    }
    if let Some(digit) = in_digits {
        parts.push(make_part(&name[start..], digit));
    }
    NaturalKey(parts)
}

fn make_part(run: &str, digits: bool) -> NaturalPart {
    if digits {
        NaturalPart::Number(NumberRun::new(run))
    } else {
        NaturalPart::Text(run.to_string())
    }
}

/// Sort names in natural order.
pub fn sort_naturally<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by_cached_key(|n| natural_key(n.as_ref()));
}

/// List the entries of `dir` whose names pass `keep`, naturally sorted.
///
/// A missing directory yields an empty list.
pub fn dir_entries(dir: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut names = Vec::new();
    for entry in entries {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if keep(&name) {
            names.push(name);
        }
    }
    sort_naturally(&mut names);
    Ok(names)
}
