//! Key chords such as `ctrl+shift+c`.

use crate::error::SensorError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

const MODIFIER_ORDER: [&str; 4] = ["ctrl", "alt", "shift", "meta"];

/// A set of keys that must be held together. Key names are normalized to
/// lowercase with common aliases folded (`control` → `ctrl`, `esc` → `escape`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Chord {
    keys: BTreeSet<String>,
}

pub fn normalize_key(key: &str) -> String {
    let key = key.trim().to_lowercase();
    match key.as_str() {
        "control" | "ctl" => "ctrl".to_string(),
        "option" | "opt" => "alt".to_string(),
        "cmd" | "command" | "super" | "win" | "windows" => "meta".to_string(),
        "esc" => "escape".to_string(),
        "return" => "enter".to_string(),
        _ => key,
    }
}

impl Chord {
    pub fn parse(spec: &str) -> Result<Self, SensorError> {
        let mut keys = BTreeSet::new();
        for part in spec.split('+') {
            let key = normalize_key(part);
            if key.is_empty() {
                return Err(SensorError::InvalidChord(spec.to_string()));
            }
            keys.insert(key);
        }
        Ok(Self { keys })
    }

    pub fn keys(&self) -> &BTreeSet<String> {
        &self.keys
    }

    /// Every key of the chord is currently held.
    pub fn is_satisfied_by(&self, pressed: &BTreeSet<String>) -> bool {
        self.keys.is_subset(pressed)
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = MODIFIER_ORDER
            .iter()
            .filter(|m| self.keys.contains(**m))
            .map(|m| m.to_string());
        let others = self
            .keys
            .iter()
            .filter(|k| !MODIFIER_ORDER.contains(&k.as_str()))
            .cloned();
        let parts: Vec<String> = modifiers.chain(others).collect();
        f.write_str(&parts.join("+"))
    }
}

impl FromStr for Chord {
    type Err = SensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chord::parse(s)
    }
}

impl TryFrom<String> for Chord {
    type Error = SensorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Chord::parse(&value)
    }
}

impl From<Chord> for String {
    fn from(chord: Chord) -> Self {
        chord.to_string()
    }
}
