//! Request fingerprints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which orchestrator operation produced a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Suggestions,
    Fixes,
    CodeQuality,
    Documentation,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Suggestions => "suggestions",
            RequestKind::Fixes => "fixes",
            RequestKind::CodeQuality => "code_quality",
            RequestKind::Documentation => "documentation",
        }
    }
}

/// Stable hash identifying a provider request.
///
/// Computed over the request kind and the composed prompt. The prompt is a
/// pure function of the prompt-relevant context fields plus command and query,
/// so two requests share a fingerprint exactly when they would send the same
/// text to the provider. Capture timestamps never reach the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn compute(kind: RequestKind, prompt: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(kind.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(prompt.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
