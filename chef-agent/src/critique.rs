//! Critic verdicts and the parsing of structured model replies

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Marker that approves a plan when the critic answers in free text
pub const APPROVAL_MARKER: &str = "APPROVED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "APPROVED")]
    Approved,
    #[serde(rename = "NEEDS_REVISION", alias = "NEEDS REVISION")]
    NeedsRevision,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "APPROVED"),
            Self::NeedsRevision => write!(f, "NEEDS REVISION"),
        }
    }
}

/// A critic's evaluation of one plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Critique {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub verdict: Verdict,
    /// Free-text body when the reply was not structured
    #[serde(skip)]
    pub notes: Option<String>,
}

impl Critique {
    /// Response schema requested from the critic
    pub fn schema() -> serde_json::Value {
        let list = json!({ "type": "array", "items": { "type": "string" } });
        json!({
            "type": "object",
            "properties": {
                "strengths": list,
                "concerns": list,
                "suggestions": list,
                "verdict": { "type": "string", "enum": ["APPROVED", "NEEDS_REVISION"] }
            },
            "required": ["strengths", "concerns", "suggestions", "verdict"]
        })
    }

    /// Parse a critic reply. Structured JSON wins; anything else is kept as
    /// notes and approved only if it contains [`APPROVAL_MARKER`].
    pub fn parse(text: &str) -> Self {
        if let Ok(critique) = serde_json::from_str::<Critique>(json_payload(text)) {
            return critique;
        }

        let verdict = if text.contains(APPROVAL_MARKER) {
            Verdict::Approved
        } else {
            Verdict::NeedsRevision
        };
        Self {
            strengths: Vec::new(),
            concerns: Vec::new(),
            suggestions: Vec::new(),
            verdict,
            notes: Some(text.trim().to_string()),
        }
    }

    pub fn is_approved(&self) -> bool {
        self.verdict == Verdict::Approved
    }
}

impl fmt::Display for Critique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(notes) = &self.notes {
            return write!(f, "{}", notes);
        }

        let sections = [
            ("✅ STRENGTHS:", &self.strengths),
            ("⚠️ CONCERNS:", &self.concerns),
            ("💡 SUGGESTIONS:", &self.suggestions),
        ];
        for (title, items) in sections {
            if items.is_empty() {
                continue;
            }
            writeln!(f, "{}", title)?;
            for item in items {
                writeln!(f, "- {}", item)?;
            }
            writeln!(f)?;
        }
        write!(f, "VERDICT: {}", self.verdict)
    }
}

/// Strip a markdown code fence around a JSON reply, if present.
pub(crate) fn json_payload(content: &str) -> &str {
    if content.contains("```json") {
        content
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(|s| s.trim())
            .unwrap_or(content)
    } else if content.contains("```") {
        content
            .split("```")
            .nth(1)
            .map(|s| s.trim())
            .unwrap_or(content)
    } else {
        content.trim()
    }
}
