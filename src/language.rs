//! Language modes a room can agree on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Editor/execution language for the shared buffer.
///
/// Anything outside the four known modes collapses to [`Language::JavaScript`];
/// there is no error path for an unknown mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    JavaScript,
    Python,
    Java,
    Cpp,
}

impl Language {
    pub const ALL: [Language; 4] = [Self::JavaScript, Self::Python, Self::Java, Self::Cpp];

    /// Wire name, as carried in `languageChange` / `compileCode` payloads.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Java => "java",
            Self::Cpp => "cpp",
        }
    }

    /// Parse a wire name, falling back to JavaScript for unknown values.
    #[must_use]
    pub fn parse_or_default(raw: &str) -> Self {
        Self::ALL.into_iter().find(|lang| lang.as_str() == raw).unwrap_or_default()
    }

    /// Infer a language from a file name's extension.
    ///
    /// The extension is whatever follows the last `.`; matching is exact and
    /// case-sensitive. A name without a `.` has no extension.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Self {
        file_name.rsplit_once('.').map_or(Self::default(), |(_, ext)| match ext {
            "js" => Self::JavaScript,
            "py" => Self::Python,
            "java" => Self::Java,
            "cpp" => Self::Cpp,
            _ => Self::default(),
        })
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "language_test.rs"]
mod tests;
