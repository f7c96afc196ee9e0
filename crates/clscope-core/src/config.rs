//! Exclusion configuration.
//!
//! Each consumer context (static analysis, highlighting, definition and
//! reference lookup) picks one of six exclusion modes. Unknown mode names
//! fall back to [`ExcludeMode::None`] with a warning.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Which scanner ranges are removed from analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum ExcludeMode {
    /// Nothing is excluded.
    None,
    /// Comments and strings.
    #[default]
    CommentString,
    /// Comments, strings and single-quoted forms.
    CommentStringQuote,
    /// Comments, strings and backquoted forms.
    CommentStringBackquote,
    /// Comments, strings, single-quoted and backquoted forms.
    CommentStringQuoteBackquote,
    /// As `CommentStringQuoteBackquote`, but comma-escaped forms stay in.
    CommentStringQuoteBackquoteExceptComma,
}

impl ExcludeMode {
    pub const ALL: [ExcludeMode; 6] = [
        ExcludeMode::None,
        ExcludeMode::CommentString,
        ExcludeMode::CommentStringQuote,
        ExcludeMode::CommentStringBackquote,
        ExcludeMode::CommentStringQuoteBackquote,
        ExcludeMode::CommentStringQuoteBackquoteExceptComma,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExcludeMode::None => "none",
            ExcludeMode::CommentString => "comment-string",
            ExcludeMode::CommentStringQuote => "comment-string-quote",
            ExcludeMode::CommentStringBackquote => "comment-string-backquote",
            ExcludeMode::CommentStringQuoteBackquote => "comment-string-quote-backquote",
            ExcludeMode::CommentStringQuoteBackquoteExceptComma => {
                "comment-string-quote-backquote-except-comma"
            }
        }
    }

    pub fn excludes_comments_and_strings(self) -> bool {
        self != ExcludeMode::None
    }

    pub fn excludes_quote(self) -> bool {
        matches!(
            self,
            ExcludeMode::CommentStringQuote
                | ExcludeMode::CommentStringQuoteBackquote
                | ExcludeMode::CommentStringQuoteBackquoteExceptComma
        )
    }

    pub fn excludes_backquote(self) -> bool {
        matches!(
            self,
            ExcludeMode::CommentStringBackquote
                | ExcludeMode::CommentStringQuoteBackquote
                | ExcludeMode::CommentStringQuoteBackquoteExceptComma
        )
    }

    /// Comma-escaped ranges are put back after quote exclusion.
    pub fn keeps_comma(self) -> bool {
        self == ExcludeMode::CommentStringQuoteBackquoteExceptComma
    }

    /// Parse a mode name, falling back to [`ExcludeMode::None`] (exclude
    /// nothing) when the name is not recognized.
    pub fn parse_lossy(name: &str) -> ExcludeMode {
        match name.parse() {
            Ok(mode) => mode,
            Err(err) => {
                tracing::warn!("{err}; excluding nothing");
                ExcludeMode::None
            }
        }
    }
}

impl FromStr for ExcludeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '_' | ' ' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        ExcludeMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| Error::UnknownExcludeMode(s.to_string()))
    }
}

impl From<String> for ExcludeMode {
    fn from(s: String) -> Self {
        ExcludeMode::parse_lossy(&s)
    }
}

impl fmt::Display for ExcludeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exclusion modes for the three consumer contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    /// Used by the definition collector.
    pub static_analysis: ExcludeMode,
    /// Used by semantic highlighting.
    pub highlight: ExcludeMode,
    /// Used by definition and reference lookup.
    pub lookup: ExcludeMode,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            static_analysis: ExcludeMode::CommentStringQuoteBackquoteExceptComma,
            highlight: ExcludeMode::CommentString,
            lookup: ExcludeMode::CommentString,
        }
    }
}

impl AnalysisConfig {
    /// Apply the same mode to every context.
    pub fn uniform(mode: ExcludeMode) -> Self {
        AnalysisConfig {
            static_analysis: mode,
            highlight: mode,
            lookup: mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_mode_name() {
        for mode in ExcludeMode::ALL {
            assert_eq!(mode.as_str().parse::<ExcludeMode>(), Ok(mode));
        }
    }

    #[test]
    fn parse_is_case_and_separator_insensitive() {
        assert_eq!(
            "Comment_String Quote".parse::<ExcludeMode>(),
            Ok(ExcludeMode::CommentStringQuote)
        );
    }

    #[test]
    fn unknown_mode_is_error() {
        assert_eq!(
            "everything".parse::<ExcludeMode>(),
            Err(Error::UnknownExcludeMode("everything".into()))
        );
    }

    #[test]
    fn unknown_mode_falls_back_to_none() {
        assert_eq!(ExcludeMode::parse_lossy("everything"), ExcludeMode::None);
    }

    #[test]
    fn mode_flags() {
        let m = ExcludeMode::CommentStringQuoteBackquoteExceptComma;
        assert!(m.excludes_comments_and_strings());
        assert!(m.excludes_quote());
        assert!(m.excludes_backquote());
        assert!(m.keeps_comma());
        assert!(!ExcludeMode::None.excludes_comments_and_strings());
        assert!(!ExcludeMode::CommentStringBackquote.excludes_quote());
    }

    #[test]
    fn config_deserializes_with_defaults_and_fallback() {
        let cfg: AnalysisConfig =
            serde_json::from_str(r#"{"highlight": "none", "lookup": "nonsense"}"#).unwrap();
        assert_eq!(cfg.highlight, ExcludeMode::None);
        assert_eq!(cfg.lookup, ExcludeMode::None);
        assert_eq!(
            cfg.static_analysis,
            AnalysisConfig::default().static_analysis
        );
    }

    #[test]
    fn mode_serializes_kebab_case() {
        let json = serde_json::to_string(&ExcludeMode::CommentStringQuote).unwrap();
        assert_eq!(json, r#""comment-string-quote""#);
    }
}
