use serde::{Deserialize, Serialize};

/// Default bound on nesting depth, generous for hand-written and generated code
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Parser settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Deepest allowed nesting of lists and quote-like prefixes
    ///
    /// Parsing recurses once per nesting level, so this keeps adversarial input such as
    /// ten thousand `(` from exhausting the call stack. Well-formed input nested deeper
    /// than the limit is rejected too, with [`Error::DepthLimitExceeded`]; raise the limit
    /// or use [`ParserConfig::unbounded`] when such input must be accepted. List length is
    /// not limited.
    ///
    /// [`Error::DepthLimitExceeded`]: crate::Error::DepthLimitExceeded
    pub max_depth: usize,
}

impl ParserConfig {
    /// Sets the maximum nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// No depth limit, for trusted input only
    pub fn unbounded() -> Self {
        ParserConfig {
            max_depth: usize::MAX,
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
