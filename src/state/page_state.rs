/// Outcome of a page once the fetcher is done with it
///
/// Every listing page and every detail page ends in exactly one of these
/// states; the run statistics are tallied from them.
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    /// Page was rendered and its records were extracted and handed to the sink
    Extracted,

    /// Every attempt failed; the page was abandoned
    Exhausted,

    /// The run was cancelled before the page finished
    Cancelled,

    /// A non-retryable error (sink or browser failure) stopped the page
    Aborted,
}

impl PageState {
    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Extracted)
    }

    /// Short lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extracted => "extracted",
            Self::Exhausted => "exhausted",
            Self::Cancelled => "cancelled",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
