use thiserror::Error;

/// Errors surfaced by [`crate::Minifier`].
///
/// Malformed CSS is never an error: a rewrite pattern that does not match is
/// a no-op. The only failure mode is the pattern engine itself giving up,
/// either at compile time or when a match exhausts the configured
/// backtracking ceiling.
#[derive(Debug, Error)]
pub enum MinifyError {
  #[error("pattern engine failure: {0}")]
  Pattern(#[from] Box<fancy_regex::Error>),
}

impl From<fancy_regex::Error> for MinifyError {
  fn from(error: fancy_regex::Error) -> Self {
    MinifyError::Pattern(Box::new(error))
  }
}
