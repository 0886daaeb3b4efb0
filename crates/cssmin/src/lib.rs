//! A pattern-based CSS minifier.
//!
//! Instead of parsing a stylesheet into a tree, the minifier protects the
//! content that structural rewriting would destroy (strings, data URLs,
//! comments marked for preservation, calc() bodies, IE filter arguments),
//! runs an ordered sequence of textual rewrites over the rest, and swaps the
//! protected content back in at the end. Large inputs are split into
//! rule-aligned chunks first so no single pattern match can exhaust the
//! engine's backtracking ceiling.
//!
//! ```
//! let out = cssmin::minify("a {  color : #ff0000 ; }").unwrap();
//! assert_eq!(out, "a{color:red}");
//! ```

mod chunker;
mod colors;
mod error;
mod minifier;
mod pipeline;
mod tokens;
mod utils;

pub use error::MinifyError;
pub use minifier::{Minifier, MinifierOptions, DEFAULT_BACKTRACK_LIMIT, DEFAULT_CHUNK_LENGTH};

/// Minifies a stylesheet with default options.
///
/// Callers minifying many stylesheets should build a [`Minifier`] once and
/// reuse it; this convenience recompiles the configurable patterns per call.
pub fn minify(css: &str) -> Result<String, MinifyError> {
  Minifier::new()?.minify(css)
}
