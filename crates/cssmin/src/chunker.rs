//! Boundary-safe splitting of large inputs.
//!
//! The backtracking pattern engine enforces a per-match resource ceiling, so
//! whole-document rewrites over very large inputs could abort mid-pattern.
//! Splitting at rule boundaries keeps every chunk comfortably inside that
//! ceiling. Nested at-rule blocks are tokenized before chunking, so an
//! unescaped `}` is always a safe cut point.

/// Chunk lengths below this are pointless and are rounded up.
pub(crate) const MIN_CHUNK_LENGTH: usize = 100;

/// Splits `css` into chunks of roughly `chunk_length` bytes, cutting just
/// after the next unescaped `}` at or past each target offset. Concatenating
/// the returned slices reproduces `css` exactly.
pub(crate) fn split_into_chunks(css: &str, chunk_length: usize) -> Vec<&str> {
  let total = css.len();
  if total <= chunk_length {
    return vec![css];
  }

  let mut chunks = Vec::new();
  let mut start = 0usize;
  let mut offset = chunk_length;

  while let Some(brace) = next_unescaped_brace(css, offset) {
    let cut = brace + 1;
    chunks.push(&css[start..cut]);
    start = cut;
    offset = brace + chunk_length;
    if offset > total {
      break;
    }
  }

  // The remainder (possibly empty, possibly brace-less) is the final chunk.
  chunks.push(&css[start..]);
  tracing::debug!(chunks = chunks.len(), total, "split input for rewriting");
  chunks
}

/// Byte index of the next `}` at or after `from` that is not preceded by a
/// backslash. `}` is ASCII, so scanning bytes cannot land inside a multibyte
/// character.
pub(crate) fn next_unescaped_brace(css: &str, from: usize) -> Option<usize> {
  let bytes = css.as_bytes();
  let mut i = from;
  while i < bytes.len() {
    if bytes[i] == b'}' && (i == 0 || bytes[i - 1] != b'\\') {
      return Some(i);
    }
    i += 1;
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn reassemble(chunks: &[&str]) -> String {
    chunks.concat()
  }

  #[test]
  fn short_input_is_a_single_chunk() {
    let css = "a{color:red}";
    assert_eq!(split_into_chunks(css, 100), vec![css]);
  }

  #[test]
  fn chunks_cut_just_after_a_closing_brace() {
    let css = "a{x:1}b{y:2}c{z:3}";
    let chunks = split_into_chunks(css, 4);
    assert_eq!(chunks, vec!["a{x:1}", "b{y:2}", "c{z:3}", ""]);
    assert_eq!(reassemble(&chunks), css);
  }

  #[test]
  fn escaped_braces_are_not_boundaries() {
    let css = r"a{content:'\}'}b{y:2}";
    let chunks = split_into_chunks(css, 5);
    assert_eq!(chunks[0], r"a{content:'\}'}");
    assert_eq!(reassemble(&chunks), css);
  }

  #[test]
  fn input_without_terminating_brace_becomes_final_chunk() {
    let css = "a{x:1}trailing selector without block";
    let chunks = split_into_chunks(css, 3);
    assert_eq!(chunks.last().copied(), Some("trailing selector without block"));
    assert_eq!(reassemble(&chunks), css);
  }

  #[test]
  fn concatenation_is_exact_for_many_lengths() {
    let css = "a{x:1}bb{y:22}ccc{z:333}dddd{w:4444}e{v:5}";
    for length in 1..css.len() + 2 {
      let chunks = split_into_chunks(css, length);
      assert_eq!(reassemble(&chunks), css, "target length {}", length);
    }
  }
}
