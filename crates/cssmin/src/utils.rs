//! Small collaborator primitives: literal replacement, size-limit parsing
//! and fallible rewrite helpers for the backtracking pattern engine.

use fancy_regex::{Captures, Regex};

/// Replaces the first literal occurrence of `needle` in `haystack`.
///
/// The replacement is inserted verbatim: `$` and `\` carry no backreference
/// meaning. Used for token restoration, where the stored content may contain
/// arbitrary text.
pub(crate) fn replace_first(haystack: &str, needle: &str, replacement: &str) -> String {
  haystack.replacen(needle, replacement, 1)
}

/// Parses a human-readable size limit ("128M", "64k", "1G" or a plain byte
/// count) into bytes. Any negative value is the "unbounded" sentinel and is
/// normalized to -1.
pub(crate) fn normalize_size_limit(limit: &str) -> i64 {
  let trimmed = limit.trim();
  let (number, multiplier) = match trimmed.char_indices().last() {
    Some((index, suffix)) if matches!(suffix, 'k' | 'K' | 'm' | 'M' | 'g' | 'G') => {
      let multiplier: i64 = match suffix.to_ascii_lowercase() {
        'k' => 1024,
        'm' => 1024 * 1024,
        _ => 1024 * 1024 * 1024,
      };
      (&trimmed[..index], multiplier)
    }
    _ => (trimmed, 1),
  };
  let value: i64 = number.trim().parse().unwrap_or(0);
  if value < 0 {
    -1
  } else {
    value.saturating_mul(multiplier)
  }
}

/// Rewrites every match of `pattern`, building the replacement with `rep`.
///
/// Unlike the engine's own replace helpers this propagates resource
/// exhaustion (e.g. a blown backtracking ceiling) instead of swallowing it.
pub(crate) fn replace_all<F>(
  pattern: &Regex,
  text: &str,
  mut rep: F,
) -> Result<String, Box<fancy_regex::Error>>
where
  F: FnMut(&Captures<'_>) -> String,
{
  let mut out = String::with_capacity(text.len());
  let mut pos = 0usize;
  while let Some(caps) = pattern.captures_from_pos(text, pos)? {
    let Some(whole) = caps.get(0) else { break };
    out.push_str(&text[pos..whole.start()]);
    out.push_str(&rep(&caps));
    if whole.end() > whole.start() {
      pos = whole.end();
    } else {
      // Zero-width match: step over one character to guarantee progress.
      match text[whole.end()..].chars().next() {
        Some(c) => {
          out.push(c);
          pos = whole.end() + c.len_utf8();
        }
        None => {
          pos = text.len();
          break;
        }
      }
    }
    if pos > text.len() {
      break;
    }
  }
  out.push_str(&text[pos..]);
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn replace_first_is_literal() {
    assert_eq!(replace_first("a TOKEN b TOKEN", "TOKEN", "$1\\x"), "a $1\\x b TOKEN");
    assert_eq!(replace_first("untouched", "missing", "y"), "untouched");
  }

  #[test]
  fn normalize_size_limit_understands_suffixes() {
    assert_eq!(normalize_size_limit("128M"), 128 * 1024 * 1024);
    assert_eq!(normalize_size_limit("64k"), 64 * 1024);
    assert_eq!(normalize_size_limit("1G"), 1024 * 1024 * 1024);
    assert_eq!(normalize_size_limit("1048576"), 1048576);
    assert_eq!(normalize_size_limit(" 2m "), 2 * 1024 * 1024);
  }

  #[test]
  fn normalize_size_limit_negative_means_unbounded() {
    assert_eq!(normalize_size_limit("-1"), -1);
    assert_eq!(normalize_size_limit("-512M"), -1);
  }

  #[test]
  fn normalize_size_limit_garbage_is_zero() {
    assert_eq!(normalize_size_limit("lots"), 0);
  }

  #[test]
  fn replace_all_rewrites_every_match() {
    let re = Regex::new(r"(?<!\\)x").unwrap();
    let out = replace_all(&re, r"x \x x", |_| "y".to_string()).unwrap();
    assert_eq!(out, r"y \x y");
  }
}
