//! The public minifier: protection passes, chunked rewriting, restoration.
//!
//! A run works in three phases. First the fragile content is swapped for
//! placeholder tokens: data URLs, comment spans, IE Matrix filter arguments,
//! string literals and nested at-rule blocks. Then the tokenized text is cut
//! into rule-aligned chunks and each chunk goes through the rewrite pipeline.
//! Finally the chunks are joined, the first `@charset` is hoisted, preserved
//! tokens come back in registration order and optional line breaks are
//! inserted.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::chunker::{self, MIN_CHUNK_LENGTH};
use crate::error::MinifyError;
use crate::pipeline::{self, CompiledPatterns, OPACITY_FILTER};
use crate::tokens::{TokenStore, COMMENT_TOKEN, NL};
use crate::utils;

/// Default target chunk size in bytes.
pub const DEFAULT_CHUNK_LENGTH: usize = 5000;

/// Default per-match backtracking ceiling for the pattern engine.
pub const DEFAULT_BACKTRACK_LIMIT: usize = 1_000_000;

static DATA_URL_START: Lazy<Regex> =
  Lazy::new(|| Regex::new(r#"(?i)url\(\s*(["']?)data:"#).expect("data url pattern"));
static BASE64_MARKER: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i)base64,").expect("base64 marker pattern"));
static MATRIX_FILTER: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?s)filter:\s*progid:DXImageTransform\.Microsoft\.Matrix\(([^)]+)\)")
    .expect("matrix filter pattern")
});
static ATTR_SELECTOR: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r#"(?i)\[\s*([a-z][a-z-]+)\s*([*|^$~]?=)\s*['"](-?[a-z_][a-z0-9_-]+)['"]\s*\]"#)
    .expect("attribute selector pattern")
});
static STRING_LITERAL: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r#""(?:[^\\"]|\\.|\\)*"|'(?:[^\\']|\\.|\\)*'"#).expect("string literal pattern")
});
static AT_RULE_BLOCK: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r"(?is)@(?:document|(?:-(?:atsc|khtml|moz|ms|o|wap|webkit)-)?keyframes|media|supports).+?\}\s*\}",
  )
  .expect("at-rule block pattern")
});
static CHARSET: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i)(@charset)( [^;]+;)").expect("charset pattern"));

/// Tuning knobs for a [`Minifier`].
#[derive(Debug, Clone)]
pub struct MinifierOptions {
  chunk_length: usize,
  linebreak_position: usize,
  backtrack_limit: usize,
  pattern_size_limit: i64,
}

impl Default for MinifierOptions {
  fn default() -> Self {
    MinifierOptions {
      chunk_length: DEFAULT_CHUNK_LENGTH,
      linebreak_position: 0,
      backtrack_limit: DEFAULT_BACKTRACK_LIMIT,
      pattern_size_limit: -1,
    }
  }
}

impl MinifierOptions {
  pub fn new() -> Self {
    Self::default()
  }

  /// Target chunk size in bytes. Values below the minimum are rounded up;
  /// chunks this small buy nothing and multiply per-chunk overhead.
  pub fn chunk_length(mut self, length: usize) -> Self {
    self.chunk_length = length.max(MIN_CHUNK_LENGTH);
    self
  }

  /// Column after which a line break is inserted following the next `}`.
  /// Zero (the default) disables wrapping.
  pub fn linebreak_position(mut self, column: usize) -> Self {
    self.linebreak_position = column;
    self
  }

  /// Per-match backtracking ceiling for the pattern engine.
  pub fn backtrack_limit(mut self, limit: usize) -> Self {
    self.backtrack_limit = limit;
    self
  }

  /// Compiled-pattern size ceiling, as a human-readable value ("128M",
  /// "64k", a plain byte count). Negative means unbounded.
  pub fn pattern_size_limit(mut self, limit: &str) -> Self {
    self.pattern_size_limit = utils::normalize_size_limit(limit);
    self
  }
}

/// A reusable CSS minifier. Compiling one is cheap but not free (the
/// backreference patterns are built against the configured ceilings), so
/// callers minifying many stylesheets should hold on to it. Runs share no
/// state; `minify` takes `&self`.
pub struct Minifier {
  options: MinifierOptions,
  patterns: CompiledPatterns,
}

impl Minifier {
  pub fn new() -> Result<Self, MinifyError> {
    Self::with_options(MinifierOptions::default())
  }

  pub fn with_options(options: MinifierOptions) -> Result<Self, MinifyError> {
    let patterns = CompiledPatterns::compile(options.backtrack_limit, options.pattern_size_limit)?;
    Ok(Minifier { options, patterns })
  }

  /// Minifies a stylesheet.
  pub fn minify(&self, css: &str) -> Result<String, MinifyError> {
    if css.is_empty() {
      return Ok(String::new());
    }

    let mut tokens = TokenStore::new();

    let css = extract_data_urls(css, &mut tokens);

    // Every comment span becomes a held token; the keep/drop decision waits
    // until strings are protected, because a comment-looking substring
    // inside a string is not a comment.
    let css = utils::replace_all(&self.patterns.comments, &css, |caps| {
      let content = caps.get(1).map(|m| m.as_str()).unwrap_or("");
      format!("/*{}*/", tokens.hold_comment(content))
    })?;

    // IE7 Matrix filter arguments are whitespace- and case-sensitive and can
    // contain strings of their own.
    let css = MATRIX_FILTER
      .replace_all(&css, |caps: &regex::Captures<'_>| {
        format!(
          "filter:progid:DXImageTransform.Microsoft.Matrix({})",
          tokens.preserve(&caps[1])
        )
      })
      .into_owned();

    // Unquote attribute selectors whose value is a plain identifier. Runs
    // before string protection on purpose: a quoted attribute selector being
    // a substring of a string literal is vanishingly unlikely.
    let css = ATTR_SELECTOR
      .replace_all(&css, "[${1}${2}${3}]")
      .into_owned();

    let css = extract_strings(&css, &mut tokens);
    let css = resolve_comments(css, &mut tokens);

    // Capture nested at-rule blocks whole so chunking cannot cut inside
    // them; each chunk reinserts the blocks that landed in it.
    let css = AT_RULE_BLOCK
      .replace_all(&css, |caps: &regex::Captures<'_>| {
        tokens.hold_at_rule_block(&caps[0])
      })
      .into_owned();

    let mut charset = String::new();
    let mut pieces = Vec::with_capacity(1);
    for chunk in chunker::split_into_chunks(&css, self.options.chunk_length) {
      let minified = pipeline::compress_chunk(chunk, &self.patterns, &mut tokens)?;

      // The first @charset wins and moves to the top; all others go.
      if charset.is_empty() {
        if let Some(caps) = CHARSET.captures(&minified) {
          charset = format!("{}{}", caps[1].to_lowercase(), &caps[2]);
        }
      }
      pieces.push(CHARSET.replace_all(&minified, "").into_owned());
    }

    let joined = format!("{charset}{}", pieces.concat());
    let mut css = joined.trim().to_string();

    // Restoration order is registration order, one occurrence per token.
    for (id, token) in &tokens.preserved {
      css = utils::replace_first(&css, id, token);
    }

    if self.options.linebreak_position > 0 {
      css = insert_linebreaks(css, self.options.linebreak_position);
    }

    tracing::debug!(output = css.len(), "minified stylesheet");
    Ok(css)
  }
}

/// Swaps the payload of every `url(data:...)` for a token before any pattern
/// runs against it; inline payloads can be hundreds of kilobytes. Base64
/// payloads additionally lose all internal whitespace. Handles `'` and `)`
/// appearing inside non-base64 payloads by honoring the opening quote.
fn extract_data_urls(css: &str, tokens: &mut TokenStore) -> String {
  let mut out = String::with_capacity(css.len());
  let mut copied = 0usize;
  let mut search = 0usize;

  while let Some(caps) = DATA_URL_START.captures_at(css, search) {
    let Some(whole) = caps.get(0) else { break };
    let match_start = whole.start();
    let data_start = match_start + "url(".len();
    search = whole.end();
    let quote = caps.get(1).map(|m| m.as_str()).unwrap_or("");

    out.push_str(&css[copied..match_start]);

    match find_data_url_paren(css, search, quote.as_bytes().first().copied()) {
      Some(paren) => {
        let payload = css[data_start..paren].trim();
        let payload = if BASE64_MARKER.is_match(payload) {
          payload.split_whitespace().collect::<String>()
        } else {
          payload.to_string()
        };
        out.push_str("url(");
        out.push_str(&tokens.preserve(payload));
        out.push(')');
        search = paren + 1;
      }
      None => {
        // Never-terminated data URL: re-emit the opening verbatim and keep
        // scanning after it.
        out.push_str(&css[match_start..search]);
      }
    }
    copied = search;
  }

  out.push_str(&css[copied..]);
  out
}

/// Finds the closing `)` of a data URL payload. Unquoted payloads end at the
/// first unescaped `)`; quoted payloads end at the `)` following the first
/// unescaped closing quote (whitespace in between allowed).
fn find_data_url_paren(css: &str, from: usize, quote: Option<u8>) -> Option<usize> {
  let bytes = css.as_bytes();
  match quote {
    None => {
      let mut i = from;
      while i < bytes.len() {
        if bytes[i] == b')' && (i == 0 || bytes[i - 1] != b'\\') {
          return Some(i);
        }
        i += 1;
      }
      None
    }
    Some(q) => {
      let mut i = from;
      while i < bytes.len() {
        if bytes[i] == q && (i == 0 || bytes[i - 1] != b'\\') {
          let mut j = i + 1;
          while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
          }
          if j < bytes.len() && bytes[j] == b')' {
            return Some(j);
          }
        }
        i += 1;
      }
      None
    }
  }
}

/// Swaps every string literal for a token. Comment ids that ended up inside
/// a string are expanded back to their original text first (the span was
/// never a comment), and the IE alpha filter idiom inside filter strings is
/// shortened on the way in because no later stage will see it.
fn extract_strings(css: &str, tokens: &mut TokenStore) -> String {
  STRING_LITERAL
    .replace_all(css, |caps: &regex::Captures<'_>| {
      let whole = &caps[0];
      let quote = &whole[..1];
      let mut content = whole[1..whole.len() - 1].to_string();
      if content.contains(COMMENT_TOKEN) {
        for (id, comment) in &tokens.comments {
          content = utils::replace_first(&content, id, comment);
        }
      }
      let content = OPACITY_FILTER.replace_all(&content, "alpha(opacity=").into_owned();
      format!("{quote}{}{quote}", tokens.preserve(content))
    })
    .into_owned()
}

/// Decides the fate of every held comment span. `/*!` comments are promoted
/// to preserved tokens and isolated on their own lines when the source had
/// them that way. An empty comment directly after `>` survives (the IE7
/// `html >/**/ body` hack). Everything else is deleted.
fn resolve_comments(css: String, tokens: &mut TokenStore) -> String {
  let ids: Vec<String> = tokens.comments.keys().cloned().collect();
  let mut css = css;
  for id in ids {
    let Some(comment) = tokens.comments.get(&id).cloned() else {
      continue;
    };

    if comment.starts_with('!') {
      let preserved_id = tokens.preserve(comment);
      css = utils::replace_first(&css, &id, &preserved_id);
      css = isolate_preserved_comment_lines(css, &preserved_id);
      continue;
    }

    if comment.is_empty() && css.contains(&format!(">/*{id}")) {
      let preserved_id = tokens.preserve(String::new());
      css = utils::replace_first(&css, &id, &preserved_id);
      continue;
    }

    css = utils::replace_first(&css, &format!("/*{id}*/"), "");
  }
  css
}

/// When a preserved comment was separated from its neighbors by line breaks,
/// replaces those breaks with the line-break marker so they survive
/// whitespace collapsing.
fn isolate_preserved_comment_lines(mut css: String, id: &str) -> String {
  let open = format!("/*{id}");
  if let Some(at) = css.find(&open) {
    let run_start = css[..at].trim_end().len();
    if let Some(first_break) = css[run_start..at].find(['\r', '\n']) {
      css.replace_range(run_start + first_break..at, NL);
    }
  }

  let close = format!("{id}*/");
  if let Some(at) = css.find(&close) {
    let run_start = at + close.len();
    let run_len = css[run_start..].len() - css[run_start..].trim_start().len();
    if let Some(last_break) = css[run_start..run_start + run_len].rfind(['\r', '\n']) {
      css.replace_range(run_start..run_start + last_break + 1, NL);
    }
  }
  css
}

/// Inserts a newline after the first unescaped `}` past each wrap column, for
/// tools that reject very long lines.
fn insert_linebreaks(mut css: String, position: usize) -> String {
  let mut offset = position;
  while offset < css.len() {
    let Some(brace) = next_wrap_point(&css, offset) else {
      break;
    };
    css.insert(brace + 1, '\n');
    offset = brace + 2 + position;
  }
  css
}

/// The next unescaped `}` at or after `from` that is not already followed by
/// a newline.
fn next_wrap_point(css: &str, from: usize) -> Option<usize> {
  let bytes = css.as_bytes();
  let mut i = from;
  while i < bytes.len() {
    if bytes[i] == b'}' && (i == 0 || bytes[i - 1] != b'\\') && bytes.get(i + 1) != Some(&b'\n') {
      return Some(i);
    }
    i += 1;
  }
  None
}
