//! The per-chunk rewrite pipeline.
//!
//! Stages run in a fixed order and later stages depend on artifacts of
//! earlier ones: whitespace is collapsed to single spaces before any spacing
//! rule fires, pseudo-class colons are escaped across the punctuation passes,
//! zero shortening expects `;`/`{` to already sit flush against property
//! names, and color-name substitution runs after hex shortening so freshly
//! produced hex values can still pick up a shorter name. Reordering stages
//! breaks correctness, not just output quality.
//!
//! Every stage is total: when its pattern does not match it leaves the text
//! alone. The only error that can escape is the backtracking engine
//! exhausting its configured ceiling.

use fancy_regex::RegexBuilder;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::colors;
use crate::error::MinifyError;
use crate::tokens::{TokenStore, NL, PSEUDO_COLON, QUERY_FRACTION};
use crate::utils;

const UNITS: &str = "(?:ch|cm|em|ex|gd|in|mm|px|pt|pc|q|rem|vh|vmax|vmin|vw|%)";

fn number_pattern() -> String {
  format!(r"(?:\+|-)?\d*\.?\d+{UNITS}?")
}

fn value_or_position_pattern() -> String {
  format!("({}|top|left|bottom|right|center) ", number_pattern())
}

/// The rewrite patterns that need lookbehind or backreferences, compiled per
/// minifier instance so the configured backtracking ceiling applies.
pub(crate) struct CompiledPatterns {
  /// `/* ... */` spans, unescaped delimiters only.
  pub comments: fancy_regex::Regex,
  leading_plus: fancy_regex::Regex,
  leading_zeros: fancy_regex::Regex,
  trailing_zeros: fancy_regex::Regex,
  trailing_dot_zero: fancy_regex::Regex,
  degenerate_zeros: fancy_regex::Regex,
  repeated_pair: fancy_regex::Regex,
  repeated_last: fancy_regex::Regex,
  named_colors: fancy_regex::Regex,
}

impl CompiledPatterns {
  pub fn compile(backtrack_limit: usize, size_limit: i64) -> Result<Self, MinifyError> {
    let build = |pattern: &str| -> Result<fancy_regex::Regex, MinifyError> {
      let mut builder = RegexBuilder::new(pattern);
      builder.backtrack_limit(backtrack_limit);
      if size_limit >= 0 {
        builder.delegate_size_limit(size_limit as usize);
      }
      Ok(builder.build()?)
    };
    let num = number_pattern();

    Ok(CompiledPatterns {
      comments: build(r"(?s)(?<!\\)/\*(.*?)\*(?<!\\)/")?,
      leading_plus: build(r"((?<!\\):| )\+(\.?\d+)")?,
      leading_zeros: build(r"((?<!\\):| )(-?)0+(\.?\d+)")?,
      trailing_zeros: build(r"((?<!\\):| )(-?)(\d?\.\d+?)0+([^\d])")?,
      trailing_dot_zero: build(r"((?<!\\):| )(-?\d+)\.0([^\d])")?,
      degenerate_zeros: build(r"((?<!\\):| )-?\.?0+([^\d])")?,
      repeated_pair: build(&format!(
        r"(?i)(margin|padding):({num}) ({num}) (?:\2) (?:\3)(;|\}}| !)"
      ))?,
      repeated_last: build(&format!(
        r"(?i)(margin|padding):({num}) ({num}) ({num}) (?:\3)(;|\}}| !)"
      ))?,
      named_colors: build(&format!(
        r"(?i)(?<!\\)(:|,|\(| )({})(;|\}}|,|\)| )",
        colors::named_to_hex_alternation()
      ))?,
    })
  }
}

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));
static NL_SPACING: Lazy<Regex> =
  Lazy::new(|| Regex::new(&format!(" ?{NL} ?")).expect("line-break marker pattern"));
static CALC_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)calc\(").expect("calc pattern"));
static CALC_SIGN: Lazy<Regex> = Lazy::new(|| Regex::new(r" (\+|-) ").expect("calc sign pattern"));
static CALC_PUNCT: Lazy<Regex> =
  Lazy::new(|| Regex::new(r" ?(\*|/|\(|\)|,) ?").expect("calc punctuation pattern"));
static CALC_SIGN_RESTORE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"_(\+|-)_").expect("calc sign restore pattern"));
static PSEUDO_CLASS_COLON: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"((?:^|\})[^{]* ):").expect("pseudo-class colon pattern"));
static SPACE_BEFORE_PUNCT: Lazy<Regex> =
  Lazy::new(|| Regex::new(r" ([!{};:>+()\]~=,])").expect("space-before pattern"));
static IMPORTANT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)!important").expect("important pattern"));
static FIRST_LINE_LETTER: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i):first-(line|letter)(\{|,)").expect("first-line pattern"));
static AT_DIRECTIVES: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r"(?i)@(document|font-face|import|(?:-(?:atsc|khtml|moz|ms|o|wap|webkit)-)?keyframes|media|namespace|page|supports|viewport)",
  )
  .expect("at-directive pattern")
});
static PSEUDO_ELEMENTS: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r"(?i):(active|after|before|checked|disabled|empty|enabled|first-(?:child|of-type)|focus|hover|last-(?:child|of-type)|link|only-(?:child|of-type)|root|:selection|target|visited)",
  )
  .expect("pseudo-element pattern")
});
static PSEUDO_FUNCTIONS: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r"(?i):(lang|not|nth-child|nth-last-child|nth-last-of-type|nth-of-type|(?:-(?:moz|webkit)-)?any)\(",
  )
  .expect("pseudo-function pattern")
});
static VALUE_FUNCTIONS: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r"(?i)([:,( ] ?)(attr|color-stop|from|rgba|to|url|-webkit-gradient|(?:-(?:atsc|khtml|moz|ms|o|wap|webkit)-)?(?:calc|max|min|(?:repeating-)?(?:linear|radial)-gradient))",
  )
  .expect("value-function pattern")
});
static QUERY_CONNECTORS: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i)( |\) )(and|not|or)\(").expect("query connector pattern"));
static SPACE_AFTER_PUNCT: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"([!{}:;>+(\[~=,]) ").expect("space-after pattern"));
static REDUNDANT_SEMICOLONS: Lazy<Regex> =
  Lazy::new(|| Regex::new(r";+\}").expect("redundant semicolon pattern"));
static STAR_HACK_SEMICOLON: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(\*[a-z0-9-]+:[^;}]+)(\})").expect("star hack pattern"));
static ONE_ZERO: Lazy<Regex> = Lazy::new(|| {
  let props = [
    "(?:line-)?height",
    "(?:(?:min|max)-)?width",
    "top",
    "left",
    "background-position",
    "bottom",
    "right",
    "border(?:-(?:top|left|bottom|right))?(?:-width)?",
    "border-(?:(?:top|bottom)-(?:left|right)-)?radius",
    "column-(?:gap|width)",
    "margin(?:-(?:top|left|bottom|right))?",
    "outline-width",
    "padding(?:-(?:top|left|bottom|right))?",
  ]
  .join("|");
  Regex::new(&format!(r"(?i)(;|\{{)({props}):0{UNITS}")).expect("one-zero pattern")
});
static TWO_ZEROES: Lazy<Regex> = Lazy::new(|| {
  Regex::new(&format!(
    r"(?i)(;|\{{)(margin|padding|background-position):{}0{UNITS}",
    value_or_position_pattern()
  ))
  .expect("two-zero pattern")
});
static THREE_ZEROES: Lazy<Regex> = Lazy::new(|| {
  let vp = value_or_position_pattern();
  Regex::new(&format!(
    r"(?i)(;|\{{)(margin|padding|background-position):{vp}{vp}0{UNITS}"
  ))
  .expect("three-zero pattern")
});
static FOUR_ZEROES: Lazy<Regex> = Lazy::new(|| {
  let vp = value_or_position_pattern();
  Regex::new(&format!(
    r"(?i)(;|\{{)(margin|padding|background-position):{vp}{vp}{vp}0{UNITS}"
  ))
  .expect("four-zero pattern")
});
static MARGIN_PADDING_ZEROES: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i)(margin|padding):0(?: 0){1,3}(;|\}| !)").expect("zero collapse pattern"));
static BACKGROUND_POSITION_ZEROES: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)(background-position):0(?: 0){2,3}(;|\}| !)").expect("background-position pattern")
});
static FONT_WEIGHT_BOLD: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i)(font-weight:)bold\b").expect("font-weight bold pattern"));
static FONT_WEIGHT_NORMAL: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i)(font-weight:)normal\b").expect("font-weight normal pattern"));
static RGB_FUNCTION: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i)rgb\(([0-9,.% -]+)\)(.)").expect("rgb pattern"));
static HSL_FUNCTION: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i)hsl\(([0-9,.% -]+)\)(.)").expect("hsl pattern"));
static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r#"(?i)(= ?["']?)?#([0-9a-f])([0-9a-f])([0-9a-f])([0-9a-f])([0-9a-f])([0-9a-f])(;|,|\}|\)|"|'| )"#,
  )
  .expect("hex color pattern")
});
pub(crate) static OPACITY_FILTER: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)progid:DXImageTransform\.Microsoft\.Alpha\(Opacity=").expect("opacity filter pattern")
});
static PIXEL_RATIO_FRACTION: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i)\(([a-z-]+):([0-9]+)/([0-9]+)\)").expect("pixel ratio pattern"));
static EMPTY_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^{};/]+\{\}").expect("empty rule pattern"));
static MULTI_SEMICOLON: Lazy<Regex> = Lazy::new(|| Regex::new(r";;+").expect("multi-semicolon pattern"));
static UPPERCASE_PROPERTY: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(\{|;)([A-Z-]+)(:)").expect("uppercase property pattern"));

/// Runs the full rewrite pipeline over one chunk.
pub(crate) fn compress_chunk(
  chunk: &str,
  patterns: &CompiledPatterns,
  tokens: &mut TokenStore,
) -> Result<String, MinifyError> {
  tracing::trace!(len = chunk.len(), "rewriting chunk");

  let css = restore_at_rule_blocks(chunk.to_string(), tokens);

  // Normalize all whitespace runs to single spaces, then pull spaces off the
  // preserved-comment line-break markers.
  let css = WHITESPACE_RUN.replace_all(&css, " ").into_owned();
  let css = NL_SPACING.replace_all(&css, NL).into_owned();

  // Spacing inside calc() is significant; shelter it before the spacing
  // passes and tighten what is safe to tighten.
  let css = protect_calc(&css, tokens);

  // +1.2em -> 1.2em, 0050 -> 50, -0.8 -> -.8, 1.200px -> 1.2px, -9.0 -> -9,
  // .000 -> 0. Each rewrite only fires directly after `:` or a space.
  let css = utils::replace_all(&patterns.leading_plus, &css, |c| {
    format!("{}{}", &c[1], &c[2])
  })?;
  let css = utils::replace_all(&patterns.leading_zeros, &css, |c| {
    format!("{}{}{}", &c[1], &c[2], &c[3])
  })?;
  let css = utils::replace_all(&patterns.trailing_zeros, &css, |c| {
    format!("{}{}{}{}", &c[1], &c[2], &c[3], &c[4])
  })?;
  let css = utils::replace_all(&patterns.trailing_dot_zero, &css, |c| {
    format!("{}{}{}", &c[1], &c[2], &c[3])
  })?;
  let css = utils::replace_all(&patterns.degenerate_zeros, &css, |c| {
    format!("{}0{}", &c[1], &c[2])
  })?;

  // Escape selector colons ("p :link" must not become "p:link"), strip
  // spaces before punctuation, then bring the colons back.
  let css = PSEUDO_CLASS_COLON
    .replace_all(&css, format!("${{1}}{PSEUDO_COLON}").as_str())
    .into_owned();
  let css = SPACE_BEFORE_PUNCT.replace_all(&css, "${1}").into_owned();
  let css = css.replace(PSEUDO_COLON, ":");
  let css = IMPORTANT.replace_all(&css, " !important").into_owned();

  // IE6 needs the space after :first-line/:first-letter.
  let css = FIRST_LINE_LETTER
    .replace_all(&css, |c: &regex::Captures<'_>| {
      format!(":first-{} {}", c[1].to_lowercase(), &c[2])
    })
    .into_owned();

  // No space after the end of a preserved comment.
  let css = css.replace("*/ ", "*/");

  let css = AT_DIRECTIVES
    .replace_all(&css, |c: &regex::Captures<'_>| format!("@{}", c[1].to_lowercase()))
    .into_owned();
  let css = PSEUDO_ELEMENTS
    .replace_all(&css, |c: &regex::Captures<'_>| format!(":{}", c[1].to_lowercase()))
    .into_owned();
  let css = PSEUDO_FUNCTIONS
    .replace_all(&css, |c: &regex::Captures<'_>| format!(":{}(", c[1].to_lowercase()))
    .into_owned();
  let css = VALUE_FUNCTIONS
    .replace_all(&css, |c: &regex::Captures<'_>| {
      format!("{}{}", &c[1], c[2].to_lowercase())
    })
    .into_owned();

  // Media queries like `screen and (min-width:0)` need the space back in
  // front of the parenthesis.
  let css = QUERY_CONNECTORS
    .replace_all(&css, |c: &regex::Captures<'_>| {
      format!("{}{} (", &c[1], c[2].to_lowercase())
    })
    .into_owned();

  let css = SPACE_AFTER_PUNCT.replace_all(&css, "${1}").into_owned();

  // Drop redundant semicolons, but keep one when the last property uses the
  // `*property` hack (Symbian S60 3.x chokes otherwise).
  let css = REDUNDANT_SEMICOLONS.replace_all(&css, "}").into_owned();
  let css = STAR_HACK_SEMICOLON.replace_all(&css, "${1};${2}").into_owned();

  let css = shorten_zero_values(&css);

  let css = FONT_WEIGHT_BOLD.replace_all(&css, "${1}700").into_owned();
  let css = FONT_WEIGHT_NORMAL.replace_all(&css, "${1}400").into_owned();

  // margin:1px 2px 1px 2px -> margin:1px 2px, margin:1px 2px 3px 2px ->
  // margin:1px 2px 3px.
  let css = utils::replace_all(&patterns.repeated_pair, &css, |c| {
    format!("{}:{} {}{}", &c[1], &c[2], &c[3], &c[4])
  })?;
  let css = utils::replace_all(&patterns.repeated_last, &css, |c| {
    format!("{}:{} {} {}{}", &c[1], &c[2], &c[3], &c[4], &c[5])
  })?;

  // Functional colors become hex first so the hex/name shortener can take
  // another bite at them.
  let css = rgb_to_hex_stage(&css);
  let css = hsl_to_hex_stage(&css);
  let css = shorten_hex_colors(&css);
  // Twice: the first pass can expose a name only after eating a separator.
  let css = shorten_named_colors(patterns, &css)?;
  let css = shorten_named_colors(patterns, &css)?;

  let css = OPACITY_FILTER.replace_all(&css, "alpha(opacity=").into_owned();

  // Shelter the `/` of device-pixel-ratio fractions across the empty-rule
  // passes.
  let css = PIXEL_RATIO_FRACTION
    .replace_all(&css, format!("(${{1}}:${{2}}{QUERY_FRACTION}${{3}})").as_str())
    .into_owned();

  // Guard line-break markers with a brace so empty-rule removal cannot eat
  // them, remove empty rules (twice: the first pass can empty a wrapper),
  // then turn the markers into real newlines.
  let css = css.replace(NL, &format!("{NL}}}"));
  let css = EMPTY_RULE.replace_all(&css, "").into_owned();
  let css = EMPTY_RULE.replace_all(&css, "").into_owned();
  let css = css.replace(&format!("{NL}}}"), "\n");

  let css = css.replace(QUERY_FRACTION, "/");

  let css = MULTI_SEMICOLON.replace_all(&css, ";").into_owned();

  let css = UPPERCASE_PROPERTY
    .replace_all(&css, |c: &regex::Captures<'_>| {
      format!("{}{}{}", &c[1], c[2].to_lowercase(), &c[3])
    })
    .into_owned();

  // Trim ordinary spaces only; the newlines around preserved comments stay.
  Ok(css.trim_matches(' ').to_string())
}

/// Reinserts the at-rule blocks that were captured for chunk safety. Blocks
/// belonging to other chunks are left in the table for them.
fn restore_at_rule_blocks(css: String, tokens: &mut TokenStore) -> String {
  let ids: Vec<String> = tokens.at_rule_blocks.keys().cloned().collect();
  let mut css = css;
  for id in ids {
    if css.contains(&id) {
      if let Some(block) = tokens.at_rule_blocks.shift_remove(&id) {
        css = utils::replace_first(&css, &id, &block);
      }
    }
  }
  css
}

/// Tightens and shelters calc() bodies. The argument list is matched with a
/// balanced-parenthesis scan; spacing around `*`, `/`, parentheses and commas
/// collapses, while spacing around binary `+`/`-` is significant and kept.
fn protect_calc(css: &str, tokens: &mut TokenStore) -> String {
  let mut out = String::with_capacity(css.len());
  let mut pos = 0usize;
  while let Some(found) = CALC_OPEN.find_at(css, pos) {
    let open = found.end() - 1;
    let Some(close) = matching_paren(css, open) else {
      // Never-closed argument list: re-emit the rest untouched.
      break;
    };
    out.push_str(&css[pos..found.start()]);
    let inner = css[open + 1..close].trim();
    let inner = CALC_SIGN.replace_all(inner, "_${1}_");
    let inner = CALC_PUNCT.replace_all(&inner, "${1}");
    let inner = CALC_SIGN_RESTORE.replace_all(&inner, " ${1} ");
    out.push_str("calc(");
    out.push_str(&tokens.preserve(inner.into_owned()));
    out.push(')');
    pos = close + 1;
  }
  out.push_str(&css[pos..]);
  out
}

fn matching_paren(css: &str, open: usize) -> Option<usize> {
  let bytes = css.as_bytes();
  let mut depth = 0usize;
  for (i, byte) in bytes.iter().enumerate().skip(open) {
    match *byte {
      b'(' => depth += 1,
      b')' => {
        depth -= 1;
        if depth == 0 {
          return Some(i);
        }
      }
      _ => {}
    }
  }
  None
}

/// Shrinks zero values for the allow-listed properties: a trailing `0<unit>`
/// in a 1-4 value list becomes `0`, all-zero margin/padding collapses to `0`
/// and all-zero background-position to its minimum valid form `0 0`.
fn shorten_zero_values(css: &str) -> String {
  let css = ONE_ZERO.replace_all(css, "${1}${2}:0");
  let css = TWO_ZEROES.replace_all(&css, "${1}${2}:${3} 0");
  let css = THREE_ZEROES.replace_all(&css, "${1}${2}:${3} ${4} 0");
  let css = FOUR_ZEROES.replace_all(&css, "${1}${2}:${3} ${4} ${5} 0");
  let css = MARGIN_PADDING_ZEROES.replace_all(&css, "${1}:0${2}");
  BACKGROUND_POSITION_ZEROES
    .replace_all(&css, "${1}:0 0${2}")
    .into_owned()
}

fn rgb_to_hex_stage(css: &str) -> String {
  RGB_FUNCTION
    .replace_all(css, |caps: &regex::Captures<'_>| {
      let channels: Vec<&str> = caps[1].split(',').collect();
      match colors::rgb_to_hex(&channels) {
        Some(hex) => hex_with_terminator(&hex, &caps[2]),
        None => caps[0].to_string(),
      }
    })
    .into_owned()
}

fn hsl_to_hex_stage(css: &str) -> String {
  HSL_FUNCTION
    .replace_all(css, |caps: &regex::Captures<'_>| {
      let components: Vec<&str> = caps[1].split(',').collect();
      match colors::hsl_to_rgb(&components) {
        Some([r, g, b]) => hex_with_terminator(&format!("{r:02x}{g:02x}{b:02x}"), &caps[2]),
        None => caps[0].to_string(),
      }
    })
    .into_owned()
}

/// Keeps a separating space when the character after the converted function
/// would otherwise glue onto the hex value (e.g. `rgb(0,0,0)0 0`).
fn hex_with_terminator(hex: &str, terminator: &str) -> String {
  if terminator.starts_with([' ', ',', ')', ';', '}']) {
    format!("#{hex}{terminator}")
  } else {
    format!("#{hex} {terminator}")
  }
}

/// `#AABBCC` -> `#ABC` or a color name that is no longer than the hex form.
///
/// Leaves IE filter parameters alone (`="`/`='` prefix: case and length are
/// load-bearing there). ID selectors like `#AddressForm` never match because
/// the terminator must be a delimiter, and runs of more than six hex digits
/// fail the match for the same reason.
fn shorten_hex_colors(css: &str) -> String {
  HEX_COLOR
    .replace_all(css, |caps: &regex::Captures<'_>| {
      let digits = format!(
        "{}{}{}{}{}{}",
        &caps[2], &caps[3], &caps[4], &caps[5], &caps[6], &caps[7]
      );
      let terminator = &caps[8];
      match caps.get(1) {
        Some(prefix) => format!("{}#{}{}", prefix.as_str(), digits, terminator),
        None => {
          let hex = colors::minimal_hex(&digits);
          let color = colors::HEX_TO_NAME
            .get(&hex)
            .map(|name| (*name).to_string())
            .unwrap_or(hex);
          format!("{color}{terminator}")
        }
      }
    })
    .into_owned()
}

fn shorten_named_colors(patterns: &CompiledPatterns, css: &str) -> Result<String, MinifyError> {
  Ok(utils::replace_all(&patterns.named_colors, css, |caps| {
    let name = caps[2].to_lowercase();
    match colors::NAME_TO_HEX.get(name.as_str()) {
      Some(hex) => format!("{}{}{}", &caps[1], hex, &caps[3]),
      None => caps[0].to_string(),
    }
  })?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn compress(css: &str) -> String {
    let patterns = CompiledPatterns::compile(1_000_000, -1).expect("patterns");
    let mut tokens = TokenStore::new();
    compress_chunk(css, &patterns, &mut tokens).expect("compress")
  }

  #[test]
  fn collapses_whitespace_and_punctuation_spacing() {
    assert_eq!(compress("a   { color : red ; }"), "a{color:red}");
  }

  #[test]
  fn keeps_descendant_pseudo_class_selectors_apart() {
    assert_eq!(compress("p :link { color : blue }"), "p :link{color:blue}");
  }

  #[test]
  fn restores_space_before_important() {
    assert_eq!(compress("a{color:red ! important}"), "a{color:red!important}");
    assert_eq!(compress("a{color:red !important}"), "a{color:red !important}");
  }

  #[test]
  fn strips_number_decorations() {
    assert_eq!(compress("a{top:+1.2em}"), "a{top:1.2em}");
    assert_eq!(compress("a{top:0050px}"), "a{top:50px}");
    assert_eq!(compress("a{top:-0.8em}"), "a{top:-.8em}");
    assert_eq!(compress("a{top:1.200px}"), "a{top:1.2px}");
    assert_eq!(compress("a{top:-9.0in}"), "a{top:-9in}");
    assert_eq!(compress("a{opacity:.000}"), "a{opacity:0}");
  }

  #[test]
  fn shortens_zero_values_for_safe_properties() {
    assert_eq!(compress("a{margin:0px 0px 0px 0px}"), "a{margin:0}");
    assert_eq!(compress("a{margin: 0px ; }"), "a{margin:0}");
    assert_eq!(compress("a{padding:0 10px 0 10px}"), "a{padding:0 10px}");
    assert_eq!(
      compress("a{background-position:0 0 0 0}"),
      "a{background-position:0 0}"
    );
    // Not on the allow list: unknown properties keep their unit.
    assert_eq!(compress("a{flex-basis:0px}"), "a{flex-basis:0px}");
  }

  #[test]
  fn collapses_repeated_shorthand_components() {
    assert_eq!(compress("a{margin:1px 2px 1px 2px}"), "a{margin:1px 2px}");
    assert_eq!(compress("a{padding:1px 2px 3px 2px}"), "a{padding:1px 2px 3px}");
    assert_eq!(compress("a{margin:1px 2px 3px 4px}"), "a{margin:1px 2px 3px 4px}");
  }

  #[test]
  fn shortens_font_weight_keywords() {
    assert_eq!(compress("a{font-weight:bold}"), "a{font-weight:700}");
    assert_eq!(compress("a{font-weight:NORMAL}"), "a{font-weight:400}");
  }

  #[test]
  fn functional_colors_become_shortest_form() {
    assert_eq!(compress("a{color:rgb(255,0,0)}"), "a{color:red}");
    assert_eq!(compress("a{color:rgb(51,102,153)}"), "a{color:#369}");
    assert_eq!(compress("a{color:rgb(100%,0%,0%)}"), "a{color:red}");
    assert_eq!(compress("a{color:hsl(0,100%,50%)}"), "a{color:red}");
    assert_eq!(compress("a{color:hsl(210,50%,40%)}"), "a{color:#369}");
  }

  #[test]
  fn conversion_restores_separating_space() {
    assert_eq!(
      compress("a{background:rgb(0,0,0) 0 0}"),
      "a{background:#000 0 0}"
    );
  }

  #[test]
  fn shortens_hex_colors_and_names() {
    assert_eq!(compress("a{color:#ffffff}"), "a{color:#fff}");
    assert_eq!(compress("a{color:#AABBCC}"), "a{color:#abc}");
    assert_eq!(compress("a{color:#1E90FF}"), "a{color:#1e90ff}");
    assert_eq!(compress("a{color:#ff0000}"), "a{color:red}");
    assert_eq!(compress("a{color:white}"), "a{color:#fff}");
    assert_eq!(compress("a{color:blanchedalmond}"), "a{color:#ffebcd}");
  }

  #[test]
  fn id_selectors_and_filters_keep_their_hex() {
    assert_eq!(compress("#AddressForm{top:0}"), "#AddressForm{top:0}");
    assert_eq!(
      compress(r##"a{filter:chroma(color="#FFFFFF");}"##),
      r##"a{filter:chroma(color="#FFFFFF")}"##
    );
    // Longer-than-six hex runs are invalid colors and must not be touched.
    assert_eq!(compress("a{background-color:#aabbccdd}"), "a{background-color:#aabbccdd}");
  }

  #[test]
  fn calc_spacing_survives() {
    let patterns = CompiledPatterns::compile(1_000_000, -1).expect("patterns");
    let mut tokens = TokenStore::new();
    let out = compress_chunk("a{width:calc( 100% - 20px )}", &patterns, &mut tokens).expect("compress");
    let (id, body) = tokens.preserved.first().expect("calc token");
    assert_eq!(body.as_str(), "100% - 20px");
    assert_eq!(out, format!("a{{width:calc({id})}}"));
  }

  #[test]
  fn calc_collapses_safe_punctuation_spacing() {
    let patterns = CompiledPatterns::compile(1_000_000, -1).expect("patterns");
    let mut tokens = TokenStore::new();
    compress_chunk("a{width:calc( ( 100% - 20px ) * 2 )}", &patterns, &mut tokens).expect("compress");
    let (_, body) = tokens.preserved.first().expect("calc token");
    assert_eq!(body.as_str(), "(100% - 20px)*2");
  }

  #[test]
  fn removes_empty_rules_in_two_passes() {
    assert_eq!(compress("a{}"), "");
    assert_eq!(compress("a{color:red}b{}c{top:0}"), "a{color:red}c{top:0}");
  }

  #[test]
  fn keeps_star_hack_semicolon() {
    assert_eq!(compress("a{*zoom:1;}"), "a{*zoom:1;}");
    assert_eq!(compress("a{color:red;;}"), "a{color:red}");
  }

  #[test]
  fn media_query_spacing_and_fractions() {
    assert_eq!(
      compress("@media screen and (-webkit-min-device-pixel-ratio:0){a{top:0}}"),
      "@media screen and (-webkit-min-device-pixel-ratio:0){a{top:0}}"
    );
    // No connector keyword, so the space after `@media` is not restored.
    assert_eq!(
      compress("@media (-o-device-pixel-ratio: 2/1 ){a{top:0}}"),
      "@media(-o-device-pixel-ratio:2/1){a{top:0}}"
    );
  }

  #[test]
  fn lowercases_directives_selectors_and_properties() {
    assert_eq!(compress("@MEDIA all{a{COLOR:red}}"), "@media all{a{color:red}}");
    assert_eq!(compress("a:HOVER{top:0}"), "a:hover{top:0}");
    assert_eq!(compress("a{background:URL(x.png)}"), "a{background:url(x.png)}");
  }

  #[test]
  fn first_line_keeps_trailing_space() {
    assert_eq!(compress("p:first-letter{top:0}"), "p:first-letter {top:0}");
  }
}
