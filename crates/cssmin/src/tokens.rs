use indexmap::IndexMap;

/// Marker inserted around preserved comments so the surviving line breaks can
/// be told apart from ordinary whitespace until the very end of a run.
pub(crate) const NL: &str = "___CSSMIN_NL___";

/// Stand-in for a pseudo-class colon while spaces before punctuation are
/// being stripped.
pub(crate) const PSEUDO_COLON: &str = "___CSSMIN_PSEUDO_COLON___";

/// Stand-in for the `/` of a device-pixel-ratio media query fraction while
/// punctuation spacing is rewritten.
pub(crate) const QUERY_FRACTION: &str = "___CSSMIN_QUERY_FRACTION___";

pub(crate) const PRESERVED_TOKEN: &str = "___CSSMIN_PRESERVED_TOKEN_";
pub(crate) const COMMENT_TOKEN: &str = "___CSSMIN_COMMENT_";
pub(crate) const AT_RULE_BLOCK_TOKEN: &str = "___CSSMIN_AT_RULE_BLOCK_";

/// Run-scoped placeholder tables.
///
/// A fresh store is created for every minification run and dropped with it,
/// so concurrent runs can never observe each other's placeholders. Tables are
/// insertion-ordered: restoration walks them in registration order and each
/// id replaces only its first literal occurrence.
///
/// The marker strings above cannot occur in legitimate CSS (triple
/// underscores are not valid in identifiers produced by any sane stylesheet,
/// and the ids additionally embed a monotonic index), which is what makes the
/// protect/rewrite/restore scheme safe without a parse tree.
#[derive(Debug, Default)]
pub(crate) struct TokenStore {
  /// Content that must survive every structural rewrite untouched.
  pub preserved: IndexMap<String, String>,
  /// Comment spans pending a keep/drop decision.
  pub comments: IndexMap<String, String>,
  /// Nested at-rule blocks captured so chunking cannot split them.
  pub at_rule_blocks: IndexMap<String, String>,
}

impl TokenStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn register(table: &mut IndexMap<String, String>, prefix: &str, content: String) -> String {
    let id = format!("{}{}___", prefix, table.len());
    table.insert(id.clone(), content);
    id
  }

  /// Registers content that must come back verbatim, returning its token id.
  pub fn preserve(&mut self, content: impl Into<String>) -> String {
    Self::register(&mut self.preserved, PRESERVED_TOKEN, content.into())
  }

  /// Registers a comment span pending resolution, returning its token id.
  pub fn hold_comment(&mut self, content: impl Into<String>) -> String {
    Self::register(&mut self.comments, COMMENT_TOKEN, content.into())
  }

  /// Registers an at-rule block captured for chunk safety, returning its
  /// token id.
  pub fn hold_at_rule_block(&mut self, content: impl Into<String>) -> String {
    Self::register(&mut self.at_rule_blocks, AT_RULE_BLOCK_TOKEN, content.into())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn ids_are_unique_and_monotonic_per_class() {
    let mut tokens = TokenStore::new();
    let a = tokens.preserve("one");
    let b = tokens.preserve("two");
    let c = tokens.hold_comment("three");

    assert_eq!(a, "___CSSMIN_PRESERVED_TOKEN_0___");
    assert_eq!(b, "___CSSMIN_PRESERVED_TOKEN_1___");
    assert_eq!(c, "___CSSMIN_COMMENT_0___");
    assert_eq!(tokens.preserved.get(&a).map(String::as_str), Some("one"));
    assert_eq!(tokens.preserved.get(&b).map(String::as_str), Some("two"));
  }

  #[test]
  fn tables_keep_insertion_order() {
    let mut tokens = TokenStore::new();
    for content in ["x", "y", "z"] {
      tokens.preserve(content);
    }
    let contents: Vec<&str> = tokens.preserved.values().map(String::as_str).collect();
    assert_eq!(contents, vec!["x", "y", "z"]);
  }
}
