//! Color data tables and the pure numeric conversions behind the color
//! shortening stages.
//!
//! Both lookup maps are derived from one canonical named-color list. The
//! derivation rules keep the rewrites monotone: a name is only ever swapped
//! in when it is not longer than the minimal hex form, and a name is only
//! ever swapped out when its hex form is strictly shorter. The two passes can
//! therefore never undo each other, which is what makes re-minifying already
//! minified output a fixed point.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// The CSS named colors with their 6-digit lowercase hex values.
const NAMED_COLORS: &[(&str, &str)] = &[
  ("aliceblue", "#f0f8ff"),
  ("antiquewhite", "#faebd7"),
  ("aqua", "#00ffff"),
  ("aquamarine", "#7fffd4"),
  ("azure", "#f0ffff"),
  ("beige", "#f5f5dc"),
  ("bisque", "#ffe4c4"),
  ("black", "#000000"),
  ("blanchedalmond", "#ffebcd"),
  ("blue", "#0000ff"),
  ("blueviolet", "#8a2be2"),
  ("brown", "#a52a2a"),
  ("burlywood", "#deb887"),
  ("cadetblue", "#5f9ea0"),
  ("chartreuse", "#7fff00"),
  ("chocolate", "#d2691e"),
  ("coral", "#ff7f50"),
  ("cornflowerblue", "#6495ed"),
  ("cornsilk", "#fff8dc"),
  ("crimson", "#dc143c"),
  ("cyan", "#00ffff"),
  ("darkblue", "#00008b"),
  ("darkcyan", "#008b8b"),
  ("darkgoldenrod", "#b8860b"),
  ("darkgray", "#a9a9a9"),
  ("darkgreen", "#006400"),
  ("darkgrey", "#a9a9a9"),
  ("darkkhaki", "#bdb76b"),
  ("darkmagenta", "#8b008b"),
  ("darkolivegreen", "#556b2f"),
  ("darkorange", "#ff8c00"),
  ("darkorchid", "#9932cc"),
  ("darkred", "#8b0000"),
  ("darksalmon", "#e9967a"),
  ("darkseagreen", "#8fbc8f"),
  ("darkslateblue", "#483d8b"),
  ("darkslategray", "#2f4f4f"),
  ("darkslategrey", "#2f4f4f"),
  ("darkturquoise", "#00ced1"),
  ("darkviolet", "#9400d3"),
  ("deeppink", "#ff1493"),
  ("deepskyblue", "#00bfff"),
  ("dimgray", "#696969"),
  ("dimgrey", "#696969"),
  ("dodgerblue", "#1e90ff"),
  ("firebrick", "#b22222"),
  ("floralwhite", "#fffaf0"),
  ("forestgreen", "#228b22"),
  ("fuchsia", "#ff00ff"),
  ("gainsboro", "#dcdcdc"),
  ("ghostwhite", "#f8f8ff"),
  ("gold", "#ffd700"),
  ("goldenrod", "#daa520"),
  ("gray", "#808080"),
  ("green", "#008000"),
  ("greenyellow", "#adff2f"),
  ("grey", "#808080"),
  ("honeydew", "#f0fff0"),
  ("hotpink", "#ff69b4"),
  ("indianred", "#cd5c5c"),
  ("indigo", "#4b0082"),
  ("ivory", "#fffff0"),
  ("khaki", "#f0e68c"),
  ("lavender", "#e6e6fa"),
  ("lavenderblush", "#fff0f5"),
  ("lawngreen", "#7cfc00"),
  ("lemonchiffon", "#fffacd"),
  ("lightblue", "#add8e6"),
  ("lightcoral", "#f08080"),
  ("lightcyan", "#e0ffff"),
  ("lightgoldenrodyellow", "#fafad2"),
  ("lightgray", "#d3d3d3"),
  ("lightgreen", "#90ee90"),
  ("lightgrey", "#d3d3d3"),
  ("lightpink", "#ffb6c1"),
  ("lightsalmon", "#ffa07a"),
  ("lightseagreen", "#20b2aa"),
  ("lightskyblue", "#87cefa"),
  ("lightslategray", "#778899"),
  ("lightslategrey", "#778899"),
  ("lightsteelblue", "#b0c4de"),
  ("lightyellow", "#ffffe0"),
  ("lime", "#00ff00"),
  ("limegreen", "#32cd32"),
  ("linen", "#faf0e6"),
  ("magenta", "#ff00ff"),
  ("maroon", "#800000"),
  ("mediumaquamarine", "#66cdaa"),
  ("mediumblue", "#0000cd"),
  ("mediumorchid", "#ba55d3"),
  ("mediumpurple", "#9370db"),
  ("mediumseagreen", "#3cb371"),
  ("mediumslateblue", "#7b68ee"),
  ("mediumspringgreen", "#00fa9a"),
  ("mediumturquoise", "#48d1cc"),
  ("mediumvioletred", "#c71585"),
  ("midnightblue", "#191970"),
  ("mintcream", "#f5fffa"),
  ("mistyrose", "#ffe4e1"),
  ("moccasin", "#ffe4b5"),
  ("navajowhite", "#ffdead"),
  ("navy", "#000080"),
  ("oldlace", "#fdf5e6"),
  ("olive", "#808000"),
  ("olivedrab", "#6b8e23"),
  ("orange", "#ffa500"),
  ("orangered", "#ff4500"),
  ("orchid", "#da70d6"),
  ("palegoldenrod", "#eee8aa"),
  ("palegreen", "#98fb98"),
  ("paleturquoise", "#afeeee"),
  ("palevioletred", "#db7093"),
  ("papayawhip", "#ffefd5"),
  ("peachpuff", "#ffdab9"),
  ("peru", "#cd853f"),
  ("pink", "#ffc0cb"),
  ("plum", "#dda0dd"),
  ("powderblue", "#b0e0e6"),
  ("purple", "#800080"),
  ("rebeccapurple", "#663399"),
  ("red", "#ff0000"),
  ("rosybrown", "#bc8f8f"),
  ("royalblue", "#4169e1"),
  ("saddlebrown", "#8b4513"),
  ("salmon", "#fa8072"),
  ("sandybrown", "#f4a460"),
  ("seagreen", "#2e8b57"),
  ("seashell", "#fff5ee"),
  ("sienna", "#a0522d"),
  ("silver", "#c0c0c0"),
  ("skyblue", "#87ceeb"),
  ("slateblue", "#6a5acd"),
  ("slategray", "#708090"),
  ("slategrey", "#708090"),
  ("snow", "#fffafa"),
  ("springgreen", "#00ff7f"),
  ("steelblue", "#4682b4"),
  ("tan", "#d2b48c"),
  ("teal", "#008080"),
  ("thistle", "#d8bfd8"),
  ("tomato", "#ff6347"),
  ("turquoise", "#40e0d0"),
  ("violet", "#ee82ee"),
  ("wheat", "#f5deb3"),
  ("white", "#ffffff"),
  ("whitesmoke", "#f5f5f5"),
  ("yellow", "#ffff00"),
  ("yellowgreen", "#9acd32"),
];

/// Minimal hex form -> color name, for names not longer than that form.
/// Ties prefer the name. Duplicate hexes (aqua/cyan, gray/grey) resolve to
/// the first listed name.
pub(crate) static HEX_TO_NAME: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
  let mut map = HashMap::new();
  for (name, hex) in NAMED_COLORS {
    let short = minimal_hex(&hex[1..]);
    if name.len() <= short.len() {
      map.entry(short).or_insert(*name);
    }
  }
  map
});

/// Color name -> minimal hex form, only where the hex form is strictly
/// shorter than the name.
pub(crate) static NAME_TO_HEX: Lazy<HashMap<&'static str, String>> = Lazy::new(|| {
  let mut map = HashMap::new();
  for (name, hex) in NAMED_COLORS {
    let short = minimal_hex(&hex[1..]);
    if short.len() < name.len() {
      map.insert(*name, short);
    }
  }
  map
});

/// Alternation of every name in [`NAME_TO_HEX`], longest first so the
/// pattern engine cannot stop at a prefix.
pub(crate) fn named_to_hex_alternation() -> String {
  let mut names: Vec<&str> = NAMED_COLORS
    .iter()
    .filter(|(name, hex)| minimal_hex(&hex[1..]).len() < name.len())
    .map(|(name, _)| *name)
    .collect();
  names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
  names.dedup();
  names.join("|")
}

/// Lowercases six hex digits and collapses a doubled triplet (`aabbcc`) to
/// three digits. Returns the `#`-prefixed minimal form.
pub(crate) fn minimal_hex(digits: &str) -> String {
  let lower = digits.to_ascii_lowercase();
  let b = lower.as_bytes();
  if b.len() == 6 && b[0] == b[1] && b[2] == b[3] && b[4] == b[5] {
    return format!("#{}{}{}", &lower[0..1], &lower[2..3], &lower[4..5]);
  }
  format!("#{}", lower)
}

/// Converts `rgb()` channels (integers or percentages) to six lowercase hex
/// digits. Returns `None` when fewer than three channels are present.
pub(crate) fn rgb_to_hex(channels: &[&str]) -> Option<String> {
  if channels.len() < 3 {
    return None;
  }
  let mut hex = String::with_capacity(6);
  for raw in &channels[..3] {
    let value = raw.trim();
    let number = match value.strip_suffix('%') {
      Some(percentage) => percentage.trim().parse::<f64>().unwrap_or(0.0) * 255.0 / 100.0,
      None => value.parse::<f64>().unwrap_or(0.0),
    };
    let byte = number.round().clamp(0.0, 255.0) as u8;
    hex.push_str(&format!("{:02x}", byte));
  }
  Some(hex)
}

/// Converts `hsl()` components (hue in degrees, saturation and lightness
/// percentages) to RGB bytes via the standard cylindrical formula. Returns
/// `None` when fewer than three components are present.
pub(crate) fn hsl_to_rgb(components: &[&str]) -> Option<[u8; 3]> {
  if components.len() < 3 {
    return None;
  }
  let hue = components[0].trim().parse::<f64>().unwrap_or(0.0);
  let hue = (((hue % 360.0) + 360.0) % 360.0) / 360.0;
  let saturation = percentage_fraction(components[1]);
  let lightness = percentage_fraction(components[2]);

  if saturation == 0.0 {
    let gray = channel_byte(lightness);
    return Some([gray, gray, gray]);
  }

  let upper = if lightness < 0.5 {
    lightness * (1.0 + saturation)
  } else {
    (lightness + saturation) - (saturation * lightness)
  };
  let lower = 2.0 * lightness - upper;

  Some([
    channel_byte(hue_to_channel(lower, upper, hue + 1.0 / 3.0)),
    channel_byte(hue_to_channel(lower, upper, hue)),
    channel_byte(hue_to_channel(lower, upper, hue - 1.0 / 3.0)),
  ])
}

fn percentage_fraction(raw: &str) -> f64 {
  let value = raw.trim().trim_end_matches('%').trim();
  value.parse::<f64>().unwrap_or(0.0).clamp(0.0, 100.0) / 100.0
}

fn channel_byte(fraction: f64) -> u8 {
  (255.0 * fraction).round().clamp(0.0, 255.0) as u8
}

/// One sector of the piecewise-linear HSL channel function.
fn hue_to_channel(lower: f64, upper: f64, hue: f64) -> f64 {
  let hue = if hue < 0.0 {
    hue + 1.0
  } else if hue > 1.0 {
    hue - 1.0
  } else {
    hue
  };
  if hue * 6.0 < 1.0 {
    return lower + (upper - lower) * 6.0 * hue;
  }
  if hue * 2.0 < 1.0 {
    return upper;
  }
  if hue * 3.0 < 2.0 {
    return lower + (upper - lower) * (2.0 / 3.0 - hue) * 6.0;
  }
  lower
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn minimal_hex_collapses_doubled_triplets() {
    assert_eq!(minimal_hex("ffffff"), "#fff");
    assert_eq!(minimal_hex("AABBCC"), "#abc");
    assert_eq!(minimal_hex("ff0000"), "#f00");
    assert_eq!(minimal_hex("1e90ff"), "#1e90ff");
  }

  #[test]
  fn rgb_channels_accept_integers_and_percentages() {
    assert_eq!(rgb_to_hex(&["255", "0", "0"]).as_deref(), Some("ff0000"));
    assert_eq!(rgb_to_hex(&["100%", "0%", "0%"]).as_deref(), Some("ff0000"));
    assert_eq!(rgb_to_hex(&["51", "102", "153"]).as_deref(), Some("336699"));
    // Out-of-range channels clamp instead of wrapping.
    assert_eq!(rgb_to_hex(&["300", "-20", "0"]).as_deref(), Some("ff0000"));
    assert_eq!(rgb_to_hex(&["255", "0"]), None);
  }

  #[test]
  fn rgb_percentages_round_half_away_from_zero() {
    // 50% of 255 = 127.5, rounds up to 128.
    assert_eq!(rgb_to_hex(&["50%", "50%", "50%"]).as_deref(), Some("808080"));
  }

  #[test]
  fn hsl_primary_colors() {
    assert_eq!(hsl_to_rgb(&["0", "100%", "50%"]), Some([255, 0, 0]));
    assert_eq!(hsl_to_rgb(&["120", "100%", "50%"]), Some([0, 255, 0]));
    assert_eq!(hsl_to_rgb(&["240", "100%", "50%"]), Some([0, 0, 255]));
  }

  #[test]
  fn hsl_hue_wraps_mod_360() {
    assert_eq!(hsl_to_rgb(&["360", "100%", "50%"]), Some([255, 0, 0]));
    assert_eq!(hsl_to_rgb(&["480", "100%", "50%"]), Some([0, 255, 0]));
    assert_eq!(hsl_to_rgb(&["-120", "100%", "50%"]), Some([0, 0, 255]));
  }

  #[test]
  fn hsl_zero_saturation_is_gray() {
    assert_eq!(hsl_to_rgb(&["37", "0%", "50%"]), Some([128, 128, 128]));
  }

  #[test]
  fn hex_to_name_prefers_short_names_only() {
    assert_eq!(HEX_TO_NAME.get("#f00").copied(), Some("red"));
    assert_eq!(HEX_TO_NAME.get("#000080").copied(), Some("navy"));
    // white is longer than #fff, so it must not be swapped in.
    assert_eq!(HEX_TO_NAME.get("#fff"), None);
    // Duplicate hex resolves to the first listed name.
    assert_eq!(HEX_TO_NAME.get("#0ff").copied(), Some("aqua"));
  }

  #[test]
  fn name_to_hex_only_shrinks() {
    assert_eq!(NAME_TO_HEX.get("white").map(String::as_str), Some("#fff"));
    assert_eq!(NAME_TO_HEX.get("black").map(String::as_str), Some("#000"));
    assert_eq!(
      NAME_TO_HEX.get("blanchedalmond").map(String::as_str),
      Some("#ffebcd")
    );
    // red -> #f00 would grow; the entry must not exist.
    assert_eq!(NAME_TO_HEX.get("red"), None);
    assert_eq!(NAME_TO_HEX.get("green"), None);
  }

  #[test]
  fn maps_never_ping_pong() {
    for (name, hex) in NAME_TO_HEX.iter() {
      if let Some(back) = HEX_TO_NAME.get(hex.as_str()) {
        assert_ne!(back, name, "{} would oscillate through {}", name, hex);
        assert!(back.len() <= hex.len());
      }
    }
  }
}
