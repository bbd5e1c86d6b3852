//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Normalize a code snippet by removing all whitespace.
/// The tutorial's code gates compare buffers this way: insensitive to
/// spacing and newlines, sensitive to every other token.
pub fn normalize_code(s: &str) -> String {
  s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max { s.to_string() } else { format!("{}… ({} bytes total)", &s[..max], s.len()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fill_template_replaces_all_occurrences() {
    let out = fill_template("Mission {n}: {topic} ({n})", &[("n", "3"), ("topic", "Lists")]);
    assert_eq!(out, "Mission 3: Lists (3)");
  }

  #[test]
  fn normalize_code_ignores_all_whitespace() {
    assert_eq!(normalize_code("mangoes = 5"), normalize_code("mangoes=5\n  "));
    assert_ne!(normalize_code("mangoes = 5"), normalize_code("mangoes = 6"));
  }

  #[test]
  fn normalize_code_keeps_interior_tokens() {
    assert_eq!(normalize_code("print( mangoes )"), "print(mangoes)");
    assert_ne!(normalize_code("print(mangoes)"), "print(mango)");
  }

  #[test]
  fn trunc_for_log_leaves_short_strings_alone() {
    assert_eq!(trunc_for_log("short", 32), "short");
    assert!(trunc_for_log(&"x".repeat(64), 8).contains("64 bytes total"));
  }
}
