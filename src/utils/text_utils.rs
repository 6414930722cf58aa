use regex::Regex;
use lazy_static::lazy_static;

lazy_static! {
  // Anything that's not a word character, a dash or
  // some whitespace gets removed from heading slugs.
  static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^\w\s-]").unwrap();
  static ref DASH_OR_SPACE_RUNS: Regex = Regex::new(r"[-\s]+").unwrap();
  // Search terms can be separated by spaces or commas.
  static ref SEARCH_SEPARATORS: Regex = Regex::new(r"[\s,]+").unwrap();
}

// I'm only escaping what can break out of an element
// or an attribute value.
pub fn escape_html(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&#39;"),
      _ => escaped.push(c)
    }
  }
  escaped
}

// Used to generate the heading anchors. Unicode word
// characters are kept so that non-latin headings still
// get something readable.
pub fn slugify(text: &str) -> String {
  let cleaned = NON_SLUG_CHARS.replace_all(text, "");
  let lowered = cleaned.trim().to_lowercase();
  DASH_OR_SPACE_RUNS.replace_all(&lowered, "-").to_string()
}

// LIKE patterns use "\" as the escape character in all
// of the queries, so "%" and "_" in user input have to
// be escaped to match literally.
pub fn escape_like(term: &str) -> String {
  let mut escaped = String::with_capacity(term.len() + 2);
  for c in term.chars() {
    if c == '\\' || c == '%' || c == '_' {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped
}

pub fn split_search_terms(search: &str, max_terms: usize) -> Vec<String> {
  SEARCH_SEPARATORS.split(search)
    .map(|t| t.trim())
    .filter(|t| !t.is_empty())
    .take(max_terms)
    .map(String::from)
    .collect()
}
