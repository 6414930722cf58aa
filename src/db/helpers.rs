use crate::utils::text_utils;

// Used for the SET part of UPDATE queries.
pub fn generate_field_equal_qmark(name: &str) -> String {
  format!("{} = ?", name)
}

// For "WHERE x IN (?,?,?)" clauses. Careful that SQLite
// doesn't like an empty list.
pub fn generate_in_placeholders(count: usize) -> String {
  vec!["?"; count].join(",")
}

// One LIKE clause per search term. The terms given as
// params have to go through like_pattern.
// unicode_lower is registered on every connection
// (see db::init_connection).
pub fn generate_like_clauses(name: &str, count: usize) -> Vec<String> {
  (0..count)
    .map(|_| format!("unicode_lower({}) LIKE ? ESCAPE '\\'", name))
    .collect()
}

// Lowercased substring pattern, to be compared with
// unicode_lower() of the column.
pub fn like_pattern(term: &str) -> String {
  format!("%{}%", text_utils::escape_like(&term.to_lowercase()))
}
