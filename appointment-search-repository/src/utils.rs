//! Utility functions for the appointment search repository.

/// Characters with a meaning in the Lucene/Solr query syntax.
const QUERY_SPECIAL_CHARS: &[char] = &[
    '\\', '+', '-', '!', '(', ')', ':', '^', '[', ']', '"', '{', '}', '~', '*', '?', '|', '&',
    ';', '/',
];

/// Escape a value so it is matched literally in a Solr query.
///
/// Special characters and whitespace are prefixed with a backslash.
///
/// # Example
///
/// ```
/// use appointment_search_repository::escape_query_value;
///
/// assert_eq!(escape_query_value("appointment-slot"), "appointment\\-slot");
/// assert_eq!(escape_query_value("site_1_appointment"), "site_1_appointment");
/// ```
pub fn escape_query_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if QUERY_SPECIAL_CHARS.contains(&c) || c.is_whitespace() {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
