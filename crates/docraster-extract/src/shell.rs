//! POSIX shell quoting for command lines handed to `sh -c`.

/// Quote `s` so the shell sees it as exactly one word.
pub fn shell_escape(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if s.chars().all(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '%' | ':' | '+' | '=' | ',' | '@')
    }) {
        return s.to_string();
    }
    let escaped = s.replace('\'', "'\\''");
    format!("'{}'", escaped)
}

/// Quote every token and join them with spaces.
pub fn shell_join<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|t| shell_escape(t.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}
