//! Named placeholder scanning (`:name` tokens in SQL text).
//!
//! A placeholder is `:` followed by `[A-Za-z_][A-Za-z0-9_]*`. The scanner
//! leaves alone:
//! - `::` casts (`created::date`)
//! - anything inside single-quoted literals (`'12:30'`, with `''` escapes)
//!   and double-quoted identifiers (`"owner's"`)
//! - `-- line` and `/* block */` comments

/// Rewrite every placeholder token for which `replace` returns `Some`.
///
/// The closure receives the name without the leading colon. Tokens it
/// declines are copied through unchanged.
pub fn rewrite_placeholders<F>(sql: &str, mut replace: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => i = skip_quoted(bytes, i, b'\''),
            b'"' => i = skip_quoted(bytes, i, b'"'),
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = bytes[i..]
                    .iter()
                    .position(|&c| c == b'\n')
                    .map_or(bytes.len(), |n| i + n + 1);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = bytes[i + 2..]
                    .windows(2)
                    .position(|w| w == b"*/")
                    .map_or(bytes.len(), |n| i + 2 + n + 2);
            }
            b':' if bytes.get(i + 1) == Some(&b':') => i += 2,
            b':' if bytes.get(i + 1).is_some_and(|c| is_name_start(*c)) => {
                let name_start = i + 1;
                let mut end = name_start + 1;
                while end < bytes.len() && is_name_char(bytes[end]) {
                    end += 1;
                }
                let name = &sql[name_start..end];
                if let Some(replacement) = replace(name) {
                    out.push_str(&sql[start..i]);
                    out.push_str(&replacement);
                    start = end;
                }
                i = end;
            }
            _ => i += 1,
        }
    }
    out.push_str(&sql[start..]);
    out
}

/// Index just past the quoted run opening at `open`. A doubled quote is an
/// escaped quote; an unterminated run extends to the end of the text.
fn skip_quoted(bytes: &[u8], open: usize, quote: u8) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Placeholder names in order of appearance (repeats included).
pub fn placeholder_names(sql: &str) -> Vec<String> {
    let mut names = Vec::new();
    rewrite_placeholders(sql, |name| {
        names.push(name.to_string());
        None
    });
    names
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
