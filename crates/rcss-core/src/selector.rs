//! Text-level helpers for selector lists.

/// Splits a selector list at commas that are not inside brackets or strings.
pub fn split_list(selector: &str) -> Vec<&str> {
    let bytes = selector.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i];
        match (quote, ch) {
            (_, b'\\') => i += 1,
            (Some(q), _) if ch == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(ch),
            (None, b'(' | b'[') => depth += 1,
            (None, b')' | b']') => depth = depth.saturating_sub(1),
            (None, b',') if depth == 0 => {
                parts.push(selector[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(selector[start.min(selector.len())..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}

pub fn has_nesting_selector(selector: &str) -> bool {
    unquoted_ampersands(selector).next().is_some()
}

/// Replaces every unquoted `&` with `replacement`.
pub fn substitute(selector: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(selector.len() + replacement.len());
    let mut last = 0;
    for idx in unquoted_ampersands(selector) {
        out.push_str(&selector[last..idx]);
        out.push_str(replacement);
        last = idx + 1;
    }
    out.push_str(&selector[last..]);
    out
}

/// A list of more than one selector becomes `:is(a, b)`; a single one is returned as is.
pub fn wrap_list(parts: &[String]) -> String {
    match parts {
        [single] => single.clone(),
        _ => format!(":is({})", parts.join(", ")),
    }
}

/// Form of `selector` that can stand in for `&` inside another selector.
pub fn as_nesting_parent(selector: &str) -> String {
    let parts: Vec<String> = split_list(selector).into_iter().map(str::to_string).collect();
    if parts.len() > 1 {
        wrap_list(&parts)
    } else {
        selector.trim().to_string()
    }
}

fn unquoted_ampersands(selector: &str) -> impl Iterator<Item = usize> + '_ {
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    selector
        .bytes()
        .enumerate()
        .filter_map(move |(idx, ch)| {
            if escaped {
                escaped = false;
                return None;
            }
            match (quote, ch) {
                (_, b'\\') => escaped = true,
                (Some(q), _) if ch == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(ch),
                (None, b'&') => return Some(idx),
                _ => {}
            }
            None
        })
}
