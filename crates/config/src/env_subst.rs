//! `${VAR}` and `${VAR:-fallback}` expansion for raw config text.

/// Expand placeholders from the process environment.
///
/// Unset variables without a fallback are left as written so validation can
/// point at them.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Names of placeholders that would stay unexpanded with `lookup`.
pub fn unresolved_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
    let mut missing = Vec::new();
    for_each_placeholder(input, |_, name, fallback| {
        if fallback.is_none() && lookup(name).is_none() && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    });
    missing
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0;
    for_each_placeholder(input, |range, name, fallback| {
        out.push_str(&input[cursor..range.start]);
        match (lookup(name), fallback) {
            (Some(value), _) => out.push_str(&value),
            (None, Some(fallback)) => out.push_str(fallback),
            (None, None) => out.push_str(&input[range.clone()]),
        }
        cursor = range.end;
    });
    out.push_str(&input[cursor..]);
    out
}

/// Visit every well-formed `${NAME}` / `${NAME:-fallback}` in `input`.
/// Unclosed or empty placeholders are treated as literal text.
fn for_each_placeholder(
    input: &str,
    mut visit: impl FnMut(std::ops::Range<usize>, &str, Option<&str>),
) {
    let mut search_from = 0;
    while let Some(offset) = input[search_from..].find("${") {
        let start = search_from + offset;
        let body_start = start + 2;
        let Some(len) = input[body_start..].find('}') else {
            break;
        };
        let body = &input[body_start..body_start + len];
        let end = body_start + len + 1;

        let (name, fallback) = match body.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (body, None),
        };
        if !name.is_empty() {
            visit(start..end, name, fallback);
        }
        search_from = end;
    }
}
