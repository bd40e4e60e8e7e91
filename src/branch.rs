use crate::error::{Result, SproutError};

const MAX_TITLE_CHARS: usize = 50;

/// Lowercase kebab form of `s` restricted to `[a-z0-9-]`.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        let c = if c == ' ' || c == '_' { '-' } else { c };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            continue;
        }
        if c == '-' && (out.is_empty() || out.ends_with('-')) {
            continue;
        }
        out.push(c);
    }
    trim_hyphens(&out).to_string()
}

fn trim_hyphens(s: &str) -> &str {
    s.trim_matches('-')
}

/// Branch name for a ticket: `<identifier>-<title>` in slug form, with the
/// title part capped at 50 characters. Empty when neither part survives.
pub fn branch_name_for_ticket(identifier: &str, title: &str) -> String {
    let id = slugify(identifier);
    let title = slugify(title);
    let title = trim_hyphens(crate::text::truncate_chars(&title, MAX_TITLE_CHARS));

    match (id.is_empty(), title.is_empty()) {
        (true, true) => String::new(),
        (true, false) => title.to_string(),
        (false, true) => id,
        (false, false) => format!("{}-{}", id, title),
    }
}

/// Reject names git would refuse as a branch.
pub fn validate_branch_name(name: &str) -> Result<()> {
    let reject = |why: &str| Err(SproutError::Validation(format!("invalid branch name '{}': {}", name, why)));

    if name.is_empty() {
        return Err(SproutError::Validation("branch name is empty".to_string()));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return reject("contains whitespace");
    }
    if let Some(c) = name.chars().find(|c| matches!(c, '~' | '^' | ':' | '?' | '*' | '[' | '\\')) {
        return reject(&format!("contains '{}'", c));
    }
    if name.contains("..") || name.contains("@{") || name.contains("//") {
        return reject("contains a forbidden sequence");
    }
    if name.starts_with('-') || name.starts_with('/') || name.ends_with('/') || name.ends_with('.') {
        return reject("bad leading or trailing character");
    }
    if name.ends_with(".lock") {
        return reject("ends with .lock");
    }
    Ok(())
}
