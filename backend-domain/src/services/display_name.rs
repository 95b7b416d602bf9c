use std::collections::HashMap;

const FIRST_NAME_KEYS: &[&str] = &["firstName", "first_name", "first name", "fname"];
const LAST_NAME_KEYS: &[&str] = &["lastName", "last_name", "last name", "lname"];
const FULL_NAME_KEYS: &[&str] = &[
    "name",
    "fullName",
    "full_name",
    "displayName",
    "display_name",
    "applicantName",
    "legalName",
    "preferredName",
    "hackerName",
];
const EMAIL_KEYS: &[&str] = &["email", "gmail"];

/// Picks a human name for an attendee record whose profile fields were
/// filled in by several registration forms with different key spellings.
pub fn display_name(id: &str, fields: &HashMap<String, String>) -> String {
    let normalized = fields
        .iter()
        .map(|(key, value)| (normalize_key(key), value.trim()))
        .filter(|(_, value)| !value.is_empty())
        .collect::<HashMap<_, _>>();
    let lookup = |keys: &[&str]| -> Option<String> {
        keys.iter()
            .find_map(|key| normalized.get(&normalize_key(key)))
            .map(|value| value.to_string())
    };

    let first = lookup(FIRST_NAME_KEYS).unwrap_or_default();
    let last = lookup(LAST_NAME_KEYS).unwrap_or_default();
    let full = format!("{} {}", first, last).trim().to_string();
    if !full.is_empty() {
        return full;
    }

    if let Some(name) = lookup(FULL_NAME_KEYS) {
        return name;
    }

    if let Some(email) = lookup(EMAIL_KEYS) {
        let inferred = infer_name_from_email(&email);
        return if inferred.is_empty() { email } else { inferred };
    }

    id.to_string()
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

fn infer_name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or("");
    let cleaned = local
        .chars()
        .map(|ch| {
            if matches!(ch, '.' | '_' | '-') || ch.is_ascii_digit() {
                ' '
            } else {
                ch
            }
        })
        .collect::<String>();
    cleaned
        .split_whitespace()
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|ch| ch.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}
