//! Minimal English singular/plural rule set for FK target-table guessing
//! (§9 design note). An external collaborator in spirit: callers may swap
//! this out for a real inflection crate without touching the scanner.

/// Best-effort singular form of a plural noun.
pub fn singularize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if let Some(stem) = lower.strip_suffix("ies") {
        format!("{stem}y")
    } else if lower.ends_with("ses") || lower.ends_with("xes") || lower.ends_with("ches") {
        lower[..lower.len() - 2].to_string()
    } else if let Some(stem) = lower.strip_suffix('s') {
        stem.to_string()
    } else {
        lower
    }
}

/// Best-effort plural form of a singular noun, used as the fallback try
/// when a stripped `_id` suffix names an already-singular table.
pub fn pluralize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if lower.ends_with('y') && !lower.ends_with("ay") && !lower.ends_with("ey") {
        format!("{}ies", &lower[..lower.len() - 1])
    } else if lower.ends_with('s') || lower.ends_with('x') || lower.ends_with("ch") {
        format!("{lower}es")
    } else {
        format!("{lower}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singularizes_ies_to_y() {
        assert_eq!(singularize("categories"), "category");
    }

    #[test]
    fn singularizes_plain_s() {
        assert_eq!(singularize("users"), "user");
    }

    #[test]
    fn pluralizes_y_to_ies() {
        assert_eq!(pluralize("category"), "categories");
    }

    #[test]
    fn pluralizes_plain_word() {
        assert_eq!(pluralize("user"), "users");
    }
}
