use regex::Regex;
use std::sync::OnceLock;

fn strip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s-]").unwrap())
}

fn dash_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-\s]+").unwrap())
}

/// URL-safe slug: lowercase, punctuation dropped, whitespace and dash runs
/// collapsed into a single `-`.
pub fn slugify(value: &str) -> String {
    let lowered = value.to_lowercase();
    let stripped = strip_re().replace_all(&lowered, "");
    let dashed = dash_re().replace_all(stripped.trim(), "-");
    dashed.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Candidate for the n-th collision: `base`, `base-1`, `base-2`, ...
pub fn slug_candidate(base: &str, counter: u32) -> String {
    if counter == 0 {
        base.to_string()
    } else {
        format!("{base}-{counter}")
    }
}

/// First of `base`, `base-1`, `base-2`, ... that is not already in `taken`.
pub fn first_free_slug(base: &str, taken: &[String]) -> String {
    (0..)
        .map(|counter| slug_candidate(base, counter))
        .find(|candidate| !taken.iter().any(|t| t == candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Fresh Fruits"), "fresh-fruits");
        assert_eq!(slugify("  Tea & Coffee!  "), "tea-coffee");
        assert_eq!(slugify("multi   space -- dash"), "multi-space-dash");
        assert_eq!(slugify("Ёлка 2024"), "ёлка-2024");
    }

    #[test]
    fn test_slug_candidate() {
        assert_eq!(slug_candidate("phones", 0), "phones");
        assert_eq!(slug_candidate("phones", 2), "phones-2");
    }

    #[test]
    fn test_first_free_slug_skips_taken_suffixes() {
        let taken = |slugs: &[&str]| slugs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(first_free_slug("phone", &[]), "phone");
        assert_eq!(first_free_slug("phone", &taken(&["phone"])), "phone-1");
        assert_eq!(first_free_slug("phone", &taken(&["phone", "phone-1"])), "phone-2");
        // a gap is reused before appending past the highest suffix
        assert_eq!(first_free_slug("phone", &taken(&["phone", "phone-2"])), "phone-1");
        // neighbours sharing the prefix do not count as collisions
        assert_eq!(first_free_slug("phone", &taken(&["phones", "phone-case"])), "phone");
    }
}
