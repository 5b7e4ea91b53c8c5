//! Named character reference table.
//!
//! The table is a flat array sorted bytewise by name, so every lookup is a
//! binary search. Names are stored without the leading `&` and trailing `;`.

mod table;

pub use table::MAX_NAME_LEN;

/// Decoded text for a semicolon-terminated name (`"amp"` for `&amp;`).
pub fn lookup(name: &str) -> Option<&'static str> {
    table::NAMED
        .binary_search_by(|(candidate, _)| candidate.as_bytes().cmp(name.as_bytes()))
        .ok()
        .map(|idx| table::NAMED[idx].1)
}

/// Decoded text for a name that is also legal without its `;`.
pub fn lookup_legacy(name: &str) -> Option<&'static str> {
    table::LEGACY
        .binary_search_by(|candidate| candidate.as_bytes().cmp(name.as_bytes()))
        .ok()
        .and_then(|_| lookup(name))
}

/// Longest legacy name that is a prefix of `name`, with its decoded text.
///
/// Returns the prefix length in bytes. Legacy names are at most six bytes
/// long, so this probes at most six candidates.
pub fn longest_legacy_prefix(name: &str) -> Option<(usize, &'static str)> {
    let max = name.len().min(LEGACY_MAX_LEN);
    (1..=max)
        .rev()
        .filter(|&len| name.is_char_boundary(len))
        .find_map(|len| lookup_legacy(&name[..len]).map(|value| (len, value)))
}

/// Whether some semicolon-terminated name starts with `prefix`.
///
/// Finds the first name that is `>= prefix`; `prefix` can still grow into a
/// full name iff that entry starts with it.
pub fn has_name_with_prefix(prefix: &str) -> bool {
    let idx = table::NAMED.partition_point(|(candidate, _)| candidate.as_bytes() < prefix.as_bytes());
    table::NAMED
        .get(idx)
        .is_some_and(|(candidate, _)| candidate.starts_with(prefix))
}

const LEGACY_MAX_LEN: usize = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_sorted_for_binary_search() {
        assert!(table::NAMED.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(table::LEGACY.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn legacy_names_match_their_semicolon_forms() {
        for name in table::LEGACY {
            assert!(name.len() <= LEGACY_MAX_LEN, "legacy name too long: {name}");
            assert!(lookup(name).is_some(), "legacy name without full form: {name}");
        }
    }

    #[test]
    fn names_follow_reference_grammar() {
        for (name, value) in table::NAMED {
            let mut bytes = name.bytes();
            assert!(bytes.next().is_some_and(|b| b.is_ascii_alphabetic()), "{name}");
            assert!(bytes.all(|b| b.is_ascii_alphanumeric()), "{name}");
            let count = value.chars().count();
            assert!((1..=2).contains(&count), "{name} decodes to {count} scalars");
            assert!(name.len() <= MAX_NAME_LEN);
        }
    }

    #[test]
    fn lookups() {
        assert_eq!(lookup("amp"), Some("&"));
        assert_eq!(lookup("notin"), Some("\u{2209}"));
        assert_eq!(lookup("frac23"), Some("\u{2154}"));
        assert_eq!(lookup("NotNestedGreaterGreater"), Some("\u{2AA2}\u{338}"));
        assert_eq!(lookup("foo"), None);
        assert_eq!(lookup_legacy("amp"), Some("&"));
        assert_eq!(lookup_legacy("frac23"), None);
        assert_eq!(lookup_legacy("notin"), None);
    }

    #[test]
    fn legacy_prefix_is_longest_match() {
        assert_eq!(longest_legacy_prefix("notit"), Some((3, "\u{ac}")));
        assert_eq!(longest_legacy_prefix("ampfoo"), Some((3, "&")));
        assert_eq!(longest_legacy_prefix("frac23foo"), None);
        assert_eq!(longest_legacy_prefix("frac12x"), Some((6, "\u{bd}")));
        assert_eq!(longest_legacy_prefix(""), None);
    }

    #[test]
    fn prefix_search() {
        assert!(has_name_with_prefix("a"));
        assert!(has_name_with_prefix("am"));
        assert!(has_name_with_prefix("amp"));
        assert!(has_name_with_prefix("fscr"));
        assert!(!has_name_with_prefix("ampx"));
        assert!(!has_name_with_prefix("foo"));
        assert!(!has_name_with_prefix("zzzz"));
    }
}
