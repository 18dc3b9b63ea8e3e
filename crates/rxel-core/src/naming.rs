//! Field name <-> attribute name translation.
//!
//! Fields use camel case (`maxItems`); attributes use kebab case
//! (`max-items`). Every ASCII uppercase letter after the first character
//! becomes `-` plus its lowercase form, so acronyms split per letter
//! (`loadURL` -> `load-u-r-l`). A leading uppercase letter is lowercased
//! without a dash.

/// Convert a camel-case field name to its kebab-case attribute name.
#[must_use]
pub fn to_kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Convert a kebab-case attribute name back to camel case.
///
/// Inverse of [`to_kebab_case`] for names that start with a lowercase letter.
#[must_use]
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '-' {
            upper_next = true;
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    if upper_next {
        out.push('-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kebab_basic() {
        assert_eq!(to_kebab_case("value"), "value");
        assert_eq!(to_kebab_case("maxItems"), "max-items");
        assert_eq!(to_kebab_case("someLongName"), "some-long-name");
        assert_eq!(to_kebab_case("Leading"), "leading");
        assert_eq!(to_kebab_case("loadURL"), "load-u-r-l");
        assert_eq!(to_kebab_case("item2Count"), "item2-count");
    }

    #[test]
    fn camel_basic() {
        assert_eq!(to_camel_case("max-items"), "maxItems");
        assert_eq!(to_camel_case("value"), "value");
        assert_eq!(to_camel_case("trailing-"), "trailing-");
    }

    #[test]
    fn round_trip_for_lower_initial_names() {
        for name in ["a", "maxItems", "loadURL", "x1Y2"] {
            assert_eq!(to_camel_case(&to_kebab_case(name)), name);
        }
    }
}
