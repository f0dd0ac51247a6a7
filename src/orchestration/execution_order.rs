//! Execution order resolution.

use std::collections::HashSet;

/// Order in which requested tags are dispatched and reported.
///
/// Priority tags come first, in their listed order, restricted to the requested
/// set. Remaining requested tags follow in `default_order` (registration order).
/// Requested tags missing from `default_order` keep their request order at the
/// end.
pub fn resolve_execution_order(
    requested: &[String],
    priority: Option<&[String]>,
    default_order: &[String],
) -> Vec<String> {
    let wanted: HashSet<&str> = requested.iter().map(String::as_str).collect();
    let mut placed: HashSet<&str> = HashSet::with_capacity(wanted.len());
    let mut order = Vec::with_capacity(wanted.len());

    let candidates = priority
        .unwrap_or_default()
        .iter()
        .chain(default_order)
        .chain(requested);

    for tag in candidates {
        let tag = tag.as_str();
        if wanted.contains(tag) && placed.insert(tag) {
            order.push(tag.to_string());
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn test_default_order_without_priority() {
        let order = resolve_execution_order(
            &tags(&["runes", "tarot"]),
            None,
            &tags(&["tarot", "astrology", "runes"]),
        );
        assert_eq!(order, tags(&["tarot", "runes"]));
    }

    #[test]
    fn test_priority_first_then_default_order() {
        let order = resolve_execution_order(
            &tags(&["tarot", "astrology", "runes"]),
            Some(&tags(&["runes"])),
            &tags(&["tarot", "astrology", "runes"]),
        );
        assert_eq!(order, tags(&["runes", "tarot", "astrology"]));
    }

    #[test]
    fn test_unrequested_priority_tags_are_ignored() {
        let order = resolve_execution_order(
            &tags(&["tarot"]),
            Some(&tags(&["iching", "tarot", "tarot"])),
            &tags(&["tarot", "iching"]),
        );
        assert_eq!(order, tags(&["tarot"]));
    }

    #[test]
    fn test_empty_request() {
        let order = resolve_execution_order(&[], Some(&tags(&["tarot"])), &tags(&["tarot"]));
        assert!(order.is_empty());
    }
}
