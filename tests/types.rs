// ABOUTME: Property tests for the validated domain types.
// ABOUTME: Covers release tags, architecture normalization, and image refs.

use caravel::types::{Arch, ImageRef, ReleaseTag, ServiceName};
use proptest::prelude::*;

proptest! {
    /// Any v-prefixed version-like string is a valid release tag.
    #[test]
    fn version_like_tags_parse(rest in "[0-9][A-Za-z0-9._-]{0,20}") {
        let tag = format!("v{rest}");
        let parsed = ReleaseTag::parse(&tag).unwrap();
        prop_assert_eq!(parsed.as_str(), tag);
    }

    /// Strings without the v-digit prefix never parse, whatever follows.
    #[test]
    fn unprefixed_strings_never_parse(s in "[0-9a-z][A-Za-z0-9._-]{0,20}") {
        prop_assume!(!s.starts_with('v') || !s[1..].starts_with(|c: char| c.is_ascii_digit()));
        prop_assert!(ReleaseTag::parse(&s).is_err());
    }

    /// A tag containing any shell metacharacter is rejected, so a tag can
    /// always be interpolated into a remote script without quoting tricks.
    #[test]
    fn tags_with_metacharacters_never_parse(
        prefix in "v[0-9][A-Za-z0-9._-]{0,5}",
        c in prop::sample::select(vec![';', '$', '`', '|', '&', ' ', '\'', '"', '>', '<']),
    ) {
        // Embedded, not trailing: leading/trailing whitespace is trimmed.
        let tag = format!("{prefix}{c}9");
        prop_assert!(ReleaseTag::parse(&tag).is_err());
    }

    /// Normalization is idempotent: feeding a normalized label back in
    /// yields the same architecture.
    #[test]
    fn arch_normalization_is_idempotent(raw in "[a-z0-9_]{1,12}") {
        let first = Arch::normalize(&raw);
        let second = Arch::normalize(first.as_str());
        prop_assert_eq!(first, second);
    }

    /// Valid image references round-trip through Display.
    #[test]
    fn image_refs_round_trip(name in "[a-z][a-z0-9-]{0,10}", tag in "v[0-9]\\.[0-9]") {
        let input = format!("ghcr.io/acme/{name}:{tag}");
        let parsed = ImageRef::parse(&input).unwrap();
        prop_assert_eq!(parsed.to_string(), input);
    }

    /// Valid service names are accepted verbatim.
    #[test]
    fn service_names_accept_compose_charset(name in "[a-z0-9][a-z0-9_-]{0,20}[a-z0-9]") {
        let parsed = ServiceName::new(&name).unwrap();
        prop_assert_eq!(parsed.as_str(), name);
    }
}

#[test]
fn floating_tags_are_rejected_even_with_force_semantics() {
    // The floating-tag check is structural; nothing downstream can relax it.
    assert!(ReleaseTag::parse("latest").is_err());
}

#[test]
fn release_substitution_keeps_registry_and_name() {
    let tag = ReleaseTag::parse("v3.0.0").unwrap();
    let image = ImageRef::parse("ghcr.io/acme/trend-viewer:v2.9.9").unwrap();
    let pinned = image.with_release(&tag);
    assert_eq!(pinned.registry(), Some("ghcr.io"));
    assert_eq!(pinned.name(), "acme/trend-viewer");
    assert_eq!(pinned.tag(), Some("v3.0.0"));
}
