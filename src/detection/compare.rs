//! Total ordering over installer version strings.

use crate::config::is_latest;
use std::cmp::Ordering;

/// Placeholder components for pre-release tags.
///
/// They sit below zero so a pre-release sorts before the release sharing its
/// numeric prefix (`6.0.0-beta.5 < 6.0.0`).
const PRERELEASE_TAGS: &[(&str, i64)] = &[("alpha", -3), ("beta", -2), ("rc", -1)];

/// Compare two installer version strings.
///
/// Handles versions like `6.0.0`, `6.0.0-Beta.5` and the `latest` sentinel,
/// which is greater than any concrete version and equal only to itself.
///
/// Concrete versions are split on `.`, `-` and `_` into integer components.
/// Pre-release tags (`alpha`, `beta`, `rc`) become negative components,
/// other non-numeric tokens are dropped, and missing trailing components
/// count as zero. Strings without any numeric content compare equal.
///
/// # Example
///
/// ```rust
/// use bmad_headless::compare_versions;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare_versions("6.0.0-Beta.5", "6.0.0-Beta.4"), Ordering::Greater);
/// assert_eq!(compare_versions("6.0.0-beta.5", "6.0.0"), Ordering::Less);
/// assert_eq!(compare_versions("latest", "99.0.0"), Ordering::Greater);
/// ```
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (is_latest(a), is_latest(b)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare_components(&components(a), &components(b)),
    }
}

fn components(version: &str) -> Vec<i64> {
    let lowered = version.trim().to_lowercase();
    let mut parts = Vec::new();

    for token in lowered.split(['.', '-', '_']) {
        let rest = match PRERELEASE_TAGS
            .iter()
            .find(|(tag, _)| token.starts_with(tag))
        {
            Some((tag, rank)) => {
                parts.push(*rank);
                &token[tag.len()..]
            }
            None => token,
        };

        let number = rest.strip_prefix('v').unwrap_or(rest);
        if let Ok(n) = number.parse::<i64>() {
            parts.push(n);
        }
    }

    parts
}

fn compare_components(a: &[i64], b: &[i64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_is_greatest() {
        assert_eq!(compare_versions("latest", "6.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("6.0.0", "latest"), Ordering::Less);
        assert_eq!(compare_versions("LATEST", "999.999.999"), Ordering::Greater);
        assert_eq!(compare_versions("latest", "Latest"), Ordering::Equal);
    }

    #[test]
    fn test_release_ordering() {
        assert_eq!(compare_versions("6.0.0", "5.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("6.0.0", "6.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("6.0.10", "6.0.9"), Ordering::Greater);
        assert_eq!(compare_versions("6.0", "6.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("6.0.0", "6.0.0.1"), Ordering::Less);
    }

    #[test]
    fn test_prerelease_ordering() {
        assert_eq!(compare_versions("6.0.0-Beta.5", "6.0.0-Beta.4"), Ordering::Greater);
        assert_eq!(compare_versions("6.0.0-beta.5", "6.0.0"), Ordering::Less);
        assert_eq!(compare_versions("6.0.0-alpha.9", "6.0.0-beta.1"), Ordering::Less);
        assert_eq!(compare_versions("6.0.0-rc.1", "6.0.0-beta.9"), Ordering::Greater);
        assert_eq!(compare_versions("6.0.0-beta5", "6.0.0-beta.5"), Ordering::Equal);
        assert_eq!(compare_versions("6.0.0-beta.1", "5.9.9"), Ordering::Greater);
    }

    #[test]
    fn test_non_numeric_tokens_are_dropped() {
        assert_eq!(compare_versions("6.0.0-next", "6.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("v6.0.0", "6.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("garbage", "nonsense"), Ordering::Equal);
        assert_eq!(compare_versions("", "0"), Ordering::Equal);
    }

    #[test]
    fn test_reflexive_and_antisymmetric() {
        let versions = [
            "latest",
            "6.0.0",
            "6.0.0-Beta.5",
            "6.0.0-Beta.4",
            "6.0.0-alpha.1",
            "5.0.0",
            "5",
            "v4.2",
            "next",
        ];
        for a in versions {
            assert_eq!(compare_versions(a, a), Ordering::Equal, "{} vs itself", a);
            for b in versions {
                assert_eq!(
                    compare_versions(a, b),
                    compare_versions(b, a).reverse(),
                    "{} vs {}",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn test_components() {
        assert_eq!(components("6.0.0-Beta.5"), vec![6, 0, 0, -2, 5]);
        assert_eq!(components("6.0.0-alpha"), vec![6, 0, 0, -3]);
        assert_eq!(components("1_2_3"), vec![1, 2, 3]);
        assert!(components("latest-ish").is_empty());
    }
}
