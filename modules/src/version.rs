//! Version rules.
//!
//! Two unrelated orderings live here:
//!
//! - **Host compatibility**: marker versions are semantic versions. A tool
//!   is loadable only when its major.minor equals the host's; among
//!   duplicates the full version decides.
//! - **Language versions**: labels such as `c#12-3` or `c++25-4` sort by
//!   suite number (after the `-`), then base number, both descending, so the
//!   newest suite of the newest language revision comes first.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::error::{RegistryError, Result};

/// Version of the host that loads tools.
pub const HOST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parses [`HOST_VERSION`].
pub fn host_version() -> Version {
    parse_version(HOST_VERSION).unwrap_or_else(|_| Version::new(0, 0, 0))
}

/// Parses a marker version, accepting `major` and `major.minor` shorthands.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidVersion`] when the text is not a version.
///
/// # Examples
///
/// ```
/// use ndk_modules::parse_version;
///
/// assert_eq!(parse_version("1.2").unwrap().to_string(), "1.2.0");
/// assert_eq!(parse_version("v0.1.3").unwrap().to_string(), "0.1.3");
/// assert!(parse_version("one").is_err());
/// ```
pub fn parse_version(text: &str) -> Result<Version> {
    let trimmed = text.trim().trim_start_matches('v');
    let normalized = match trimmed.matches('.').count() {
        0 => format!("{trimmed}.0.0"),
        1 => format!("{trimmed}.0"),
        _ => trimmed.to_string(),
    };
    Version::parse(&normalized).map_err(|err| RegistryError::InvalidVersion {
        version: text.to_string(),
        reason: err.to_string(),
    })
}

/// `true` when `candidate` shares the host's major and minor numbers.
pub fn is_compatible(host: &Version, candidate: &Version) -> bool {
    host.major == candidate.major && host.minor == candidate.minor
}

static SEGMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)(?:[^-]*-\D*(\d+(?:\.\d+)?))?").expect("static regex must compile")
});

/// Numeric parts of a language version label.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LanguageVersion {
    /// First number in the label (`12` in `c#12-3`, `7.3` in `c#7.3`).
    pub base: f64,
    /// Number after the `-` separator (`3` in `c#12-3`); zero when absent.
    pub suite: f64,
}

impl LanguageVersion {
    /// Extracts the parts of `label`; missing or unparsable parts are zero.
    pub fn parse(label: &str) -> Self {
        let Some(captures) = SEGMENTS.captures(label) else {
            return Self::default();
        };
        let number = |index: usize| {
            captures
                .get(index)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .unwrap_or(0.0)
        };
        Self {
            base: number(1),
            suite: number(2),
        }
    }

    /// Ranking order: `Less` means `self` comes first. Higher suites come
    /// first, then higher bases.
    pub fn rank(&self, other: &Self) -> Ordering {
        other
            .suite
            .total_cmp(&self.suite)
            .then_with(|| other.base.total_cmp(&self.base))
    }
}

/// Orders two language version labels of the same language.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use ndk_modules::compare_language_versions;
///
/// assert_eq!(compare_language_versions("c#12-3", "c#12-2"), Ordering::Less);
/// assert_eq!(compare_language_versions("c#11-4", "c#12-3"), Ordering::Less);
/// assert_eq!(compare_language_versions("c#7.3", "c#7"), Ordering::Less);
/// ```
pub fn compare_language_versions(a: &str, b: &str) -> Ordering {
    LanguageVersion::parse(a).rank(&LanguageVersion::parse(b))
}

/// Orders `(identifier, language version)` pairs: identifiers first, then
/// [`compare_language_versions`].
pub fn compare_languages(a: (&str, &str), b: (&str, &str)) -> Ordering {
    a.0.cmp(b.0)
        .then_with(|| compare_language_versions(a.1, b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_host_version_matches_package() {
        assert_eq!(host_version().to_string(), HOST_VERSION);
    }

    #[test]
    fn test_compatibility_ignores_patch() {
        let host = Version::new(1, 0, 0);
        assert!(is_compatible(&host, &parse_version("1.0.9").unwrap()));
        assert!(!is_compatible(&host, &parse_version("1.1").unwrap()));
        assert!(!is_compatible(&host, &parse_version("2.0").unwrap()));
    }

    #[test]
    fn test_segments() {
        assert_eq!(
            LanguageVersion::parse("c#12-3"),
            LanguageVersion { base: 12.0, suite: 3.0 }
        );
        assert_eq!(
            LanguageVersion::parse("c++25-4"),
            LanguageVersion { base: 25.0, suite: 4.0 }
        );
        assert_eq!(
            LanguageVersion::parse("c#7.3"),
            LanguageVersion { base: 7.3, suite: 0.0 }
        );
        assert_eq!(LanguageVersion::parse("latest"), LanguageVersion::default());
    }

    #[test]
    fn test_suite_dominates_base() {
        let mut labels = vec!["c#12-1", "c#10-3", "c#12-3", "c#11"];
        labels.sort_by(|a, b| compare_language_versions(a, b));
        assert_eq!(labels, vec!["c#12-3", "c#10-3", "c#12-1", "c#11"]);
    }

    #[test]
    fn test_ties_are_stable() {
        let mut labels = vec!["c#12", "c#12.0", "c#12-0"];
        labels.sort_by(|a, b| compare_language_versions(a, b));
        assert_eq!(labels, vec!["c#12", "c#12.0", "c#12-0"]);
    }

    #[test]
    fn test_identifier_first() {
        assert_eq!(
            compare_languages(("csharp", "c#1"), ("fsharp", "f#9")),
            Ordering::Less
        );
    }

    fn label() -> impl Strategy<Value = String> {
        (0u32..40, proptest::option::of(0u32..10), proptest::option::of(0u32..10)).prop_map(
            |(base, fraction, suite)| {
                let mut label = format!("c#{base}");
                if let Some(fraction) = fraction {
                    label.push_str(&format!(".{fraction}"));
                }
                if let Some(suite) = suite {
                    label.push_str(&format!("-{suite}"));
                }
                label
            },
        )
    }

    proptest! {
        #[test]
        fn prop_ordering_is_transitive(a in label(), b in label(), c in label()) {
            let ab = compare_language_versions(&a, &b);
            let bc = compare_language_versions(&b, &c);
            if ab != Ordering::Greater && bc != Ordering::Greater {
                prop_assert_ne!(compare_language_versions(&a, &c), Ordering::Greater);
            }
        }

        #[test]
        fn prop_ordering_is_antisymmetric(a in label(), b in label()) {
            prop_assert_eq!(
                compare_language_versions(&a, &b),
                compare_language_versions(&b, &a).reverse()
            );
        }
    }
}
