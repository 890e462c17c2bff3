//! Version token parsing and increment.
//!
//! Tokens have the shape `V<major>` or `V<major>.<minor>`. The manifest's
//! first line is the sole source of truth for the prior version; there is
//! no separate version file.

const PRELUDE_PREFIX: &str = "[DIRCONTXT_LLM_SNAPSHOT_";
const PRELUDE_SUFFIX: &str = "]";

/// A parsed version token: either a bare major, or major.minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: Option<u32>,
}

impl Version {
    pub const V1: Version = Version { major: 1, minor: None };

    /// Parses a token like `V1` or `V1.1`. Unrecognized shapes (missing
    /// `V` prefix, non-numeric parts, extra dots) return `None` — the
    /// caller treats that the same as "no prior version" and falls back
    /// to `V1`.
    pub fn parse(token: &str) -> Option<Version> {
        let rest = token.strip_prefix('V')?;
        match rest.split_once('.') {
            Some((major, minor)) => Some(Version {
                major: major.parse().ok()?,
                minor: Some(minor.parse().ok()?),
            }),
            None => Some(Version { major: rest.parse().ok()?, minor: None }),
        }
    }

    /// Extracts and parses the version token from a manifest's first line,
    /// which must look like `[DIRCONTXT_LLM_SNAPSHOT_<TOKEN>]`. Returns
    /// `None` for any other first line, including an empty manifest.
    pub fn from_manifest_prelude(first_line: &str) -> Option<Version> {
        let inner = first_line.strip_prefix(PRELUDE_PREFIX)?.strip_suffix(PRELUDE_SUFFIX)?;
        Version::parse(inner)
    }

    /// `V<a>.<b>` -> `V<a>.<b+1>`; `V<a>` -> `V<a>.1`.
    pub fn increment(self) -> Version {
        match self.minor {
            Some(minor) => Version { major: self.major, minor: Some(minor + 1) },
            None => Version { major: self.major, minor: Some(1) },
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "V{}.{}", self.major, minor),
            None => write!(f, "V{}", self.major),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_major() {
        assert_eq!(Version::parse("V1"), Some(Version { major: 1, minor: None }));
    }

    #[test]
    fn parses_major_minor() {
        assert_eq!(Version::parse("V2.3"), Some(Version { major: 2, minor: Some(3) }));
    }

    #[test]
    fn rejects_unrecognized_shapes() {
        assert_eq!(Version::parse("1"), None);
        assert_eq!(Version::parse("Vx"), None);
        assert_eq!(Version::parse("V1.2.3"), None);
        assert_eq!(Version::parse(""), None);
    }

    #[test]
    fn increments_bare_major_to_dot_one() {
        assert_eq!(Version::parse("V1").unwrap().increment().to_string(), "V1.1");
    }

    #[test]
    fn increments_minor() {
        assert_eq!(Version::parse("V1.1").unwrap().increment().to_string(), "V1.2");
    }

    #[test]
    fn extracts_token_from_prelude_line() {
        let v = Version::from_manifest_prelude("[DIRCONTXT_LLM_SNAPSHOT_V1.4]").unwrap();
        assert_eq!(v.to_string(), "V1.4");
    }

    #[test]
    fn prelude_extraction_fails_on_unrelated_text() {
        assert!(Version::from_manifest_prelude("not a prelude line").is_none());
        assert!(Version::from_manifest_prelude("[DIRCONTXT_LLM_DIFF_V1]").is_none());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for s in ["V1", "V1.1", "V42.7"] {
            assert_eq!(Version::parse(s).unwrap().to_string(), s);
        }
    }
}
