//! Class update policy
//!
//! Decides what happens when a compiled class meets the repository: add
//! it, replace the stored definition, or leave the repository alone and
//! say why. The decision looks at the `Version` and `Experimental`
//! qualifiers of both definitions.

use std::cmp::Ordering;
use std::fmt;

use cim::{CimName, Class};

use crate::messages::MessageCode;
use crate::options::CompilerOptions;

pub const VERSION_QUALIFIER: &str = "Version";
pub const EXPERIMENTAL_QUALIFIER: &str = "Experimental";

/// A schema version `m.n.u`
///
/// Missing components match any value; an empty string is a version with
/// no components at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Version {
    pub major: Option<u32>,
    pub minor: Option<u32>,
    pub update: Option<u32>,
}

impl Version {
    /// Parse `m`, `m.n` or `m.n.u`; `None` on any other format
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Some(Self::default());
        }
        let mut parts = [None; 3];
        for (i, part) in text.split('.').enumerate() {
            if i >= parts.len() || part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            parts[i] = Some(part.parse().ok()?);
        }
        Some(Self {
            major: parts[0],
            minor: parts[1],
            update: parts[2],
        })
    }

    pub fn is_empty(&self) -> bool {
        self.major.is_none()
    }

    /// Same version, treating missing components as wildcards
    pub fn matches(&self, other: &Version) -> bool {
        fn component(a: Option<u32>, b: Option<u32>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
        }
        !self.is_empty()
            && !other.is_empty()
            && component(self.major, other.major)
            && component(self.minor, other.minor)
            && component(self.update, other.update)
    }

    /// Ordering of fully comparable components; missing ones compare equal
    pub fn compare(&self, other: &Version) -> Ordering {
        for (a, b) in [
            (self.major, other.major),
            (self.minor, other.minor),
            (self.update, other.update),
        ] {
            if let (Some(a), Some(b)) = (a, b) {
                match a.cmp(&b) {
                    Ordering::Equal => {}
                    unequal => return unequal,
                }
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [self.major, self.minor, self.update]
            .iter()
            .flatten()
            .map(u32::to_string)
            .collect();
        f.write_str(&parts.join("."))
    }
}

/// Outcome of comparing a compiled class with the repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDecision {
    /// Class is new to the repository
    Create,
    /// Replace the stored definition
    Modify,
    /// Leave the repository alone
    Reject(MessageCode),
}

impl UpdateDecision {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Reject(_))
    }
}

/// `Version` and `Experimental` markings of a class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Markings {
    version: Version,
    experimental: bool,
}

impl Markings {
    fn of(class: &Class) -> cim::Result<Option<Self>> {
        let experimental = class.bool_qualifier(EXPERIMENTAL_QUALIFIER)?.unwrap_or(false);
        let version = match class.find_qualifier(&CimName::new(VERSION_QUALIFIER)?)? {
            Some(index) => class
                .get_qualifier(index)?
                .value()?
                .as_str()
                .map(str::to_string)
                .unwrap_or_default(),
            None => String::new(),
        };
        Ok(Version::parse(&version).map(|version| Self {
            version,
            experimental,
        }))
    }
}

/// Decide how `incoming` is applied given the repository copy `existing`
pub fn decide(
    incoming: &Class,
    existing: Option<&Class>,
    options: &CompilerOptions,
) -> cim::Result<UpdateDecision> {
    let Some(new) = Markings::of(incoming)? else {
        return Ok(UpdateDecision::Reject(MessageCode::InvalidVersionFormat));
    };

    let Some(existing) = existing else {
        if new.experimental && !options.allow_experimental {
            return Ok(UpdateDecision::Reject(MessageCode::NoExperimentalUpdate));
        }
        return Ok(UpdateDecision::Create);
    };

    let Some(old) = Markings::of(existing)? else {
        return Ok(UpdateDecision::Reject(MessageCode::InvalidVersionFormat));
    };

    if !options.update_class {
        return Ok(UpdateDecision::Reject(MessageCode::NoClassUpdate));
    }
    if new.experimental != old.experimental && !options.allow_experimental {
        return Ok(UpdateDecision::Reject(MessageCode::NoExperimentalUpdate));
    }
    if old.version.is_empty() {
        return Ok(UpdateDecision::Modify);
    }
    if new.version.matches(&old.version) {
        return Ok(UpdateDecision::Reject(MessageCode::SameVersion));
    }
    if options.allow_version {
        return Ok(UpdateDecision::Modify);
    }
    Ok(UpdateDecision::Reject(MessageCode::NoVersionUpdate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cim::{Flavor, Qualifier};

    fn class(version: Option<&str>, experimental: bool) -> Class {
        let class = Class::new(CimName::new("X").unwrap(), None);
        if let Some(v) = version {
            class
                .add_qualifier(Qualifier::new(CimName::new("Version").unwrap(), v, Flavor::DEFAULTS))
                .unwrap();
        }
        if experimental {
            class
                .add_qualifier(Qualifier::new(
                    CimName::new("Experimental").unwrap(),
                    true,
                    Flavor::DEFAULTS,
                ))
                .unwrap();
        }
        class
    }

    fn updating() -> CompilerOptions {
        CompilerOptions::default().with_update_class(true)
    }

    #[test]
    fn test_version_parse() {
        assert_eq!(
            Version::parse("2.7.0"),
            Some(Version {
                major: Some(2),
                minor: Some(7),
                update: Some(0)
            })
        );
        assert_eq!(Version::parse("3").unwrap().minor, None);
        assert!(Version::parse("").unwrap().is_empty());
        assert_eq!(Version::parse("2.x"), None);
        assert_eq!(Version::parse("1.2.3.4"), None);
        assert_eq!(Version::parse("1..2"), None);
        assert_eq!(Version::parse("2.7.0").unwrap().to_string(), "2.7.0");
    }

    #[test]
    fn test_version_compare() {
        let a = Version::parse("2.7.0").unwrap();
        let b = Version::parse("2.8").unwrap();
        assert_eq!(a.compare(&b), Ordering::Less);
        assert!(a.matches(&Version::parse("2.7").unwrap()));
        assert!(!a.matches(&b));
    }

    #[test]
    fn test_new_class() {
        let d = decide(&class(Some("1.0.0"), false), None, &CompilerOptions::default()).unwrap();
        assert_eq!(d, UpdateDecision::Create);

        let d = decide(&class(None, true), None, &CompilerOptions::default()).unwrap();
        assert_eq!(d, UpdateDecision::Reject(MessageCode::NoExperimentalUpdate));

        let opts = CompilerOptions::default().with_allow_experimental(true);
        assert_eq!(decide(&class(None, true), None, &opts).unwrap(), UpdateDecision::Create);
    }

    #[test]
    fn test_update_needs_flag() {
        let repo = class(Some("2.7.0"), false);
        let d = decide(&class(Some("2.8.0"), false), Some(&repo), &CompilerOptions::default()).unwrap();
        assert_eq!(d, UpdateDecision::Reject(MessageCode::NoClassUpdate));
    }

    #[test]
    fn test_version_scenario() {
        let repo = class(Some("2.7.0"), false);

        let d = decide(&class(Some("2.7.0"), false), Some(&repo), &updating()).unwrap();
        assert_eq!(d, UpdateDecision::Reject(MessageCode::SameVersion));

        let d = decide(&class(Some("2.8.0"), false), Some(&repo), &updating()).unwrap();
        assert_eq!(d, UpdateDecision::Reject(MessageCode::NoVersionUpdate));

        let opts = updating().with_allow_version(true);
        let d = decide(&class(Some("2.8.0"), false), Some(&repo), &opts).unwrap();
        assert_eq!(d, UpdateDecision::Modify);

        let d = decide(&class(Some("2.7.0"), false), Some(&repo), &opts).unwrap();
        assert_eq!(d, UpdateDecision::Reject(MessageCode::SameVersion));
    }

    #[test]
    fn test_unversioned_repository_class_is_replaced() {
        let repo = class(None, false);
        let d = decide(&class(Some("1.0.0"), false), Some(&repo), &updating()).unwrap();
        assert_eq!(d, UpdateDecision::Modify);
    }

    #[test]
    fn test_experimental_change() {
        let repo = class(Some("1.0.0"), false);
        let d = decide(&class(Some("1.1.0"), true), Some(&repo), &updating()).unwrap();
        assert_eq!(d, UpdateDecision::Reject(MessageCode::NoExperimentalUpdate));

        let repo = class(Some("1.0.0"), true);
        let d = decide(&class(Some("1.1.0"), false), Some(&repo), &updating()).unwrap();
        assert_eq!(d, UpdateDecision::Reject(MessageCode::NoExperimentalUpdate));

        let opts = updating().with_allow_experimental(true).with_allow_version(true);
        let d = decide(&class(Some("1.1.0"), false), Some(&repo), &opts).unwrap();
        assert_eq!(d, UpdateDecision::Modify);
    }

    #[test]
    fn test_invalid_version() {
        let d = decide(&class(Some("two"), false), None, &CompilerOptions::default()).unwrap();
        assert_eq!(d, UpdateDecision::Reject(MessageCode::InvalidVersionFormat));
    }
}
