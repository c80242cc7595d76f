//! Semantic-version range constraints
//!
//! Kind modules bind version-specific implementations to range expressions
//! such as `>=0.0.1 <0.0.2`. The syntax:
//!
//! ```text
//! range       := alternative ("||" alternative)*
//! alternative := comparator (" " comparator)*
//! comparator  := op? version        op: = == ! != > >= < <=
//! ```
//!
//! A bare version is an exact match. `x`, `X` or `*` may stand in for the
//! minor or patch component (`1.x`, `>=1.2.x`).

use std::cmp::Ordering;
use std::fmt;

use semver::Version;
use thiserror::Error;

/// Errors raised while parsing a range expression
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("empty version range")]
    Empty,

    #[error("empty alternative in range '{0}'")]
    EmptyAlternative(String),

    #[error("unknown operator in comparator '{0}'")]
    UnknownOperator(String),

    #[error("operator '{0}' is missing a version")]
    MissingVersion(String),

    #[error("wildcard not allowed with '!=' in '{0}'")]
    NegatedWildcard(String),

    #[error("invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },
}

/// Strictly parse a concrete version (`1.2.3`, `1.2.3-rc.1`)
pub fn parse_version(version: &str) -> Result<Version, semver::Error> {
    Version::parse(version)
}

/// Compare by semver precedence, ignoring build metadata
fn precedence(a: &Version, b: &Version) -> Ordering {
    a.major
        .cmp(&b.major)
        .then(a.minor.cmp(&b.minor))
        .then(a.patch.cmp(&b.patch))
        .then_with(|| a.pre.cmp(&b.pre))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Op {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Ge => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Le => ordering != Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Comparator {
    op: Op,
    version: Version,
}

impl Comparator {
    fn matches(&self, version: &Version) -> bool {
        self.op.holds(precedence(version, &self.version))
    }
}

/// A parsed range expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    raw: String,
    /// OR over alternatives, AND within an alternative
    alternatives: Vec<Vec<Comparator>>,
}

impl VersionRange {
    /// Parse a range expression
    pub fn parse(input: &str) -> Result<Self, RangeError> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(RangeError::Empty);
        }

        let mut alternatives = Vec::new();
        for alternative in raw.split("||") {
            let tokens = join_operators(alternative)?;
            if tokens.is_empty() {
                return Err(RangeError::EmptyAlternative(raw.to_string()));
            }

            let mut comparators = Vec::new();
            for token in tokens {
                comparators.extend(parse_comparator(&token)?);
            }
            alternatives.push(comparators);
        }

        Ok(Self {
            raw: raw.to_string(),
            alternatives,
        })
    }

    /// Whether `version` falls inside this range
    pub fn contains(&self, version: &Version) -> bool {
        self.alternatives
            .iter()
            .any(|all| all.iter().all(|c| c.matches(version)))
    }

    /// The constraint text this range was parsed from
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for VersionRange {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split an alternative on whitespace, gluing a lone operator to the
/// version that follows it (`>= 1.0.0` becomes `>=1.0.0`).
fn join_operators(alternative: &str) -> Result<Vec<String>, RangeError> {
    let mut tokens = Vec::new();
    let mut pending: Option<&str> = None;

    for part in alternative.split_whitespace() {
        let is_operator = part.chars().all(|c| matches!(c, '<' | '>' | '=' | '!'));
        match pending.take() {
            Some(op) if is_operator => return Err(RangeError::MissingVersion(op.to_string())),
            Some(op) => tokens.push(format!("{}{}", op, part)),
            None if is_operator => pending = Some(part),
            None => tokens.push(part.to_string()),
        }
    }

    if let Some(op) = pending {
        return Err(RangeError::MissingVersion(op.to_string()));
    }
    Ok(tokens)
}

fn split_operator(token: &str) -> Result<(Op, &str), RangeError> {
    let end = token
        .find(|c: char| !matches!(c, '<' | '>' | '=' | '!'))
        .unwrap_or(token.len());
    let (op, rest) = token.split_at(end);

    let op = match op {
        "" | "=" | "==" => Op::Eq,
        "!" | "!=" => Op::Ne,
        ">" => Op::Gt,
        ">=" => Op::Ge,
        "<" => Op::Lt,
        "<=" => Op::Le,
        _ => return Err(RangeError::UnknownOperator(token.to_string())),
    };
    if rest.is_empty() {
        return Err(RangeError::MissingVersion(token.to_string()));
    }
    Ok((op, rest))
}

fn is_wildcard(part: &str) -> bool {
    matches!(part, "x" | "X" | "*")
}

fn invalid(version: &str, reason: impl fmt::Display) -> RangeError {
    RangeError::InvalidVersion {
        version: version.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_component(version: &str, part: &str) -> Result<u64, RangeError> {
    part.parse::<u64>().map_err(|e| invalid(version, e))
}

/// Turn a comparator token into one or two concrete comparators
fn parse_comparator(token: &str) -> Result<Vec<Comparator>, RangeError> {
    let (op, version_str) = split_operator(token)?;

    let parts: Vec<&str> = version_str.splitn(3, '.').collect();
    let wildcard = parts.len() < 3 || parts[1..].iter().any(|p| is_wildcard(p));
    if !wildcard {
        let version = parse_version(version_str).map_err(|e| invalid(version_str, e))?;
        return Ok(vec![Comparator { op, version }]);
    }

    // Wildcard: resolve to the half-open interval [lower, upper)
    let major = parse_component(version_str, parts[0])?;
    let (lower, upper) = match parts.get(1) {
        None => return Err(invalid(version_str, "expected MAJOR.MINOR.PATCH or a wildcard")),
        Some(minor) if is_wildcard(minor) => {
            if parts.get(2).is_some_and(|p| !is_wildcard(p)) {
                return Err(invalid(version_str, "patch must be a wildcard when minor is"));
            }
            let next = major
                .checked_add(1)
                .ok_or_else(|| invalid(version_str, "major version has no successor"))?;
            (Version::new(major, 0, 0), Version::new(next, 0, 0))
        }
        Some(minor) => {
            let minor = parse_component(version_str, minor)?;
            match parts.get(2) {
                Some(patch) if is_wildcard(patch) => {
                    let next = minor
                        .checked_add(1)
                        .ok_or_else(|| invalid(version_str, "minor version has no successor"))?;
                    (Version::new(major, minor, 0), Version::new(major, next, 0))
                }
                _ => return Err(invalid(version_str, "expected MAJOR.MINOR.PATCH or a wildcard")),
            }
        }
    };
    let bound = |op, version| Comparator { op, version };
    Ok(match op {
        Op::Eq => vec![bound(Op::Ge, lower), bound(Op::Lt, upper)],
        Op::Ge => vec![bound(Op::Ge, lower)],
        Op::Lt => vec![bound(Op::Lt, lower)],
        Op::Gt => vec![bound(Op::Ge, upper)],
        Op::Le => vec![bound(Op::Lt, upper)],
        Op::Ne => return Err(RangeError::NegatedWildcard(token.to_string())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        parse_version(s).unwrap()
    }

    #[test]
    fn test_half_open_range() {
        let range = VersionRange::parse(">=0.0.1 <0.0.2").unwrap();
        assert!(range.contains(&v("0.0.1")));
        assert!(range.contains(&v("0.0.2-rc.1")));
        assert!(!range.contains(&v("0.0.2")));
        assert!(!range.contains(&v("0.0.0")));
        assert_eq!(range.as_str(), ">=0.0.1 <0.0.2");
    }

    #[test]
    fn test_bare_version_is_exact() {
        let range = VersionRange::parse("1.0.0").unwrap();
        assert!(range.contains(&v("1.0.0")));
        assert!(range.contains(&v("1.0.0+build.5")));
        assert!(!range.contains(&v("1.0.1")));
        assert!(!range.contains(&v("1.0.0-alpha")));
    }

    #[test]
    fn test_alternatives() {
        let range = VersionRange::parse("<1.0.0 || >=2.0.0 !=2.1.0").unwrap();
        assert!(range.contains(&v("0.9.0")));
        assert!(!range.contains(&v("1.5.0")));
        assert!(range.contains(&v("2.0.3")));
        assert!(!range.contains(&v("2.1.0")));
    }

    #[test]
    fn test_spaced_operator() {
        let range = VersionRange::parse(">= 1.2.0   < 1.3.0").unwrap();
        assert!(range.contains(&v("1.2.7")));
        assert!(!range.contains(&v("1.3.0")));
    }

    #[test]
    fn test_wildcards() {
        let major = VersionRange::parse("1.x").unwrap();
        assert!(major.contains(&v("1.9.9")));
        assert!(!major.contains(&v("2.0.0")));

        let minor = VersionRange::parse("1.2.*").unwrap();
        assert!(minor.contains(&v("1.2.0")));
        assert!(!minor.contains(&v("1.3.0")));

        let above = VersionRange::parse(">1.x").unwrap();
        assert!(!above.contains(&v("1.4.0")));
        assert!(above.contains(&v("2.0.0")));

        let upto = VersionRange::parse("<=1.2.x").unwrap();
        assert!(upto.contains(&v("1.2.9")));
        assert!(!upto.contains(&v("1.3.0")));
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(VersionRange::parse("   "), Err(RangeError::Empty));
        assert!(matches!(VersionRange::parse("1.0.0 ||"), Err(RangeError::EmptyAlternative(_))));
        assert!(matches!(VersionRange::parse("=>1.0.0"), Err(RangeError::UnknownOperator(_))));
        assert!(matches!(VersionRange::parse(">="), Err(RangeError::MissingVersion(_))));
        assert!(matches!(VersionRange::parse("!=1.x"), Err(RangeError::NegatedWildcard(_))));
        assert!(matches!(VersionRange::parse("not-a-range"), Err(RangeError::InvalidVersion { .. })));
        assert!(matches!(VersionRange::parse("1.0"), Err(RangeError::InvalidVersion { .. })));
        assert!(matches!(
            VersionRange::parse("18446744073709551615.x"),
            Err(RangeError::InvalidVersion { .. })
        ));
        assert!(matches!(
            VersionRange::parse("1.18446744073709551615.x"),
            Err(RangeError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_strict_version_parse() {
        assert!(parse_version("0.0.1").is_ok());
        assert!(parse_version("v0.0.1").is_err());
        assert!(parse_version("not-a-version").is_err());
    }
}
