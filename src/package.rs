//! Typed package descriptions accepted by the pattern builder.
//!
//! The aggregator itself works on raw JSON so that loosely shaped input can be
//! accepted; these types are the well-formed subset used by the CLI when it
//! builds packages from `name-version` atoms.
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    pub versions: Vec<Version>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub version: String,
}

impl Package {
    pub fn new(name: impl Into<String>, versions: Vec<Version>) -> Self {
        Self {
            name: name.into(),
            vendor: None,
            versions,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("serialize package")
    }
}

impl Version {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

fn atom_regex() -> &'static Regex {
    static ATOM: OnceLock<Regex> = OnceLock::new();
    ATOM.get_or_init(|| Regex::new(r"^(.+)-([0-9]+.*)$").expect("regex for package atoms"))
}

/// Split a `name-version` atom such as `rust-bin-1.58.1`.
///
/// The name is matched greedily, so the version starts at the last `-` that is
/// followed by a digit.
pub fn parse_atom(raw: &str) -> Option<Package> {
    let caps = atom_regex().captures(raw.trim())?;
    let name = caps.get(1)?.as_str();
    let version = caps.get(2)?.as_str();
    Some(Package::new(name, vec![Version::new(version)]))
}

/// Merge atoms of the same package into one description, keeping first-seen
/// order of both packages and versions.
pub fn group_atoms(packages: Vec<Package>) -> Vec<Package> {
    let mut grouped: Vec<Package> = Vec::new();
    for package in packages {
        match grouped.iter_mut().find(|existing| existing.name == package.name) {
            Some(existing) => existing.versions.extend(package.versions),
            None => grouped.push(package),
        }
    }
    grouped
}
