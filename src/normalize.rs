//! Package normalization: package descriptions to canonical records whose
//! versions carry quasi-CPEs.
use crate::config::{PatternConfig, VendorAlias, DEFAULT_TARGET_SW};
use crate::error::NormalizeError;
use crate::quasi_cpe::QuasiCpe;
use crate::util::value_kind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Turns one package description into a canonical record.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, package: &Value) -> Result<CanonicalPackage, NormalizeError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalPackage {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub versions: Vec<CanonicalVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalVersion {
    #[serde(default)]
    pub version: String,
    /// Absent for versions with no CPE counterpart (live ebuilds, empty).
    #[serde(default)]
    pub quasi_cpe: Option<String>,
}

/// Accepts descriptions that are already canonical and returns them as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughNormalizer;

impl Normalizer for PassthroughNormalizer {
    fn normalize(&self, package: &Value) -> Result<CanonicalPackage, NormalizeError> {
        if !package.is_object() {
            return Err(NormalizeError::new(
                None,
                format!("expected a package record, got {}", value_kind(package)),
            ));
        }
        let name = package.get("name").and_then(Value::as_str);
        serde_json::from_value(package.clone())
            .map_err(|err| NormalizeError::new(name, format!("not a canonical record: {err}")))
    }
}

/// Normalizer for Portage-style package names and versions
/// (`dev-libs/libxml2`, `2.9.10-r5`, `8.4_p1`, `9999`).
#[derive(Debug, Clone)]
pub struct PortageNormalizer {
    target_sw: String,
    vendor_aliases: BTreeMap<String, VendorAlias>,
}

impl Default for PortageNormalizer {
    fn default() -> Self {
        Self::new(&PatternConfig::default())
    }
}

impl PortageNormalizer {
    /// Blank `target_sw` and blank aliases are ignored so every generated
    /// quasi-CPE has non-empty components, even from an unvalidated config.
    pub fn new(config: &PatternConfig) -> Self {
        let target_sw = match config.target_sw.trim() {
            "" => DEFAULT_TARGET_SW,
            target_sw => target_sw,
        };
        let vendor_aliases = config
            .vendor_aliases
            .iter()
            .filter(|(_, alias)| {
                !alias.vendor.trim().is_empty() && !alias.product.trim().is_empty()
            })
            .map(|(name, alias)| (name.clone(), alias.clone()))
            .collect();
        Self {
            target_sw: target_sw.to_string(),
            vendor_aliases,
        }
    }

    fn vendor_and_product(
        &self,
        name: &str,
        vendor: Option<String>,
    ) -> (Option<String>, String) {
        if vendor.is_some() {
            return (vendor, name.to_string());
        }
        match self.vendor_aliases.get(name) {
            Some(alias) => (Some(alias.vendor.clone()), alias.product.clone()),
            None => (None, name.to_string()),
        }
    }

    fn canonical_version(
        &self,
        vendor: Option<&str>,
        product: &str,
        raw: &str,
    ) -> CanonicalVersion {
        let quasi_cpe = split_version(raw).map(|(version, update)| {
            QuasiCpe::application(vendor, product, version, update, &self.target_sw).to_string()
        });
        if quasi_cpe.is_none() {
            tracing::debug!(package = product, version = raw, "version has no quasi-CPE");
        }
        CanonicalVersion {
            version: raw.to_string(),
            quasi_cpe,
        }
    }
}

impl Normalizer for PortageNormalizer {
    fn normalize(&self, package: &Value) -> Result<CanonicalPackage, NormalizeError> {
        let record = package.as_object().ok_or_else(|| {
            NormalizeError::new(
                None,
                format!("expected a package record, got {}", value_kind(package)),
            )
        })?;
        let full_name = record
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| NormalizeError::new(None, "missing string field \"name\""))?;
        let name = strip_category(full_name);
        if name.is_empty() {
            return Err(NormalizeError::new(None, "empty package name"));
        }
        let vendor = optional_string(record, "vendor")
            .map_err(|reason| NormalizeError::new(Some(name), reason))?;
        let (vendor, product) = self.vendor_and_product(name, vendor);
        let raw_versions =
            raw_versions(record).map_err(|reason| NormalizeError::new(Some(name), reason))?;

        let versions = raw_versions
            .into_iter()
            .map(|raw| self.canonical_version(vendor.as_deref(), &product, raw))
            .collect();
        Ok(CanonicalPackage {
            name: name.to_string(),
            vendor,
            product,
            versions,
        })
    }
}

fn strip_category(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn optional_string(record: &Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) if value.trim().is_empty() => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.trim().to_string())),
        Some(other) => Err(format!(
            "field {key:?} must be a string, got {}",
            value_kind(other)
        )),
    }
}

/// Version strings from `versions` (records or bare strings) or a lone `version`.
fn raw_versions(record: &Map<String, Value>) -> Result<Vec<&str>, String> {
    match record.get("versions") {
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .map(|(index, entry)| match entry {
                Value::String(version) => Ok(version.as_str()),
                Value::Object(fields) => fields
                    .get("version")
                    .and_then(Value::as_str)
                    .ok_or_else(|| format!("versions[{index}] has no string \"version\"")),
                other => Err(format!(
                    "versions[{index}] must be a record or string, got {}",
                    value_kind(other)
                )),
            })
            .collect(),
        Some(Value::Null) | None => match record.get("version") {
            Some(Value::String(version)) => Ok(vec![version.as_str()]),
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(other) => Err(format!(
                "field \"version\" must be a string, got {}",
                value_kind(other)
            )),
        },
        Some(other) => Err(format!(
            "field \"versions\" must be a list, got {}",
            value_kind(other)
        )),
    }
}

/// Split a Portage version into CPE version and update, dropping the
/// `-rN` revision. Returns `None` for versions with no CPE counterpart.
pub(crate) fn split_version(raw: &str) -> Option<(&str, Option<&str>)> {
    let trimmed = raw.trim();
    let base = match trimmed.rsplit_once("-r") {
        Some((base, revision))
            if !revision.is_empty() && revision.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => trimmed,
    };
    if base.is_empty() || is_live_version(base) {
        return None;
    }
    match base.split_once('_') {
        Some((version, _)) if version.is_empty() => None,
        Some((version, update)) if !update.is_empty() => Some((version, Some(update))),
        Some((version, _)) => Some((version, None)),
        None => Some((base, None)),
    }
}

fn is_live_version(version: &str) -> bool {
    version.len() >= 4 && version.bytes().all(|b| b == b'9')
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
