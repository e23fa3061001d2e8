//! Pattern builder configuration.
//!
//! The config is a small JSON document; every field has a default so a missing
//! file behaves like `config_stub()`.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_TARGET_SW: &str = "linux";
const CONFIG_DIR_NAME: &str = "cpe-pattern";
const CONFIG_FILE_NAME: &str = "config.json";

/// Vendor and product a package name maps to in CPE dictionaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorAlias {
    pub vendor: String,
    pub product: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub schema_version: u32,
    /// `target_sw` component written into generated quasi-CPEs.
    #[serde(default = "default_target_sw")]
    pub target_sw: String,
    /// Package names whose CPE vendor/product differ from the package name.
    #[serde(default = "default_vendor_aliases")]
    pub vendor_aliases: BTreeMap<String, VendorAlias>,
    /// CPE match feed searched by `cpat query` when `--feed` is omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_path: Option<PathBuf>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            target_sw: default_target_sw(),
            vendor_aliases: default_vendor_aliases(),
            feed_path: None,
        }
    }
}

fn default_target_sw() -> String {
    DEFAULT_TARGET_SW.to_string()
}

fn default_vendor_aliases() -> BTreeMap<String, VendorAlias> {
    let mut aliases = BTreeMap::new();
    aliases.insert(
        "google-chrome".to_string(),
        VendorAlias {
            vendor: "google".to_string(),
            product: "chrome".to_string(),
        },
    );
    aliases
}

/// Render a pretty JSON config stub with all defaults filled in.
pub fn config_stub() -> String {
    serde_json::to_string_pretty(&PatternConfig::default()).expect("serialize config stub")
}

/// Location of the per-user config file, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

pub fn load_config(path: &Path) -> Result<PatternConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: PatternConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Load an explicit config, else the per-user config when present, else defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<PatternConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match default_config_path() {
        Some(path) if path.is_file() => {
            tracing::debug!(path = %path.display(), "loading user config");
            load_config(&path)
        }
        _ => Ok(PatternConfig::default()),
    }
}

pub fn validate_config(config: &PatternConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    let target_sw = config.target_sw.trim();
    if target_sw.is_empty() {
        return Err(anyhow!("target_sw must be non-empty"));
    }
    if target_sw.contains(':') {
        return Err(anyhow!("target_sw must not contain ':' (got {target_sw:?})"));
    }
    for (name, alias) in &config.vendor_aliases {
        if name.trim().is_empty() {
            return Err(anyhow!("vendor_aliases keys must be non-empty"));
        }
        if alias.vendor.trim().is_empty() || alias.product.trim().is_empty() {
            return Err(anyhow!(
                "vendor alias for {name:?} needs non-empty vendor and product"
            ));
        }
    }
    Ok(())
}
