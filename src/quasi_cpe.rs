//! Quasi-CPE grammar and its translation into regex fragments.
//!
//! A quasi-CPE is a CPE 2.3 formatted string (or a CPE 2.2 URI) whose
//! components may hold `*`/`?` globs. Translation yields a fragment that
//! matches the `cpe23Uri` values of a CPE match feed from the vendor component
//! onwards. Fragments never contain a top-level `|`, so any number of them can
//! be joined into one alternation.
use crate::error::TranslateError;
use std::fmt;

const CPE23_PREFIX: &str = "cpe:2.3:";
const CPE22_PREFIX: &str = "cpe:/";
const CPE23_COMPONENTS: usize = 11;
const CPE22_MAX_COMPONENTS: usize = 7;

const ANY: &str = "*";
const ANY_VALUE: &str = "[^:]+";
const ANY_UPDATE: &str = r"[\*\-]";
const ANY_OTHER: &str = "[^:]";

/// Turns one quasi-CPE into a regex fragment.
pub trait Translator: Send + Sync {
    fn translate(&self, quasi_cpe: &str) -> Result<String, TranslateError>;
}

/// Translator targeting the `regex` crate syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexTranslator;

impl Translator for RegexTranslator {
    fn translate(&self, quasi_cpe: &str) -> Result<String, TranslateError> {
        Ok(QuasiCpe::parse(quasi_cpe)?.to_regex())
    }
}

/// Parsed quasi-CPE. Components keep their CPE escapes (`\:`, `\*`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuasiCpe {
    pub part: String,
    pub vendor: String,
    pub product: String,
    pub version: String,
    pub update: String,
    pub edition: String,
    pub language: String,
    pub sw_edition: String,
    pub target_sw: String,
    pub target_hw: String,
    pub other: String,
}

impl QuasiCpe {
    /// Application quasi-CPE with every unnamed component left as `*`.
    ///
    /// Arguments are raw values; they are escaped so that `:`, `\`, `*` and
    /// `?` are taken literally.
    pub fn application(
        vendor: Option<&str>,
        product: &str,
        version: &str,
        update: Option<&str>,
        target_sw: &str,
    ) -> Self {
        let escaped_or_any = |value: Option<&str>| value.map(escape_component).unwrap_or_else(any);
        Self {
            part: "a".to_string(),
            vendor: escaped_or_any(vendor),
            product: escape_component(product),
            version: escape_component(version),
            update: escaped_or_any(update),
            edition: any(),
            language: any(),
            sw_edition: any(),
            target_sw: escape_component(target_sw),
            target_hw: any(),
            other: any(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, TranslateError> {
        let trimmed = raw.trim();
        let components = if let Some(rest) = trimmed.strip_prefix(CPE23_PREFIX) {
            let components = split_components(rest);
            if components.len() != CPE23_COMPONENTS {
                return Err(TranslateError::new(
                    raw,
                    format!(
                        "expected {} components after {CPE23_PREFIX}, found {}",
                        CPE23_COMPONENTS,
                        components.len()
                    ),
                ));
            }
            if let Some(index) = components.iter().position(|c| c.is_empty()) {
                return Err(TranslateError::new(
                    raw,
                    format!("component {} is empty", index + 1),
                ));
            }
            components
        } else if let Some(rest) = trimmed.strip_prefix(CPE22_PREFIX) {
            let mut components = split_components(rest);
            if components.len() > CPE22_MAX_COMPONENTS {
                return Err(TranslateError::new(
                    raw,
                    format!(
                        "CPE 2.2 URI has at most {} components, found {}",
                        CPE22_MAX_COMPONENTS,
                        components.len()
                    ),
                ));
            }
            components.resize(CPE23_COMPONENTS, String::new());
            components
                .into_iter()
                .map(|c| if c.is_empty() { any() } else { c })
                .collect()
        } else {
            return Err(TranslateError::new(
                raw,
                format!("missing {CPE23_PREFIX} or {CPE22_PREFIX} prefix"),
            ));
        };

        let components: [String; CPE23_COMPONENTS] = components
            .try_into()
            .map_err(|_| TranslateError::new(raw, "wrong component count"))?;
        let [part, vendor, product, version, update, edition, language, sw_edition, target_sw, target_hw, other] =
            components;
        if !matches!(part.as_str(), "a" | "o" | "h" | ANY) {
            return Err(TranslateError::new(
                raw,
                format!("part must be one of a, o, h or * (got {part:?})"),
            ));
        }
        if let Some(dangling) = [
            &vendor,
            &product,
            &version,
            &update,
            &edition,
            &language,
            &sw_edition,
            &target_sw,
            &target_hw,
            &other,
        ]
        .into_iter()
        .find(|c| has_dangling_escape(c))
        {
            return Err(TranslateError::new(
                raw,
                format!("dangling escape in component {dangling:?}"),
            ));
        }
        Ok(Self {
            part,
            vendor,
            product,
            version,
            update,
            edition,
            language,
            sw_edition,
            target_sw,
            target_hw,
            other,
        })
    }

    /// Regex fragment matching this quasi-CPE from the vendor component on.
    pub fn to_regex(&self) -> String {
        let vendor = if self.vendor == ANY {
            String::new()
        } else {
            literal_regex(&self.vendor)
        };
        let fields = [
            vendor,
            value_regex(&self.product),
            value_regex(&self.version),
            alternative_or(&self.update, ANY_UPDATE),
            value_regex(&self.edition),
            value_regex(&self.language),
            value_regex(&self.sw_edition),
            alternative_or(&self.target_sw, ANY_VALUE),
            value_regex(&self.target_hw),
            if self.other == ANY {
                ANY_OTHER.to_string()
            } else {
                literal_regex(&self.other)
            },
        ];
        fields.join(":")
    }
}

impl fmt::Display for QuasiCpe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{CPE23_PREFIX}{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}",
            self.part,
            self.vendor,
            self.product,
            self.version,
            self.update,
            self.edition,
            self.language,
            self.sw_edition,
            self.target_sw,
            self.target_hw,
            self.other
        )
    }
}

fn any() -> String {
    ANY.to_string()
}

/// Escape characters that carry meaning inside a quasi-CPE component.
pub fn escape_component(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | ':' | '*' | '?') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Split on `:` that is not preceded by a backslash escape.
fn split_components(raw: &str) -> Vec<String> {
    let mut components = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                current.push(ch);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ':' => components.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    components.push(current);
    components
}

fn has_dangling_escape(component: &str) -> bool {
    let mut chars = component.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.next().is_none() {
            return true;
        }
    }
    false
}

fn value_regex(component: &str) -> String {
    if component == ANY {
        ANY_VALUE.to_string()
    } else {
        literal_regex(component)
    }
}

fn alternative_or(component: &str, wildcard: &str) -> String {
    if component == ANY {
        wildcard.to_string()
    } else {
        format!(r"({}|\*)", literal_regex(component))
    }
}

/// Regex for a component value: globs expand within the component, escaped
/// characters match as written in the formatted string.
fn literal_regex(component: &str) -> String {
    let mut out = String::new();
    let mut run = String::new();
    let mut chars = component.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                run.push('\\');
                if let Some(next) = chars.next() {
                    run.push(next);
                }
            }
            '*' | '?' => {
                out.push_str(&regex::escape(&std::mem::take(&mut run)));
                out.push_str(if ch == '*' { "[^:]*" } else { "[^:]" });
            }
            _ => run.push(ch),
        }
    }
    out.push_str(&regex::escape(&run));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAIL: &str = r"[^:]+:[^:]+:[^:]+:(linux|\*):[^:]+:[^:]";

    fn translate(raw: &str) -> String {
        RegexTranslator.translate(raw).expect("translate")
    }

    #[test]
    fn translates_application_without_vendor() {
        assert_eq!(
            translate("cpe:2.3:a:*:busybox:1.31.0:*:*:*:*:linux:*:*"),
            format!(r":busybox:1\.31\.0:[\*\-]:{TAIL}")
        );
    }

    #[test]
    fn translates_named_update_and_vendor() {
        assert_eq!(
            translate("cpe:2.3:a:*:openssh:8.4:p1:*:*:*:linux:*:*"),
            format!(r":openssh:8\.4:(p1|\*):{TAIL}")
        );
        assert_eq!(
            translate("cpe:2.3:a:google:chrome:97.0.4692.71:*:*:*:*:linux:*:*"),
            format!(r"google:chrome:97\.0\.4692\.71:[\*\-]:{TAIL}")
        );
    }

    #[test]
    fn escapes_regex_metacharacters() {
        assert_eq!(
            translate("cpe:2.3:a:*:nicotine+:1.4.1:*:*:*:*:linux:*:*"),
            format!(r":nicotine\+:1\.4\.1:[\*\-]:{TAIL}")
        );
    }

    #[test]
    fn expands_globs_inside_components() {
        assert_eq!(
            translate("cpe:/a:vendor:prod:1.*"),
            r"vendor:prod:1\.[^:]*:[\*\-]:[^:]+:[^:]+:[^:]+:[^:]+:[^:]+:[^:]"
        );
        assert_eq!(
            translate("cpe:2.3:a:*:prod:2.?:*:*:*:*:*:*:*"),
            r":prod:2\.[^:]:[\*\-]:[^:]+:[^:]+:[^:]+:[^:]+:[^:]+:[^:]"
        );
    }

    #[test]
    fn escaped_colon_stays_inside_component() {
        let cpe = QuasiCpe::parse(r"cpe:2.3:a:*:we\:ird:1:*:*:*:*:*:*:*").expect("parse");
        assert_eq!(cpe.product, r"we\:ird");
        assert!(cpe.to_regex().starts_with(r":we\\:ird:1:"));
    }

    #[test]
    fn fragments_are_valid_and_match_feed_uris() {
        let fragment = translate("cpe:2.3:a:*:libxml2:2.9.10:*:*:*:*:linux:*:*");
        let re = regex::Regex::new(&fragment).expect("valid regex");
        assert!(re.is_match("cpe:2.3:a:xmlsoft:libxml2:2.9.10:*:*:*:*:*:*:*"));
        assert!(re.is_match("cpe:2.3:a:xmlsoft:libxml2:2.9.10:-:*:*:*:*:*:*"));
        assert!(!re.is_match("cpe:2.3:a:xmlsoft:libxml2:2.9.1:*:*:*:*:*:*:*"));
        assert!(!re.is_match("cpe:2.3:a:xmlsoft:libxml2:2.9.10:*:*:*:*:windows:*:*"));
    }

    #[test]
    fn application_round_trips_through_display() {
        let cpe = QuasiCpe::application(None, "nicotine+", "1.4.1", Some("p1"), "linux");
        let text = cpe.to_string();
        assert_eq!(text, "cpe:2.3:a:*:nicotine+:1.4.1:p1:*:*:*:linux:*:*");
        assert_eq!(QuasiCpe::parse(&text).expect("parse"), cpe);
    }

    #[test]
    fn rejects_malformed_quasi_cpes() {
        for raw in [
            "busybox-1.31.0",
            "cpe:2.3:a:*:busybox:1.31.0",
            "cpe:2.3:x:*:busybox:1.31.0:*:*:*:*:linux:*:*",
            "cpe:2.3:a::busybox:1.31.0:*:*:*:*:linux:*:*",
            "cpe:/a:1:2:3:4:5:6:7",
            r"cpe:2.3:a:*:busybox:1.31.0:*:*:*:*:linux:*:x\",
        ] {
            let err = RegexTranslator.translate(raw).expect_err(raw);
            assert_eq!(err.quasi_cpe, raw);
        }
    }
}
