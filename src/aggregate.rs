//! Pattern aggregation: package descriptions in, one regex alternation out.
//!
//! The payload shape is resolved once at the boundary (`PayloadSource` to
//! `Payload`); traversal then only deals with a list of package records.
//! Fragments are emitted in package order, then version order, and the first
//! collaborator failure aborts the whole run.
use crate::error::PatternError;
use crate::normalize::Normalizer;
use crate::quasi_cpe::Translator;
use crate::util::value_kind;
use serde_json::{Map, Value};

/// Separator between fragments of the resulting alternation.
pub const ALTERNATION_SEPARATOR: &str = "|";

/// Payload as handed to `Aggregator::run`.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadSource {
    /// In-memory list of package descriptions.
    Sequence(Vec<Value>),
    /// In-memory single package description.
    Record(Map<String, Value>),
    /// Serialized JSON holding either of the above.
    Text(String),
}

/// Payload after shape resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Sequence(Vec<Value>),
    Single(Value),
}

impl Payload {
    /// Classify a generic JSON value by shape.
    pub fn from_value(value: Value) -> Result<Self, PatternError> {
        match value {
            Value::Array(packages) => Ok(Payload::Sequence(packages)),
            record @ Value::Object(_) => Ok(Payload::Single(record)),
            other => Err(PatternError::InvalidPayloadShape {
                kind: value_kind(&other),
            }),
        }
    }

    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Package descriptions in input order.
    pub fn packages(&self) -> &[Value] {
        match self {
            Payload::Sequence(packages) => packages,
            Payload::Single(package) => std::slice::from_ref(package),
        }
    }

    pub fn package_count(&self) -> usize {
        self.packages().len()
    }
}

impl TryFrom<PayloadSource> for Payload {
    type Error = PatternError;

    fn try_from(source: PayloadSource) -> Result<Self, Self::Error> {
        match source {
            PayloadSource::Sequence(packages) => Ok(Payload::Sequence(packages)),
            PayloadSource::Record(record) => Ok(Payload::Single(Value::Object(record))),
            PayloadSource::Text(text) => Payload::parse(&text),
        }
    }
}

/// Builds one alternation from any number of packages.
///
/// Stateless apart from its two collaborators; every call owns its own
/// intermediate buffers. Both collaborator traits require `Send + Sync`, so
/// one aggregator can be shared by reference across threads.
#[derive(Clone, Copy)]
pub struct Aggregator<'a> {
    normalizer: &'a dyn Normalizer,
    translator: &'a dyn Translator,
}

impl<'a> Aggregator<'a> {
    pub fn new(normalizer: &'a dyn Normalizer, translator: &'a dyn Translator) -> Self {
        Self {
            normalizer,
            translator,
        }
    }

    /// Run over any payload form.
    pub fn run(&self, source: PayloadSource) -> Result<String, PatternError> {
        let payload = Payload::try_from(source)?;
        self.run_payload(&payload)
    }

    /// Run over an in-memory list of packages; any other shape is rejected,
    /// including a bare package record.
    pub fn run_sequence(&self, packages: &Value) -> Result<String, PatternError> {
        match packages {
            Value::Array(packages) => Ok(join_fragments(&self.handle_list(packages)?)),
            other => Err(PatternError::InvalidPayloadShape {
                kind: value_kind(other),
            }),
        }
    }

    /// Run over serialized JSON holding a list of packages or a single one.
    pub fn run_text(&self, text: &str) -> Result<String, PatternError> {
        let payload = Payload::parse(text)?;
        self.run_payload(&payload)
    }

    pub fn run_payload(&self, payload: &Payload) -> Result<String, PatternError> {
        tracing::debug!(packages = payload.package_count(), "building pattern");
        let fragments = match payload {
            Payload::Sequence(packages) => self.handle_list(packages)?,
            Payload::Single(package) => self.handle_dict(package)?,
        };
        tracing::info!(fragments = fragments.len(), "built pattern");
        Ok(join_fragments(&fragments))
    }

    /// Fragments of every package, flattened in input order.
    pub fn fragments(&self, payload: &Payload) -> Result<Vec<String>, PatternError> {
        match payload {
            Payload::Sequence(packages) => self.handle_list(packages),
            Payload::Single(package) => self.handle_dict(package),
        }
    }

    fn handle_list(&self, packages: &[Value]) -> Result<Vec<String>, PatternError> {
        let mut fragments = Vec::new();
        for package in packages {
            fragments.extend(self.handle_dict(package)?);
        }
        Ok(fragments)
    }

    fn handle_dict(&self, package: &Value) -> Result<Vec<String>, PatternError> {
        let canonical = self.normalizer.normalize(package)?;
        let mut fragments = Vec::new();
        for version in &canonical.versions {
            let Some(quasi_cpe) = version.quasi_cpe.as_deref() else {
                continue;
            };
            let fragment = self.translator.translate(quasi_cpe)?;
            tracing::debug!(quasi_cpe, fragment = %fragment, "translated quasi-CPE");
            fragments.push(fragment);
        }
        Ok(fragments)
    }
}

/// Join fragments into one alternation; no fragments yields an empty string.
pub fn join_fragments(fragments: &[String]) -> String {
    fragments.join(ALTERNATION_SEPARATOR)
}
