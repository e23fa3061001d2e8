//! Builds one regex alternation from package descriptions so a CPE match
//! feed can be searched for every package version at once.
//!
//! Packages are normalized into canonical records whose versions carry
//! quasi-CPEs, each quasi-CPE is translated into a regex fragment, and the
//! fragments are joined with `|`.
pub mod aggregate;
pub mod config;
pub mod error;
pub mod feed;
pub mod normalize;
pub mod package;
pub mod quasi_cpe;
pub mod util;

pub use aggregate::{Aggregator, Payload, PayloadSource};
pub use error::{NormalizeError, PatternError, TranslateError};
pub use normalize::{CanonicalPackage, CanonicalVersion, Normalizer};
pub use quasi_cpe::{QuasiCpe, RegexTranslator, Translator};
