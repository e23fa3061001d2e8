//! Searching a CPE match feed with a built pattern.
//!
//! The feed is NVD's pretty-printed JSON match feed; it is scanned line by
//! line, so it never has to be fully parsed. Only the CPE value of each
//! `cpe23Uri` line is matched, after JSON string unescaping.
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Key that precedes every CPE value in a feed line.
pub const CPE_KEY_IN_FEED_LINE: &str = "\"cpe23Uri\" : ";

/// Default file name of the uncompressed NVD CPE match feed.
pub const CPE_MATCH_FEED: &str = "nvdcpematch-1.0.json";

pub fn contains_cpe_key(line: &str) -> bool {
    line.contains(CPE_KEY_IN_FEED_LINE)
}

/// A feed given as a directory means the default feed file inside it.
pub fn resolve_feed_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(CPE_MATCH_FEED)
    } else {
        path.to_path_buf()
    }
}

/// Extract the CPE value from a `"cpe23Uri" : "..."` feed line, as written in
/// the JSON text.
pub fn scrape_cpe(line: &str) -> String {
    let value = line
        .rsplit(CPE_KEY_IN_FEED_LINE)
        .next()
        .unwrap_or(line);
    value
        .trim()
        .trim_matches(',')
        .trim_matches('"')
        .to_string()
}

/// CPE value of a feed line with JSON string escapes resolved, so
/// `odd\\:name` in the file reads as the formatted-string `odd\:name`.
/// Values that are not valid JSON string bodies are kept verbatim.
pub fn feed_cpe(line: &str) -> String {
    let scraped = scrape_cpe(line);
    serde_json::from_str::<String>(&format!("\"{scraped}\"")).unwrap_or(scraped)
}

fn compile(pattern: &str) -> Result<Option<Regex>> {
    if pattern.is_empty() {
        return Ok(None);
    }
    let re = Regex::new(pattern).context("compile CPE pattern")?;
    Ok(Some(re))
}

/// Unique, sorted CPEs from feed lines matching `pattern`.
///
/// An empty pattern matches nothing rather than every line.
pub fn search(pattern: &str, feed: &Path) -> Result<BTreeSet<String>> {
    if !feed.is_file() {
        return Err(anyhow!("CPE match feed {} doesn't exist", feed.display()));
    }
    let Some(re) = compile(pattern)? else {
        tracing::warn!("empty pattern; skipping feed search");
        return Ok(BTreeSet::new());
    };
    let file = File::open(feed).with_context(|| format!("open {}", feed.display()))?;
    let mut matches = BTreeSet::new();
    let mut scanned = 0usize;
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("read {}", feed.display()))?;
        scanned += 1;
        if !contains_cpe_key(&line) {
            continue;
        }
        let cpe = feed_cpe(&line);
        if re.is_match(&cpe) {
            matches.insert(cpe);
        }
    }
    tracing::info!(
        feed = %feed.display(),
        lines = scanned,
        matches = matches.len(),
        "searched CPE match feed"
    );
    Ok(matches)
}

/// In-memory variant of `search` over already extracted CPE values.
pub fn match_entries<'a, I>(entries: I, pattern: &str) -> Result<BTreeSet<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let Some(re) = compile(pattern)? else {
        return Ok(BTreeSet::new());
    };
    Ok(entries
        .into_iter()
        .filter(|entry| re.is_match(entry))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quasi_cpe::{QuasiCpe, RegexTranslator, Translator};
    use std::io::Write;

    const FEED: &str = r#"{
  "matches" : [ {
    "cpe23Uri" : "cpe:2.3:a:busybox:busybox:1.29.3:*:*:*:*:*:*:*",
    "cpe_name" : [ {
      "cpe23Uri" : "cpe:2.3:a:busybox:busybox:1.29.3:*:*:*:*:*:*:*"
    } ]
  }, {
    "cpe23Uri" : "cpe:2.3:a:xmlsoft:libxml2:2.9.10:*:*:*:*:*:*:*",
    "cpe_name" : [ {
      "cpe23Uri" : "cpe:2.3:a:xmlsoft:libxml2:2.9.10:-:*:*:*:*:*:*"
    } ]
  }, {
    "cpe23Uri" : "cpe:2.3:a:xmlsoft:libxml2:2.9.10:*:*:*:*:windows:*:*",
    "cpe_name" : [ ]
  } ]
}
"#;

    fn write_feed() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create feed");
        file.write_all(FEED.as_bytes()).expect("write feed");
        file
    }

    #[test]
    fn scrapes_value_from_feed_line() {
        let line = "    \"cpe23Uri\" : \"cpe:2.3:a:xmlsoft:libxml2:2.9.10:*:*:*:*:*:*:*\",\r\n";
        assert_eq!(
            scrape_cpe(line),
            "cpe:2.3:a:xmlsoft:libxml2:2.9.10:*:*:*:*:*:*:*"
        );
    }

    #[test]
    fn recognizes_lines_holding_cpe_values() {
        let input = [
            (false, "{"),
            (false, "  \"matches\" : [ {"),
            (true, "    \"cpe23Uri\" : \"cpe:2.3:a:\\$0.99_kindle_books_project:\\$0.99_kindle_books:6:*:*:*:*:android:*:*\","),
            (false, "    \"cpe_name\" : [ {"),
            (true, "    \"cpe23Uri\" : \"cpe:2.3:o:-:-:-:*:*:*:*:*:*:*\","),
            (false, "    } ]"),
        ];
        for (expected, line) in input {
            assert_eq!(contains_cpe_key(line), expected, "{line}");
        }
    }

    #[test]
    fn search_returns_sorted_unique_matches() {
        let feed = write_feed();
        let pattern = r":libxml2:2\.9\.10:[\*\-]:[^:]+:[^:]+:[^:]+:(linux|\*):[^:]+:[^:]|:busybox:1\.29\.3:[\*\-]:[^:]+:[^:]+:[^:]+:(linux|\*):[^:]+:[^:]";
        let matches = search(pattern, feed.path()).expect("search feed");
        let expected: BTreeSet<String> = [
            "cpe:2.3:a:busybox:busybox:1.29.3:*:*:*:*:*:*:*",
            "cpe:2.3:a:xmlsoft:libxml2:2.9.10:*:*:*:*:*:*:*",
            "cpe:2.3:a:xmlsoft:libxml2:2.9.10:-:*:*:*:*:*:*",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();
        assert_eq!(matches, expected);
    }

    #[test]
    fn empty_pattern_matches_nothing() {
        let feed = write_feed();
        assert!(search("", feed.path()).expect("search feed").is_empty());
        assert!(match_entries(["cpe:2.3:a:x:y:1:*:*:*:*:*:*:*"], "")
            .expect("match")
            .is_empty());
    }

    #[test]
    fn missing_feed_is_an_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = search("x", &dir.path().join(CPE_MATCH_FEED)).expect_err("missing feed");
        assert!(err.to_string().contains("doesn't exist"));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let feed = write_feed();
        assert!(search("(unclosed", feed.path()).is_err());
    }

    #[test]
    fn unescapes_feed_values_before_matching() {
        let mut file = tempfile::NamedTempFile::new().expect("create feed");
        writeln!(
            file,
            r#"    "cpe23Uri" : "cpe:2.3:a:acme:odd\\:name:1.0:*:*:*:*:*:*:*","#
        )
        .expect("write feed");
        let quasi_cpe = QuasiCpe::application(None, "odd:name", "1.0", None, "linux");
        let pattern = RegexTranslator
            .translate(&quasi_cpe.to_string())
            .expect("fragment");
        let matches = search(&pattern, file.path()).expect("search feed");
        assert_eq!(
            matches.into_iter().collect::<Vec<_>>(),
            vec![r"cpe:2.3:a:acme:odd\:name:1.0:*:*:*:*:*:*:*".to_string()]
        );
    }

    #[test]
    fn keeps_values_that_are_not_json_strings() {
        let line = r#"    "cpe23Uri" : "cpe:2.3:a:\$0.99_kindle_books_project:x:6:*:*:*:*:*:*:*","#;
        assert_eq!(
            feed_cpe(line),
            r"cpe:2.3:a:\$0.99_kindle_books_project:x:6:*:*:*:*:*:*:*"
        );
    }

    #[test]
    fn resolves_directory_to_default_feed_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        assert_eq!(resolve_feed_path(dir.path()), dir.path().join(CPE_MATCH_FEED));
        let feed = write_feed();
        assert_eq!(resolve_feed_path(feed.path()), feed.path());
        let missing = dir.path().join("missing.json");
        assert_eq!(resolve_feed_path(&missing), missing);
    }

    #[test]
    fn filters_in_memory_entries() {
        let entries = [
            "cpe:2.3:a:busybox:busybox:1.31.0:*:*:*:*:*:*:*",
            "cpe:2.3:a:busybox:busybox:1.29.3:*:*:*:*:*:*:*",
            "cpe:2.3:a:busybox:busybox:1.31.0:*:*:*:*:*:*:*",
        ];
        let matches = match_entries(entries, r":busybox:1\.31\.0:").expect("match");
        assert_eq!(matches.len(), 1);
        assert!(matches.contains("cpe:2.3:a:busybox:busybox:1.31.0:*:*:*:*:*:*:*"));
    }
}
