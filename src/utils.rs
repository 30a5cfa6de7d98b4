use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::PathBuf;
use url::Url;

/// Label used for the archive owner's own messages.
pub const SELF_LABEL: &str = "Me";

/// Configuration required to run the export process.
/// This decouples the logic from how the arguments were parsed (CLI/Config file).
#[derive(Clone, Debug)]
pub struct ExportConfig {
    pub partner: String,
    pub output_dir: PathBuf,
    /// Where the archive server keeps its decrypted data. Only mentioned to the operator.
    pub data_dir: PathBuf,
    pub base_url: Url,
    pub quiet: bool,
}

impl ExportConfig {
    pub fn raw_json_path(&self) -> PathBuf {
        self.output_dir.join("chat_raw.json")
    }

    pub fn timeline_csv_path(&self) -> PathBuf {
        self.output_dir.join("chat_timeline.csv")
    }

    pub fn stats_path(&self) -> PathBuf {
        self.output_dir.join("stats.json")
    }

    pub fn slices_dir(&self) -> PathBuf {
        self.output_dir.join("ai_analysis")
    }
}

/// Parse a message timestamp into its wall-clock time.
///
/// ISO-8601 first (a trailing `Z` is read as `+00:00`, offsets are kept as the
/// local wall clock rather than converted), then a bare `YYYY-MM-DD HH:MM:SS`
/// prefix. Anything else is `None`.
pub fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    parse_iso(&raw.replace('Z', "+00:00")).or_else(|| {
        let prefix = raw.get(..19)?;
        NaiveDateTime::parse_from_str(prefix, "%Y-%m-%d %H:%M:%S").ok()
    })
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    const WITH_OFFSET: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];
    const NAIVE: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];

    if let Some(dt) = WITH_OFFSET
        .iter()
        .find_map(|f| DateTime::parse_from_str(s, f).ok())
    {
        return Some(dt.naive_local());
    }
    if let Some(dt) = NAIVE
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `YYYY-MM` bucket key. Zero-padded, so lexical order is chronological.
pub fn month_key(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m").to_string()
}

pub fn sender_label<'a>(is_self: bool, partner_name: &'a str) -> &'a str {
    if is_self { SELF_LABEL } else { partner_name }
}

/// First `max` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Quote a CSV field when it contains a delimiter, quote or line break.
pub fn csv_field(value: &str) -> std::borrow::Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\"")).into()
    } else {
        value.into()
    }
}
