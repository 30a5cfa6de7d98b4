//! Plain-text dialogue transcripts per month and per year, sized for pasting
//! into an LLM prompt.
use crate::importer::Message;
use crate::utils::{month_key, parse_time, sender_label, truncate_chars};
use chrono::{Datelike, NaiveDateTime};
use eyre::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Months with fewer text messages than this get no transcript.
pub const MONTHLY_MIN_MESSAGES: usize = 10;
/// Yearly transcripts are sampled down to roughly this many lines.
pub const YEARLY_TARGET_LINES: usize = 500;
/// Each sampled yearly line is cut to this many characters.
pub const YEARLY_CONTENT_MAX: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    pub file_name: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogueSlices {
    pub monthly: Vec<Slice>,
    pub yearly: Vec<Slice>,
}

struct Line<'a> {
    at: NaiveDateTime,
    is_self: bool,
    content: &'a str,
}

impl Line<'_> {
    fn render(&self, time_fmt: &str, partner: &str, max_chars: Option<usize>) -> String {
        let flat = self.content.replace('\n', " ");
        let content = match max_chars {
            Some(n) => truncate_chars(&flat, n),
            None => flat.as_str(),
        };
        format!(
            "[{}] {}: {}",
            self.at.format(time_fmt),
            sender_label(self.is_self, partner),
            content
        )
    }
}

/// Text messages with content and a usable timestamp, in server order.
fn dialogue_lines(messages: &[Message]) -> Vec<Line<'_>> {
    messages
        .iter()
        .filter(|m| m.is_text() && !m.content().is_empty())
        .filter_map(|m| {
            Some(Line {
                at: parse_time(m.time_str())?,
                is_self: m.is_self,
                content: m.content(),
            })
        })
        .collect()
}

/// Every `max(1, n / 500)`-th line, starting with the first.
fn sample<T>(items: &[T]) -> impl Iterator<Item = &T> {
    let stride = (items.len() / YEARLY_TARGET_LINES).max(1);
    items.iter().step_by(stride)
}

pub fn slice_dialogues(messages: &[Message], partner: &str) -> DialogueSlices {
    let lines = dialogue_lines(messages);

    let mut by_month: BTreeMap<String, Vec<&Line>> = BTreeMap::new();
    let mut by_year: BTreeMap<i32, Vec<&Line>> = BTreeMap::new();
    for line in &lines {
        by_month.entry(month_key(&line.at)).or_default().push(line);
        by_year.entry(line.at.year()).or_default().push(line);
    }

    let monthly = by_month
        .into_iter()
        .filter(|(_, msgs)| msgs.len() >= MONTHLY_MIN_MESSAGES)
        .map(|(month, msgs)| {
            let mut body = format!("=== {} dialogue ===\n{} text messages\n\n", month, msgs.len());
            let rendered: Vec<String> = msgs
                .iter()
                .map(|l| l.render("%m-%d %H:%M", partner, None))
                .collect();
            body.push_str(&rendered.join("\n"));
            Slice {
                file_name: format!("dialogue_{}.txt", month),
                body,
            }
        })
        .collect();

    let yearly = by_year
        .into_iter()
        .map(|(year, msgs)| {
            let sampled: Vec<String> = sample(&msgs)
                .map(|l| l.render("%m-%d", partner, Some(YEARLY_CONTENT_MAX)))
                .collect();
            let mut body = format!(
                "=== {} yearly highlights ===\n{} messages, {} sampled\n\n",
                year,
                msgs.len(),
                sampled.len()
            );
            body.push_str(&sampled.join("\n"));
            Slice {
                file_name: format!("yearly_{}_summary.txt", year),
                body,
            }
        })
        .collect();

    DialogueSlices { monthly, yearly }
}

/// Write every slice into `dir`, creating it if needed. Existing files are replaced.
pub fn write_slices(dir: &Path, slices: &DialogueSlices) -> Result<()> {
    fs::create_dir_all(dir)
        .wrap_err_with(|| format!("Failed to create slice dir: {}", dir.display()))?;
    for slice in slices.monthly.iter().chain(&slices.yearly) {
        let path = dir.join(&slice.file_name);
        fs::write(&path, &slice.body)
            .wrap_err_with(|| format!("Failed to write: {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(time: &str, content: &str, is_self: bool) -> Message {
        Message {
            time: Some(time.to_string()),
            type_code: Some(1),
            content: Some(content.to_string()),
            is_self,
            ..Default::default()
        }
    }

    fn month_of(month: u32, n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| text(&format!("2023-{month:02}-01 10:{i:02}:00"), "hi", i % 2 == 0))
            .collect()
    }

    #[test]
    fn month_needs_ten_messages() {
        let mut msgs = month_of(4, 9);
        msgs.extend(month_of(5, 10));
        let slices = slice_dialogues(&msgs, "Honey");
        let names: Vec<&str> = slices.monthly.iter().map(|s| s.file_name.as_str()).collect();
        assert_eq!(names, vec!["dialogue_2023-05.txt"]);
    }

    #[test]
    fn monthly_transcript_format() {
        let mut msgs = month_of(5, 10);
        msgs[0].content = Some("line one\nline two".into());
        let slices = slice_dialogues(&msgs, "Honey");
        let body = &slices.monthly[0].body;
        let mut lines = body.lines();
        assert_eq!(lines.next(), Some("=== 2023-05 dialogue ==="));
        assert_eq!(lines.next(), Some("10 text messages"));
        assert_eq!(lines.next(), Some(""));
        assert_eq!(lines.next(), Some("[05-01 10:00] Me: line one line two"));
        assert_eq!(lines.next(), Some("[05-01 10:01] Honey: hi"));
        assert!(!body.ends_with('\n'));
    }

    #[test]
    fn non_text_empty_and_untimed_messages_are_ignored() {
        let mut msgs = month_of(6, 10);
        msgs.push(Message { type_code: Some(3), ..text("2023-06-02 00:00:00", "img", true) });
        msgs.push(text("2023-06-02 00:00:00", "", true));
        msgs.push(text("garbage", "lost", true));
        let slices = slice_dialogues(&msgs, "Honey");
        assert!(slices.monthly[0].body.contains("\n10 text messages\n"));
        assert_eq!(slices.yearly.len(), 1);
    }

    #[test]
    fn yearly_sampling_uses_fixed_stride() {
        let msgs: Vec<Message> = (0..1234)
            .map(|i| {
                let day = 1 + (i / 60) % 28;
                let minute = i % 60;
                text(&format!("2022-03-{day:02} 08:{minute:02}:00"), &format!("m{i}"), false)
            })
            .collect();
        let slices = slice_dialogues(&msgs, "Honey");
        let year = &slices.yearly[0];
        assert_eq!(year.file_name, "yearly_2022_summary.txt");

        // stride = 1234 / 500 = 2 -> 617 lines
        let mut lines = year.body.lines();
        assert_eq!(lines.next(), Some("=== 2022 yearly highlights ==="));
        assert_eq!(lines.next(), Some("1234 messages, 617 sampled"));
        assert_eq!(lines.next(), Some(""));
        assert_eq!(lines.next(), Some("[03-01] Honey: m0"));
        assert_eq!(lines.next(), Some("[03-01] Honey: m2"));
        assert_eq!(year.body.lines().count(), 3 + 617);
    }

    #[test]
    fn small_years_keep_every_line_and_truncate_content() {
        let long = "好".repeat(200);
        let msgs = vec![text("2021-01-01 00:00:00", &long, true)];
        let slices = slice_dialogues(&msgs, "Honey");
        let last = slices.yearly[0].body.lines().last().unwrap();
        assert_eq!(last, format!("[01-01] Me: {}", "好".repeat(YEARLY_CONTENT_MAX)));
        assert!(slices.monthly.is_empty());
    }

    #[test]
    fn slicing_is_deterministic() {
        let mut msgs = month_of(1, 30);
        msgs.extend(month_of(2, 12));
        assert_eq!(slice_dialogues(&msgs, "Honey"), slice_dialogues(&msgs, "Honey"));
    }

    #[test]
    fn write_slices_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("ai_analysis");
        let slices = slice_dialogues(&month_of(7, 10), "Honey");
        write_slices(&dir, &slices).unwrap();
        assert!(dir.join("dialogue_2023-07.txt").exists());
        assert!(dir.join("yearly_2023_summary.txt").exists());
    }
}
