//! Descriptive statistics over a fetched conversation.
use crate::importer::{Message, MessageKind};
use crate::utils::{month_key, parse_time};
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;

const RECENT_MONTHS: usize = 12;
const PEAK_HOURS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub partner: String,
    pub total_messages: usize,
    pub text_messages: usize,
    pub my_messages: usize,
    pub partner_messages: usize,
    pub message_types: BTreeMap<MessageKind, usize>,
    pub date_range: DateRange,
    pub yearly_messages: BTreeMap<i32, usize>,
    /// The trailing twelve `YYYY-MM` keys that have any messages.
    pub monthly_messages: BTreeMap<String, usize>,
    pub peak_hours: Vec<HourCount>,
    pub avg_message_length: f64,
    pub active_months: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
    pub days: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourCount {
    pub hour: u32,
    pub count: usize,
}

/// Time buckets for every message whose timestamp parses.
#[derive(Debug, Default)]
struct Buckets {
    yearly: BTreeMap<i32, usize>,
    monthly: BTreeMap<String, usize>,
    hourly: [usize; 24],
    first: Option<NaiveDateTime>,
    last: Option<NaiveDateTime>,
    parsed: usize,
}

impl Buckets {
    fn add(&mut self, dt: NaiveDateTime) {
        *self.yearly.entry(dt.year()).or_default() += 1;
        *self.monthly.entry(month_key(&dt)).or_default() += 1;
        self.hourly[dt.hour() as usize] += 1;
        self.first = Some(self.first.map_or(dt, |f| f.min(dt)));
        self.last = Some(self.last.map_or(dt, |l| l.max(dt)));
        self.parsed += 1;
    }
}

pub fn generate_stats(messages: &[Message], partner: &str) -> StatsReport {
    let mut buckets = Buckets::default();
    let mut message_types: BTreeMap<MessageKind, usize> = BTreeMap::new();
    let mut my_messages = 0;
    let mut text_messages = 0;
    let (mut text_chars, mut text_with_content) = (0usize, 0usize);

    for msg in messages {
        *message_types.entry(msg.kind()).or_default() += 1;
        if msg.is_self {
            my_messages += 1;
        }
        if msg.is_text() {
            text_messages += 1;
            if !msg.content().is_empty() {
                text_chars += msg.content().chars().count();
                text_with_content += 1;
            }
        }
        if let Some(dt) = parse_time(msg.time_str()) {
            buckets.add(dt);
        }
    }

    let avg_message_length = if text_with_content == 0 {
        0.0
    } else {
        round2(text_chars as f64 / text_with_content as f64)
    };

    StatsReport {
        partner: partner.to_string(),
        total_messages: messages.len(),
        text_messages,
        my_messages,
        partner_messages: messages.len() - my_messages,
        message_types,
        date_range: date_range(&buckets),
        peak_hours: peak_hours(&buckets.hourly),
        active_months: buckets.monthly.len(),
        monthly_messages: recent_months(&buckets.monthly),
        yearly_messages: buckets.yearly,
        avg_message_length,
    }
}

fn date_range(b: &Buckets) -> DateRange {
    let day = |dt: Option<NaiveDateTime>| dt.map(|d| d.format("%Y-%m-%d").to_string());
    let days = match (b.first, b.last) {
        (Some(first), Some(last)) if b.parsed > 1 => (last - first).num_days(),
        _ => 0,
    };
    DateRange {
        start: day(b.first),
        end: day(b.last),
        days,
    }
}

/// Busiest hours first. The sort is stable, so tied hours keep ascending order.
fn peak_hours(hourly: &[usize; 24]) -> Vec<HourCount> {
    let mut hours: Vec<HourCount> = (0u32..)
        .zip(hourly.iter().copied())
        .map(|(hour, count)| HourCount { hour, count })
        .collect();
    hours.sort_by(|a, b| b.count.cmp(&a.count));
    hours.truncate(PEAK_HOURS);
    hours
}

fn recent_months(monthly: &BTreeMap<String, usize>) -> BTreeMap<String, usize> {
    let skip = monthly.len().saturating_sub(RECENT_MONTHS);
    monthly
        .iter()
        .skip(skip)
        .map(|(k, v)| (k.clone(), *v))
        .collect()
}

/// Two decimals, ties to even (`1.125` -> `1.12`).
fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(time: &str, code: i64, content: &str, is_self: bool) -> Message {
        Message {
            time: Some(time.to_string()),
            type_code: Some(code),
            content: Some(content.to_string()),
            is_self,
            ..Default::default()
        }
    }

    fn sample() -> Vec<Message> {
        vec![
            msg("2022-12-31 23:59:00", 1, "bye 2022", true),
            msg("2023-01-01T09:00:00+08:00", 1, "早", false),
            msg("2023-01-01T09:30:00Z", 3, "", false),
            msg("2023-03-15 14:00:00", 34, "", true),
            msg("not a time", 1, "lost", false),
            msg("2023-03-15 14:10:00", 12345, "", false),
        ]
    }

    #[test]
    fn counts_partition_the_total() {
        let s = generate_stats(&sample(), "Honey");
        assert_eq!(s.total_messages, 6);
        assert_eq!(s.my_messages + s.partner_messages, s.total_messages);
        assert_eq!(s.message_types.values().sum::<usize>(), s.total_messages);
        assert_eq!(s.message_types[&MessageKind::Other], 1);
        assert_eq!(s.text_messages, 3);
    }

    #[test]
    fn every_parsed_message_lands_in_one_bucket_each() {
        let s = generate_stats(&sample(), "Honey");
        let parsed = 5;
        assert_eq!(s.yearly_messages.values().sum::<usize>(), parsed);
        assert_eq!(s.yearly_messages[&2022], 1);
        assert_eq!(s.yearly_messages[&2023], 4);
        assert_eq!(s.monthly_messages.values().sum::<usize>(), parsed);
        assert_eq!(s.active_months, 3);
    }

    #[test]
    fn date_range_spans_whole_days() {
        let s = generate_stats(&sample(), "Honey");
        assert_eq!(s.date_range.start.as_deref(), Some("2022-12-31"));
        assert_eq!(s.date_range.end.as_deref(), Some("2023-03-15"));
        assert_eq!(s.date_range.days, 73);
    }

    #[test]
    fn single_timestamp_has_zero_span() {
        let s = generate_stats(&[msg("2023-01-01 10:00:00", 1, "x", true)], "Honey");
        assert_eq!(s.date_range.days, 0);
        assert_eq!(s.date_range.start, s.date_range.end);

        let empty = generate_stats(&[], "Honey");
        assert_eq!(empty.date_range.start, None);
        assert_eq!(empty.avg_message_length, 0.0);
        assert_eq!(empty.peak_hours.len(), 3);
        assert!(empty.peak_hours.iter().all(|h| h.count == 0));
        assert_eq!(empty.peak_hours[0].hour, 0);
    }

    #[test]
    fn peak_hour_ties_keep_first_seen_order() {
        let mut msgs = Vec::new();
        for _ in 0..5 {
            msgs.push(msg("2023-01-01 09:00:00", 1, "a", true));
        }
        for hour in [14, 20, 22] {
            for _ in 0..20 {
                msgs.push(msg(&format!("2023-01-01 {hour}:00:00"), 1, "a", true));
            }
        }
        let s = generate_stats(&msgs, "Honey");
        let hours: Vec<u32> = s.peak_hours.iter().map(|h| h.hour).collect();
        assert_eq!(hours, vec![14, 20, 22]);
        assert_eq!(s.peak_hours[0].count, 20);
    }

    #[test]
    fn only_last_twelve_months_are_listed() {
        let msgs: Vec<Message> = (1..=12)
            .map(|m| msg(&format!("2022-{m:02}-01 00:00:00"), 1, "x", true))
            .chain((1..=3).map(|m| msg(&format!("2023-{m:02}-01 00:00:00"), 1, "x", true)))
            .collect();
        let s = generate_stats(&msgs, "Honey");
        assert_eq!(s.active_months, 15);
        assert_eq!(s.monthly_messages.len(), 12);
        assert_eq!(s.monthly_messages.keys().next().unwrap(), "2022-04");
        assert_eq!(s.monthly_messages.keys().last().unwrap(), "2023-03");
    }

    #[test]
    fn average_length_counts_characters_of_text_only() {
        let msgs = vec![
            msg("", 1, "你好", true),
            msg("", 1, "hello", false),
            msg("", 1, "", false),
            msg("", 49, "https://example.com/very/long/link", false),
        ];
        let s = generate_stats(&msgs, "Honey");
        assert_eq!(s.avg_message_length, 3.5);

        let thirds = vec![msg("", 1, "a", true), msg("", 1, "a", true), msg("", 1, "ab", true)];
        assert_eq!(generate_stats(&thirds, "Honey").avg_message_length, 1.33);

        // 9 chars over 8 messages = 1.125 exactly
        let mut eighths = vec![msg("", 1, "ab", true)];
        eighths.extend((0..7).map(|_| msg("", 1, "a", false)));
        assert_eq!(generate_stats(&eighths, "Honey").avg_message_length, 1.12);
    }

    #[test]
    fn repeated_runs_serialize_identically() {
        let a = serde_json::to_string_pretty(&generate_stats(&sample(), "Honey")).unwrap();
        let b = serde_json::to_string_pretty(&generate_stats(&sample(), "Honey")).unwrap();
        assert_eq!(a, b);
    }
}
