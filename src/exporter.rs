use crate::importer::Message;
use crate::resolver::Partner;
use crate::utils::{csv_field, parse_time, sender_label, truncate_chars};
use serde::Serialize;
use std::io::Write;

/// CSV content cells are cut to this many characters.
pub const CSV_CONTENT_MAX: usize = 1000;

const CSV_HEADER: [&str; 10] = [
    "datetime", "date", "time", "year", "month", "sender", "is_self", "msg_type", "content",
    "word_count",
];

/// Byte order mark so spreadsheet tools detect UTF-8.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Serialize)]
struct RawDocument<'a> {
    partner_name: &'a str,
    partner_wxid: &'a str,
    message_count: usize,
    messages: &'a [Message],
}

/// Full-fidelity dump of the conversation plus who it was resolved to.
pub fn write_raw_json<W: Write>(
    writer: &mut W,
    partner: &Partner,
    messages: &[Message],
) -> std::io::Result<()> {
    let doc = RawDocument {
        partner_name: &partner.name,
        partner_wxid: &partner.wxid,
        message_count: messages.len(),
        messages,
    };
    serde_json::to_writer_pretty(&mut *writer, &doc).map_err(std::io::Error::other)?;
    writeln!(writer)
}

/// One row per message. Unparseable timestamps leave the derived columns empty.
pub fn write_timeline_csv<W: Write>(
    writer: &mut W,
    partner_name: &str,
    messages: &[Message],
) -> std::io::Result<()> {
    writer.write_all(UTF8_BOM)?;
    write!(writer, "{}\r\n", CSV_HEADER.join(","))?;

    for msg in messages {
        let dt = parse_time(msg.time_str());
        let content = msg.content();
        let (date, time, year, month) = match dt {
            Some(dt) => (
                dt.format("%Y-%m-%d").to_string(),
                dt.format("%H:%M:%S").to_string(),
                dt.format("%Y").to_string(),
                dt.format("%Y-%m").to_string(),
            ),
            None => Default::default(),
        };
        let is_self = if msg.is_self { "True" } else { "False" };

        let row = [
            csv_field(msg.time_str()),
            date.into(),
            time.into(),
            year.into(),
            month.into(),
            csv_field(sender_label(msg.is_self, partner_name)),
            is_self.into(),
            msg.kind().label().into(),
            csv_field(truncate_chars(content, CSV_CONTENT_MAX)),
            content.chars().count().to_string().into(),
        ];
        write!(writer, "{}\r\n", row.join(","))?;
    }

    Ok(())
}
