/// Wire types for the chat archive server (`chatlog server`).
///
/// Both endpoints return bare JSON arrays:
///
/// ```text
/// GET /api/v1/contact                                   -> [Contact]
/// GET /api/v1/chatlog?talker=..&limit=..&offset=..&format=json -> [Message]
/// ```
///
/// Only the fields this tool reads are typed. Everything else the server sends
/// is kept in `extra` so `chat_raw.json` round-trips the original records, apart
/// from the sender flag, which is normalized to `is_self`.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker carried by the identifier of every group conversation.
pub const GROUP_MARKER: &str = "@chatroom";

// ---------------------------------------------------------------------------
// Contacts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, alias = "userName")]
    pub wxid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(default, alias = "nickName", skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default)]
    pub msg_count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Contact {
    /// Remark, then nickname, then the raw identifier. Empty strings count as missing.
    pub fn display_name(&self) -> &str {
        [self.remark.as_deref(), self.nickname.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or(&self.wxid)
    }

    pub fn is_group(&self) -> bool {
        self.wxid.contains(GROUP_MARKER)
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// One chat record.
///
/// Decoding never fails on a single record: a `time`, `type` or `content` of the
/// wrong JSON type is left untouched in `extra`, so it is written back verbatim
/// and the typed field stays `None`. The sender flag is read from `is_self` or
/// `isSelf` (any truthy value) and always written back as `is_self`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct Message {
    /// ISO-8601 timestamp as sent by the server. Not guaranteed to parse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub is_self: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for Message {
    fn from(mut raw: Map<String, Value>) -> Self {
        let time = take_if(&mut raw, "time", |v| v.as_str().map(str::to_owned));
        let type_code = take_if(&mut raw, "type", Value::as_i64);
        let content = take_if(&mut raw, "content", |v| v.as_str().map(str::to_owned));
        let flags: Vec<Value> = ["is_self", "isSelf"]
            .iter()
            .filter_map(|key| raw.remove(*key))
            .collect();
        let is_self = flags.iter().any(truthy);
        Self {
            time,
            type_code,
            content,
            is_self,
            extra: raw,
        }
    }
}

/// Remove `key` only when `parse` accepts its value.
fn take_if<T>(
    raw: &mut Map<String, Value>,
    key: &str,
    parse: impl FnOnce(&Value) -> Option<T>,
) -> Option<T> {
    let parsed = raw.get(key).and_then(parse)?;
    raw.remove(key);
    Some(parsed)
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Null => false,
    }
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        self.type_code.map_or(MessageKind::Other, MessageKind::from_code)
    }

    pub fn is_text(&self) -> bool {
        self.kind() == MessageKind::Text
    }

    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    pub fn time_str(&self) -> &str {
        self.time.as_deref().unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Message kinds
// ---------------------------------------------------------------------------

/// Semantic category of a message type code.
///
/// Closed set; any code not listed maps to [`MessageKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Image,
    Voice,
    Video,
    Emoji,
    Link,
    VideoCall,
    System,
    Other,
}

impl MessageKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Text,
            3 => Self::Image,
            34 => Self::Voice,
            43 => Self::Video,
            47 => Self::Emoji,
            49 => Self::Link,
            50 => Self::VideoCall,
            10000 => Self::System,
            _ => Self::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Voice => "voice",
            Self::Video => "video",
            Self::Emoji => "emoji",
            Self::Link => "link",
            Self::VideoCall => "video_call",
            Self::System => "system",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
