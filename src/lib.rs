//! # couple-chat-export
//!
//! A CLI tool that exports the one-on-one chat history with a single contact from a
//! locally running [chatlog](https://github.com/sjzar/chatlog) archive server.
//!
//! ## What it does
//!
//! The archive server exposes the decrypted chat database over HTTP. This tool looks up
//! the counterpart by remark or nickname, downloads the whole conversation page by page
//! and writes:
//!
//! - `chat_raw.json`: every message as the server sent it, plus who it was resolved to
//! - `chat_timeline.csv`: one row per message, ready for a spreadsheet
//! - `stats.json`: volume, date range, busiest hours, per-year and recent per-month counts
//! - `ai_analysis/`: one transcript per busy month and a sampled transcript per year
//!
//! The server is only ever read from. Re-running against the same data rewrites the
//! same files byte for byte.
//!
//! ## Usage
//!
//! ```sh
//! # Start the archive server first: chatlog key && chatlog decrypt && chatlog server
//! couple-chat-export --partner "Honey" --output ./our_chat
//! ```
//!
//! Preferences can be persisted in `~/.config/couple-chat-export/config.toml`.
pub mod client;
pub mod exporter;
pub mod fetcher;
pub mod importer;
pub mod pipeline;
pub mod resolver;
pub mod slicer;
pub mod stats;
pub mod utils;
