use crate::client::ArchiveSource;
use crate::importer::Message;
use tracing::{info, warn};

pub const PAGE_SIZE: usize = 1000;
/// Log progress once every this many pages.
const PROGRESS_EVERY: usize = 5;

/// Download a whole conversation, one page at a time.
///
/// Stops on an empty or short page. A failed request ends pagination early and
/// returns whatever was already fetched; nothing is retried.
pub fn fetch_all(source: &dyn ArchiveSource, talker: &str, quiet: bool) -> Vec<Message> {
    let progress = Progress::new(quiet);
    let mut all = Vec::new();
    let mut offset = 0;
    let mut pages = 0;

    loop {
        let page = match source.messages(talker, PAGE_SIZE, offset) {
            Ok(page) => page,
            Err(e) => {
                warn!(
                    "Fetch interrupted at offset {}: {}. Keeping {} messages.",
                    offset,
                    e,
                    all.len()
                );
                break;
            }
        };
        if page.is_empty() {
            break;
        }

        let short = page.len() < PAGE_SIZE;
        all.extend(page);
        offset += PAGE_SIZE;
        pages += 1;

        progress.update(all.len());
        if pages % PROGRESS_EVERY == 0 {
            info!("Fetched {} messages so far...", all.len());
        }

        if short {
            break;
        }
    }

    progress.finish();
    all
}

#[cfg(feature = "progress")]
struct Progress(indicatif::ProgressBar);

#[cfg(feature = "progress")]
impl Progress {
    fn new(quiet: bool) -> Self {
        use indicatif::{ProgressBar, ProgressStyle};
        use std::time::Duration;

        if quiet {
            return Self(ProgressBar::hidden());
        }
        let s = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            s.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        s.set_message("Fetching messages...");
        s.enable_steady_tick(Duration::from_millis(80));
        Self(s)
    }

    fn update(&self, fetched: usize) {
        self.0.set_message(format!("Fetching messages... {}", fetched));
    }

    fn finish(&self) {
        self.0.finish_and_clear();
    }
}

#[cfg(not(feature = "progress"))]
struct Progress;

#[cfg(not(feature = "progress"))]
impl Progress {
    fn new(_quiet: bool) -> Self {
        Self
    }

    fn update(&self, _fetched: usize) {}

    fn finish(&self) {}
}
