use crate::client::ArchiveSource;
use crate::exporter;
use crate::fetcher;
use crate::resolver::{self, Chooser, Partner, Resolution};
use crate::slicer;
use crate::stats;
use crate::utils::ExportConfig;
use eyre::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Exported(ExportSummary),
    /// Nobody matched and nobody was picked from the shortlist.
    ContactNotFound,
    /// The contact resolved but the archive returned no messages.
    NoMessages(Partner),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub partner: Partner,
    pub message_count: usize,
    pub raw_json: PathBuf,
    pub timeline_csv: PathBuf,
    pub stats: PathBuf,
    pub slices_dir: PathBuf,
    pub monthly_slices: usize,
    pub yearly_slices: usize,
}

/// Resolve, fetch, then write every output.
///
/// Nothing touches the output directory until at least one message is in hand.
pub fn execute(
    config: &ExportConfig,
    source: &dyn ArchiveSource,
    chooser: &mut dyn Chooser,
) -> Result<ExportOutcome> {
    let contacts = source.contacts().wrap_err_with(|| {
        format!(
            "Could not reach the chat archive server at {}. Is `chatlog server` running?",
            config.base_url
        )
    })?;
    info!("Found {} contacts", contacts.len());

    let partner = match resolver::resolve(&config.partner, &contacts) {
        Resolution::Matched(partner) => {
            let others = resolver::other_matches(&config.partner, &contacts, &partner);
            if !others.is_empty() {
                warn!(
                    "'{}' also matches {}; using the first match. Use a more specific name to pick another.",
                    config.partner,
                    others.join(", ")
                );
            }
            partner
        }
        Resolution::Ambiguous(shortlist) => match chooser.choose(&config.partner, &shortlist) {
            Some(partner) => partner,
            None => return Ok(ExportOutcome::ContactNotFound),
        },
    };
    info!("Matched {} ({} messages)", partner.name, partner.msg_count);

    let messages = fetcher::fetch_all(source, &partner.wxid, config.quiet);
    if messages.is_empty() {
        return Ok(ExportOutcome::NoMessages(partner));
    }
    info!("Fetched {} messages", messages.len());

    fs::create_dir_all(&config.output_dir).wrap_err_with(|| {
        format!("Failed to create output dir: {}", config.output_dir.display())
    })?;

    let raw_json = config.raw_json_path();
    write_with(&raw_json, |w| exporter::write_raw_json(w, &partner, &messages))?;
    info!("Raw data: {}", raw_json.display());

    let timeline_csv = config.timeline_csv_path();
    write_with(&timeline_csv, |w| {
        exporter::write_timeline_csv(w, &partner.name, &messages)
    })?;
    info!("Timeline: {}", timeline_csv.display());

    let report = stats::generate_stats(&messages, &partner.name);
    let stats_path = config.stats_path();
    write_with(&stats_path, |w| {
        serde_json::to_writer_pretty(&mut *w, &report).map_err(std::io::Error::other)?;
        writeln!(w)
    })?;
    info!("Statistics: {}", stats_path.display());

    let slices = slicer::slice_dialogues(&messages, &partner.name);
    let slices_dir = config.slices_dir();
    slicer::write_slices(&slices_dir, &slices)?;
    info!(
        "Wrote {} monthly and {} yearly transcripts to {}",
        slices.monthly.len(),
        slices.yearly.len(),
        slices_dir.display()
    );

    Ok(ExportOutcome::Exported(ExportSummary {
        message_count: messages.len(),
        monthly_slices: slices.monthly.len(),
        yearly_slices: slices.yearly.len(),
        partner,
        raw_json,
        timeline_csv,
        stats: stats_path,
        slices_dir,
    }))
}

fn write_with<F>(path: &Path, render: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let file =
        File::create(path).wrap_err_with(|| format!("Failed to create: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    render(&mut writer).wrap_err_with(|| format!("Failed to write: {}", path.display()))?;
    writer
        .flush()
        .wrap_err_with(|| format!("Failed to flush: {}", path.display()))
}
