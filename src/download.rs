// src/download.rs

use anyhow::{bail, Result};
use futures::{stream, Stream, StreamExt};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::{
    io::Write,
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{info, instrument, warn};

use crate::{
    config::{Config, TransportPolicy},
    fetch::{save_image, FetchResult, ImageSource},
    table::{load_table, prepare_output_dirs, Record, Table},
};

/// How one record ended up.
#[derive(Clone, Debug, PartialEq)]
pub enum Status {
    Saved { path: PathBuf, bytes: usize },
    HttpFailure { status: u16 },
    TransportFailure { message: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordOutcome {
    pub record: Record,
    pub status: Status,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub attempted: usize,
    pub saved: usize,
    pub http_failures: usize,
    pub transport_failures: usize,
}

/// `<dir>/<index>.png`
pub fn image_path(dir: &Path, record: &Record) -> PathBuf {
    dir.join(format!("{}.png", record.index))
}

/// Console line for a record whose image could not be fetched.
pub fn failure_line(record: &Record) -> String {
    format!("Failed at {},{}", record.lat, record.lon)
}

/// Row counter on stderr; draws nothing when stderr is not a terminal.
fn progress_bar(total: usize, label: &str) -> ProgressBar {
    let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
    let style = ProgressStyle::with_template("{msg} {bar:30.cyan/blue} {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.set_message(label.to_string());
    bar
}

/// One outcome per record of `table.head(limit)`, in table order. Requests
/// are issued one at a time; the next starts only after the previous
/// outcome is consumed. A failed file write is yielded as `Err`.
pub fn outcomes<'a, S>(
    source: &'a S,
    table: &'a Table,
    dir: &'a Path,
    limit: Option<usize>,
) -> impl Stream<Item = Result<RecordOutcome>> + 'a
where
    S: ImageSource + ?Sized,
{
    stream::iter(table.head(limit)).then(move |record| async move {
        let status = match source.fetch(record.lat, record.lon).await {
            FetchResult::Image(bytes) => {
                let path = image_path(dir, record);
                save_image(&bytes, &path).await?;
                Status::Saved {
                    path,
                    bytes: bytes.len(),
                }
            }
            FetchResult::HttpStatus(status) => Status::HttpFailure { status },
            FetchResult::Transport(message) => Status::TransportFailure { message },
        };
        Ok::<_, anyhow::Error>(RecordOutcome {
            record: *record,
            status,
        })
    })
}

/// Fetch every record of one table into `dir`, writing a failure line to
/// `report` for each record without an image.
#[instrument(level = "info", skip(source, table, dir, report), fields(table = %table.source().display(), dir = %dir.display()))]
pub async fn download_split<S, W>(
    source: &S,
    table: &Table,
    dir: &Path,
    limit: Option<usize>,
    policy: TransportPolicy,
    report: &mut W,
) -> Result<DownloadSummary>
where
    S: ImageSource + ?Sized,
    W: Write,
{
    let total = table.head(limit).len();
    let start = Instant::now();
    let mut summary = DownloadSummary::default();
    let label = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let bar = progress_bar(total, &label);

    let results = outcomes(source, table, dir, limit);
    futures::pin_mut!(results);

    while let Some(outcome) = results.next().await {
        let outcome = outcome?;
        summary.attempted += 1;

        match &outcome.status {
            Status::Saved { .. } => summary.saved += 1,
            Status::HttpFailure { status } => {
                summary.http_failures += 1;
                warn!(index = outcome.record.index, status, "image request rejected");
                bar.suspend(|| writeln!(report, "{}", failure_line(&outcome.record)))?;
            }
            Status::TransportFailure { message } => {
                summary.transport_failures += 1;
                warn!(index = outcome.record.index, error = %message, "image request failed");
                bar.suspend(|| writeln!(report, "{}", failure_line(&outcome.record)))?;
                if policy == TransportPolicy::Abort {
                    bar.abandon();
                    bail!(
                        "transport failure at row {} ({},{}): {}",
                        outcome.record.index,
                        outcome.record.lat,
                        outcome.record.lon,
                        message
                    );
                }
            }
        }

        bar.inc(1);
    }
    bar.finish_and_clear();

    info!(
        saved = summary.saved,
        http_failures = summary.http_failures,
        transport_failures = summary.transport_failures,
        elapsed = ?start.elapsed(),
        "split done"
    );
    Ok(summary)
}

/// Create output folders, load every table, then download each split in
/// configured order. Tables are all loaded before the first request.
pub async fn run<S, W>(
    config: &Config,
    source: &S,
    report: &mut W,
) -> Result<Vec<(String, DownloadSummary)>>
where
    S: ImageSource + ?Sized,
    W: Write,
{
    prepare_output_dirs(config)?;

    let tables = config
        .splits
        .iter()
        .map(|split| load_table(&split.table))
        .collect::<Result<Vec<_>>>()?;

    let mut summaries = Vec::with_capacity(tables.len());
    for (split, table) in config.splits.iter().zip(&tables) {
        info!(split = %split.name, rows = table.len(), limit = ?split.limit, "downloading");
        let dir = config.split_dir(&split.name);
        let summary = download_split(
            source,
            table,
            &dir,
            split.limit,
            config.on_transport_error,
            report,
        )
        .await?;
        summaries.push((split.name.clone(), summary));
    }

    info!("satellite images downloaded");
    Ok(summaries)
}
