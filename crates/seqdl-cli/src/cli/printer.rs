//! Prints job events on stdout, human-readable or as JSON lines.

use seqdl_core::events::DownloadEvent;
use seqdl_core::{DownloadListener, Outcome};
use std::io::Write;

pub struct EventPrinter {
    json: bool,
}

impl EventPrinter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn print(&self, event: Result<DownloadEvent, seqdl_core::events::EventError>) {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("not printing event: {}", e);
                return;
            }
        };
        let line = match render(&event, self.json) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("cannot render event: {}", e);
                return;
            }
        };
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

/// One output line for `event`.
pub fn render(event: &DownloadEvent, json: bool) -> serde_json::Result<String> {
    if json {
        return event.to_json_line();
    }
    Ok(match event {
        DownloadEvent::Progress {
            source,
            progress: 0,
        } => format!("started   {source}"),
        DownloadEvent::Progress { source, progress } => format!("{progress:>3}%      {source}"),
        DownloadEvent::End { source, outcome } => match outcome {
            Outcome::Completed => format!("done      {source}"),
            failure if failure.is_error() => format!("failed    {source}: {failure}"),
            other => format!("stopped   {source}: {other}"),
        },
    })
}

impl DownloadListener for EventPrinter {
    fn on_download_start(&self, source: &str) {
        self.print(DownloadEvent::started(source));
    }

    fn on_download_progress(&self, source: &str, progress: u8) {
        self.print(DownloadEvent::progress(source, progress));
    }

    fn on_download_end(&self, source: &str, outcome: Outcome) {
        self.print(DownloadEvent::end(source, outcome));
    }
}
