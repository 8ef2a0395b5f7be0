// Terminal progress bar driven by engine status events

use std::io::Write;
use std::time::{Duration, Instant};

use super::models::{ProgressEvent, ProgressStatus};
use super::traits::ProgressSink;
use super::utils::{format_eta, human_size};

pub const BAR_LEN: usize = 40;

/// Minimum gap between two "downloading" renders
pub const RENDER_INTERVAL: Duration = Duration::from_millis(200);

/// Bytes per animation step of the indeterminate bar
const INDETERMINATE_STEP: f64 = 64.0 * 1024.0;

const FINISHED_LINE: &str = "Download finished. Processing file...";

/// Rate-limited single-line progress display.
///
/// One instance per download; the rate-limit state dies with it.
pub struct ProgressReporter<W: Write> {
    out: W,
    last_render: Option<Instant>,
    finished: bool,
}

impl<W: Write> ProgressReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_render: None,
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn handle(&mut self, event: &ProgressEvent) {
        if self.finished {
            return;
        }
        let now = Instant::now();
        match event.status {
            ProgressStatus::Downloading => {
                if let Some(last) = self.last_render {
                    if now.duration_since(last) < RENDER_INTERVAL {
                        return;
                    }
                }
                self.last_render = Some(now);
                let line = render_line(event);
                let _ = write!(self.out, "\r{}", line);
                let _ = self.out.flush();
            }
            ProgressStatus::Finished => {
                self.last_render = Some(now);
                self.finished = true;
                // pad to wipe the remains of the bar
                let _ = writeln!(self.out, "\r{:<width$}", FINISHED_LINE, width = BAR_LEN + 60);
                let _ = self.out.flush();
            }
            ProgressStatus::Other => {}
        }
    }
}

impl<W: Write + Send> ProgressSink for ProgressReporter<W> {
    fn on_status(&mut self, event: &ProgressEvent) {
        self.handle(event);
    }
}

/// Body of one progress line, without the leading carriage return
pub fn render_line(event: &ProgressEvent) -> String {
    let downloaded = event.downloaded_bytes.unwrap_or(0.0).max(0.0);
    let total = event.effective_total();
    let speed = event.speed.filter(|s| s.is_finite() && *s > 0.0);

    let percent = match total {
        Some(t) => (downloaded / t * 100.0).clamp(0.0, 100.0),
        None => 0.0,
    };
    let filled = match total {
        Some(_) => ((BAR_LEN as f64) * percent / 100.0) as usize,
        None => indeterminate_fill(downloaded),
    }
    .min(BAR_LEN);
    let bar = format!("{}{}", "█".repeat(filled), "-".repeat(BAR_LEN - filled));

    let eta = match (speed, total) {
        (Some(s), Some(t)) => format_eta(((t - downloaded).max(0.0) / s) as u64),
        _ => "-".to_string(),
    };
    let total_h = match total {
        Some(t) => human_size(Some(t)),
        None => "?".to_string(),
    };

    format!(
        "[{}] {:6.2}% | {}/{} | {}/s | ETA: {}",
        bar,
        percent,
        human_size(Some(downloaded)),
        total_h,
        human_size(Some(speed.unwrap_or(0.0))),
        eta
    )
}

// Bounces between empty and full as bytes arrive
fn indeterminate_fill(downloaded: f64) -> usize {
    let step = (downloaded / INDETERMINATE_STEP) as usize;
    let period = 2 * BAR_LEN;
    let pos = step % period;
    if pos <= BAR_LEN {
        pos
    } else {
        period - pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renders(buf: &[u8]) -> usize {
        String::from_utf8_lossy(buf).matches('\r').count()
    }

    #[test]
    fn known_total_line() {
        let ev = ProgressEvent::downloading(512.0 * 1024.0, Some(1024.0 * 1024.0), Some(1024.0));
        let line = render_line(&ev);
        assert!(line.starts_with(&format!("[{}{}]", "█".repeat(20), "-".repeat(20))));
        assert!(line.contains(" 50.00%"));
        assert!(line.contains("512.0 KB/1.0 MB"));
        assert!(line.contains("1.0 KB/s"));
        assert!(line.ends_with("ETA: 0:08:32"));
    }

    #[test]
    fn eta_placeholder_without_total_or_speed() {
        let no_total = ProgressEvent::downloading(1000.0, None, Some(100.0));
        let line = render_line(&no_total);
        assert!(line.ends_with("ETA: -"));
        assert!(line.contains("/?"));
        assert!(line.contains("  0.00%"));

        let no_speed = ProgressEvent::downloading(1000.0, Some(2000.0), Some(0.0));
        assert!(render_line(&no_speed).ends_with("ETA: -"));

        let nothing = ProgressEvent::default();
        let line = render_line(&nothing);
        assert!(line.contains("0.0 B/?"));
        assert!(line.contains("0.0 B/s"));
    }

    #[test]
    fn estimate_used_when_exact_missing() {
        let ev = ProgressEvent {
            status: ProgressStatus::Downloading,
            downloaded_bytes: Some(250.0),
            total_bytes: None,
            total_bytes_estimate: Some(1000.0),
            speed: Some(250.0),
        };
        let line = render_line(&ev);
        assert!(line.contains(" 25.00%"));
        assert!(line.ends_with("ETA: 0:00:03"));
    }

    #[test]
    fn indeterminate_fill_stays_in_bounds() {
        for i in 0..500 {
            let fill = indeterminate_fill(i as f64 * 10_000.0);
            assert!(fill <= BAR_LEN);
        }
        assert_eq!(indeterminate_fill(0.0), 0);
        assert_eq!(indeterminate_fill(INDETERMINATE_STEP * 5.0), 5);
        assert_eq!(indeterminate_fill(INDETERMINATE_STEP * 40.0), 40);
        assert_eq!(indeterminate_fill(INDETERMINATE_STEP * 45.0), 35);
        assert_eq!(indeterminate_fill(INDETERMINATE_STEP * 80.0), 0);
    }

    #[test]
    fn rapid_downloading_events_render_once() {
        let mut reporter = ProgressReporter::new(Vec::new());
        reporter.handle(&ProgressEvent::downloading(10.0, Some(100.0), None));
        reporter.handle(&ProgressEvent::downloading(20.0, Some(100.0), None));
        let out = reporter.into_inner();
        assert_eq!(renders(&out), 1);
    }

    #[test]
    fn finished_always_renders() {
        let mut reporter = ProgressReporter::new(Vec::new());
        reporter.handle(&ProgressEvent::downloading(10.0, Some(100.0), None));
        reporter.handle(&ProgressEvent::finished());
        assert!(reporter.is_finished());
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(text.matches('\r').count(), 2);
        assert!(text.contains(FINISHED_LINE));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn nothing_renders_after_finished() {
        let mut reporter = ProgressReporter::new(Vec::new());
        reporter.handle(&ProgressEvent::finished());
        std::thread::sleep(RENDER_INTERVAL + Duration::from_millis(20));
        reporter.handle(&ProgressEvent::downloading(10.0, Some(100.0), None));
        reporter.handle(&ProgressEvent::finished());
        assert_eq!(renders(&reporter.into_inner()), 1);
    }

    #[test]
    fn renders_again_after_interval() {
        let mut reporter = ProgressReporter::new(Vec::new());
        reporter.handle(&ProgressEvent::downloading(10.0, Some(100.0), None));
        std::thread::sleep(RENDER_INTERVAL + Duration::from_millis(20));
        reporter.handle(&ProgressEvent::downloading(20.0, Some(100.0), None));
        assert_eq!(renders(&reporter.into_inner()), 2);
    }

    #[test]
    fn other_status_is_ignored() {
        let mut reporter = ProgressReporter::new(Vec::new());
        reporter.on_status(&ProgressEvent {
            status: ProgressStatus::Other,
            ..ProgressEvent::default()
        });
        assert!(reporter.into_inner().is_empty());
    }
}
