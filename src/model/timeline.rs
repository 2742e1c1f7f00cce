use chrono::{Datelike, NaiveDate, Weekday};
use tracing::debug;

/// Signed number of calendar days from `a` to `b`.
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days()
}

pub fn add_days(date: NaiveDate, n: i64) -> NaiveDate {
    date + chrono::Duration::days(n)
}

/// One column of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Day {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub is_weekend: bool,
}

impl Day {
    fn new(date: NaiveDate) -> Self {
        let weekday = date.weekday();
        Self {
            date,
            weekday,
            is_weekend: matches!(weekday, Weekday::Sat | Weekday::Sun),
        }
    }
}

/// A run of contiguous days sharing a month or an ISO week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
    pub label: String,
    /// Index of the first day of the run within [`TimelineWindow::days`].
    pub first_day: usize,
    pub len: usize,
}

/// What the viewport reports on every scroll event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub offset: f32,
    pub client_width: f32,
    pub content_width: f32,
}

/// When and by how much the window grows while scrolling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtendPolicy {
    pub threshold_px: f32,
    pub chunk_days: u32,
    /// Chunk used when the edge is already very close (fast or far scroll).
    pub far_chunk_days: u32,
    /// Distances below `threshold_px / far_scroll_factor` use `far_chunk_days`.
    pub far_scroll_factor: f32,
}

impl Default for ExtendPolicy {
    fn default() -> Self {
        Self {
            threshold_px: 1000.0,
            chunk_days: 30,
            far_chunk_days: 90,
            far_scroll_factor: 3.0,
        }
    }
}

impl ExtendPolicy {
    fn chunk_for(&self, distance: f32) -> Option<u32> {
        if distance >= self.threshold_px {
            None
        } else if distance < self.threshold_px / self.far_scroll_factor.max(1.0) {
            Some(self.far_chunk_days.max(self.chunk_days))
        } else {
            Some(self.chunk_days)
        }
    }
}

/// Days added on each side by one scroll event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extension {
    pub backward: u32,
    pub forward: u32,
}

impl Extension {
    pub fn is_empty(&self) -> bool {
        self.backward == 0 && self.forward == 0
    }
}

/// The scrollable date range and its day-to-pixel mapping.
///
/// Offsets are measured from the left edge of the content (the anchor day).
/// Writes to the viewport scroll offset are deferred: mutations that shift
/// content queue a target which the renderer collects with
/// [`TimelineWindow::take_scroll_target`] on the following frame.
#[derive(Debug, Clone)]
pub struct TimelineWindow {
    anchor: NaiveDate,
    total_days: u32,
    day_width: f32,
    scroll_offset: f32,
    pending_scroll: Option<f32>,
    policy: ExtendPolicy,
}

impl TimelineWindow {
    pub fn new(anchor: NaiveDate, total_days: u32, day_width: f32) -> Self {
        Self {
            anchor,
            total_days: total_days.max(1),
            day_width: day_width.max(1.0),
            scroll_offset: 0.0,
            pending_scroll: None,
            policy: ExtendPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ExtendPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn total_days(&self) -> u32 {
        self.total_days
    }

    pub fn day_width(&self) -> f32 {
        self.day_width
    }

    /// The last day in the window.
    pub fn last_day(&self) -> NaiveDate {
        add_days(self.anchor, self.total_days as i64 - 1)
    }

    pub fn content_width(&self) -> f32 {
        self.total_days as f32 * self.day_width
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.anchor && date <= self.last_day()
    }

    pub fn days(&self) -> Vec<Day> {
        (0..self.total_days as i64)
            .map(|i| Day::new(add_days(self.anchor, i)))
            .collect()
    }

    /// Convert a date to an x offset from the anchor.
    pub fn date_to_offset(&self, date: NaiveDate) -> f32 {
        days_between(self.anchor, date) as f32 * self.day_width
    }

    /// Convert an x offset back to a date, rounding to the nearest day boundary.
    pub fn offset_to_date(&self, x: f32) -> NaiveDate {
        let days = (x / self.day_width).round() as i64;
        add_days(self.anchor, days)
    }

    /// Prepend `n` days. The matching scroll correction is queued, not applied.
    pub fn extend_backward(&mut self, n: u32) {
        if n == 0 {
            return;
        }
        self.anchor = add_days(self.anchor, -(n as i64));
        self.total_days += n;
        let base = self.pending_scroll.unwrap_or(self.scroll_offset);
        self.pending_scroll = Some(base + n as f32 * self.day_width);
        debug!(days = n, anchor = %self.anchor, "timeline extended backward");
    }

    pub fn extend_forward(&mut self, n: u32) {
        self.total_days += n;
        if n > 0 {
            debug!(days = n, total = self.total_days, "timeline extended forward");
        }
    }

    /// The viewport offset as last reported or applied.
    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    /// Apply and return the queued scroll target, if any. Call once per frame
    /// before laying out the viewport.
    pub fn take_scroll_target(&mut self) -> Option<f32> {
        let target = self.pending_scroll.take()?;
        self.scroll_offset = target.max(0.0);
        Some(self.scroll_offset)
    }

    /// Record the viewport metrics and grow the window when an edge is near.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> Extension {
        let mut ext = Extension::default();
        // A queued correction means the reported offset is stale.
        if self.pending_scroll.is_some() {
            return ext;
        }
        self.scroll_offset = metrics.offset;

        if let Some(n) = self.policy.chunk_for(metrics.offset) {
            self.extend_backward(n);
            ext.backward = n;
        }
        let to_right = metrics.content_width - metrics.offset - metrics.client_width;
        if let Some(n) = self.policy.chunk_for(to_right) {
            self.extend_forward(n);
            ext.forward = n;
        }
        ext
    }

    /// Change the zoom level, keeping the date at the viewport's left edge fixed.
    pub fn set_day_width(&mut self, day_width: f32) {
        let day_width = day_width.max(1.0);
        if (day_width - self.day_width).abs() < f32::EPSILON {
            return;
        }
        let base = self.pending_scroll.unwrap_or(self.scroll_offset);
        let left_days = base / self.day_width;
        self.day_width = day_width;
        self.pending_scroll = Some(left_days * day_width);
    }

    /// Queue a scroll that puts `date` at the centre of a viewport of `client_width`.
    pub fn scroll_to_date(&mut self, date: NaiveDate, client_width: f32) {
        if !self.contains(date) {
            let before = days_between(date, self.anchor);
            if before > 0 {
                self.extend_backward(before as u32 + self.policy.chunk_days);
            }
            let after = days_between(self.last_day(), date);
            if after > 0 {
                self.extend_forward(after as u32 + self.policy.chunk_days);
            }
        }
        let target = self.date_to_offset(date) - client_width / 2.0 + self.day_width / 2.0;
        self.pending_scroll = Some(target.max(0.0));
    }

    /// Runs of days sharing the same month and year.
    pub fn month_blocks(&self) -> Vec<HeaderBlock> {
        run_length(
            &self.days(),
            |d| (d.date.year(), d.date.month()),
            |d| d.date.format("%B %Y").to_string(),
        )
    }

    /// Runs of days sharing the same ISO week.
    pub fn week_blocks(&self) -> Vec<HeaderBlock> {
        run_length(
            &self.days(),
            |d| {
                let w = d.date.iso_week();
                (w.year(), w.week())
            },
            |d| format!("W{}", d.date.iso_week().week()),
        )
    }
}

fn run_length<K: PartialEq>(
    days: &[Day],
    key: impl Fn(&Day) -> K,
    label: impl Fn(&Day) -> String,
) -> Vec<HeaderBlock> {
    let mut blocks: Vec<HeaderBlock> = Vec::new();
    let mut current: Option<K> = None;
    for (i, day) in days.iter().enumerate() {
        let k = key(day);
        match (&current, blocks.last_mut()) {
            (Some(prev), Some(block)) if *prev == k => block.len += 1,
            _ => {
                blocks.push(HeaderBlock {
                    label: label(day),
                    first_day: i,
                    len: 1,
                });
                current = Some(k);
            }
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn window() -> TimelineWindow {
        TimelineWindow::new(d(2025, 1, 1), 90, 10.0)
    }

    #[test]
    fn test_days_are_contiguous() {
        let w = window();
        let days = w.days();
        assert_eq!(days.len(), 90);
        assert_eq!(days[0].date, d(2025, 1, 1));
        assert!(days.windows(2).all(|p| days_between(p[0].date, p[1].date) == 1));
        // 2025-01-04 is a Saturday
        assert!(days[3].is_weekend);
        assert!(!days[5].is_weekend);
    }

    #[test]
    fn test_offset_round_trip() {
        let w = window();
        assert_eq!(w.date_to_offset(d(2025, 1, 11)), 100.0);
        assert_eq!(w.offset_to_date(100.0), d(2025, 1, 11));
        assert_eq!(w.offset_to_date(104.9), d(2025, 1, 11));
        assert_eq!(w.offset_to_date(105.1), d(2025, 1, 12));
        assert_eq!(w.date_to_offset(d(2024, 12, 31)), -10.0);
    }

    #[test]
    fn test_extend_backward_defers_compensation() {
        let mut w = window();
        w.on_scroll(ScrollMetrics {
            offset: 2000.0,
            client_width: 300.0,
            content_width: 5000.0,
        });
        let anchor_date = d(2025, 2, 1);
        let before = w.date_to_offset(anchor_date) - w.scroll_offset();

        w.extend_backward(30);
        assert_eq!(w.anchor(), d(2024, 12, 2));
        assert_eq!(w.total_days(), 90 + 30);

        let target = w.take_scroll_target().unwrap();
        assert_eq!(target, 2000.0 + 300.0);
        assert_eq!(w.date_to_offset(anchor_date) - w.scroll_offset(), before);
        assert!(w.take_scroll_target().is_none());
    }

    #[test]
    fn test_on_scroll_extends_near_edges() {
        let mut w = TimelineWindow::new(d(2025, 1, 1), 400, 10.0);
        // 4000px of content, viewport in the middle: nothing to do.
        let ext = w.on_scroll(ScrollMetrics {
            offset: 1500.0,
            client_width: 1000.0,
            content_width: 4000.0,
        });
        assert!(ext.is_empty());

        // Close to the right edge.
        let ext = w.on_scroll(ScrollMetrics {
            offset: 2500.0,
            client_width: 1000.0,
            content_width: 4000.0,
        });
        assert_eq!(ext, Extension { backward: 0, forward: 30 });
        assert_eq!(w.total_days(), 430);

        // Hard against the left edge uses the far chunk.
        let ext = w.on_scroll(ScrollMetrics {
            offset: 0.0,
            client_width: 1000.0,
            content_width: 4300.0,
        });
        assert_eq!(ext.backward, 90);
        assert_eq!(w.anchor(), add_days(d(2025, 1, 1), -90));
    }

    #[test]
    fn test_on_scroll_ignores_stale_offset_while_correction_pending() {
        let mut w = TimelineWindow::new(d(2025, 1, 1), 400, 10.0);
        let metrics = ScrollMetrics {
            offset: 500.0,
            client_width: 1000.0,
            content_width: 4000.0,
        };
        assert_eq!(w.on_scroll(metrics).backward, 30);
        assert!(w.on_scroll(metrics).is_empty());
        assert_eq!(w.total_days(), 430);
    }

    #[test]
    fn test_zoom_keeps_left_date() {
        let mut w = window();
        w.on_scroll(ScrollMetrics {
            offset: 1200.0,
            client_width: 100.0,
            content_width: 9000.0,
        });
        let left = w.offset_to_date(w.scroll_offset());
        w.set_day_width(20.0);
        let target = w.take_scroll_target().unwrap();
        assert_eq!(w.offset_to_date(target), left);
    }

    #[test]
    fn test_month_and_week_blocks() {
        let w = TimelineWindow::new(d(2025, 1, 27), 14, 10.0);
        let months = w.month_blocks();
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].label, "January 2025");
        assert_eq!(months[0].len, 5);
        assert_eq!(months[1].first_day, 5);
        assert_eq!(months[1].len, 9);

        let weeks = w.week_blocks();
        // 2025-01-27 is a Monday in ISO week 5.
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].label, "W5");
        assert_eq!(weeks[0].len, 7);
        assert_eq!(weeks[1].label, "W6");
    }

    #[test]
    fn test_scroll_to_date_outside_window_extends() {
        let mut w = window();
        w.scroll_to_date(d(2024, 11, 1), 400.0);
        assert!(w.contains(d(2024, 11, 1)));
        let target = w.take_scroll_target().unwrap();
        assert!(target >= 0.0);
    }
}
