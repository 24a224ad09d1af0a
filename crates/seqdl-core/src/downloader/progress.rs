//! Integer progress throttling.

/// Last reported whole percentage of one job. Only moves forward, and only by
/// at least one point at a time, so bursts of sub-percent updates collapse
/// into a single notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProgressCursor {
    last: u8,
}

impl ProgressCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> u8 {
        self.last
    }

    /// Feed a completion in percent. Returns the percentage to report, if any.
    pub fn advance(&mut self, completion: f32) -> Option<u8> {
        // NaN saturates to 0.
        let p = completion.clamp(0.0, 100.0).floor() as u8;
        if p > self.last {
            self.last = p;
            Some(p)
        } else {
            None
        }
    }
}
