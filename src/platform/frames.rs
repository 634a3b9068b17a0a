/// Per-frame scheduling for the progressive encode loop

use std::time::Duration;

use futures::future::{FutureExt, LocalBoxFuture};

/// Yields control until the next display refresh.
///
/// The raster encoder awaits this between redraws so the event thread stays
/// responsive during capture.
pub trait FrameScheduler {
    fn next_frame(&self) -> LocalBoxFuture<'_, ()>;
}

/// Fixed-interval frames driven by the tokio timer (~60Hz by default)
#[derive(Debug, Clone, Copy)]
pub struct IntervalFrames {
    interval: Duration,
}

impl IntervalFrames {
    pub fn new(interval: Duration) -> Self {
        IntervalFrames { interval }
    }
}

impl Default for IntervalFrames {
    fn default() -> Self {
        Self::new(Duration::from_millis(16))
    }
}

impl FrameScheduler for IntervalFrames {
    fn next_frame(&self) -> LocalBoxFuture<'_, ()> {
        tokio::time::sleep(self.interval).boxed_local()
    }
}
