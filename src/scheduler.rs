use std::{thread::sleep, time::{Duration, Instant}};

// Never reused once cancelled or delivered
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameHandle(u64);

pub trait FrameScheduler {
    fn now(&self) -> Duration;

    /// Asks for one more frame. Replaces any request still pending.
    fn request_frame(&mut self) -> FrameHandle;

    fn cancel(&mut self, handle: FrameHandle);
}

pub struct IntervalScheduler {
    epoch: Instant,
    interval: Duration,
    next_id: u64,
    pending: Option<FrameHandle>,
    last_delivered: Duration,
}

impl IntervalScheduler {
    pub fn new(interval: Duration) -> Self {
        IntervalScheduler {
            epoch: Instant::now(),
            interval,
            next_id: 0,
            pending: None,
            last_delivered: Duration::ZERO,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    // Sleeps until the pending frame is due
    pub fn next_frame(&mut self) -> Option<(FrameHandle, Duration)> {
        let handle = self.pending?;

        let due = self.last_delivered + self.interval;
        let now = self.now();
        if now < due {
            sleep(due - now);
        }

        self.pending = None;
        let now = self.now();
        self.last_delivered = now;
        Some((handle, now))
    }

    pub fn time_until_due(&self) -> Duration {
        (self.last_delivered + self.interval).saturating_sub(self.now())
    }
}

impl FrameScheduler for IntervalScheduler {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        handle
    }

    fn cancel(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

// Time only moves when a test says so
#[cfg(test)]
pub mod manual {
    use super::*;

    #[derive(Default)]
    pub struct ManualScheduler {
        pub now: Duration,
        next_id: u64,
        pub pending: Option<FrameHandle>,
        pub cancelled: Vec<FrameHandle>,
    }

    impl ManualScheduler {
        pub fn fire_at(&mut self, at: Duration) -> Option<(FrameHandle, Duration)> {
            self.now = at;
            self.pending.take().map(|handle| (handle, at))
        }
    }

    impl FrameScheduler for ManualScheduler {
        fn now(&self) -> Duration {
            self.now
        }

        fn request_frame(&mut self) -> FrameHandle {
            self.next_id += 1;
            let handle = FrameHandle(self.next_id);
            self.pending = Some(handle);
            handle
        }

        fn cancel(&mut self, handle: FrameHandle) {
            self.cancelled.push(handle);
            if self.pending == Some(handle) {
                self.pending = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_request_is_not_delivered() {
        let mut sched = IntervalScheduler::new(Duration::from_millis(1));
        let handle = sched.request_frame();
        sched.cancel(handle);
        assert!(!sched.has_pending());
        assert!(sched.next_frame().is_none());
    }

    #[test]
    fn delivers_each_request_once() {
        let mut sched = IntervalScheduler::new(Duration::from_millis(1));
        let first = sched.request_frame();
        let (delivered, t1) = sched.next_frame().unwrap();
        assert_eq!(delivered, first);
        assert!(sched.next_frame().is_none());

        let second = sched.request_frame();
        assert_ne!(first, second);
        let (delivered, t2) = sched.next_frame().unwrap();
        assert_eq!(delivered, second);
        assert!(t2 >= t1 + Duration::from_millis(1));
    }

    #[test]
    fn newer_request_replaces_older() {
        let mut sched = IntervalScheduler::new(Duration::from_millis(1));
        let old = sched.request_frame();
        let new = sched.request_frame();
        sched.cancel(old);
        assert_eq!(sched.next_frame().map(|(h, _)| h), Some(new));
    }
}
