use serde::{Deserialize, Serialize};

/// Wall-clock time split into whole seconds and nanoseconds, like a ROS stamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Stamp {
    pub secs: i64,
    pub nsecs: u32,
}

impl Stamp {
    pub fn new(secs: i64, nsecs: u32) -> Self {
        Self { secs, nsecs }
    }

    pub fn now() -> Self {
        let now = chrono::Utc::now();
        Self {
            secs: now.timestamp(),
            nsecs: now.timestamp_subsec_nanos(),
        }
    }

    pub fn as_millis(&self) -> i64 {
        self.secs * 1000 + (self.nsecs / 1_000_000) as i64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub stamp: Stamp,
    pub frame_id: String,
}

impl Header {
    pub fn new(stamp: Stamp, frame_id: impl Into<String>) -> Self {
        Self {
            stamp,
            frame_id: frame_id.into(),
        }
    }
}

/// Source of message stamps. The viewer reads it once per tick for the
/// joint state and marker, and again for the transform.
pub trait Clock {
    fn now(&self) -> Stamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Stamp {
        Stamp::now()
    }
}
