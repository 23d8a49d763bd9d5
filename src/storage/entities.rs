use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// One completed timed interval. Created when the timer is saved and never changed afterwards.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize, Clone, Copy)]
pub struct SessionEntity {
    pub seconds: u64,
    /// Moment the session was saved.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl SessionEntity {
    pub fn new(seconds: u64, timestamp: DateTime<Utc>) -> Self {
        Self { seconds, timestamp }
    }
}
