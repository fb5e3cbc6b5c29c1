#![forbid(unsafe_code)]

use crate::ids::UserId;
use time::{Date, OffsetDateTime};

/// Who performs a mutation and when. Every write that touches audit columns
/// or change history takes one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Audit {
    pub actor: UserId,
    pub at: OffsetDateTime,
}

impl Audit {
    pub fn new(actor: UserId, at: OffsetDateTime) -> Self {
        Self { actor, at }
    }

    pub fn now(actor: UserId) -> Self {
        Self::new(actor, OffsetDateTime::now_utc())
    }

    pub fn date(&self) -> Date {
        self.at.date()
    }
}
