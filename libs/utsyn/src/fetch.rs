//! Sequencing for filter fetches. Requests are not cancelled on re-submit,
//! so a slow early response can arrive after a fast later one; tagging every
//! request and accepting only the latest tag keeps stale responses from
//! overwriting newer state.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTag(u64);

#[derive(Debug, Default)]
pub struct FetchSequencer {
    issued: u64,
}

impl FetchSequencer {
    pub fn new() -> FetchSequencer {
        FetchSequencer::default()
    }

    /// Tag a new request; every previously issued tag becomes stale.
    pub fn begin(&mut self) -> FetchTag {
        self.issued += 1;
        FetchTag(self.issued)
    }

    /// Whether a response carrying this tag may still be applied.
    pub fn is_current(&self, tag: FetchTag) -> bool {
        tag.0 == self.issued
    }
}
