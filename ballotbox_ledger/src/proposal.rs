/// A time-boxed yes/no proposal.
///
/// There is no stored "closed" state: a proposal is open exactly while the
/// current time lies within [start, end], and closure is implicit once the
/// window has passed.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Proposal {
    /// Monotonically increasing, allocated by the ledger.
    pub id: u64,
    pub title: String,
    pub description: String,
    pub yes_votes: u32,
    pub no_votes: u32,

    /// Voting window, Unix seconds.
    pub start: u64,
    pub end: u64,
}

impl Proposal {
    pub fn is_open(&self, now: u64) -> bool {
        now >= self.start && now <= self.end
    }
}
