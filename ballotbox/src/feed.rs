use crate::*;
use tokio::sync::broadcast;
use uuid::Uuid;

/// A vote-insert notification for live result displays.
///
/// Carries only what a public tally needs; no voter id and no verification
/// code ever travel over the feed.
#[derive(Serialize, Clone, Debug)]
pub struct VoteEvent {
    pub election_id: Uuid,
    pub candidate_id: Uuid,
    pub cast_at: Timestamp,
}

/// Publish/subscribe fan-out of vote events.
///
/// Backed by a broadcast channel: publishing never blocks, a subscriber
/// that falls too far behind skips ahead, and dropping a subscription is
/// all the cleanup there is. Pollers that cannot hold a subscription can
/// simply re-run the tally.
#[derive(Clone)]
pub struct VoteFeed {
    tx: broadcast::Sender<VoteEvent>,
}

impl VoteFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1024);
        VoteFeed { tx }
    }

    /// Publish an event. A feed with no subscribers swallows it.
    pub fn publish(&self, event: VoteEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to vote events scoped to one election.
    pub fn subscribe(&self, election_id: Uuid) -> VoteSubscription {
        VoteSubscription {
            rx: self.tx.subscribe(),
            election_id,
        }
    }
}

impl Default for VoteFeed {
    fn default() -> Self {
        VoteFeed::new()
    }
}

/// A live subscription to one election's vote events.
pub struct VoteSubscription {
    rx: broadcast::Receiver<VoteEvent>,
    election_id: Uuid,
}

impl VoteSubscription {
    /// Wait for the next event in this election. `None` once the feed is
    /// gone.
    pub async fn next(&mut self) -> Option<VoteEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.election_id == self.election_id => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant: the next already-queued event in this
    /// election, if any.
    pub fn try_next(&mut self) -> Option<VoteEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if event.election_id == self.election_id => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
