use crate::*;
use uuid::Uuid;

/// An election that voters cast ballots in.
///
/// Created by an administrator. After creation only the active flag and the
/// time window may change; an election is never deleted while votes
/// reference it.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Election {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start: Timestamp,
    pub end: Timestamp,
    pub active: bool,

    /// The administrator who created the election.
    pub created_by: Uuid,
}

impl Election {
    pub fn new(
        title: &str,
        description: &str,
        start: Timestamp,
        end: Timestamp,
        created_by: Uuid,
    ) -> Result<Self, ValidationError> {
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if end <= start {
            return Err(ValidationError::WindowEndsBeforeStart);
        }
        Ok(Election {
            id: Uuid::new_v4(),
            title: title.to_owned(),
            description: description.to_owned(),
            start,
            end,
            active: true,
            created_by,
        })
    }

    /// Whether ballots may be cast right now: the active flag is set and
    /// `now` lies within [start, end].
    pub fn is_open(&self, now: Timestamp) -> bool {
        self.active && now >= self.start && now <= self.end
    }
}

/// A candidate standing in exactly one election.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Candidate {
    pub id: Uuid,
    pub election_id: Uuid,
    pub name: String,

    /// Position label, e.g. "President" or "Treasurer".
    pub position: String,

    pub bio: Option<String>,
    pub photo_url: Option<String>,
}

impl Candidate {
    pub fn new(election_id: Uuid, name: &str, position: &str) -> Result<Self, ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyCandidateName);
        }
        if position.trim().is_empty() {
            return Err(ValidationError::EmptyPosition);
        }
        Ok(Candidate {
            id: Uuid::new_v4(),
            election_id,
            name: name.to_owned(),
            position: position.to_owned(),
            bio: None,
            photo_url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn election_window() {
        let admin = Uuid::new_v4();
        let election = Election::new(
            "Board 2026",
            "",
            Timestamp::from_secs(100),
            Timestamp::from_secs(200),
            admin,
        )
        .unwrap();

        assert!(!election.is_open(Timestamp::from_secs(99)));
        assert!(election.is_open(Timestamp::from_secs(100)));
        assert!(election.is_open(Timestamp::from_secs(200)));
        assert!(!election.is_open(Timestamp::from_secs(201)));

        let mut closed = election.clone();
        closed.active = false;
        assert!(!closed.is_open(Timestamp::from_secs(150)));
    }

    #[test]
    fn election_validation() {
        let admin = Uuid::new_v4();
        assert_eq!(
            Election::new(
                "  ",
                "",
                Timestamp::from_secs(0),
                Timestamp::from_secs(1),
                admin
            )
            .unwrap_err(),
            ValidationError::EmptyTitle
        );
        assert_eq!(
            Election::new(
                "Board 2026",
                "",
                Timestamp::from_secs(5),
                Timestamp::from_secs(5),
                admin
            )
            .unwrap_err(),
            ValidationError::WindowEndsBeforeStart
        );
    }

    #[test]
    fn candidate_validation() {
        let election_id = Uuid::new_v4();
        assert!(Candidate::new(election_id, "Alice", "President").is_ok());
        assert_eq!(
            Candidate::new(election_id, "", "President").unwrap_err(),
            ValidationError::EmptyCandidateName
        );
        assert_eq!(
            Candidate::new(election_id, "Alice", "").unwrap_err(),
            ValidationError::EmptyPosition
        );
    }
}
