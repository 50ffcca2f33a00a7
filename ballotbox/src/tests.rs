use super::*;
use std::sync::{Arc, Barrier};
use std::thread;
use uuid::Uuid;

fn open_election(ballot_box: &BallotBox<MemStore>, admin_id: Uuid) -> (Election, Vec<Candidate>) {
    let election = ballot_box
        .create_election(
            admin_id,
            "Student Council 2026",
            "Annual student council election",
            Timestamp::from_secs(0),
            Timestamp::from_secs(1_000_000),
        )
        .unwrap();
    let alice = ballot_box
        .add_candidate(admin_id, election.id, "Alice", "President")
        .unwrap();
    let bob = ballot_box
        .add_candidate(admin_id, election.id, "Bob", "President")
        .unwrap();
    (election, vec![alice, bob])
}

fn bootstrap_admin(ballot_box: &BallotBox<MemStore>) -> Uuid {
    let admin_id = Uuid::new_v4();
    let mut admin = VoterProfile::new(admin_id, "Admin");
    admin.is_admin = true;
    ballot_box.store().put_voter(admin).unwrap();
    admin_id
}

#[test]
fn end_to_end_election() {
    let ballot_box = BallotBox::new(MemStore::default());
    let admin_id = bootstrap_admin(&ballot_box);
    let (election, candidates) = open_election(&ballot_box, admin_id);
    let (alice, bob) = (&candidates[0], &candidates[1]);

    // V1 authenticates for the first time and casts for Alice.
    let v1 = ballot_box.register_voter(Uuid::new_v4(), "V1").unwrap();
    let code = ballot_box
        .cast_vote(v1.id, election.id, alice.id, Timestamp::from_secs(10))
        .unwrap();
    assert!(!code.to_string().is_empty());

    // A second attempt by V1, even for a different candidate, is refused.
    let second = ballot_box.cast_vote(v1.id, election.id, bob.id, Timestamp::from_secs(11));
    assert!(matches!(second, Err(Error::AlreadyVoted { .. })));
    assert!(!second.unwrap_err().is_retryable());

    // The code round-trips to the recorded choice, repeatably.
    let verified = ballot_box.verify(&code.to_string()).unwrap().unwrap();
    assert_eq!(verified.election_title, election.title);
    assert_eq!(verified.candidate_name, "Alice");
    assert_eq!(verified.position, "President");
    assert_eq!(
        ballot_box.verify(&code.to_string()).unwrap().unwrap(),
        verified
    );

    // Tally: one vote, 100%.
    let results = ballot_box.tally(election.id).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "Alice");
    assert_eq!(results[0].votes, 1);
    assert!((results[0].percentage - 100.0).abs() < 1e-9);

    // A second voter splits the tally and the chain still verifies.
    let v2 = ballot_box.register_voter(Uuid::new_v4(), "V2").unwrap();
    ballot_box
        .cast_vote(v2.id, election.id, bob.id, Timestamp::from_secs(12))
        .unwrap();
    let results = ballot_box.tally(election.id).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results.iter().map(|r| r.votes).sum::<usize>(), 2);

    let votes = ballot_box.store().votes(election.id).unwrap();
    verify_chain(&votes).unwrap();
}

#[test]
fn concurrent_double_submit_yields_one_vote() {
    const ATTEMPTS: usize = 16;

    let ballot_box = Arc::new(BallotBox::new(MemStore::default()));
    let admin_id = bootstrap_admin(&ballot_box);
    let (election, candidates) = open_election(&ballot_box, admin_id);
    let voter = ballot_box.register_voter(Uuid::new_v4(), "V1").unwrap();

    // All threads submit for the same voter at once (the two-tabs race).
    let barrier = Arc::new(Barrier::new(ATTEMPTS));
    let mut handles = Vec::new();
    for i in 0..ATTEMPTS {
        let ballot_box = Arc::clone(&ballot_box);
        let barrier = Arc::clone(&barrier);
        let candidate_id = candidates[i % candidates.len()].id;
        let voter_id = voter.id;
        let election_id = election.id;
        handles.push(thread::spawn(move || {
            barrier.wait();
            ballot_box.cast_vote(voter_id, election_id, candidate_id, Timestamp::from_secs(10))
        }));
    }

    let mut successes = 0;
    let mut already_voted = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => successes += 1,
            Err(Error::AlreadyVoted { .. }) => already_voted += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(already_voted, ATTEMPTS - 1);
    assert_eq!(ballot_box.store().votes(election.id).unwrap().len(), 1);
}

#[test]
fn distinct_voters_all_count() {
    const VOTERS: usize = 8;

    let ballot_box = Arc::new(BallotBox::new(MemStore::default()));
    let admin_id = bootstrap_admin(&ballot_box);
    let (election, candidates) = open_election(&ballot_box, admin_id);

    let mut handles = Vec::new();
    for i in 0..VOTERS {
        let ballot_box = Arc::clone(&ballot_box);
        let candidate_id = candidates[i % candidates.len()].id;
        let election_id = election.id;
        let voter = ballot_box
            .register_voter(Uuid::new_v4(), &format!("V{}", i))
            .unwrap();
        handles.push(thread::spawn(move || {
            ballot_box.cast_vote(voter.id, election_id, candidate_id, Timestamp::from_secs(10))
        }));
    }
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let results = ballot_box.tally(election.id).unwrap();
    assert_eq!(results.iter().map(|r| r.votes).sum::<usize>(), VOTERS);
    let percent: f64 = results.iter().map(|r| r.percentage).sum();
    assert!((percent - 100.0).abs() < 1e-9);

    // Concurrent inserts still form a valid chain.
    let votes = ballot_box.store().votes(election.id).unwrap();
    verify_chain(&votes).unwrap();
}
