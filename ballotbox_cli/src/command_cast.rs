use super::{exit_with, parse_uuid, rest};

pub fn command_cast(matches: &clap::ArgMatches, uri: &str) {
    let voter_id = parse_uuid(matches, "VOTER");
    let election_id = parse_uuid(matches, "ELECTION");
    let candidate_id = parse_uuid(matches, "CANDIDATE");

    match rest::cast_vote(uri, voter_id, election_id, candidate_id) {
        Ok(res) => {
            println!("Vote recorded.");
            println!("Verification code: {}", res.verification_code);
            println!("Keep this code: it is the only way to confirm your vote later.");
        }
        Err(e) => exit_with("ballotbox cast", &e),
    }
}
