use super::{exit_with, parse_uuid, rest};

pub fn command_results(matches: &clap::ArgMatches, uri: &str) {
    let election_id = parse_uuid(matches, "ELECTION");

    match rest::results(uri, election_id) {
        Ok(tallies) => {
            if tallies.is_empty() {
                println!("No votes recorded yet.");
                return;
            }
            for tally in tallies {
                println!("{:>6}  {:>5.1}%  {}", tally.votes, tally.percentage, tally.name);
            }
        }
        Err(e) => exit_with("ballotbox results", &e),
    }
}
