use super::{exit_with, rest};

pub fn command_verify(matches: &clap::ArgMatches, uri: &str) {
    let code = matches.value_of("CODE").unwrap_or_else(|| {
        eprintln!("ballotbox verify: verification code required");
        std::process::exit(1);
    });

    match rest::verify(uri, code) {
        Ok(vote) => {
            println!("Vote confirmed.");
            println!("  Election:  {}", vote.election_title);
            println!("  Position:  {}", vote.position);
            println!("  Candidate: {}", vote.candidate_name);
            println!("  Cast at:   {}", vote.cast_at);
        }
        Err(e) => exit_with("ballotbox verify", &e),
    }
}
