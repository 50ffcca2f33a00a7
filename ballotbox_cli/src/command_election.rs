use super::{exit_with, parse_uuid, rest};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn command_election(matches: &clap::ArgMatches, uri: &str) {
    if let Some(matches) = matches.subcommand_matches("create") {
        command_election_create(matches, uri);
        std::process::exit(0);
    }
    if let Some(matches) = matches.subcommand_matches("list") {
        command_election_list(matches, uri);
        std::process::exit(0);
    }
    if let Some(matches) = matches.subcommand_matches("candidates") {
        command_election_candidates(matches, uri);
        std::process::exit(0);
    }
    if let Some(matches) = matches.subcommand_matches("add-candidate") {
        command_election_add_candidate(matches, uri);
        std::process::exit(0);
    }
    eprintln!("ballotbox election: subcommand required (create, list, candidates, add-candidate)");
    std::process::exit(1);
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn command_election_create(matches: &clap::ArgMatches, uri: &str) {
    let admin_id = parse_uuid(matches, "ADMIN");
    let title = matches.value_of("TITLE").unwrap_or_default();
    let description = matches.value_of("description").unwrap_or_default();
    let hours: u64 = matches
        .value_of("duration-hours")
        .unwrap_or("24")
        .parse()
        .unwrap_or_else(|e| {
            eprintln!("ballotbox election create: bad --duration-hours: {}", e);
            std::process::exit(1);
        });

    let start = now_secs();
    let end = start.saturating_add(hours.saturating_mul(3600));

    match rest::create_election(uri, admin_id, title, description, start, end) {
        Ok(election) => {
            println!("Election created: {}", election.id);
        }
        Err(e) => exit_with("ballotbox election create", &e),
    }
}

fn command_election_list(_matches: &clap::ArgMatches, uri: &str) {
    match rest::list_elections(uri) {
        Ok(elections) => {
            for election in elections {
                let state = if election.active { "active" } else { "closed" };
                println!("{}  {:>6}  {}", election.id, state, election.title);
            }
        }
        Err(e) => exit_with("ballotbox election list", &e),
    }
}

fn command_election_candidates(matches: &clap::ArgMatches, uri: &str) {
    let election_id = parse_uuid(matches, "ELECTION");
    match rest::list_candidates(uri, election_id) {
        Ok(candidates) => {
            for candidate in candidates {
                println!("{}  {}  ({})", candidate.id, candidate.name, candidate.position);
            }
        }
        Err(e) => exit_with("ballotbox election candidates", &e),
    }
}

fn command_election_add_candidate(matches: &clap::ArgMatches, uri: &str) {
    let admin_id = parse_uuid(matches, "ADMIN");
    let election_id = parse_uuid(matches, "ELECTION");
    let name = matches.value_of("NAME").unwrap_or_default();
    let position = matches.value_of("POSITION").unwrap_or_default();

    match rest::add_candidate(uri, admin_id, election_id, name, position) {
        Ok(candidate) => {
            println!("Candidate added: {}", candidate.id);
        }
        Err(e) => exit_with("ballotbox election add-candidate", &e),
    }
}
