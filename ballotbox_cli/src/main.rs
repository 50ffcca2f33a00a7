use clap::{App, Arg, SubCommand};
use uuid::Uuid;

mod command_cast;
mod command_election;
mod command_results;
mod command_verify;
mod rest;

fn main() {
    let matches = App::new("BallotBox CLI")
        .version("1.0")
        .about("Interacts with a ballotbox daemon")
        .arg(
            Arg::with_name("uri")
                .long("uri")
                .takes_value(true)
                .help("Set the ballotbox uri - can also be set with BALLOTBOX_URI")
                .required(false),
        )
        .subcommand(
            SubCommand::with_name("cast")
                .about("Cast a ballot")
                .arg(Arg::with_name("VOTER").index(1).required(true))
                .arg(Arg::with_name("ELECTION").index(2).required(true))
                .arg(Arg::with_name("CANDIDATE").index(3).required(true)),
        )
        .subcommand(
            SubCommand::with_name("verify")
                .about("Confirm a recorded vote by verification code")
                .arg(Arg::with_name("CODE").index(1).required(true)),
        )
        .subcommand(
            SubCommand::with_name("results")
                .about("Show current results for an election")
                .arg(Arg::with_name("ELECTION").index(1).required(true)),
        )
        .subcommand(
            SubCommand::with_name("election")
                .about("Manage elections")
                .subcommand(
                    SubCommand::with_name("create")
                        .about("Create an election (admin)")
                        .arg(Arg::with_name("ADMIN").index(1).required(true))
                        .arg(Arg::with_name("TITLE").index(2).required(true))
                        .arg(
                            Arg::with_name("description")
                                .long("description")
                                .takes_value(true),
                        )
                        .arg(
                            Arg::with_name("duration-hours")
                                .long("duration-hours")
                                .takes_value(true)
                                .help("Voting window length in hours (default 24)"),
                        ),
                )
                .subcommand(SubCommand::with_name("list").about("List elections"))
                .subcommand(
                    SubCommand::with_name("candidates")
                        .about("List an election's candidates")
                        .arg(Arg::with_name("ELECTION").index(1).required(true)),
                )
                .subcommand(
                    SubCommand::with_name("add-candidate")
                        .about("Add a candidate to an election (admin)")
                        .arg(Arg::with_name("ADMIN").index(1).required(true))
                        .arg(Arg::with_name("ELECTION").index(2).required(true))
                        .arg(Arg::with_name("NAME").index(3).required(true))
                        .arg(Arg::with_name("POSITION").index(4).required(true)),
                ),
        )
        .get_matches();

    let env_var = std::env::var("BALLOTBOX_URI");
    let uri = match matches.value_of("uri") {
        Some(uri) => uri.to_owned(),
        None => env_var.unwrap_or_else(|_| "http://localhost:8000".to_owned()),
    };

    // Subcommands
    if let Some(matches) = matches.subcommand_matches("cast") {
        command_cast::command_cast(matches, &uri);
        std::process::exit(0);
    }
    if let Some(matches) = matches.subcommand_matches("verify") {
        command_verify::command_verify(matches, &uri);
        std::process::exit(0);
    }
    if let Some(matches) = matches.subcommand_matches("results") {
        command_results::command_results(matches, &uri);
        std::process::exit(0);
    }
    if let Some(matches) = matches.subcommand_matches("election") {
        command_election::command_election(matches, &uri);
        std::process::exit(0);
    }

    eprintln!("ballotbox: no subcommand given, try --help");
    std::process::exit(1);
}

/// Parse a required uuid positional argument, exiting with a message on
/// bad input.
pub fn parse_uuid(matches: &clap::ArgMatches, name: &str) -> Uuid {
    let raw = matches.value_of(name).unwrap_or_default();
    Uuid::parse_str(raw).unwrap_or_else(|e| {
        eprintln!("ballotbox: {} is not a valid uuid: {}", raw, e);
        std::process::exit(1);
    })
}

/// Print a failed request and exit. Retryable failures say so.
pub fn exit_with(context: &str, err: &rest::RestError) -> ! {
    match err {
        rest::RestError::Api(body) if body.retryable => {
            eprintln!("{}: {} (safe to retry)", context, body.message);
        }
        _ => eprintln!("{}: {}", context, err),
    }
    std::process::exit(1);
}
