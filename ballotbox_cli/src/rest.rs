use ballotbox::{Candidate, CandidateTally, Election, VerifiedVote};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The daemon's JSON error envelope.
#[derive(Deserialize, Debug, Clone)]
pub struct ApiErrorBody {
    pub error: String,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug)]
pub enum RestError {
    Transport(reqwest::Error),
    Api(ApiErrorBody),
}

impl std::fmt::Display for RestError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RestError::Transport(e) => write!(f, "{}", e),
            RestError::Api(body) => write!(f, "{}", body.message),
        }
    }
}

impl From<reqwest::Error> for RestError {
    fn from(e: reqwest::Error) -> Self {
        RestError::Transport(e)
    }
}

fn parse<T: serde::de::DeserializeOwned>(
    res: reqwest::blocking::Response,
) -> Result<T, RestError> {
    if res.status().is_success() {
        return Ok(res.json()?);
    }
    let body: ApiErrorBody = res.json()?;
    Err(RestError::Api(body))
}

#[derive(Serialize)]
struct CastRequest {
    voter_id: Uuid,
    election_id: Uuid,
    candidate_id: Uuid,
}

#[derive(Deserialize)]
pub struct CastResponse {
    pub verification_code: String,
}

pub fn cast_vote(
    base_uri: &str,
    voter_id: Uuid,
    election_id: Uuid,
    candidate_id: Uuid,
) -> Result<CastResponse, RestError> {
    let client = reqwest::blocking::Client::new();
    let full_uri = format!("{}/api/vote", base_uri);
    let res = client
        .post(&full_uri)
        .json(&CastRequest {
            voter_id,
            election_id,
            candidate_id,
        })
        .send()?;
    parse(res)
}

pub fn verify(base_uri: &str, code: &str) -> Result<VerifiedVote, RestError> {
    let client = reqwest::blocking::Client::new();
    let full_uri = format!("{}/api/verify/{}", base_uri, code);
    let res = client.get(&full_uri).send()?;
    parse(res)
}

pub fn results(base_uri: &str, election_id: Uuid) -> Result<Vec<CandidateTally>, RestError> {
    let client = reqwest::blocking::Client::new();
    let full_uri = format!("{}/api/election/{}/results", base_uri, election_id);
    let res = client.get(&full_uri).send()?;
    parse(res)
}

pub fn list_elections(base_uri: &str) -> Result<Vec<Election>, RestError> {
    let client = reqwest::blocking::Client::new();
    let full_uri = format!("{}/api/elections", base_uri);
    let res = client.get(&full_uri).send()?;
    parse(res)
}

pub fn list_candidates(base_uri: &str, election_id: Uuid) -> Result<Vec<Candidate>, RestError> {
    let client = reqwest::blocking::Client::new();
    let full_uri = format!("{}/api/election/{}/candidates", base_uri, election_id);
    let res = client.get(&full_uri).send()?;
    parse(res)
}

#[derive(Serialize)]
struct CreateElectionRequest<'a> {
    admin_id: Uuid,
    title: &'a str,
    description: &'a str,
    start: u64,
    end: u64,
}

pub fn create_election(
    base_uri: &str,
    admin_id: Uuid,
    title: &str,
    description: &str,
    start: u64,
    end: u64,
) -> Result<Election, RestError> {
    let client = reqwest::blocking::Client::new();
    let full_uri = format!("{}/api/election", base_uri);
    let res = client
        .post(&full_uri)
        .json(&CreateElectionRequest {
            admin_id,
            title,
            description,
            start,
            end,
        })
        .send()?;
    parse(res)
}

#[derive(Serialize)]
struct AddCandidateRequest<'a> {
    admin_id: Uuid,
    name: &'a str,
    position: &'a str,
}

pub fn add_candidate(
    base_uri: &str,
    admin_id: Uuid,
    election_id: Uuid,
    name: &str,
    position: &str,
) -> Result<Candidate, RestError> {
    let client = reqwest::blocking::Client::new();
    let full_uri = format!("{}/api/election/{}/candidate", base_uri, election_id);
    let res = client
        .post(&full_uri)
        .json(&AddCandidateRequest {
            admin_id,
            name,
            position,
        })
        .send()?;
    parse(res)
}
