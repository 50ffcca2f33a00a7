#[macro_use]
extern crate rocket;
#[macro_use]
extern crate serde;
#[macro_use]
extern crate lazy_static;

mod config;
mod db;
mod error;

use ballotbox::{
    Candidate, CandidateTally, Election, Timestamp, VerifiedVote, Vote, VoteEvent, VoteFeed,
    VoterProfile,
};
use db::Db;
use error::ApiError;
use rocket::http::Status;
use rocket::response::stream::{Event, EventStream};
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

lazy_static! {
    pub static ref CONFIG: config::Config = config::Config::from_env();
}

#[derive(Deserialize)]
struct CastRequest {
    voter_id: Uuid,
    election_id: Uuid,
    candidate_id: Uuid,
}

#[derive(Serialize)]
struct CastResponse {
    verification_code: String,
}

/// Record a ballot. The duplicate check is the insert itself: a second
/// submission for the same (voter, election) pair comes back as a 409.
#[post("/vote", data = "<req>")]
async fn cast_vote(
    db: &State<Db>,
    feed: &State<VoteFeed>,
    req: Json<CastRequest>,
) -> Result<(Status, Json<CastResponse>), ApiError> {
    let now = Timestamp::now();

    let voter = db::load_voter(db, req.voter_id)
        .await?
        .ok_or(ballotbox::Error::NotAuthenticated(req.voter_id))?;

    let election = db::load_election(db, req.election_id)
        .await?
        .ok_or(ballotbox::Error::ElectionNotFound(req.election_id))?;
    if !election.is_open(now) {
        return Err(ballotbox::Error::ElectionNotActive(req.election_id).into());
    }

    let candidates = db::load_candidates(db, req.election_id).await?;
    if !candidates.iter().any(|c| c.id == req.candidate_id) {
        return Err(ballotbox::Error::InvalidCandidate {
            candidate: req.candidate_id,
            election: req.election_id,
        }
        .into());
    }

    let vote = Vote::new(voter.id, req.election_id, req.candidate_id, now);
    let vote = db::insert_vote(db, vote).await?;

    feed.publish(VoteEvent {
        election_id: vote.election_id,
        candidate_id: vote.candidate_id,
        cast_at: vote.cast_at,
    });

    Ok((
        Status::Created,
        Json(CastResponse {
            verification_code: vote.verification_code.to_string(),
        }),
    ))
}

#[get("/election/<id>/results")]
async fn election_results(db: &State<Db>, id: Uuid) -> Result<Json<Vec<CandidateTally>>, ApiError> {
    db::load_election(db, id)
        .await?
        .ok_or(ballotbox::Error::ElectionNotFound(id))?;
    let candidates = db::load_candidates(db, id).await?;
    let votes = db::load_votes(db, id).await?;
    Ok(Json(CandidateTally::count(&candidates, &votes)))
}

/// Look up a vote by verification code. The response never names the
/// voter; an unknown or malformed code is a plain 404.
#[get("/verify/<code>")]
async fn verify(db: &State<Db>, code: &str) -> Result<Json<VerifiedVote>, ApiError> {
    let no_match = || ApiError::not_found("No vote is recorded under this code.");

    let parsed = match code.parse() {
        Ok(parsed) => parsed,
        Err(_) => return Err(no_match()),
    };
    let vote = db::load_vote_by_code(db, &parsed).await?.ok_or_else(no_match)?;

    let election = db::load_election(db, vote.election_id)
        .await?
        .ok_or_else(no_match)?;
    let candidates = db::load_candidates(db, vote.election_id).await?;
    let candidate = candidates
        .into_iter()
        .find(|c| c.id == vote.candidate_id)
        .ok_or_else(no_match)?;

    Ok(Json(VerifiedVote {
        election_title: election.title,
        position: candidate.position,
        candidate_name: candidate.name,
        cast_at: vote.cast_at,
    }))
}

#[get("/elections")]
async fn list_elections(db: &State<Db>) -> Result<Json<Vec<Election>>, ApiError> {
    Ok(Json(db::load_elections(db).await?))
}

#[get("/election/<id>/candidates")]
async fn list_candidates(db: &State<Db>, id: Uuid) -> Result<Json<Vec<Candidate>>, ApiError> {
    db::load_election(db, id)
        .await?
        .ok_or(ballotbox::Error::ElectionNotFound(id))?;
    Ok(Json(db::load_candidates(db, id).await?))
}

/// Live, anonymous vote events for one election, as server-sent events.
#[get("/election/<id>/feed")]
fn election_feed(feed: &State<VoteFeed>, id: Uuid) -> EventStream![] {
    let mut sub = feed.subscribe(id);
    EventStream! {
        while let Some(event) = sub.next().await {
            yield Event::json(&event);
        }
    }
}

// Administration
// --------------

#[derive(Deserialize)]
struct CreateElectionRequest {
    admin_id: Uuid,
    title: String,
    description: String,
    start: Timestamp,
    end: Timestamp,
}

#[post("/election", data = "<req>")]
async fn create_election(
    db: &State<Db>,
    req: Json<CreateElectionRequest>,
) -> Result<(Status, Json<Election>), ApiError> {
    require_admin(db, req.admin_id).await?;
    let election = Election::new(
        &req.title,
        &req.description,
        req.start,
        req.end,
        req.admin_id,
    )
    .map_err(ballotbox::Error::from)?;
    db::insert_election(db, &election).await?;
    Ok((Status::Created, Json(election)))
}

#[derive(Deserialize)]
struct AddCandidateRequest {
    admin_id: Uuid,
    name: String,
    position: String,
}

#[post("/election/<id>/candidate", data = "<req>")]
async fn add_candidate(
    db: &State<Db>,
    id: Uuid,
    req: Json<AddCandidateRequest>,
) -> Result<(Status, Json<Candidate>), ApiError> {
    require_admin(db, req.admin_id).await?;
    db::load_election(db, id)
        .await?
        .ok_or(ballotbox::Error::ElectionNotFound(id))?;
    let candidate =
        Candidate::new(id, &req.name, &req.position).map_err(ballotbox::Error::from)?;
    db::insert_candidate(db, &candidate).await?;
    Ok((Status::Created, Json(candidate)))
}

#[derive(Deserialize)]
struct SetActiveRequest {
    admin_id: Uuid,
    active: bool,
}

#[post("/election/<id>/active", data = "<req>")]
async fn set_election_active(
    db: &State<Db>,
    id: Uuid,
    req: Json<SetActiveRequest>,
) -> Result<Json<Election>, ApiError> {
    require_admin(db, req.admin_id).await?;
    let mut election = db::load_election(db, id)
        .await?
        .ok_or(ballotbox::Error::ElectionNotFound(id))?;
    election.active = req.active;
    sqlx::query("UPDATE elections SET is_active = ? WHERE id = ?")
        .bind(election.active as i64)
        .bind(election.id.to_string())
        .execute(&**db)
        .await?;
    Ok(Json(election))
}

#[derive(Deserialize)]
struct RegisterVoterRequest {
    id: Uuid,
    display_name: String,
}

/// First-login registration. Re-registering an existing voter returns the
/// stored profile unchanged.
#[post("/voter", data = "<req>")]
async fn register_voter(
    db: &State<Db>,
    req: Json<RegisterVoterRequest>,
) -> Result<Json<VoterProfile>, ApiError> {
    let profile = VoterProfile::new(req.id, &req.display_name);
    Ok(Json(db::upsert_voter(db, &profile).await?))
}

#[derive(Deserialize)]
struct RegisterBiometricRequest {
    credential_id: String,
}

#[post("/voter/<id>/biometric", data = "<req>")]
async fn register_biometric(
    db: &State<Db>,
    id: Uuid,
    req: Json<RegisterBiometricRequest>,
) -> Result<Status, ApiError> {
    let updated = db::set_biometric(db, id, &req.credential_id, Timestamp::now()).await?;
    if !updated {
        return Err(ballotbox::Error::NotAuthenticated(id).into());
    }
    Ok(Status::NoContent)
}

#[derive(Deserialize)]
struct GrantAdminRequest {
    admin_id: Uuid,
}

/// Grant the admin flag to an existing voter. Admins only; the first admin
/// comes from `BALLOTBOXD_ADMIN_ID` at startup.
#[post("/voter/<id>/admin", data = "<req>")]
async fn grant_admin(
    db: &State<Db>,
    id: Uuid,
    req: Json<GrantAdminRequest>,
) -> Result<Status, ApiError> {
    require_admin(db, req.admin_id).await?;
    if !db::set_admin(db, id).await? {
        return Err(ballotbox::Error::NotAuthenticated(id).into());
    }
    Ok(Status::NoContent)
}

async fn require_admin(db: &Db, voter_id: Uuid) -> Result<VoterProfile, ApiError> {
    let voter = db::load_voter(db, voter_id)
        .await?
        .ok_or(ballotbox::Error::NotAuthenticated(voter_id))?;
    if !voter.is_admin {
        return Err(ballotbox::Error::NotAuthorized(voter_id).into());
    }
    Ok(voter)
}

#[launch]
fn rocket() -> _ {
    rocket::build()
        .attach(db::stage())
        .manage(VoteFeed::new())
        .mount(
            "/api",
            routes![
                cast_vote,
                election_results,
                verify,
                list_elections,
                list_candidates,
                election_feed,
                create_election,
                add_candidate,
                set_election_active,
                register_voter,
                register_biometric,
                grant_admin,
            ],
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::local::blocking::Client;
    use rocket::serde::json::{json, Value};

    // One scenario over one temp database: CONFIG is process-global, so the
    // whole admin-and-cast flow runs in a single test.
    #[test]
    fn admin_bootstrap_cast_and_grant() {
        let admin_id = Uuid::new_v4();
        let db_path = std::env::temp_dir().join(format!(
            "ballotboxd-test-{}.sqlite.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&db_path);
        std::env::set_var("BALLOTBOXD_DB_PATH", &db_path);
        std::env::set_var("BALLOTBOXD_ADMIN_ID", admin_id.to_string());

        let client = Client::tracked(rocket()).expect("valid rocket instance");

        // The seeded admin can create an election and a candidate.
        let res = client
            .post("/api/election")
            .json(&json!({
                "admin_id": admin_id,
                "title": "Board 2026",
                "description": "",
                "start": 0,
                "end": 4_102_444_800u64,
            }))
            .dispatch();
        assert_eq!(res.status(), Status::Created);
        let election: Value = res.into_json().unwrap();
        let election_id = election["id"].as_str().unwrap().to_owned();

        let res = client
            .post(format!("/api/election/{}/candidate", election_id))
            .json(&json!({
                "admin_id": admin_id,
                "name": "Alice",
                "position": "President",
            }))
            .dispatch();
        assert_eq!(res.status(), Status::Created);
        let candidate: Value = res.into_json().unwrap();
        let candidate_id = candidate["id"].as_str().unwrap().to_owned();

        let voter_id = Uuid::new_v4();
        let res = client
            .post("/api/voter")
            .json(&json!({ "id": voter_id, "display_name": "V1" }))
            .dispatch();
        assert_eq!(res.status(), Status::Ok);

        // First ballot is recorded; the unique index refuses the second.
        let ballot = json!({
            "voter_id": voter_id,
            "election_id": election_id,
            "candidate_id": candidate_id,
        });
        let res = client.post("/api/vote").json(&ballot).dispatch();
        assert_eq!(res.status(), Status::Created);
        let body: Value = res.into_json().unwrap();
        assert_eq!(body["verification_code"].as_str().unwrap().len(), 32);

        let res = client.post("/api/vote").json(&ballot).dispatch();
        assert_eq!(res.status(), Status::Conflict);
        let body: Value = res.into_json().unwrap();
        assert_eq!(body["error"], "already_voted");
        assert_eq!(body["retryable"], false);

        // A plain voter cannot reach the admin surface until granted.
        let rogue = json!({
            "admin_id": voter_id,
            "title": "Rogue",
            "description": "",
            "start": 0,
            "end": 10,
        });
        let res = client.post("/api/election").json(&rogue).dispatch();
        assert_eq!(res.status(), Status::Forbidden);

        let res = client
            .post(format!("/api/voter/{}/admin", voter_id))
            .json(&json!({ "admin_id": admin_id }))
            .dispatch();
        assert_eq!(res.status(), Status::NoContent);

        let res = client
            .post("/api/election")
            .json(&json!({
                "admin_id": voter_id,
                "title": "Runoff",
                "description": "",
                "start": 0,
                "end": 4_102_444_800u64,
            }))
            .dispatch();
        assert_eq!(res.status(), Status::Created);

        // Granting to an unknown voter is refused, not silently absorbed.
        let res = client
            .post(format!("/api/voter/{}/admin", Uuid::new_v4()))
            .json(&json!({ "admin_id": admin_id }))
            .dispatch();
        assert_eq!(res.status(), Status::Unauthorized);
    }
}
