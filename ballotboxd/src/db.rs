use crate::error::ApiError;
use ballotbox::*;
use rocket::fairing::{self, AdHoc};
use rocket::{Build, Rocket};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{ConnectOptions, Row};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

pub type Db = sqlx::SqlitePool;

async fn init_db(rocket: Rocket<Build>) -> fairing::Result {
    let opts = SqliteConnectOptions::new()
        .filename(&crate::CONFIG.db_path)
        .create_if_missing(true)
        .disable_statement_logging();

    // A bounded acquire keeps "storage unreachable" a fast, retryable 503
    // instead of a hung request.
    let pool = SqlitePoolOptions::new()
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(opts)
        .await;
    let db = match pool {
        Ok(db) => db,
        Err(e) => {
            log::error!("failed to connect to database: {}", e);
            return Err(rocket);
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
        log::error!("failed to run database migrations: {}", e);
        return Err(rocket);
    }

    if let Some(admin_id) = crate::CONFIG.admin_id {
        if let Err(e) = bootstrap_admin(&db, admin_id).await {
            log::error!("failed to bootstrap admin {}: {}", admin_id, e);
            return Err(rocket);
        }
    }

    Ok(rocket.manage(db))
}

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("SQLx Stage", |rocket| async {
        rocket.attach(AdHoc::try_on_ignite("SQLx Database", init_db))
    })
}

// Row mapping
// -----------

fn parse_uuid(value: String) -> Result<Uuid, ApiError> {
    Uuid::parse_str(&value)
        .map_err(|e| ApiError::unavailable(format!("corrupt row: bad uuid: {}", e)))
}

fn election_from_row(row: &SqliteRow) -> Result<Election, ApiError> {
    Ok(Election {
        id: parse_uuid(row.get("id"))?,
        title: row.get("title"),
        description: row.get("description"),
        start: Timestamp::from_secs(row.get::<i64, _>("start_time") as u64),
        end: Timestamp::from_secs(row.get::<i64, _>("end_time") as u64),
        active: row.get::<i64, _>("is_active") != 0,
        created_by: parse_uuid(row.get("created_by"))?,
    })
}

fn candidate_from_row(row: &SqliteRow) -> Result<Candidate, ApiError> {
    Ok(Candidate {
        id: parse_uuid(row.get("id"))?,
        election_id: parse_uuid(row.get("election_id"))?,
        name: row.get("name"),
        position: row.get("position"),
        bio: row.get("bio"),
        photo_url: row.get("photo_url"),
    })
}

fn voter_from_row(row: &SqliteRow) -> Result<VoterProfile, ApiError> {
    let credential = match row.get::<Option<String>, _>("credential_id") {
        Some(credential_id) => Some(BiometricCredential {
            credential_id,
            registered_at: Timestamp::from_secs(
                row.get::<Option<i64>, _>("credential_registered_at")
                    .unwrap_or(0) as u64,
            ),
        }),
        None => None,
    };
    Ok(VoterProfile {
        id: parse_uuid(row.get("id"))?,
        display_name: row.get("display_name"),
        is_admin: row.get::<i64, _>("is_admin") != 0,
        credential,
    })
}

fn vote_from_row(row: &SqliteRow) -> Result<Vote, ApiError> {
    let code: String = row.get("verification_code");
    let hash: String = row.get("integrity_hash");
    Ok(Vote {
        id: parse_uuid(row.get("id"))?,
        election_id: parse_uuid(row.get("election_id"))?,
        candidate_id: parse_uuid(row.get("candidate_id"))?,
        voter_id: parse_uuid(row.get("voter_id"))?,
        verification_code: VerificationCode::from_str(&code)
            .map_err(|e| ApiError::unavailable(format!("corrupt row: {}", e)))?,
        cast_at: Timestamp::from_secs(row.get::<i64, _>("cast_at") as u64),
        integrity_hash: Some(
            IntegrityHash::from_str(&hash)
                .map_err(|e| ApiError::unavailable(format!("corrupt row: {}", e)))?,
        ),
    })
}

// Queries
// -------

pub async fn load_election(db: &Db, id: Uuid) -> Result<Option<Election>, ApiError> {
    let row = sqlx::query("SELECT * FROM elections WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(db)
        .await?;
    row.as_ref().map(election_from_row).transpose()
}

pub async fn load_elections(db: &Db) -> Result<Vec<Election>, ApiError> {
    let rows = sqlx::query("SELECT * FROM elections ORDER BY start_time")
        .fetch_all(db)
        .await?;
    rows.iter().map(election_from_row).collect()
}

pub async fn load_candidates(db: &Db, election_id: Uuid) -> Result<Vec<Candidate>, ApiError> {
    let rows = sqlx::query("SELECT * FROM candidates WHERE election_id = ? ORDER BY seq")
        .bind(election_id.to_string())
        .fetch_all(db)
        .await?;
    rows.iter().map(candidate_from_row).collect()
}

pub async fn load_voter(db: &Db, id: Uuid) -> Result<Option<VoterProfile>, ApiError> {
    let row = sqlx::query("SELECT * FROM voters WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(db)
        .await?;
    row.as_ref().map(voter_from_row).transpose()
}

pub async fn load_votes(db: &Db, election_id: Uuid) -> Result<Vec<Vote>, ApiError> {
    let rows = sqlx::query("SELECT * FROM votes WHERE election_id = ? ORDER BY rowid")
        .bind(election_id.to_string())
        .fetch_all(db)
        .await?;
    rows.iter().map(vote_from_row).collect()
}

pub async fn load_vote_by_code(
    db: &Db,
    code: &VerificationCode,
) -> Result<Option<Vote>, ApiError> {
    let row = sqlx::query("SELECT * FROM votes WHERE verification_code = ?")
        .bind(code.to_string())
        .fetch_optional(db)
        .await?;
    row.as_ref().map(vote_from_row).transpose()
}

/// Insert a vote. The unique (voter, election) index is the double-vote
/// guard: a conflicting insert fails atomically and surfaces as
/// `AlreadyVoted`. The chain-head read happens in the same transaction as
/// the insert.
pub async fn insert_vote(db: &Db, mut vote: Vote) -> Result<Vote, ApiError> {
    let mut tx = db.begin().await?;

    let prev: Option<String> = sqlx::query_scalar(
        "SELECT integrity_hash FROM votes WHERE election_id = ? ORDER BY rowid DESC LIMIT 1",
    )
    .bind(vote.election_id.to_string())
    .fetch_optional(&mut *tx)
    .await?;
    let prev = prev
        .map(|h| IntegrityHash::from_str(&h))
        .transpose()
        .map_err(|e| ApiError::unavailable(format!("corrupt chain head: {}", e)))?;

    let hash = chain_hash(prev.as_ref(), &vote);
    vote.integrity_hash = Some(hash);

    let inserted = sqlx::query(
        "INSERT INTO votes (id, election_id, candidate_id, voter_id, verification_code, cast_at, integrity_hash) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(vote.id.to_string())
    .bind(vote.election_id.to_string())
    .bind(vote.candidate_id.to_string())
    .bind(vote.voter_id.to_string())
    .bind(vote.verification_code.to_string())
    .bind(vote.cast_at.as_secs() as i64)
    .bind(hash.to_string())
    .execute(&mut *tx)
    .await;

    if let Err(e) = inserted {
        let unique = e
            .as_database_error()
            .map_or(false, |db_err| db_err.is_unique_violation());
        if unique {
            return Err(Error::AlreadyVoted {
                voter: vote.voter_id,
                election: vote.election_id,
            }
            .into());
        }
        return Err(e.into());
    }

    tx.commit().await?;
    Ok(vote)
}

pub async fn insert_election(db: &Db, election: &Election) -> Result<(), ApiError> {
    sqlx::query(
        "INSERT INTO elections (id, title, description, start_time, end_time, is_active, created_by) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(election.id.to_string())
    .bind(&election.title)
    .bind(&election.description)
    .bind(election.start.as_secs() as i64)
    .bind(election.end.as_secs() as i64)
    .bind(election.active as i64)
    .bind(election.created_by.to_string())
    .execute(db)
    .await?;
    Ok(())
}

pub async fn insert_candidate(db: &Db, candidate: &Candidate) -> Result<(), ApiError> {
    sqlx::query(
        "INSERT INTO candidates (id, election_id, name, position, bio, photo_url, seq) \
         VALUES (?, ?, ?, ?, ?, ?, \
             (SELECT COUNT(*) FROM candidates WHERE election_id = ?))",
    )
    .bind(candidate.id.to_string())
    .bind(candidate.election_id.to_string())
    .bind(&candidate.name)
    .bind(&candidate.position)
    .bind(&candidate.bio)
    .bind(&candidate.photo_url)
    .bind(candidate.election_id.to_string())
    .execute(db)
    .await?;
    Ok(())
}

/// First-authentication upsert: creates the profile if absent, otherwise
/// leaves the existing row (and its admin flag) untouched.
pub async fn upsert_voter(db: &Db, voter: &VoterProfile) -> Result<VoterProfile, ApiError> {
    sqlx::query("INSERT INTO voters (id, display_name, is_admin) VALUES (?, ?, 0) ON CONFLICT (id) DO NOTHING")
        .bind(voter.id.to_string())
        .bind(&voter.display_name)
        .execute(db)
        .await?;
    let stored = load_voter(db, voter.id).await?;
    stored.ok_or_else(|| ApiError::unavailable("voter row vanished after upsert".to_owned()))
}

/// Seed the configured admin on startup. A fresh database has no admins,
/// so without this every admin endpoint would be unreachable.
pub async fn bootstrap_admin(db: &Db, admin_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO voters (id, display_name, is_admin) VALUES (?, 'Administrator', 1) \
         ON CONFLICT (id) DO UPDATE SET is_admin = 1",
    )
    .bind(admin_id.to_string())
    .execute(db)
    .await?;
    Ok(())
}

pub async fn set_admin(db: &Db, voter_id: Uuid) -> Result<bool, ApiError> {
    let result = sqlx::query("UPDATE voters SET is_admin = 1 WHERE id = ?")
        .bind(voter_id.to_string())
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_biometric(
    db: &Db,
    voter_id: Uuid,
    credential_id: &str,
    now: Timestamp,
) -> Result<bool, ApiError> {
    let result = sqlx::query(
        "UPDATE voters SET credential_id = ?, credential_registered_at = ? WHERE id = ?",
    )
    .bind(credential_id)
    .bind(now.as_secs() as i64)
    .bind(voter_id.to_string())
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
