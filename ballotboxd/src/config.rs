use std::env::var;
use uuid::Uuid;

pub struct Config {
    pub db_path: String,

    /// Seed admin for a fresh database. Further admins are granted through
    /// the API by an existing admin.
    pub admin_id: Option<Uuid>,
}

impl Config {
    pub fn from_env() -> Self {
        let db_path = match var("BALLOTBOXD_DB_PATH") {
            Ok(val) => val,
            Err(_e) => "./ballotbox.sqlite.db".to_owned(),
        };

        let admin_id = match var("BALLOTBOXD_ADMIN_ID") {
            Ok(val) => match val.parse::<Uuid>() {
                Ok(id) => Some(id),
                Err(e) => {
                    log::warn!("ignoring BALLOTBOXD_ADMIN_ID, not a valid uuid: {}", e);
                    None
                }
            },
            Err(_e) => None,
        };

        Config { db_path, admin_id }
    }
}
