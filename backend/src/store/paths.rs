//! Document paths

use chrono::NaiveDate;

pub const USERS: &str = "users";

pub fn user(uid: &str) -> String {
    format!("{}/{}", USERS, uid)
}

pub fn water(uid: &str) -> String {
    format!("{}/water/current", user(uid))
}

pub fn supplements(uid: &str) -> String {
    format!("{}/supplements", user(uid))
}

pub fn supplement(uid: &str, id: &str) -> String {
    format!("{}/{}", supplements(uid), id)
}

/// Daily consumption counts, keyed by local date
pub fn supplement_stats(uid: &str, date: NaiveDate) -> String {
    format!("{}/supplementStats/{}", user(uid), date.format("%Y-%m-%d"))
}

pub fn routines(uid: &str) -> String {
    format!("{}/routines", user(uid))
}

pub fn timers(uid: &str) -> String {
    format!("{}/timers", user(uid))
}

pub fn calendar_events(uid: &str) -> String {
    format!("{}/calendarEvents", user(uid))
}

/// Collection part of a document path (`""` for a top-level name)
pub fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

/// Last segment of a path
pub fn id_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, id)| id).unwrap_or(path)
}
