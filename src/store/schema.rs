use std::fs;
use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

/// Tables in the order they are created. Dropping rows runs in reverse so
/// foreign keys never dangle mid-rewrite.
pub(crate) const TABLES: &[&str] = &[
    "meta",
    "clubs",
    "reading_groups",
    "persons",
    "members",
    "books",
    "events",
    "event_registrations",
    "loans",
    "reservations",
];

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS clubs (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        required_status TEXT
    )",
    "CREATE TABLE IF NOT EXISTS reading_groups (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        focus_category TEXT NOT NULL,
        max_capacity INTEGER NOT NULL CHECK (max_capacity > 0)
    )",
    "CREATE TABLE IF NOT EXISTS persons (
        id INTEGER PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        date_of_birth TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE COLLATE NOCASE,
        phone_number TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS members (
        id INTEGER PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        date_of_birth TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE COLLATE NOCASE,
        phone_number TEXT NOT NULL,
        registration_date TEXT NOT NULL,
        status TEXT NOT NULL,
        blacklisted INTEGER NOT NULL DEFAULT 0,
        club_id INTEGER REFERENCES clubs(id),
        reading_group_id INTEGER REFERENCES reading_groups(id),
        CHECK (club_id IS NULL OR reading_group_id IS NULL)
    )",
    "CREATE TABLE IF NOT EXISTS books (
        id INTEGER PRIMARY KEY,
        isbn TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        publication_year INTEGER NOT NULL,
        category TEXT NOT NULL,
        page_count INTEGER NOT NULL CHECK (page_count > 0),
        rating REAL
    )",
    "CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        location TEXT NOT NULL,
        max_attendees INTEGER NOT NULL CHECK (max_attendees > 0)
    )",
    "CREATE TABLE IF NOT EXISTS event_registrations (
        event_id INTEGER NOT NULL REFERENCES events(id),
        member_id INTEGER NOT NULL REFERENCES members(id),
        attended INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (event_id, member_id)
    )",
    "CREATE TABLE IF NOT EXISTS loans (
        id INTEGER PRIMARY KEY,
        member_id INTEGER NOT NULL REFERENCES members(id),
        book_id INTEGER NOT NULL REFERENCES books(id),
        book_position INTEGER NOT NULL,
        member_position INTEGER NOT NULL,
        loan_date TEXT NOT NULL,
        due_date TEXT NOT NULL,
        return_date TEXT,
        overdue INTEGER NOT NULL DEFAULT 0,
        late_fee REAL NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS reservations (
        id INTEGER PRIMARY KEY,
        member_id INTEGER NOT NULL REFERENCES members(id),
        book_id INTEGER NOT NULL REFERENCES books(id),
        member_position INTEGER NOT NULL,
        reservation_date TEXT NOT NULL,
        expiration_date TEXT NOT NULL,
        status TEXT NOT NULL
    )",
];

/// Make sure the database file's directory exists and open it.
pub(crate) fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Enable foreign keys and create any missing table. Safe to run on every
/// start.
pub(crate) fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    for statement in SCHEMA {
        conn.execute(statement, [])?;
    }
    Ok(())
}
