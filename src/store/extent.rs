//! Full rewrite and full reload of every extent. Relationship collections
//! are not stored twice: each association lives in one table and both ends
//! are rebuilt from it on load.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::schema::TABLES;
use crate::error::{EntityKind, LibraryError, Result};
use crate::library::Extents;
use crate::models::{
    Affiliation, Book, BookDetails, BookId, Club, ClubDetails, ClubId, Event, EventDetails,
    EventId, IdAllocator, Loan, LoanId, Member, MemberId, Person, PersonDetails, PersonId,
    ReadingGroup, ReadingGroupDetails, ReadingGroupId, Reservation, ReservationId,
};

const NEXT_ID_KEY: &str = "next_id";

/// Replace the stored state with `extents`.
pub(crate) fn write_extents(conn: &mut Connection, extents: &Extents) -> Result<()> {
    let tx = conn.transaction()?;
    for table in TABLES.iter().rev() {
        tx.execute(&format!("DELETE FROM {table}"), [])?;
    }

    tx.execute(
        "INSERT INTO meta (key, value) VALUES (?1, ?2)",
        params![NEXT_ID_KEY, extents.ids.peek() as i64],
    )?;

    for club in extents.clubs.values() {
        tx.execute(
            "INSERT INTO clubs (id, name, description, required_status) VALUES (?1, ?2, ?3, ?4)",
            params![
                club.id.get() as i64,
                club.name,
                club.description,
                club.required_status.map(|status| status.as_str()),
            ],
        )?;
    }

    for group in extents.reading_groups.values() {
        tx.execute(
            "INSERT INTO reading_groups (id, name, focus_category, max_capacity)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                group.id.get() as i64,
                group.name,
                group.focus_category.as_str(),
                group.max_capacity,
            ],
        )?;
    }

    for (id, person) in &extents.persons {
        tx.execute(
            "INSERT INTO persons (id, first_name, last_name, date_of_birth, email, phone_number)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id.get() as i64,
                person.first_name,
                person.last_name,
                person.date_of_birth,
                person.email,
                person.phone_number,
            ],
        )?;
    }

    for member in extents.members.values() {
        let person = &member.person;
        tx.execute(
            "INSERT INTO members (id, first_name, last_name, date_of_birth, email, phone_number,
                                  registration_date, status, blacklisted, club_id, reading_group_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                member.id.get() as i64,
                person.first_name,
                person.last_name,
                person.date_of_birth,
                person.email,
                person.phone_number,
                member.registration_date,
                member.status.as_str(),
                member.blacklisted,
                member.club().map(|id| id.get() as i64),
                member.reading_group().map(|id| id.get() as i64),
            ],
        )?;
    }

    for book in extents.books.values() {
        tx.execute(
            "INSERT INTO books (id, isbn, title, author, publication_year, category, page_count, rating)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                book.id.get() as i64,
                book.isbn,
                book.title,
                book.author,
                book.publication_year,
                book.category.as_str(),
                book.page_count,
                book.rating,
            ],
        )?;
    }

    for event in extents.events.values() {
        tx.execute(
            "INSERT INTO events (id, name, start_time, end_time, location, max_attendees)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.id.get() as i64,
                event.name,
                event.start_time,
                event.end_time,
                event.location,
                event.max_attendees,
            ],
        )?;
        for member in &event.registered {
            tx.execute(
                "INSERT INTO event_registrations (event_id, member_id, attended) VALUES (?1, ?2, ?3)",
                params![
                    event.id.get() as i64,
                    member.get() as i64,
                    event.attended.contains(member),
                ],
            )?;
        }
    }

    let member_positions: BTreeMap<LoanId, usize> = extents
        .members
        .values()
        .flat_map(|member| member.loans.iter().enumerate())
        .map(|(position, loan_id)| (*loan_id, position))
        .collect();
    for book in extents.books.values() {
        for (position, loan_id) in book.loan_history.iter().enumerate() {
            let loan = extents
                .loans
                .get(loan_id)
                .ok_or_else(|| LibraryError::not_found(EntityKind::Loan, *loan_id))?;
            let member_position = member_positions
                .get(loan_id)
                .ok_or_else(|| LibraryError::not_found(EntityKind::Loan, *loan_id))?;
            tx.execute(
                "INSERT INTO loans (id, member_id, book_id, book_position, member_position,
                                    loan_date, due_date, return_date, overdue, late_fee)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    loan.id.get() as i64,
                    loan.member.get() as i64,
                    loan.book.get() as i64,
                    position as i64,
                    *member_position as i64,
                    loan.loan_date,
                    loan.due_date,
                    loan.return_date,
                    loan.overdue,
                    loan.late_fee,
                ],
            )?;
        }
    }

    for member in extents.members.values() {
        for (position, reservation_id) in member.reservations.iter().enumerate() {
            let reservation = extents
                .reservations
                .get(reservation_id)
                .ok_or_else(|| LibraryError::not_found(EntityKind::Reservation, *reservation_id))?;
            tx.execute(
                "INSERT INTO reservations (id, member_id, book_id, member_position,
                                           reservation_date, expiration_date, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    reservation.id.get() as i64,
                    reservation.member.get() as i64,
                    reservation.book.get() as i64,
                    position as i64,
                    reservation.reservation_date,
                    reservation.expiration_date,
                    reservation.status.as_str(),
                ],
            )?;
        }
    }

    tx.commit()?;
    Ok(())
}

/// Rebuild every extent, including both ends of each association.
pub(crate) fn read_extents(conn: &Connection) -> Result<Extents> {
    let mut extents = Extents::default();

    let next_id: Option<i64> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = ?1",
            [NEXT_ID_KEY],
            |row| row.get(0),
        )
        .optional()?;
    extents.ids = IdAllocator::starting_at(next_id.unwrap_or(1) as u64);

    extents.clubs = load_clubs(conn)?;
    extents.reading_groups = load_reading_groups(conn)?;
    extents.persons = load_persons(conn)?;
    extents.members = load_members(conn)?;
    extents.books = load_books(conn)?;
    extents.events = load_events(conn)?;

    link_affiliations(&mut extents)?;
    link_registrations(conn, &mut extents)?;
    link_loans(conn, &mut extents)?;
    link_reservations(conn, &mut extents)?;

    Ok(extents)
}

fn raw_id(row: &Row<'_>, index: usize) -> rusqlite::Result<u64> {
    Ok(row.get::<_, i64>(index)? as u64)
}

/// Parse an enum stored as text, reporting the offending table on failure.
fn parse_text<T>(table: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr<Err = LibraryError>,
{
    value
        .parse()
        .map_err(|err| LibraryError::Corrupt(format!("{table}: {err}")))
}

fn load_clubs(conn: &Connection) -> Result<BTreeMap<ClubId, Club>> {
    let mut stmt = conn.prepare("SELECT id, name, description, required_status FROM clubs ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                raw_id(row, 0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut clubs = BTreeMap::new();
    for (id, name, description, required) in rows {
        let required_status = required
            .map(|status| parse_text("clubs", &status))
            .transpose()?;
        let id = ClubId(id);
        clubs.insert(
            id,
            Club::new(
                id,
                ClubDetails {
                    name,
                    description,
                    required_status,
                },
            ),
        );
    }
    Ok(clubs)
}

fn load_reading_groups(conn: &Connection) -> Result<BTreeMap<ReadingGroupId, ReadingGroup>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, focus_category, max_capacity FROM reading_groups ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                raw_id(row, 0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut groups = BTreeMap::new();
    for (id, name, category, max_capacity) in rows {
        let id = ReadingGroupId(id);
        let details = ReadingGroupDetails {
            name,
            focus_category: parse_text("reading_groups", &category)?,
            max_capacity,
        };
        groups.insert(id, ReadingGroup::new(id, details));
    }
    Ok(groups)
}

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person::from_details(PersonDetails {
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        email: row.get(4)?,
        phone_number: row.get(5)?,
    }))
}

fn load_persons(conn: &Connection) -> Result<BTreeMap<PersonId, Person>> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, date_of_birth, email, phone_number
         FROM persons ORDER BY id",
    )?;
    let persons = stmt
        .query_map([], |row| Ok((PersonId(raw_id(row, 0)?), person_from_row(row)?)))?
        .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
    Ok(persons)
}

/// Members come back without loans, reservations or events; those are
/// linked afterwards. The affiliation is kept so `link_affiliations` can
/// fill the group side.
fn load_members(conn: &Connection) -> Result<BTreeMap<MemberId, Member>> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, date_of_birth, email, phone_number,
                registration_date, status, blacklisted, club_id, reading_group_id
         FROM members ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                raw_id(row, 0)?,
                person_from_row(row)?,
                row.get::<_, chrono::NaiveDate>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, bool>(8)?,
                row.get::<_, Option<i64>>(9)?,
                row.get::<_, Option<i64>>(10)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut members = BTreeMap::new();
    for (id, person, registered, status, blacklisted, club, group) in rows {
        let id = MemberId(id);
        let mut member = Member::new(id, person, parse_text("members", &status)?, registered);
        member.blacklisted = blacklisted;
        member.affiliation = match (club, group) {
            (Some(club), None) => Some(Affiliation::Club(ClubId(club as u64))),
            (None, Some(group)) => Some(Affiliation::ReadingGroup(ReadingGroupId(group as u64))),
            (None, None) => None,
            (Some(_), Some(_)) => {
                return Err(LibraryError::Corrupt(format!(
                    "member {id} is in both a club and a reading group"
                )))
            }
        };
        members.insert(id, member);
    }
    Ok(members)
}

fn load_books(conn: &Connection) -> Result<BTreeMap<BookId, Book>> {
    let mut stmt = conn.prepare(
        "SELECT id, isbn, title, author, publication_year, category, page_count, rating
         FROM books ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                raw_id(row, 0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i32>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, u32>(6)?,
                row.get::<_, Option<f64>>(7)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut books = BTreeMap::new();
    for (id, isbn, title, author, publication_year, category, page_count, rating) in rows {
        let id = BookId(id);
        let mut book = Book::new(
            id,
            BookDetails {
                isbn,
                title,
                author,
                publication_year,
                category: parse_text("books", &category)?,
                page_count,
            },
        );
        book.rating = rating;
        books.insert(id, book);
    }
    Ok(books)
}

fn load_events(conn: &Connection) -> Result<BTreeMap<EventId, Event>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, start_time, end_time, location, max_attendees FROM events ORDER BY id",
    )?;
    let events = stmt
        .query_map([], |row| {
            let id = EventId(raw_id(row, 0)?);
            let details = EventDetails {
                name: row.get(1)?,
                start_time: row.get(2)?,
                end_time: row.get(3)?,
                location: row.get(4)?,
                max_attendees: row.get(5)?,
            };
            Ok((id, Event::new(id, details)))
        })?
        .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
    Ok(events)
}

fn link_affiliations(extents: &mut Extents) -> Result<()> {
    for member in extents.members.values() {
        match member.affiliation {
            Some(Affiliation::Club(club)) => {
                extents
                    .clubs
                    .get_mut(&club)
                    .ok_or_else(|| LibraryError::Corrupt(format!("unknown club {club}")))?
                    .members
                    .insert(member.id);
            }
            Some(Affiliation::ReadingGroup(group)) => {
                extents
                    .reading_groups
                    .get_mut(&group)
                    .ok_or_else(|| LibraryError::Corrupt(format!("unknown reading group {group}")))?
                    .participants
                    .insert(member.id);
            }
            None => {}
        }
    }
    Ok(())
}

fn link_registrations(conn: &Connection, extents: &mut Extents) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT event_id, member_id, attended FROM event_registrations ORDER BY event_id, member_id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                EventId(raw_id(row, 0)?),
                MemberId(raw_id(row, 1)?),
                row.get::<_, bool>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for (event_id, member_id, attended) in rows {
        let event = extents
            .events
            .get_mut(&event_id)
            .ok_or_else(|| LibraryError::Corrupt(format!("unknown event {event_id}")))?;
        let member = extents
            .members
            .get_mut(&member_id)
            .ok_or_else(|| LibraryError::Corrupt(format!("unknown member {member_id}")))?;
        event.registered.insert(member_id);
        member.registered_events.insert(event_id);
        if attended {
            event.attended.insert(member_id);
            member.attended_events.insert(event_id);
        }
    }
    Ok(())
}

/// Loans are re-attached in history order on the book side and attach order
/// on the member side; the borrowed count is derived from the active ones.
fn link_loans(conn: &Connection, extents: &mut Extents) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT id, member_id, book_id, loan_date, due_date, return_date, overdue, late_fee,
                member_position
         FROM loans ORDER BY book_id, book_position",
    )?;
    let rows = stmt
        .query_map([], |row| {
            let mut loan = Loan::new(
                LoanId(raw_id(row, 0)?),
                MemberId(raw_id(row, 1)?),
                BookId(raw_id(row, 2)?),
                row.get(3)?,
                row.get(4)?,
            );
            loan.return_date = row.get(5)?;
            loan.overdue = row.get(6)?;
            loan.late_fee = row.get(7)?;
            Ok((loan, row.get::<_, i64>(8)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut by_member: Vec<_> = rows.iter().collect();
    by_member.sort_by_key(|(loan, position)| (loan.member, *position, loan.id));
    let by_member: Vec<&Loan> = by_member.into_iter().map(|(loan, _)| loan).collect();
    let loans: Vec<&Loan> = rows.iter().map(|(loan, _)| loan).collect();

    for loan in &loans {
        extents
            .books
            .get_mut(&loan.book)
            .ok_or_else(|| LibraryError::Corrupt(format!("loan {} has unknown book", loan.id)))?
            .loan_history
            .push(loan.id);
    }
    for loan in by_member {
        let member = extents
            .members
            .get_mut(&loan.member)
            .ok_or_else(|| LibraryError::Corrupt(format!("loan {} has unknown member", loan.id)))?;
        member.loans.push(loan.id);
        if loan.is_active() {
            member
                .increment_borrowed()
                .map_err(|err| LibraryError::Corrupt(err.to_string()))?;
        }
    }

    extents.loans = rows.into_iter().map(|(loan, _)| (loan.id, loan)).collect();
    Ok(())
}

fn link_reservations(conn: &Connection, extents: &mut Extents) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT id, member_id, book_id, reservation_date, expiration_date, status
         FROM reservations ORDER BY member_id, member_position",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                Reservation::new(
                    ReservationId(raw_id(row, 0)?),
                    MemberId(raw_id(row, 1)?),
                    BookId(raw_id(row, 2)?),
                    row.get(3)?,
                    row.get(4)?,
                ),
                row.get::<_, String>(5)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for (mut reservation, status) in rows {
        reservation.status = parse_text("reservations", &status)?;
        let id = reservation.id;
        extents
            .members
            .get_mut(&reservation.member)
            .ok_or_else(|| LibraryError::Corrupt(format!("reservation {id} has unknown member")))?
            .reservations
            .push(id);
        extents
            .books
            .get_mut(&reservation.book)
            .ok_or_else(|| LibraryError::Corrupt(format!("reservation {id} has unknown book")))?
            .reservations
            .push(id);
        extents.reservations.insert(id, reservation);
    }

    for book in extents.books.values_mut() {
        book.reservations.sort();
    }
    Ok(())
}
