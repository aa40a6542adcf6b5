//! Demo catalog used by the `seed` subcommand and by the browser when it
//! starts on an empty store. Everything goes through the public library
//! operations, so the seed data obeys the same rules as user input.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::info;

use crate::error::{LibraryError, Result};
use crate::library::Library;
use crate::models::{
    BookCategory, BookDetails, ClubDetails, EventDetails, MembershipStatus, PersonDetails,
    ReadingGroupDetails,
};

fn offset(today: NaiveDate, days: i64) -> NaiveDate {
    today + Duration::days(days)
}

fn at(date: NaiveDate, hour: u32) -> Result<NaiveDateTime> {
    date.and_hms_opt(hour, 0, 0)
        .ok_or_else(|| LibraryError::validation("event time", format!("invalid hour {hour}")))
}

fn person(
    first: &str,
    last: &str,
    born: (i32, u32, u32),
    email: &str,
    phone: &str,
) -> Result<PersonDetails> {
    let date_of_birth = NaiveDate::from_ymd_opt(born.0, born.1, born.2)
        .ok_or_else(|| LibraryError::validation("date of birth", "invalid calendar date"))?;
    Ok(PersonDetails {
        first_name: first.into(),
        last_name: last.into(),
        date_of_birth,
        email: email.into(),
        phone_number: phone.into(),
    })
}

fn book(
    isbn: &str,
    title: &str,
    author: &str,
    year: i32,
    category: BookCategory,
    pages: u32,
) -> BookDetails {
    BookDetails {
        isbn: isbn.into(),
        title: title.into(),
        author: author.into(),
        publication_year: year,
        category,
        page_count: pages,
    }
}

/// Fill an empty library with sample data. Returns `false` and leaves the
/// library alone when it already holds anything.
pub fn seed_demo(library: &mut Library) -> Result<bool> {
    if !library.is_empty() {
        return Ok(false);
    }
    let today = library.clock().today();

    let dune = library.add_book(book(
        "978-0-306-40615-7",
        "Dune",
        "Frank Herbert",
        1965,
        BookCategory::Fiction,
        412,
    ))?;
    let c_book = library.add_book(book(
        "978-0-13-110362-7",
        "The C Programming Language",
        "Brian Kernighan",
        1978,
        BookCategory::Science,
        272,
    ))?;
    let pride = library.add_book(book(
        "978-0-14-143951-8",
        "Pride and Prejudice",
        "Jane Austen",
        1813,
        BookCategory::Fiction,
        480,
    ))?;
    let styles = library.add_book(book(
        "978-0-596-52068-7",
        "The Mysterious Affair at Styles",
        "Agatha Christie",
        1920,
        BookCategory::Mystery,
        296,
    ))?;
    library.add_book(book(
        "978-1-59327-584-6",
        "Leaves of Grass",
        "Walt Whitman",
        1855,
        BookCategory::Poetry,
        145,
    ))?;
    library.rate_book(dune, 4.6)?;
    library.rate_book(pride, 4.2)?;

    library.add_person(person(
        "Mira",
        "Okafor",
        (1979, 5, 14),
        "mira.okafor@library.example",
        "+44 20 7946 0018",
    )?)?;

    let ana = library.add_member(
        person("Ana", "Lima", (1992, 8, 3), "ana.lima@example.org", "+351 21 555 0142")?,
        MembershipStatus::Regular,
    )?;
    let tom = library.add_member(
        person("Tom", "O'Neill", (1986, 1, 27), "tom.oneill@example.org", "555-0108-311")?,
        MembershipStatus::Premium,
    )?;
    let yuki = library.add_member(
        person("Yuki", "Tanaka", (2001, 11, 9), "yuki.tanaka@example.org", "+81 3 5550 1234")?,
        MembershipStatus::Vip,
    )?;

    // one loan already past its due date, one running, one settled
    library.create_loan(ana, dune, offset(today, -20), offset(today, -6))?;
    library.create_loan(tom, c_book, offset(today, -3), offset(today, 11))?;
    let settled = library.create_loan(yuki, pride, offset(today, -40), offset(today, -26))?;
    library.return_loan(settled, offset(today, -28))?;

    library.create_reservation(yuki, dune, offset(today, -1), offset(today, 6))?;
    library.create_reservation(tom, styles, offset(today, -2), offset(today, 12))?;

    let talk = library.add_event(EventDetails {
        name: "Author talk".into(),
        start_time: at(offset(today, 7), 18)?,
        end_time: at(offset(today, 7), 20)?,
        location: "Main hall".into(),
        max_attendees: 30,
    })?;
    library.register_for_event(ana, talk)?;
    library.register_for_event(tom, talk)?;

    let poetry = library.add_event(EventDetails {
        name: "Poetry night".into(),
        start_time: at(offset(today, -14), 19)?,
        end_time: at(offset(today, -14), 21)?,
        location: "Reading room".into(),
        max_attendees: 12,
    })?;
    library.register_for_event(tom, poetry)?;
    library.register_for_event(yuki, poetry)?;
    library.mark_attended(yuki, poetry)?;

    let circle = library.add_club(ClubDetails {
        name: "Premium circle".into(),
        description: "Early access to new arrivals".into(),
        required_status: Some(MembershipStatus::Premium),
    })?;
    library.join_club(tom, circle)?;

    let mysteries = library.add_reading_group(ReadingGroupDetails {
        name: "Mystery Mondays".into(),
        focus_category: BookCategory::Mystery,
        max_capacity: 8,
    })?;
    library.join_reading_group(ana, mysteries)?;

    info!(%today, "seeded demo library");
    Ok(true)
}
