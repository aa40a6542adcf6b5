use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use library_manager::{
    BookCategory, BookDetails, BookId, ClubDetails, EventDetails, FixedClock, Library,
    LibraryError, MemberId, MembershipStatus, PersonDetails, ReadingGroupDetails,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

fn library() -> Library {
    Library::with_clock(FixedClock::new(day(20)))
}

fn member(lib: &mut Library, name: &str, status: MembershipStatus) -> MemberId {
    lib.add_member(
        PersonDetails {
            first_name: name.into(),
            last_name: "Reader".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1988, 3, 3).unwrap(),
            email: format!("{}@example.org", name.to_lowercase()),
            phone_number: "555 222 3333".into(),
        },
        status,
    )
    .unwrap()
}

fn book(lib: &mut Library, isbn: &str, title: &str) -> BookId {
    lib.add_book(BookDetails {
        isbn: isbn.into(),
        title: title.into(),
        author: "Some Author".into(),
        publication_year: 1999,
        category: BookCategory::Fiction,
        page_count: 300,
    })
    .unwrap()
}

#[test]
fn borrow_limit_follows_membership_status() {
    let mut lib = library();
    let reader = member(&mut lib, "Ola", MembershipStatus::Regular);
    let isbns = [
        "978-0-306-40615-7",
        "0-306-40615-2",
        "978-0-13-110362-7",
        "978-0-596-52068-7",
        "978-1-59327-584-6",
        "978-0-14-143951-8",
    ];
    let books: Vec<_> = isbns
        .iter()
        .enumerate()
        .map(|(n, isbn)| book(&mut lib, isbn, &format!("Volume {n}")))
        .collect();

    for book in &books[..5] {
        lib.create_loan(reader, *book, day(1), day(15)).unwrap();
    }
    let sixth = lib.create_loan(reader, books[5], day(1), day(15));
    assert!(matches!(sixth, Err(LibraryError::BorrowLimit { limit: 5, .. })));
    assert_eq!(lib.member(reader).unwrap().borrowed_items(), 5);
    assert!(lib.book_loan_history(books[5]).unwrap().is_empty());

    lib.set_member_status(reader, MembershipStatus::Premium).unwrap();
    lib.create_loan(reader, books[5], day(1), day(15)).unwrap();

    // six items out, so Regular no longer fits
    assert!(lib
        .set_member_status(reader, MembershipStatus::Regular)
        .is_err());
}

#[test]
fn loan_moves_keep_both_sides_in_step() {
    let mut lib = library();
    let ann = member(&mut lib, "Ann", MembershipStatus::Regular);
    let bob = member(&mut lib, "Bob", MembershipStatus::Regular);
    let first = book(&mut lib, "978-0-306-40615-7", "First");
    let second = book(&mut lib, "0-306-40615-2", "Second");

    let loan = lib.create_loan(ann, first, day(2), day(16)).unwrap();
    lib.reassign_loan_member(loan, bob).unwrap();
    lib.reassign_loan_book(loan, second).unwrap();

    assert!(lib.member(ann).unwrap().loan_ids().is_empty());
    assert_eq!(lib.member(ann).unwrap().borrowed_items(), 0);
    assert_eq!(lib.member(bob).unwrap().loan_ids(), &[loan]);
    assert_eq!(lib.member(bob).unwrap().borrowed_items(), 1);
    assert!(lib.book(first).unwrap().loan_history().is_empty());
    assert_eq!(lib.book(second).unwrap().loan_history(), &[loan]);
    assert_eq!(lib.loan(loan).unwrap().member(), bob);
}

#[test]
fn blacklisted_members_cannot_borrow_but_can_return() {
    let mut lib = library();
    let ann = member(&mut lib, "Ann", MembershipStatus::Vip);
    let title = book(&mut lib, "978-0-306-40615-7", "Kept");
    let loan = lib.create_loan(ann, title, day(1), day(10)).unwrap();

    lib.set_blacklisted(ann, true).unwrap();
    let other = book(&mut lib, "0-306-40615-2", "Refused");
    assert!(matches!(
        lib.create_loan(ann, other, day(20), day(30)),
        Err(LibraryError::Blacklisted(_))
    ));

    lib.return_loan(loan, day(20)).unwrap();
    let returned = lib.loan(loan).unwrap();
    assert!(returned.is_overdue());
    assert_eq!(returned.late_fee(), 10.0);
    assert_eq!(lib.member(ann).unwrap().borrowed_items(), 0);
}

#[test]
fn removing_a_member_cleans_up_every_association() {
    let mut lib = library();
    let ann = member(&mut lib, "Ann", MembershipStatus::Premium);
    let bob = member(&mut lib, "Bob", MembershipStatus::Premium);
    let title = book(&mut lib, "978-0-306-40615-7", "Shared");

    let loan = lib.create_loan(ann, title, day(1), day(30)).unwrap();
    let reservation = lib.create_reservation(ann, title, day(2), day(9)).unwrap();
    let kept = lib.create_reservation(bob, title, day(3), day(9)).unwrap();
    let event = lib
        .add_event(EventDetails {
            name: "Book swap".into(),
            start_time: day(25).and_hms_opt(10, 0, 0).unwrap(),
            end_time: day(25).and_hms_opt(12, 0, 0).unwrap(),
            location: "Lobby".into(),
            max_attendees: 10,
        })
        .unwrap();
    lib.register_for_event(ann, event).unwrap();
    lib.mark_attended(ann, event).unwrap();
    let club = lib
        .add_club(ClubDetails {
            name: "Swappers".into(),
            description: "Trade paperbacks".into(),
            required_status: None,
        })
        .unwrap();
    lib.join_club(ann, club).unwrap();

    lib.remove_member(ann).unwrap();

    assert!(matches!(lib.member(ann), Err(LibraryError::NotFound { .. })));
    assert!(matches!(lib.loan(loan), Err(LibraryError::NotFound { .. })));
    assert!(matches!(
        lib.reservation(reservation),
        Err(LibraryError::NotFound { .. })
    ));
    let shared = lib.book(title).unwrap();
    assert!(shared.loan_history().is_empty());
    assert_eq!(shared.reservation_ids(), &[kept]);
    assert!(lib.is_available(title).unwrap());
    assert!(lib.event_registrations(event).unwrap().is_empty());
    assert!(lib.event_attendees(event).unwrap().is_empty());
    assert!(lib.club(club).unwrap().members().is_empty());
}

#[test]
fn books_on_loan_cannot_be_removed() {
    let mut lib = library();
    let ann = member(&mut lib, "Ann", MembershipStatus::Regular);
    let title = book(&mut lib, "978-0-306-40615-7", "Busy");
    let loan = lib.create_loan(ann, title, day(1), day(30)).unwrap();

    assert!(lib.remove_book(title).is_err());
    lib.return_loan(loan, day(5)).unwrap();
    lib.remove_book(title).unwrap();

    assert!(lib.member(ann).unwrap().loan_ids().is_empty());
    assert!(lib.loans().next().is_none());
}

#[test]
fn isbns_are_unique_ignoring_punctuation() {
    let mut lib = library();
    book(&mut lib, "978-0-306-40615-7", "Original");
    let copy = lib.add_book(BookDetails {
        isbn: "9780306406157".into(),
        title: "Copy".into(),
        author: "Someone Else".into(),
        publication_year: 2000,
        category: BookCategory::Fiction,
        page_count: 10,
    });
    assert!(matches!(copy, Err(LibraryError::Duplicate { .. })));
    assert!(lib.find_book_by_isbn("978 0 306 40615 7").is_some());
}

#[test]
fn affiliation_is_exclusive_end_to_end() {
    let mut lib = library();
    let ann = member(&mut lib, "Ann", MembershipStatus::Regular);
    let club = lib
        .add_club(ClubDetails {
            name: "Open club".into(),
            description: "Anyone".into(),
            required_status: None,
        })
        .unwrap();
    let group = lib
        .add_reading_group(ReadingGroupDetails {
            name: "Sci-fi circle".into(),
            focus_category: BookCategory::Science,
            max_capacity: 2,
        })
        .unwrap();

    lib.join_reading_group(ann, group).unwrap();
    assert!(matches!(
        lib.join_club(ann, club),
        Err(LibraryError::ExclusiveAffiliation(_))
    ));
    assert_eq!(lib.member(ann).unwrap().reading_group(), Some(group));
    assert_eq!(lib.member(ann).unwrap().club(), None);

    lib.remove_reading_group(group).unwrap();
    lib.join_club(ann, club).unwrap();
    assert_eq!(lib.club_members(club).unwrap().len(), 1);
}

#[test]
fn sweep_reports_only_new_transitions() {
    let mut lib = library();
    let ann = member(&mut lib, "Ann", MembershipStatus::Regular);
    let title = book(&mut lib, "978-0-306-40615-7", "Late");
    let loan = lib.create_loan(ann, title, day(1), day(10)).unwrap();
    let reservation = lib.create_reservation(ann, title, day(1), day(5)).unwrap();

    let first = lib.refresh_statuses().unwrap();
    assert_eq!(first.newly_overdue, vec![loan]);
    assert_eq!(first.newly_expired, vec![reservation]);

    let second = lib.refresh_statuses().unwrap();
    assert!(second.is_empty());
    assert_eq!(lib.overdue_loans().len(), 1);
}
