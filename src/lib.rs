//! Core library surface for the Library Manager.
//!
//! The domain lives in [`models`] and is owned by [`Library`], which keeps
//! every bidirectional association consistent and rewrites the SQLite extent
//! dump after each change. The `bin` target adds the command line and the
//! terminal browser on top.
pub mod clock;
pub mod config;
pub mod error;
pub mod library;
pub mod models;
pub mod seed;
pub mod store;
pub mod ui;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{EntityKind, LibraryError, Result};
pub use library::{Library, PersonRef, SweepReport};
pub use models::{
    Affiliation, Book, BookCategory, BookDetails, BookId, Club, ClubDetails, ClubId, Event,
    EventDetails, EventId, Loan, LoanId, Member, MemberId, MembershipStatus, Person,
    PersonDetails, PersonId, ReadingGroup, ReadingGroupDetails, ReadingGroupId, Reservation,
    ReservationId, ReservationStatus, LATE_FEE_PER_DAY,
};
pub use seed::seed_demo;
pub use store::ExtentStore;

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
