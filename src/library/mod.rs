//! The library owns every extent and is the only place relationships are
//! changed. Each public mutation validates first, then updates both ends of
//! the affected association, then dumps the whole extent to the attached
//! store (if any).

mod catalog;
mod events;
mod groups;
mod loans;
mod people;
mod reservations;
mod sweep;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::error::{EntityKind, LibraryError, Result};
use crate::models::{
    Book, BookId, Club, ClubId, Event, EventId, IdAllocator, Loan, LoanId, Member, MemberId,
    Person, PersonId, ReadingGroup, ReadingGroupId, Reservation, ReservationId,
};
use crate::store::ExtentStore;

pub use people::PersonRef;
pub use sweep::SweepReport;

/// All live instances, keyed by id. Ids grow monotonically, so map order is
/// creation order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Extents {
    pub(crate) ids: IdAllocator,
    pub(crate) persons: BTreeMap<PersonId, Person>,
    pub(crate) members: BTreeMap<MemberId, Member>,
    pub(crate) books: BTreeMap<BookId, Book>,
    pub(crate) loans: BTreeMap<LoanId, Loan>,
    pub(crate) reservations: BTreeMap<ReservationId, Reservation>,
    pub(crate) events: BTreeMap<EventId, Event>,
    pub(crate) clubs: BTreeMap<ClubId, Club>,
    pub(crate) reading_groups: BTreeMap<ReadingGroupId, ReadingGroup>,
}

impl Extents {
    pub(crate) fn is_empty(&self) -> bool {
        self.persons.is_empty()
            && self.members.is_empty()
            && self.books.is_empty()
            && self.events.is_empty()
            && self.clubs.is_empty()
            && self.reading_groups.is_empty()
    }
}

/// In-memory library with optional SQLite extent dump.
#[derive(Debug)]
pub struct Library {
    extents: Extents,
    clock: Box<dyn Clock>,
    store: Option<ExtentStore>,
}

impl Default for Library {
    fn default() -> Self {
        Self::new()
    }
}

impl Library {
    /// Empty library on the system clock, not backed by storage.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    #[must_use]
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            extents: Extents::default(),
            clock: Box::new(clock),
            store: None,
        }
    }

    /// Open (or create) the SQLite file at `path`, load whatever it holds and
    /// keep it attached so every later mutation is written back.
    pub fn open(path: impl AsRef<Path>, clock: impl Clock + 'static) -> Result<Self> {
        let store = ExtentStore::open(path.as_ref())?;
        Self::from_store(store, clock)
    }

    /// Load from an already opened store and attach it.
    pub fn from_store(store: ExtentStore, clock: impl Clock + 'static) -> Result<Self> {
        let extents = store.load()?;
        info!(
            members = extents.members.len(),
            books = extents.books.len(),
            loans = extents.loans.len(),
            "loaded library extents"
        );
        Ok(Self {
            extents,
            clock: Box::new(clock),
            store: Some(store),
        })
    }

    /// Attach a store to an in-memory library, replacing whatever the store
    /// held with the current state.
    pub fn attach_store(&mut self, store: ExtentStore) -> Result<()> {
        self.store = Some(store);
        self.commit()
    }

    /// Stop writing changes back and hand the store to the caller.
    pub fn detach_store(&mut self) -> Option<ExtentStore> {
        self.store.take()
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    /// True when no entity of any kind exists yet.
    pub fn is_empty(&self) -> bool {
        self.extents.is_empty()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Write the full extent dump. Called at the end of every mutation.
    fn commit(&mut self) -> Result<()> {
        if let Some(store) = self.store.as_mut() {
            store.save(&self.extents)?;
        }
        Ok(())
    }

    fn next_id(&mut self) -> u64 {
        self.extents.ids.next_raw()
    }

    fn member_ref(&self, id: MemberId) -> Result<&Member> {
        self.extents
            .members
            .get(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Member, id))
    }

    fn member_mut(&mut self, id: MemberId) -> Result<&mut Member> {
        self.extents
            .members
            .get_mut(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Member, id))
    }

    fn book_ref(&self, id: BookId) -> Result<&Book> {
        self.extents
            .books
            .get(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Book, id))
    }

    fn book_mut(&mut self, id: BookId) -> Result<&mut Book> {
        self.extents
            .books
            .get_mut(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Book, id))
    }

    fn loan_ref(&self, id: LoanId) -> Result<&Loan> {
        self.extents
            .loans
            .get(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Loan, id))
    }

    fn loan_mut(&mut self, id: LoanId) -> Result<&mut Loan> {
        self.extents
            .loans
            .get_mut(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Loan, id))
    }

    fn reservation_ref(&self, id: ReservationId) -> Result<&Reservation> {
        self.extents
            .reservations
            .get(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Reservation, id))
    }

    fn reservation_mut(&mut self, id: ReservationId) -> Result<&mut Reservation> {
        self.extents
            .reservations
            .get_mut(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Reservation, id))
    }

    fn event_ref(&self, id: EventId) -> Result<&Event> {
        self.extents
            .events
            .get(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Event, id))
    }

    fn event_mut(&mut self, id: EventId) -> Result<&mut Event> {
        self.extents
            .events
            .get_mut(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Event, id))
    }

    fn club_ref(&self, id: ClubId) -> Result<&Club> {
        self.extents
            .clubs
            .get(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Club, id))
    }

    fn club_mut(&mut self, id: ClubId) -> Result<&mut Club> {
        self.extents
            .clubs
            .get_mut(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Club, id))
    }

    fn group_ref(&self, id: ReadingGroupId) -> Result<&ReadingGroup> {
        self.extents
            .reading_groups
            .get(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::ReadingGroup, id))
    }

    fn group_mut(&mut self, id: ReadingGroupId) -> Result<&mut ReadingGroup> {
        self.extents
            .reading_groups
            .get_mut(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::ReadingGroup, id))
    }
}
