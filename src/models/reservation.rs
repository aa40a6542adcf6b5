use chrono::NaiveDate;

use super::{BookId, MemberId, ReservationId, ReservationStatus};
use crate::error::{EntityKind, LibraryError, Result};

/// A member's claim on a book. Like a loan, both ends are mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub(crate) id: ReservationId,
    pub(crate) member: MemberId,
    pub(crate) book: BookId,
    pub(crate) reservation_date: NaiveDate,
    pub(crate) expiration_date: NaiveDate,
    pub(crate) status: ReservationStatus,
}

impl Reservation {
    pub(crate) fn new(
        id: ReservationId,
        member: MemberId,
        book: BookId,
        reservation_date: NaiveDate,
        expiration_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            member,
            book,
            reservation_date,
            expiration_date,
            status: ReservationStatus::Pending,
        }
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn member(&self) -> MemberId {
        self.member
    }

    pub fn book(&self) -> BookId {
        self.book
    }

    pub fn reservation_date(&self) -> NaiveDate {
        self.reservation_date
    }

    pub fn expiration_date(&self) -> NaiveDate {
        self.expiration_date
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == ReservationStatus::Pending
    }

    pub(crate) fn fulfill(&mut self) -> Result<()> {
        self.transition("fulfill", ReservationStatus::Fulfilled)
    }

    pub(crate) fn cancel(&mut self) -> Result<()> {
        self.transition("cancel", ReservationStatus::Canceled)
    }

    /// Pending reservations past their expiration date become expired.
    /// Returns whether the status changed.
    pub(crate) fn expire_if_due(&mut self, today: NaiveDate) -> bool {
        if self.is_pending() && today > self.expiration_date {
            self.status = ReservationStatus::Expired;
            true
        } else {
            false
        }
    }

    fn transition(&mut self, action: &'static str, to: ReservationStatus) -> Result<()> {
        if !self.is_pending() {
            return Err(LibraryError::InvalidTransition {
                kind: EntityKind::Reservation,
                action,
                state: self.status.as_str().to_lowercase(),
            });
        }
        self.status = to;
        Ok(())
    }
}
