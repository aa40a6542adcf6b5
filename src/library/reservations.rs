//! Member ↔ Reservation ↔ Book.

use chrono::NaiveDate;
use tracing::debug;

use super::Library;
use crate::error::{EntityKind, LibraryError, Result};
use crate::models::{BookId, MemberId, Reservation, ReservationId, ReservationStatus};

impl Library {
    pub fn create_reservation(
        &mut self,
        member: MemberId,
        book: BookId,
        reservation_date: NaiveDate,
        expiration_date: NaiveDate,
    ) -> Result<ReservationId> {
        if expiration_date < reservation_date {
            return Err(LibraryError::validation(
                "expiration date",
                "cannot be before the reservation date",
            ));
        }
        self.member_ref(member)?;
        self.book_ref(book)?;

        let id = ReservationId(self.next_id());
        self.extents.reservations.insert(
            id,
            Reservation::new(id, member, book, reservation_date, expiration_date),
        );
        self.member_mut(member)?.reservations.push(id);
        self.book_mut(book)?.reservations.push(id);

        debug!(%id, %member, %book, "created reservation");
        self.commit()?;
        Ok(id)
    }

    pub fn fulfill_reservation(&mut self, id: ReservationId) -> Result<()> {
        self.reservation_mut(id)?.fulfill()?;
        debug!(%id, "fulfilled reservation");
        self.commit()
    }

    pub fn cancel_reservation(&mut self, id: ReservationId) -> Result<()> {
        self.reservation_mut(id)?.cancel()?;
        debug!(%id, "canceled reservation");
        self.commit()
    }

    /// Expire the reservation if it is still pending past its expiration
    /// date. Returns whether it is expired now.
    pub fn check_expired(&mut self, id: ReservationId) -> Result<bool> {
        let today = self.clock.today();
        let reservation = self.reservation_mut(id)?;
        if reservation.expire_if_due(today) {
            debug!(%id, "reservation expired");
        }
        let expired = reservation.status == ReservationStatus::Expired;
        self.commit()?;
        Ok(expired)
    }

    pub fn reassign_reservation_member(&mut self, id: ReservationId, member: MemberId) -> Result<()> {
        let previous = self.reservation_ref(id)?.member;
        if previous == member {
            return Ok(());
        }
        self.member_ref(member)?;

        self.member_mut(previous)?
            .reservations
            .retain(|other| *other != id);
        self.member_mut(member)?.reservations.push(id);
        self.reservation_mut(id)?.member = member;

        debug!(%id, from = %previous, to = %member, "moved reservation to member");
        self.commit()
    }

    pub fn reassign_reservation_book(&mut self, id: ReservationId, book: BookId) -> Result<()> {
        let previous = self.reservation_ref(id)?.book;
        if previous == book {
            return Ok(());
        }
        self.book_ref(book)?;

        self.book_mut(previous)?
            .reservations
            .retain(|other| *other != id);
        self.book_mut(book)?.reservations.push(id);
        self.reservation_mut(id)?.book = book;

        debug!(%id, from = %previous, to = %book, "moved reservation to book");
        self.commit()
    }

    pub fn remove_reservation(&mut self, id: ReservationId) -> Result<()> {
        self.detach_reservation(id)?;
        self.commit()
    }

    pub(super) fn detach_reservation(&mut self, id: ReservationId) -> Result<()> {
        let reservation = self
            .extents
            .reservations
            .remove(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Reservation, id))?;
        if let Some(member) = self.extents.members.get_mut(&reservation.member) {
            member.reservations.retain(|other| *other != id);
        }
        if let Some(book) = self.extents.books.get_mut(&reservation.book) {
            book.reservations.retain(|other| *other != id);
        }
        debug!(%id, "removed reservation");
        Ok(())
    }

    pub fn reservation(&self, id: ReservationId) -> Result<&Reservation> {
        self.reservation_ref(id)
    }

    pub fn reservations(&self) -> impl Iterator<Item = &Reservation> {
        self.extents.reservations.values()
    }
}
