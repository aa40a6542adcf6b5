use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::{ClubId, EventId, LoanId, MemberId, MembershipStatus, Person, ReadingGroupId, ReservationId};
use crate::error::{LibraryError, Result};

/// A member belongs to at most one club or one reading group. Encoding the
/// choice as an enum makes "both at once" unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affiliation {
    Club(ClubId),
    ReadingGroup(ReadingGroupId),
}

/// A registered library member. The borrowed item count, status and
/// relationship collections change over the member's lifetime; the library
/// is the only place that mutates them.
#[derive(Debug, Clone)]
pub struct Member {
    pub(crate) id: MemberId,
    pub(crate) person: Person,
    pub(crate) registration_date: NaiveDate,
    pub(crate) status: MembershipStatus,
    pub(crate) borrowed_items: u32,
    pub(crate) blacklisted: bool,
    pub(crate) loans: Vec<LoanId>,
    pub(crate) reservations: Vec<ReservationId>,
    pub(crate) registered_events: BTreeSet<EventId>,
    pub(crate) attended_events: BTreeSet<EventId>,
    pub(crate) affiliation: Option<Affiliation>,
}

impl Member {
    pub(crate) fn new(
        id: MemberId,
        person: Person,
        status: MembershipStatus,
        registration_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            person,
            registration_date,
            status,
            borrowed_items: 0,
            blacklisted: false,
            loans: Vec::new(),
            reservations: Vec::new(),
            registered_events: BTreeSet::new(),
            attended_events: BTreeSet::new(),
            affiliation: None,
        }
    }

    pub fn id(&self) -> MemberId {
        self.id
    }

    pub fn person(&self) -> &Person {
        &self.person
    }

    pub fn registration_date(&self) -> NaiveDate {
        self.registration_date
    }

    pub fn status(&self) -> MembershipStatus {
        self.status
    }

    /// Number of loans not yet returned.
    pub fn borrowed_items(&self) -> u32 {
        self.borrowed_items
    }

    pub fn is_blacklisted(&self) -> bool {
        self.blacklisted
    }

    /// Loan ids in the order they were attached. Use
    /// [`crate::Library::member_loans`] for the due-date ordering.
    pub fn loan_ids(&self) -> &[LoanId] {
        &self.loans
    }

    pub fn reservation_ids(&self) -> &[ReservationId] {
        &self.reservations
    }

    pub fn registered_events(&self) -> &BTreeSet<EventId> {
        &self.registered_events
    }

    pub fn attended_events(&self) -> &BTreeSet<EventId> {
        &self.attended_events
    }

    pub fn affiliation(&self) -> Option<Affiliation> {
        self.affiliation
    }

    pub fn club(&self) -> Option<ClubId> {
        match self.affiliation {
            Some(Affiliation::Club(club)) => Some(club),
            _ => None,
        }
    }

    pub fn reading_group(&self) -> Option<ReadingGroupId> {
        match self.affiliation {
            Some(Affiliation::ReadingGroup(group)) => Some(group),
            _ => None,
        }
    }

    /// Reject a new loan for this member without changing anything.
    pub(crate) fn ensure_can_borrow(&self) -> Result<()> {
        if self.blacklisted {
            return Err(LibraryError::Blacklisted(self.id.get()));
        }
        let limit = self.status.borrow_limit();
        if self.borrowed_items >= limit {
            return Err(LibraryError::BorrowLimit {
                member: self.id.get(),
                status: self.status,
                limit,
            });
        }
        Ok(())
    }

    pub(crate) fn set_borrowed_items(&mut self, count: u32) -> Result<()> {
        let limit = self.status.borrow_limit();
        if count > limit {
            return Err(LibraryError::BorrowLimit {
                member: self.id.get(),
                status: self.status,
                limit,
            });
        }
        self.borrowed_items = count;
        Ok(())
    }

    pub(crate) fn increment_borrowed(&mut self) -> Result<()> {
        self.set_borrowed_items(self.borrowed_items + 1)
    }

    pub(crate) fn decrement_borrowed(&mut self) -> Result<()> {
        let count = self.borrowed_items.checked_sub(1).ok_or_else(|| {
            LibraryError::validation("borrowed items count", "cannot be negative")
        })?;
        self.set_borrowed_items(count)
    }

    /// Downgrades must still fit the items already borrowed.
    pub(crate) fn ensure_status_fits(&self, status: MembershipStatus) -> Result<()> {
        if status < self.status && self.borrowed_items > status.borrow_limit() {
            return Err(LibraryError::Rule(format!(
                "cannot downgrade status: member has {} borrowed items, but {} allows only {}",
                self.borrowed_items,
                status,
                status.borrow_limit()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PersonDetails;

    fn member(status: MembershipStatus) -> Member {
        let person = Person::from_details(PersonDetails {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 12, 10).unwrap(),
            email: "ada@example.org".into(),
            phone_number: "+44 20 7946 0000".into(),
        });
        Member::new(
            MemberId(1),
            person,
            status,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    #[test]
    fn borrowed_count_is_bounded_by_status() {
        let mut m = member(MembershipStatus::Regular);
        for _ in 0..5 {
            m.increment_borrowed().unwrap();
        }
        assert!(matches!(
            m.increment_borrowed(),
            Err(LibraryError::BorrowLimit { limit: 5, .. })
        ));
        assert_eq!(m.borrowed_items(), 5);
        assert!(m.ensure_can_borrow().is_err());
    }

    #[test]
    fn count_never_goes_negative() {
        let mut m = member(MembershipStatus::Vip);
        assert!(m.decrement_borrowed().is_err());
        assert_eq!(m.borrowed_items(), 0);
    }

    #[test]
    fn downgrade_checks_current_load() {
        let mut m = member(MembershipStatus::Premium);
        m.set_borrowed_items(7).unwrap();
        assert!(m.ensure_status_fits(MembershipStatus::Regular).is_err());
        assert!(m.ensure_status_fits(MembershipStatus::Vip).is_ok());
        m.set_borrowed_items(5).unwrap();
        assert!(m.ensure_status_fits(MembershipStatus::Regular).is_ok());
    }

    #[test]
    fn blacklisted_members_cannot_borrow() {
        let mut m = member(MembershipStatus::Vip);
        m.blacklisted = true;
        assert!(matches!(m.ensure_can_borrow(), Err(LibraryError::Blacklisted(1))));
    }
}
