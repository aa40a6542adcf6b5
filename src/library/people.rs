//! The Person extent (plain persons and members) and member attributes.

use tracing::debug;

use super::Library;
use crate::error::{EntityKind, LibraryError, Result};
use crate::models::{
    Event, Loan, Member, MemberId, MembershipStatus, Person, PersonDetails, PersonId, Reservation,
};

/// Identifies an entry of the Person extent, which spans plain persons and
/// members alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonRef {
    Person(PersonId),
    Member(MemberId),
}

impl PersonRef {
    fn raw(self) -> u64 {
        match self {
            PersonRef::Person(id) => id.get(),
            PersonRef::Member(id) => id.get(),
        }
    }
}

impl Library {
    pub fn add_person(&mut self, details: PersonDetails) -> Result<PersonId> {
        let details = details.validated(self.clock.today())?;
        self.ensure_email_free(&details.email, None)?;

        let id = PersonId(self.next_id());
        self.extents
            .persons
            .insert(id, Person::from_details(details));
        debug!(%id, "added person");
        self.commit()?;
        Ok(id)
    }

    /// Replace every contact field of a plain person.
    pub fn update_person(&mut self, id: PersonId, details: PersonDetails) -> Result<()> {
        let details = details.validated(self.clock.today())?;
        self.person(id)?;
        self.ensure_email_free(&details.email, Some(PersonRef::Person(id)))?;

        if let Some(person) = self.extents.persons.get_mut(&id) {
            *person = Person::from_details(details);
        }
        self.commit()
    }

    pub fn remove_person(&mut self, id: PersonId) -> Result<()> {
        self.extents
            .persons
            .remove(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Person, id))?;
        debug!(%id, "removed person");
        self.commit()
    }

    pub fn person(&self, id: PersonId) -> Result<&Person> {
        self.extents
            .persons
            .get(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Person, id))
    }

    /// The whole Person extent in creation order, members included.
    pub fn persons(&self) -> Vec<(PersonRef, &Person)> {
        let mut all: Vec<(PersonRef, &Person)> = self
            .extents
            .persons
            .iter()
            .map(|(id, person)| (PersonRef::Person(*id), person))
            .chain(
                self.extents
                    .members
                    .iter()
                    .map(|(id, member)| (PersonRef::Member(*id), &member.person)),
            )
            .collect();
        all.sort_by_key(|(owner, _)| owner.raw());
        all
    }

    /// Email lookup is case-insensitive, matching the uniqueness rule.
    pub fn find_person_by_email(&self, email: &str) -> Option<(PersonRef, &Person)> {
        let email = email.trim();
        self.persons()
            .into_iter()
            .find(|(_, person)| person.email.eq_ignore_ascii_case(email))
    }

    fn ensure_email_free(&self, email: &str, owner: Option<PersonRef>) -> Result<()> {
        match self.find_person_by_email(email) {
            Some((found, _)) if Some(found) != owner => Err(LibraryError::Duplicate {
                field: "email",
                value: email.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Register a new member. The registration date is today.
    pub fn add_member(
        &mut self,
        details: PersonDetails,
        status: MembershipStatus,
    ) -> Result<MemberId> {
        let today = self.clock.today();
        let details = details.validated(today)?;
        self.ensure_email_free(&details.email, None)?;

        let id = MemberId(self.next_id());
        let member = Member::new(id, Person::from_details(details), status, today);
        self.extents.members.insert(id, member);
        debug!(%id, %status, "added member");
        self.commit()?;
        Ok(id)
    }

    pub fn update_member(&mut self, id: MemberId, details: PersonDetails) -> Result<()> {
        let details = details.validated(self.clock.today())?;
        self.member_ref(id)?;
        self.ensure_email_free(&details.email, Some(PersonRef::Member(id)))?;

        self.member_mut(id)?.person = Person::from_details(details);
        self.commit()
    }

    /// Change the membership tier. Downgrades must fit the items currently
    /// borrowed and the requirement of the member's club.
    pub fn set_member_status(&mut self, id: MemberId, status: MembershipStatus) -> Result<()> {
        let member = self.member_ref(id)?;
        member.ensure_status_fits(status)?;
        if let Some(club_id) = member.club() {
            let club = self.club_ref(club_id)?;
            if let Some(required) = club.required_status.filter(|_| !club.admits(status)) {
                return Err(LibraryError::StatusTooLow {
                    required,
                    actual: status,
                });
            }
        }

        self.member_mut(id)?.status = status;
        debug!(%id, %status, "changed membership status");
        self.commit()
    }

    pub fn set_blacklisted(&mut self, id: MemberId, blacklisted: bool) -> Result<()> {
        self.member_mut(id)?.blacklisted = blacklisted;
        debug!(%id, blacklisted, "changed blacklist flag");
        self.commit()
    }

    /// Remove a member together with everything that cannot exist without
    /// them: loans and reservations are deleted from the books' side too,
    /// event registrations and the club or reading group membership are
    /// dropped.
    pub fn remove_member(&mut self, id: MemberId) -> Result<()> {
        let member = self.member_ref(id)?.clone();

        for loan in &member.loans {
            self.detach_loan(*loan)?;
        }
        for reservation in &member.reservations {
            self.detach_reservation(*reservation)?;
        }
        for event in &member.registered_events {
            if let Some(event) = self.extents.events.get_mut(event) {
                event.registered.remove(&id);
                event.attended.remove(&id);
            }
        }
        self.detach_affiliation(id)?;

        self.extents.members.remove(&id);
        debug!(%id, "removed member");
        self.commit()
    }

    pub fn member(&self, id: MemberId) -> Result<&Member> {
        self.member_ref(id)
    }

    /// Member extent in registration order.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.extents.members.values()
    }

    /// The member's loans ordered by due date (ties by creation order).
    pub fn member_loans(&self, id: MemberId) -> Result<Vec<&Loan>> {
        let member = self.member_ref(id)?;
        let mut loans = member
            .loans
            .iter()
            .map(|loan| self.loan_ref(*loan))
            .collect::<Result<Vec<_>>>()?;
        loans.sort_by_key(|loan| (loan.due_date, loan.id));
        Ok(loans)
    }

    /// Reservations in the order they were attached to the member.
    pub fn member_reservations(&self, id: MemberId) -> Result<Vec<&Reservation>> {
        self.member_ref(id)?
            .reservations
            .iter()
            .map(|reservation| self.reservation_ref(*reservation))
            .collect()
    }

    pub fn member_registered_events(&self, id: MemberId) -> Result<Vec<&Event>> {
        self.member_ref(id)?
            .registered_events
            .iter()
            .map(|event| self.event_ref(*event))
            .collect()
    }

    pub fn member_attended_events(&self, id: MemberId) -> Result<Vec<&Event>> {
        self.member_ref(id)?
            .attended_events
            .iter()
            .map(|event| self.event_ref(*event))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::clock::FixedClock;

    fn library() -> Library {
        Library::with_clock(FixedClock::new(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()))
    }

    fn details(email: &str) -> PersonDetails {
        PersonDetails {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 12, 9).unwrap(),
            email: email.into(),
            phone_number: "+1 555 0100 22".into(),
        }
    }

    #[test]
    fn email_is_unique_across_persons_and_members() {
        let mut lib = library();
        lib.add_person(details("grace@example.org")).unwrap();

        let err = lib
            .add_member(details("GRACE@example.org"), MembershipStatus::Regular)
            .unwrap_err();
        assert!(matches!(err, LibraryError::Duplicate { field: "email", .. }));
        assert_eq!(lib.members().count(), 0);
    }

    #[test]
    fn updating_keeps_own_email() {
        let mut lib = library();
        let id = lib
            .add_member(details("grace@example.org"), MembershipStatus::Regular)
            .unwrap();
        let mut changed = details("grace@example.org");
        changed.phone_number = "+1 555 0199 00".into();
        lib.update_member(id, changed).unwrap();
        assert_eq!(lib.member(id).unwrap().person().phone_number(), "+1 555 0199 00");
    }

    #[test]
    fn person_extent_lists_members_too() {
        let mut lib = library();
        let member = lib
            .add_member(details("a@example.org"), MembershipStatus::Premium)
            .unwrap();
        let person = lib.add_person(details("b@example.org")).unwrap();

        let owners: Vec<PersonRef> = lib.persons().into_iter().map(|(owner, _)| owner).collect();
        assert_eq!(owners, vec![PersonRef::Member(member), PersonRef::Person(person)]);
        assert_eq!(
            lib.member(member).unwrap().registration_date(),
            NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
        );
    }

    #[test]
    fn rejects_invalid_contact_details() {
        let mut lib = library();
        let mut bad = details("not-an-email");
        assert!(lib.add_person(bad.clone()).is_err());
        bad.email = "ok@example.org".into();
        bad.date_of_birth = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert!(lib.add_person(bad).is_err());
        assert!(lib.is_empty());
    }

    #[test]
    fn updating_a_person_validates_and_guards_email() {
        let mut lib = library();
        let grace = lib.add_person(details("grace@example.org")).unwrap();
        lib.add_member(details("taken@example.org"), MembershipStatus::Regular)
            .unwrap();

        let mut moved = details("grace.h@example.org");
        moved.last_name = "Murray".into();
        lib.update_person(grace, moved).unwrap();
        let person = lib.person(grace).unwrap();
        assert_eq!(person.last_name(), "Murray");
        assert_eq!(person.email(), "grace.h@example.org");

        let err = lib
            .update_person(grace, details("Taken@example.org"))
            .unwrap_err();
        assert!(matches!(err, LibraryError::Duplicate { field: "email", .. }));
        let mut blank = details("grace.h@example.org");
        blank.first_name = " ".into();
        assert!(lib.update_person(grace, blank).is_err());
        assert_eq!(lib.person(grace).unwrap().last_name(), "Murray");
    }

    #[test]
    fn removing_a_person_frees_the_email() {
        let mut lib = library();
        let grace = lib.add_person(details("grace@example.org")).unwrap();
        lib.remove_person(grace).unwrap();

        assert!(matches!(
            lib.person(grace),
            Err(LibraryError::NotFound { kind: EntityKind::Person, .. })
        ));
        assert!(lib.find_person_by_email("grace@example.org").is_none());
        assert!(lib.remove_person(grace).is_err());
        lib.add_member(details("grace@example.org"), MembershipStatus::Vip)
            .unwrap();
    }
}
