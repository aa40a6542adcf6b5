//! Member XOR Club/ReadingGroup. A member's affiliation and the group's
//! member set always agree; joining a different group of the same kind
//! leaves the old one first.

use tracing::debug;

use super::Library;
use crate::error::{EntityKind, LibraryError, Result};
use crate::models::{
    Affiliation, Club, ClubDetails, ClubId, Member, MemberId, ReadingGroup, ReadingGroupDetails,
    ReadingGroupId,
};

impl Library {
    pub fn add_club(&mut self, details: ClubDetails) -> Result<ClubId> {
        let details = details.validated()?;
        let id = ClubId(self.next_id());
        self.extents.clubs.insert(id, Club::new(id, details));
        debug!(%id, "added club");
        self.commit()?;
        Ok(id)
    }

    /// Replace the club's fields. Raising the required status is rejected
    /// while a current member falls below it.
    pub fn update_club(&mut self, id: ClubId, details: ClubDetails) -> Result<()> {
        let details = details.validated()?;
        if let Some(required) = details.required_status {
            for member in &self.club_ref(id)?.members {
                let actual = self.member_ref(*member)?.status;
                if actual < required {
                    return Err(LibraryError::StatusTooLow { required, actual });
                }
            }
        }
        self.club_mut(id)?.apply(details);
        self.commit()
    }

    pub fn remove_club(&mut self, id: ClubId) -> Result<()> {
        let club = self
            .extents
            .clubs
            .remove(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Club, id))?;
        for member in &club.members {
            if let Some(member) = self.extents.members.get_mut(member) {
                member.affiliation = None;
            }
        }
        debug!(%id, "removed club");
        self.commit()
    }

    /// Put a member into a club, leaving any previous club. Members of a
    /// reading group must leave it first.
    pub fn join_club(&mut self, member: MemberId, club: ClubId) -> Result<()> {
        let joiner = self.member_ref(member)?;
        let target = self.club_ref(club)?;
        match joiner.affiliation {
            Some(Affiliation::Club(current)) if current == club => return Ok(()),
            Some(Affiliation::ReadingGroup(_)) => {
                return Err(LibraryError::ExclusiveAffiliation(member.get()))
            }
            _ => {}
        }
        if let Some(required) = target.required_status.filter(|_| !target.admits(joiner.status)) {
            return Err(LibraryError::StatusTooLow {
                required,
                actual: joiner.status,
            });
        }

        self.detach_affiliation(member)?;
        self.club_mut(club)?.members.insert(member);
        self.member_mut(member)?.affiliation = Some(Affiliation::Club(club));
        debug!(%member, %club, "joined club");
        self.commit()
    }

    pub fn leave_club(&mut self, member: MemberId) -> Result<()> {
        if self.member_ref(member)?.club().is_none() {
            return Ok(());
        }
        self.detach_affiliation(member)?;
        self.commit()
    }

    pub fn add_reading_group(&mut self, details: ReadingGroupDetails) -> Result<ReadingGroupId> {
        let details = details.validated()?;
        let id = ReadingGroupId(self.next_id());
        self.extents
            .reading_groups
            .insert(id, ReadingGroup::new(id, details));
        debug!(%id, "added reading group");
        self.commit()?;
        Ok(id)
    }

    pub fn update_reading_group(
        &mut self,
        id: ReadingGroupId,
        details: ReadingGroupDetails,
    ) -> Result<()> {
        let details = details.validated()?;
        let participants = self.group_ref(id)?.participants.len();
        if (details.max_capacity as usize) < participants {
            return Err(LibraryError::Rule(format!(
                "cannot reduce maximum capacity below the {participants} current participants"
            )));
        }
        self.group_mut(id)?.apply(details);
        self.commit()
    }

    pub fn remove_reading_group(&mut self, id: ReadingGroupId) -> Result<()> {
        let group = self
            .extents
            .reading_groups
            .remove(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::ReadingGroup, id))?;
        for member in &group.participants {
            if let Some(member) = self.extents.members.get_mut(member) {
                member.affiliation = None;
            }
        }
        debug!(%id, "removed reading group");
        self.commit()
    }

    /// Put a member into a reading group, leaving any previous group.
    /// Club members must leave their club first.
    pub fn join_reading_group(&mut self, member: MemberId, group: ReadingGroupId) -> Result<()> {
        let joiner = self.member_ref(member)?;
        let target = self.group_ref(group)?;
        match joiner.affiliation {
            Some(Affiliation::ReadingGroup(current)) if current == group => return Ok(()),
            Some(Affiliation::Club(_)) => {
                return Err(LibraryError::ExclusiveAffiliation(member.get()))
            }
            _ => {}
        }
        if target.is_full() {
            return Err(LibraryError::CapacityReached {
                what: EntityKind::ReadingGroup,
                capacity: target.max_capacity,
            });
        }

        self.detach_affiliation(member)?;
        self.group_mut(group)?.participants.insert(member);
        self.member_mut(member)?.affiliation = Some(Affiliation::ReadingGroup(group));
        debug!(%member, %group, "joined reading group");
        self.commit()
    }

    pub fn leave_reading_group(&mut self, member: MemberId) -> Result<()> {
        if self.member_ref(member)?.reading_group().is_none() {
            return Ok(());
        }
        self.detach_affiliation(member)?;
        self.commit()
    }

    /// Clear the member's affiliation on both sides without committing.
    pub(super) fn detach_affiliation(&mut self, member: MemberId) -> Result<()> {
        match self.member_mut(member)?.affiliation.take() {
            Some(Affiliation::Club(club)) => {
                if let Some(club) = self.extents.clubs.get_mut(&club) {
                    club.members.remove(&member);
                }
            }
            Some(Affiliation::ReadingGroup(group)) => {
                if let Some(group) = self.extents.reading_groups.get_mut(&group) {
                    group.participants.remove(&member);
                }
            }
            None => {}
        }
        Ok(())
    }

    pub fn club(&self, id: ClubId) -> Result<&Club> {
        self.club_ref(id)
    }

    pub fn clubs(&self) -> impl Iterator<Item = &Club> {
        self.extents.clubs.values()
    }

    pub fn club_members(&self, id: ClubId) -> Result<Vec<&Member>> {
        self.club_ref(id)?
            .members
            .iter()
            .map(|member| self.member_ref(*member))
            .collect()
    }

    pub fn reading_group(&self, id: ReadingGroupId) -> Result<&ReadingGroup> {
        self.group_ref(id)
    }

    pub fn reading_groups(&self) -> impl Iterator<Item = &ReadingGroup> {
        self.extents.reading_groups.values()
    }

    pub fn group_participants(&self, id: ReadingGroupId) -> Result<Vec<&Member>> {
        self.group_ref(id)?
            .participants
            .iter()
            .map(|member| self.member_ref(*member))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{BookCategory, MembershipStatus, PersonDetails};

    fn library() -> Library {
        Library::with_clock(FixedClock::new(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()))
    }

    fn member(lib: &mut Library, name: &str, status: MembershipStatus) -> MemberId {
        lib.add_member(
            PersonDetails {
                first_name: "Club".into(),
                last_name: "Goer".into(),
                date_of_birth: NaiveDate::from_ymd_opt(1999, 4, 4).unwrap(),
                email: format!("{name}@example.org"),
                phone_number: "+31 20 555 0199".into(),
            },
            status,
        )
        .unwrap()
    }

    fn club(lib: &mut Library, required: Option<MembershipStatus>) -> ClubId {
        lib.add_club(ClubDetails {
            name: "Night owls".into(),
            description: "Late opening regulars".into(),
            required_status: required,
        })
        .unwrap()
    }

    fn group(lib: &mut Library, capacity: u32) -> ReadingGroupId {
        lib.add_reading_group(ReadingGroupDetails {
            name: "Whodunnits".into(),
            focus_category: BookCategory::Mystery,
            max_capacity: capacity,
        })
        .unwrap()
    }

    #[test]
    fn club_and_reading_group_are_exclusive() {
        let mut lib = library();
        let m = member(&mut lib, "x", MembershipStatus::Regular);
        let c = club(&mut lib, None);
        let g = group(&mut lib, 4);

        lib.join_club(m, c).unwrap();
        assert!(matches!(
            lib.join_reading_group(m, g),
            Err(LibraryError::ExclusiveAffiliation(_))
        ));
        assert!(lib.reading_group(g).unwrap().participants().is_empty());

        lib.leave_club(m).unwrap();
        lib.join_reading_group(m, g).unwrap();
        assert_eq!(lib.member(m).unwrap().reading_group(), Some(g));
        assert!(lib.club(c).unwrap().members().is_empty());
    }

    #[test]
    fn joining_another_club_leaves_the_first() {
        let mut lib = library();
        let m = member(&mut lib, "x", MembershipStatus::Regular);
        let first = club(&mut lib, None);
        let second = club(&mut lib, None);

        lib.join_club(m, first).unwrap();
        lib.join_club(m, second).unwrap();

        assert!(lib.club(first).unwrap().members().is_empty());
        assert!(lib.club(second).unwrap().members().contains(&m));
        assert_eq!(lib.member(m).unwrap().club(), Some(second));
    }

    #[test]
    fn clubs_enforce_required_status() {
        let mut lib = library();
        let regular = member(&mut lib, "r", MembershipStatus::Regular);
        let vip = member(&mut lib, "v", MembershipStatus::Vip);
        let c = club(&mut lib, Some(MembershipStatus::Premium));

        assert!(matches!(
            lib.join_club(regular, c),
            Err(LibraryError::StatusTooLow { .. })
        ));
        lib.join_club(vip, c).unwrap();

        // a member cannot drop below the club's requirement
        assert!(lib.set_member_status(vip, MembershipStatus::Regular).is_err());
        lib.set_member_status(vip, MembershipStatus::Premium).unwrap();
    }

    #[test]
    fn reading_group_capacity() {
        let mut lib = library();
        let a = member(&mut lib, "a", MembershipStatus::Regular);
        let b = member(&mut lib, "b", MembershipStatus::Regular);
        let g = group(&mut lib, 1);

        lib.join_reading_group(a, g).unwrap();
        assert!(matches!(
            lib.join_reading_group(b, g),
            Err(LibraryError::CapacityReached { capacity: 1, .. })
        ));

        let mut details = lib.reading_group(g).unwrap().details();
        details.max_capacity = 0;
        assert!(lib.update_reading_group(g, details).is_err());
    }

    #[test]
    fn removing_a_club_frees_its_members() {
        let mut lib = library();
        let m = member(&mut lib, "m", MembershipStatus::Regular);
        let c = club(&mut lib, None);
        lib.join_club(m, c).unwrap();
        lib.remove_club(c).unwrap();
        assert_eq!(lib.member(m).unwrap().affiliation(), None);
    }

    #[test]
    fn raising_the_requirement_cannot_exclude_a_member() {
        let mut lib = library();
        let premium = member(&mut lib, "p", MembershipStatus::Premium);
        let c = club(&mut lib, None);
        lib.join_club(premium, c).unwrap();

        let mut details = lib.club(c).unwrap().details();
        details.required_status = Some(MembershipStatus::Vip);
        assert!(matches!(
            lib.update_club(c, details.clone()),
            Err(LibraryError::StatusTooLow {
                required: MembershipStatus::Vip,
                actual: MembershipStatus::Premium,
            })
        ));
        assert_eq!(lib.club(c).unwrap().required_status(), None);

        details.required_status = Some(MembershipStatus::Premium);
        details.description = "Premium and up".into();
        lib.update_club(c, details).unwrap();
        let updated = lib.club(c).unwrap();
        assert_eq!(updated.required_status(), Some(MembershipStatus::Premium));
        assert_eq!(updated.description(), "Premium and up");
        assert!(updated.members().contains(&premium));
    }

    #[test]
    fn leaving_a_reading_group_frees_the_seat() {
        let mut lib = library();
        let a = member(&mut lib, "a", MembershipStatus::Regular);
        let b = member(&mut lib, "b", MembershipStatus::Regular);
        let g = group(&mut lib, 1);
        lib.join_reading_group(a, g).unwrap();

        lib.leave_reading_group(a).unwrap();
        assert_eq!(lib.member(a).unwrap().affiliation(), None);
        assert!(lib.group_participants(g).unwrap().is_empty());

        // leaving twice is harmless
        lib.leave_reading_group(a).unwrap();
        lib.join_reading_group(b, g).unwrap();
        assert_eq!(lib.member(b).unwrap().reading_group(), Some(g));
    }
}
