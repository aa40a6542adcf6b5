//! Member ↔ Event registration and attendance. Attendance is a subset of
//! registration on both sides at all times.

use tracing::debug;

use super::Library;
use crate::error::{EntityKind, LibraryError, Result};
use crate::models::{Event, EventDetails, EventId, Member, MemberId};

impl Library {
    pub fn add_event(&mut self, details: EventDetails) -> Result<EventId> {
        let details = details.validated()?;
        let id = EventId(self.next_id());
        self.extents.events.insert(id, Event::new(id, details));
        debug!(%id, "added event");
        self.commit()?;
        Ok(id)
    }

    /// Replace the event's fields. Capacity may not drop below the current
    /// number of registrations.
    pub fn update_event(&mut self, id: EventId, details: EventDetails) -> Result<()> {
        let details = details.validated()?;
        let registered = self.event_ref(id)?.registered.len();
        if (details.max_attendees as usize) < registered {
            return Err(LibraryError::Rule(format!(
                "cannot reduce maximum attendees below the {registered} current registrations"
            )));
        }
        self.event_mut(id)?.apply(details);
        self.commit()
    }

    pub fn remove_event(&mut self, id: EventId) -> Result<()> {
        let event = self
            .extents
            .events
            .remove(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Event, id))?;
        for member in &event.registered {
            if let Some(member) = self.extents.members.get_mut(member) {
                member.registered_events.remove(&id);
                member.attended_events.remove(&id);
            }
        }
        debug!(%id, "removed event");
        self.commit()
    }

    /// Register a member. Registering twice is a no-op; a full event
    /// rejects new registrations.
    pub fn register_for_event(&mut self, member: MemberId, event: EventId) -> Result<()> {
        self.member_ref(member)?;
        let target = self.event_ref(event)?;
        if target.registered.contains(&member) {
            return Ok(());
        }
        if target.is_full() {
            return Err(LibraryError::CapacityReached {
                what: EntityKind::Event,
                capacity: target.max_attendees,
            });
        }

        self.event_mut(event)?.registered.insert(member);
        self.member_mut(member)?.registered_events.insert(event);
        debug!(%member, %event, "registered for event");
        self.commit()
    }

    /// Drop a registration, and with it any recorded attendance.
    pub fn unregister_from_event(&mut self, member: MemberId, event: EventId) -> Result<()> {
        self.member_ref(member)?;
        if !self.event_ref(event)?.registered.contains(&member) {
            return Ok(());
        }

        let target = self.event_mut(event)?;
        target.registered.remove(&member);
        target.attended.remove(&member);
        let attendee = self.member_mut(member)?;
        attendee.registered_events.remove(&event);
        attendee.attended_events.remove(&event);
        debug!(%member, %event, "unregistered from event");
        self.commit()
    }

    /// Only registered members can be marked as attended.
    pub fn mark_attended(&mut self, member: MemberId, event: EventId) -> Result<()> {
        self.member_ref(member)?;
        let target = self.event_ref(event)?;
        if !target.registered.contains(&member) {
            return Err(LibraryError::NotRegistered {
                member: member.get(),
                event: event.get(),
            });
        }
        if target.attended.contains(&member) {
            return Ok(());
        }

        self.event_mut(event)?.attended.insert(member);
        self.member_mut(member)?.attended_events.insert(event);
        debug!(%member, %event, "marked attended");
        self.commit()
    }

    pub fn unmark_attended(&mut self, member: MemberId, event: EventId) -> Result<()> {
        self.member_ref(member)?;
        if !self.event_ref(event)?.attended.contains(&member) {
            return Ok(());
        }

        self.event_mut(event)?.attended.remove(&member);
        self.member_mut(member)?.attended_events.remove(&event);
        self.commit()
    }

    pub fn event(&self, id: EventId) -> Result<&Event> {
        self.event_ref(id)
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.extents.events.values()
    }

    pub fn event_registrations(&self, id: EventId) -> Result<Vec<&Member>> {
        self.event_ref(id)?
            .registered
            .iter()
            .map(|member| self.member_ref(*member))
            .collect()
    }

    pub fn event_attendees(&self, id: EventId) -> Result<Vec<&Member>> {
        self.event_ref(id)?
            .attended
            .iter()
            .map(|member| self.member_ref(*member))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{MembershipStatus, PersonDetails};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 5)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn setup(capacity: u32) -> (Library, EventId, Vec<MemberId>) {
        let mut lib = Library::with_clock(FixedClock::new(NaiveDate::from_ymd_opt(2024, 11, 1).unwrap()));
        let event = lib
            .add_event(EventDetails {
                name: "Poetry night".into(),
                start_time: at(18),
                end_time: at(20),
                location: "Reading room".into(),
                max_attendees: capacity,
            })
            .unwrap();
        let members = ["ann", "bob", "cyd"]
            .iter()
            .map(|name| {
                lib.add_member(
                    PersonDetails {
                        first_name: "Test".into(),
                        last_name: "Member".into(),
                        date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
                        email: format!("{name}@example.org"),
                        phone_number: "555 010 0000".into(),
                    },
                    MembershipStatus::Regular,
                )
                .unwrap()
            })
            .collect();
        (lib, event, members)
    }

    #[test]
    fn capacity_limits_registrations() {
        let (mut lib, event, members) = setup(2);
        lib.register_for_event(members[0], event).unwrap();
        lib.register_for_event(members[1], event).unwrap();
        // repeat registration is not a new seat
        lib.register_for_event(members[1], event).unwrap();

        let err = lib.register_for_event(members[2], event).unwrap_err();
        assert!(matches!(err, LibraryError::CapacityReached { capacity: 2, .. }));
        assert!(lib.member(members[2]).unwrap().registered_events().is_empty());
    }

    #[test]
    fn attendance_requires_registration() {
        let (mut lib, event, members) = setup(5);
        assert!(matches!(
            lib.mark_attended(members[0], event),
            Err(LibraryError::NotRegistered { .. })
        ));
        lib.register_for_event(members[0], event).unwrap();
        lib.mark_attended(members[0], event).unwrap();

        assert_eq!(lib.event_attendees(event).unwrap().len(), 1);
        assert!(lib.member(members[0]).unwrap().attended_events().contains(&event));
    }

    #[test]
    fn unregistering_clears_attendance_on_both_sides() {
        let (mut lib, event, members) = setup(5);
        lib.register_for_event(members[0], event).unwrap();
        lib.mark_attended(members[0], event).unwrap();
        lib.unregister_from_event(members[0], event).unwrap();

        let member = lib.member(members[0]).unwrap();
        assert!(member.registered_events().is_empty());
        assert!(member.attended_events().is_empty());
        assert!(lib.event(event).unwrap().attended_members().is_empty());
    }

    #[test]
    fn capacity_cannot_shrink_below_registrations() {
        let (mut lib, event, members) = setup(3);
        lib.register_for_event(members[0], event).unwrap();
        lib.register_for_event(members[1], event).unwrap();

        let mut details = lib.event(event).unwrap().details();
        details.max_attendees = 1;
        assert!(lib.update_event(event, details.clone()).is_err());
        details.max_attendees = 2;
        lib.update_event(event, details).unwrap();
    }

    #[test]
    fn end_must_follow_start() {
        let (mut lib, event, _) = setup(3);
        let mut details = lib.event(event).unwrap().details();
        details.end_time = at(17);
        assert!(lib.update_event(event, details).is_err());
    }

    #[test]
    fn unmarking_keeps_the_registration() {
        let (mut lib, event, members) = setup(5);
        lib.register_for_event(members[0], event).unwrap();
        lib.mark_attended(members[0], event).unwrap();
        let attended: Vec<EventId> = lib
            .member_attended_events(members[0])
            .unwrap()
            .iter()
            .map(|event| event.id())
            .collect();
        assert_eq!(attended, vec![event]);

        lib.unmark_attended(members[0], event).unwrap();
        assert!(lib.member_attended_events(members[0]).unwrap().is_empty());
        assert!(lib.event_attendees(event).unwrap().is_empty());
        assert_eq!(lib.event_registrations(event).unwrap().len(), 1);
        assert_eq!(lib.member_registered_events(members[0]).unwrap().len(), 1);
    }

    #[test]
    fn removing_an_event_detaches_every_member() {
        let (mut lib, event, members) = setup(5);
        for member in &members {
            lib.register_for_event(*member, event).unwrap();
        }
        lib.mark_attended(members[1], event).unwrap();

        lib.remove_event(event).unwrap();
        assert!(matches!(
            lib.event(event),
            Err(LibraryError::NotFound { kind: EntityKind::Event, .. })
        ));
        for member in &members {
            let member = lib.member(*member).unwrap();
            assert!(member.registered_events().is_empty());
            assert!(member.attended_events().is_empty());
        }
        assert!(lib.member_attended_events(members[1]).unwrap().is_empty());
    }
}
