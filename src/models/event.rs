use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use super::{EventId, MemberId};
use crate::error::{LibraryError, Result};
use crate::validation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetails {
    pub name: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub location: String,
    pub max_attendees: u32,
}

impl EventDetails {
    /// Start and end are checked together so an event can be moved in one
    /// step without passing through an invalid interval.
    pub(crate) fn validated(&self) -> Result<Self> {
        if self.start_time >= self.end_time {
            return Err(LibraryError::validation(
                "start time",
                "must be before the end time",
            ));
        }
        Ok(Self {
            name: validation::text("event name", &self.name)?,
            start_time: self.start_time,
            end_time: self.end_time,
            location: validation::text("location", &self.location)?,
            max_attendees: validation::positive("maximum attendees", self.max_attendees)?,
        })
    }
}

/// A library event. Attendees are always a subset of registered members.
#[derive(Debug, Clone)]
pub struct Event {
    pub(crate) id: EventId,
    pub(crate) name: String,
    pub(crate) start_time: NaiveDateTime,
    pub(crate) end_time: NaiveDateTime,
    pub(crate) location: String,
    pub(crate) max_attendees: u32,
    pub(crate) registered: BTreeSet<MemberId>,
    pub(crate) attended: BTreeSet<MemberId>,
}

impl Event {
    pub(crate) fn new(id: EventId, details: EventDetails) -> Self {
        Self {
            id,
            name: details.name,
            start_time: details.start_time,
            end_time: details.end_time,
            location: details.location,
            max_attendees: details.max_attendees,
            registered: BTreeSet::new(),
            attended: BTreeSet::new(),
        }
    }

    pub(crate) fn apply(&mut self, details: EventDetails) {
        self.name = details.name;
        self.start_time = details.start_time;
        self.end_time = details.end_time;
        self.location = details.location;
        self.max_attendees = details.max_attendees;
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    pub fn end_time(&self) -> NaiveDateTime {
        self.end_time
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn max_attendees(&self) -> u32 {
        self.max_attendees
    }

    pub fn registered_members(&self) -> &BTreeSet<MemberId> {
        &self.registered
    }

    pub fn attended_members(&self) -> &BTreeSet<MemberId> {
        &self.attended
    }

    pub fn is_full(&self) -> bool {
        self.registered.len() >= self.max_attendees as usize
    }

    pub fn details(&self) -> EventDetails {
        EventDetails {
            name: self.name.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            location: self.location.clone(),
            max_attendees: self.max_attendees,
        }
    }
}
