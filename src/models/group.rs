//! The two sides of a member's exclusive affiliation.

use std::collections::BTreeSet;

use super::{BookCategory, ClubId, MemberId, MembershipStatus, ReadingGroupId};
use crate::error::Result;
use crate::validation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClubDetails {
    pub name: String,
    pub description: String,
    /// Lowest membership status allowed to join; `None` admits everyone.
    pub required_status: Option<MembershipStatus>,
}

impl ClubDetails {
    pub(crate) fn validated(&self) -> Result<Self> {
        Ok(Self {
            name: validation::text("club name", &self.name)?,
            description: validation::text("description", &self.description)?,
            required_status: self.required_status,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Club {
    pub(crate) id: ClubId,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) required_status: Option<MembershipStatus>,
    pub(crate) members: BTreeSet<MemberId>,
}

impl Club {
    pub(crate) fn new(id: ClubId, details: ClubDetails) -> Self {
        Self {
            id,
            name: details.name,
            description: details.description,
            required_status: details.required_status,
            members: BTreeSet::new(),
        }
    }

    pub(crate) fn apply(&mut self, details: ClubDetails) {
        self.name = details.name;
        self.description = details.description;
        self.required_status = details.required_status;
    }

    pub fn id(&self) -> ClubId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn required_status(&self) -> Option<MembershipStatus> {
        self.required_status
    }

    pub fn members(&self) -> &BTreeSet<MemberId> {
        &self.members
    }

    /// Whether a member of the given status meets the club's requirement.
    pub fn admits(&self, status: MembershipStatus) -> bool {
        self.required_status.map_or(true, |required| status >= required)
    }

    pub fn details(&self) -> ClubDetails {
        ClubDetails {
            name: self.name.clone(),
            description: self.description.clone(),
            required_status: self.required_status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingGroupDetails {
    pub name: String,
    pub focus_category: BookCategory,
    pub max_capacity: u32,
}

impl ReadingGroupDetails {
    pub(crate) fn validated(&self) -> Result<Self> {
        Ok(Self {
            name: validation::text("group name", &self.name)?,
            focus_category: self.focus_category,
            max_capacity: validation::positive("maximum capacity", self.max_capacity)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ReadingGroup {
    pub(crate) id: ReadingGroupId,
    pub(crate) name: String,
    pub(crate) focus_category: BookCategory,
    pub(crate) max_capacity: u32,
    pub(crate) participants: BTreeSet<MemberId>,
}

impl ReadingGroup {
    pub(crate) fn new(id: ReadingGroupId, details: ReadingGroupDetails) -> Self {
        Self {
            id,
            name: details.name,
            focus_category: details.focus_category,
            max_capacity: details.max_capacity,
            participants: BTreeSet::new(),
        }
    }

    pub(crate) fn apply(&mut self, details: ReadingGroupDetails) {
        self.name = details.name;
        self.focus_category = details.focus_category;
        self.max_capacity = details.max_capacity;
    }

    pub fn id(&self) -> ReadingGroupId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn focus_category(&self) -> BookCategory {
        self.focus_category
    }

    pub fn max_capacity(&self) -> u32 {
        self.max_capacity
    }

    pub fn participants(&self) -> &BTreeSet<MemberId> {
        &self.participants
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.max_capacity as usize
    }

    pub fn details(&self) -> ReadingGroupDetails {
        ReadingGroupDetails {
            name: self.name.clone(),
            focus_category: self.focus_category,
            max_capacity: self.max_capacity,
        }
    }
}
