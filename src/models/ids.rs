//! Typed identifiers. All entities draw from one counter owned by the
//! library, so an id is unique across every extent and never reused.

use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u64);

        impl $name {
            /// Raw numeric value, as stored in SQLite.
            #[must_use]
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// A plain person that is not a member.
    PersonId
);
entity_id!(MemberId);
entity_id!(BookId);
entity_id!(LoanId);
entity_id!(ReservationId);
entity_id!(EventId);
entity_id!(ClubId);
entity_id!(ReadingGroupId);

/// Hands out identifiers in creation order.
#[derive(Debug, Clone)]
pub(crate) struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub(crate) fn starting_at(next: u64) -> Self {
        Self { next: next.max(1) }
    }

    pub(crate) fn next_raw(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub(crate) fn peek(&self) -> u64 {
        self.next
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}
