//! Domain entities. These stay plain data holders with validated fields;
//! the [`crate::library::Library`] owns them and keeps both ends of every
//! relationship in step.

mod book;
mod event;
mod group;
mod ids;
mod loan;
mod member;
mod person;
mod reservation;

use std::fmt;
use std::str::FromStr;

pub use book::{Book, BookDetails};
pub use event::{Event, EventDetails};
pub use group::{Club, ClubDetails, ReadingGroup, ReadingGroupDetails};
pub use ids::{BookId, ClubId, EventId, LoanId, MemberId, PersonId, ReadingGroupId, ReservationId};
pub(crate) use ids::IdAllocator;
pub use loan::{Loan, LATE_FEE_PER_DAY};
pub use member::{Affiliation, Member};
pub use person::{Person, PersonDetails};
pub use reservation::Reservation;

use crate::error::LibraryError;

/// Membership tiers, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MembershipStatus {
    Regular,
    Premium,
    Vip,
}

impl MembershipStatus {
    pub const ALL: [MembershipStatus; 3] = [Self::Regular, Self::Premium, Self::Vip];

    /// Maximum number of simultaneously borrowed items.
    #[must_use]
    pub fn borrow_limit(self) -> u32 {
        match self {
            MembershipStatus::Regular => 5,
            MembershipStatus::Premium => 10,
            MembershipStatus::Vip => 15,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MembershipStatus::Regular => "Regular",
            MembershipStatus::Premium => "Premium",
            MembershipStatus::Vip => "VIP",
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipStatus {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| LibraryError::validation("membership status", format!("unknown '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookCategory {
    Fiction,
    NonFiction,
    Science,
    History,
    Biography,
    Fantasy,
    Mystery,
    Poetry,
    Children,
}

impl BookCategory {
    pub const ALL: [BookCategory; 9] = [
        Self::Fiction,
        Self::NonFiction,
        Self::Science,
        Self::History,
        Self::Biography,
        Self::Fantasy,
        Self::Mystery,
        Self::Poetry,
        Self::Children,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BookCategory::Fiction => "Fiction",
            BookCategory::NonFiction => "Non-fiction",
            BookCategory::Science => "Science",
            BookCategory::History => "History",
            BookCategory::Biography => "Biography",
            BookCategory::Fantasy => "Fantasy",
            BookCategory::Mystery => "Mystery",
            BookCategory::Poetry => "Poetry",
            BookCategory::Children => "Children",
        }
    }
}

impl fmt::Display for BookCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookCategory {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| LibraryError::validation("book category", format!("unknown '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationStatus {
    Pending,
    Fulfilled,
    Canceled,
    Expired,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 4] =
        [Self::Pending, Self::Fulfilled, Self::Canceled, Self::Expired];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "Pending",
            ReservationStatus::Fulfilled => "Fulfilled",
            ReservationStatus::Canceled => "Canceled",
            ReservationStatus::Expired => "Expired",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| LibraryError::validation("reservation status", format!("unknown '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_order_matches_tiers() {
        assert!(MembershipStatus::Regular < MembershipStatus::Premium);
        assert!(MembershipStatus::Premium < MembershipStatus::Vip);
        assert_eq!(MembershipStatus::Vip.borrow_limit(), 15);
    }

    #[test]
    fn enums_parse_their_display_form() {
        for status in MembershipStatus::ALL {
            assert_eq!(status.to_string().parse::<MembershipStatus>().unwrap(), status);
        }
        for category in BookCategory::ALL {
            assert_eq!(category.as_str().parse::<BookCategory>().unwrap(), category);
        }
        assert_eq!("expired".parse::<ReservationStatus>().unwrap(), ReservationStatus::Expired);
        assert!("Gold".parse::<MembershipStatus>().is_err());
    }
}
