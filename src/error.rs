//! Error type shared by the domain model and the extent store.

use thiserror::Error;

use crate::models::MembershipStatus;

/// Which extent an identifier belongs to. Used to make "not found" and
/// uniqueness errors readable without carrying the full entity around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Person,
    Member,
    Book,
    Loan,
    Reservation,
    Event,
    Club,
    ReadingGroup,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Person => "person",
            EntityKind::Member => "member",
            EntityKind::Book => "book",
            EntityKind::Loan => "loan",
            EntityKind::Reservation => "reservation",
            EntityKind::Event => "event",
            EntityKind::Club => "club",
            EntityKind::ReadingGroup => "reading group",
        };
        f.write_str(name)
    }
}

/// Every way a library operation can be rejected.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// A single field failed its format or range check.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// A unique attribute (email, ISBN) is already taken.
    #[error("{field} already in use: {value}")]
    Duplicate { field: &'static str, value: String },

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: u64 },

    /// Event or reading group has no free places left.
    #[error("{what} has reached its maximum capacity of {capacity}")]
    CapacityReached { what: EntityKind, capacity: u32 },

    #[error("member {member} cannot borrow more than {limit} items with {status} status")]
    BorrowLimit {
        member: u64,
        status: MembershipStatus,
        limit: u32,
    },

    #[error("member {0} is blacklisted")]
    Blacklisted(u64),

    /// The member already belongs to the other side of the club/reading group pair.
    #[error("member {0} cannot be in both a club and a reading group")]
    ExclusiveAffiliation(u64),

    #[error("requires {required} status or higher, member has {actual}")]
    StatusTooLow {
        required: MembershipStatus,
        actual: MembershipStatus,
    },

    #[error("cannot {action} a {kind} that is {state}")]
    InvalidTransition {
        kind: EntityKind,
        action: &'static str,
        state: String,
    },

    #[error("member {member} is not registered for event {event}")]
    NotRegistered { member: u64, event: u64 },

    /// Generic rule violation that does not warrant its own variant.
    #[error("{0}")]
    Rule(String),

    /// Stored data could not be mapped back onto the domain model.
    #[error("corrupt store: {0}")]
    Corrupt(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LibraryError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(kind: EntityKind, id: impl Into<u64>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// True for errors caused by the caller's input rather than the store.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::Io(_) | Self::Corrupt(_))
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
