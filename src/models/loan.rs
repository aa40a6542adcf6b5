use chrono::NaiveDate;

use super::{BookId, LoanId, MemberId};

/// Fee charged for each day a loan runs past its due date.
pub const LATE_FEE_PER_DAY: f64 = 1.0;

/// A loan links exactly one member with exactly one book. Both ends are
/// mandatory; detaching a loan from either side deletes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Loan {
    pub(crate) id: LoanId,
    pub(crate) member: MemberId,
    pub(crate) book: BookId,
    pub(crate) loan_date: NaiveDate,
    pub(crate) due_date: NaiveDate,
    pub(crate) return_date: Option<NaiveDate>,
    pub(crate) overdue: bool,
    pub(crate) late_fee: f64,
}

impl Loan {
    pub(crate) fn new(
        id: LoanId,
        member: MemberId,
        book: BookId,
        loan_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            member,
            book,
            loan_date,
            due_date,
            return_date: None,
            overdue: false,
            late_fee: 0.0,
        }
    }

    pub fn id(&self) -> LoanId {
        self.id
    }

    pub fn member(&self) -> MemberId {
        self.member
    }

    pub fn book(&self) -> BookId {
        self.book
    }

    pub fn loan_date(&self) -> NaiveDate {
        self.loan_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        self.return_date
    }

    /// Still out, i.e. counted against the member's borrowed items.
    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }

    pub fn is_overdue(&self) -> bool {
        self.overdue
    }

    pub fn late_fee(&self) -> f64 {
        self.late_fee
    }

    /// Recompute the overdue flag and late fee. Returned loans are judged by
    /// their return date, active ones by `today`. Returns whether the flag
    /// flipped to overdue.
    pub(crate) fn evaluate_overdue(&mut self, today: NaiveDate) -> bool {
        let reference = self.return_date.unwrap_or(today);
        let days_late = (reference - self.due_date).num_days().max(0);
        let was_overdue = self.overdue;
        self.overdue = days_late > 0;
        self.late_fee = days_late as f64 * LATE_FEE_PER_DAY;
        self.overdue && !was_overdue
    }
}
