//! Date-driven status refresh across every active loan and pending
//! reservation.

use tracing::info;

use super::Library;
use crate::error::Result;
use crate::models::{Loan, LoanId, ReservationId};

/// What a status sweep changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Active loans that became overdue during this sweep.
    pub newly_overdue: Vec<LoanId>,
    /// Pending reservations that expired during this sweep.
    pub newly_expired: Vec<ReservationId>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.newly_overdue.is_empty() && self.newly_expired.is_empty()
    }
}

impl Library {
    /// Run the overdue check on every active loan and the expiry check on
    /// every pending reservation, as of today. One extent dump at the end.
    pub fn refresh_statuses(&mut self) -> Result<SweepReport> {
        let today = self.clock.today();
        let mut report = SweepReport::default();

        for loan in self.extents.loans.values_mut() {
            if loan.is_active() && loan.evaluate_overdue(today) {
                report.newly_overdue.push(loan.id);
            }
        }
        for reservation in self.extents.reservations.values_mut() {
            if reservation.expire_if_due(today) {
                report.newly_expired.push(reservation.id);
            }
        }

        info!(
            overdue = report.newly_overdue.len(),
            expired = report.newly_expired.len(),
            %today,
            "status sweep finished"
        );
        self.commit()?;
        Ok(report)
    }

    /// Active loans currently flagged overdue, oldest due date first.
    pub fn overdue_loans(&self) -> Vec<&Loan> {
        let mut loans: Vec<_> = self
            .loans()
            .filter(|loan| loan.is_active() && loan.is_overdue())
            .collect();
        loans.sort_by_key(|loan| (loan.due_date(), loan.id()));
        loans
    }
}
