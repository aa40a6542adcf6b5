//! Member ↔ Loan ↔ Book. A loan sits in exactly one member's loan list and
//! exactly one book's history; active loans are counted in the member's
//! borrowed items.

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::Library;
use crate::error::{EntityKind, LibraryError, Result};
use crate::models::{BookId, Loan, LoanId, MemberId};

impl Library {
    /// Lend `book` to `member`. Nothing changes if the member may not borrow
    /// or the book is already out.
    pub fn create_loan(
        &mut self,
        member: MemberId,
        book: BookId,
        loan_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Result<LoanId> {
        if due_date < loan_date {
            return Err(LibraryError::validation(
                "due date",
                "cannot be before the loan date",
            ));
        }
        if let Err(err) = self.member_ref(member)?.ensure_can_borrow() {
            warn!(%member, %book, %err, "loan rejected");
            return Err(err);
        }
        if !self.is_available(book)? {
            warn!(%member, %book, "loan rejected, book already out");
            return Err(LibraryError::Rule(format!("book {book} is already on loan")));
        }

        let id = LoanId(self.next_id());
        self.extents
            .loans
            .insert(id, Loan::new(id, member, book, loan_date, due_date));
        let borrower = self.member_mut(member)?;
        borrower.loans.push(id);
        borrower.increment_borrowed()?;
        self.book_mut(book)?.loan_history.push(id);

        debug!(%id, %member, %book, "created loan");
        self.commit()?;
        Ok(id)
    }

    /// Close a loan. The member's borrowed count drops and the overdue flag
    /// and late fee are settled against the return date.
    pub fn return_loan(&mut self, id: LoanId, return_date: NaiveDate) -> Result<()> {
        let loan = self.loan_ref(id)?;
        if !loan.is_active() {
            return Err(LibraryError::InvalidTransition {
                kind: EntityKind::Loan,
                action: "return",
                state: "already returned".into(),
            });
        }
        if return_date < loan.loan_date {
            return Err(LibraryError::validation(
                "return date",
                "cannot be before the loan date",
            ));
        }
        let member = loan.member;

        self.member_mut(member)?.decrement_borrowed()?;
        let today = self.clock.today();
        let loan = self.loan_mut(id)?;
        loan.return_date = Some(return_date);
        loan.evaluate_overdue(today);

        debug!(%id, %member, late_fee = loan.late_fee, "returned loan");
        self.commit()
    }

    /// Re-evaluate the overdue flag and late fee as of today.
    pub fn check_overdue(&mut self, id: LoanId) -> Result<bool> {
        let today = self.clock.today();
        let loan = self.loan_mut(id)?;
        loan.evaluate_overdue(today);
        let overdue = loan.overdue;
        self.commit()?;
        Ok(overdue)
    }

    /// Move a loan to another member, keeping both loan lists and borrowed
    /// counts consistent.
    pub fn reassign_loan_member(&mut self, id: LoanId, member: MemberId) -> Result<()> {
        let loan = self.loan_ref(id)?;
        let (previous, active) = (loan.member, loan.is_active());
        if previous == member {
            return Ok(());
        }
        let target = self.member_ref(member)?;
        if active {
            target.ensure_can_borrow()?;
        }

        let old = self.member_mut(previous)?;
        old.loans.retain(|loan| *loan != id);
        if active {
            old.decrement_borrowed()?;
        }
        let new = self.member_mut(member)?;
        new.loans.push(id);
        if active {
            new.increment_borrowed()?;
        }
        self.loan_mut(id)?.member = member;

        debug!(%id, from = %previous, to = %member, "moved loan to member");
        self.commit()
    }

    /// Move a loan record into another book's history. An active loan can
    /// only move onto a book that is not out.
    pub fn reassign_loan_book(&mut self, id: LoanId, book: BookId) -> Result<()> {
        let loan = self.loan_ref(id)?;
        let (previous, active) = (loan.book, loan.is_active());
        if previous == book {
            return Ok(());
        }
        if active && !self.is_available(book)? {
            return Err(LibraryError::Rule(format!("book {book} is already on loan")));
        }

        self.book_mut(previous)?
            .loan_history
            .retain(|loan| *loan != id);
        self.book_mut(book)?.loan_history.push(id);
        self.loan_mut(id)?.book = book;

        debug!(%id, from = %previous, to = %book, "moved loan to book");
        self.commit()
    }

    /// Remove a loan from both the member and the book and delete it.
    pub fn remove_loan(&mut self, id: LoanId) -> Result<()> {
        self.detach_loan(id)?;
        self.commit()
    }

    pub(super) fn detach_loan(&mut self, id: LoanId) -> Result<()> {
        let loan = self
            .extents
            .loans
            .remove(&id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Loan, id))?;
        if let Some(member) = self.extents.members.get_mut(&loan.member) {
            member.loans.retain(|other| *other != id);
            if loan.is_active() {
                member.decrement_borrowed()?;
            }
        }
        if let Some(book) = self.extents.books.get_mut(&loan.book) {
            book.loan_history.retain(|other| *other != id);
        }
        debug!(%id, "removed loan");
        Ok(())
    }

    pub fn loan(&self, id: LoanId) -> Result<&Loan> {
        self.loan_ref(id)
    }

    pub fn loans(&self) -> impl Iterator<Item = &Loan> {
        self.extents.loans.values()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{BookCategory, BookDetails, MembershipStatus, PersonDetails};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    fn setup() -> (Library, MemberId, BookId) {
        let mut lib = Library::with_clock(FixedClock::new(day(20)));
        let member = lib
            .add_member(
                PersonDetails {
                    first_name: "Alan".into(),
                    last_name: "Turing".into(),
                    date_of_birth: NaiveDate::from_ymd_opt(1980, 6, 23).unwrap(),
                    email: "alan@example.org".into(),
                    phone_number: "+44 161 555 0101".into(),
                },
                MembershipStatus::Regular,
            )
            .unwrap();
        let book = lib
            .add_book(BookDetails {
                isbn: "0-306-40615-2".into(),
                title: "Computable Numbers".into(),
                author: "A. M. Turing".into(),
                publication_year: 1936,
                category: BookCategory::Science,
                page_count: 36,
            })
            .unwrap();
        (lib, member, book)
    }

    fn other_member(lib: &mut Library, status: MembershipStatus) -> MemberId {
        lib.add_member(
            PersonDetails {
                first_name: "Joan".into(),
                last_name: "Clarke".into(),
                date_of_birth: NaiveDate::from_ymd_opt(1987, 6, 24).unwrap(),
                email: "joan@example.org".into(),
                phone_number: "+44 161 555 0102".into(),
            },
            status,
        )
        .unwrap()
    }

    fn extra_books(lib: &mut Library) -> Vec<BookId> {
        [
            "978-0-306-40615-7",
            "978-0-13-110362-7",
            "978-0-596-52068-7",
            "978-1-59327-584-6",
            "978-0-14-143951-8",
        ]
        .iter()
        .enumerate()
        .map(|(n, isbn)| {
            lib.add_book(BookDetails {
                isbn: (*isbn).into(),
                title: format!("Volume {n}"),
                author: "Various".into(),
                publication_year: 1990,
                category: BookCategory::Science,
                page_count: 100,
            })
            .unwrap()
        })
        .collect()
    }

    #[test]
    fn loan_is_visible_from_both_sides() {
        let (mut lib, member, book) = setup();
        let loan = lib.create_loan(member, book, day(1), day(14)).unwrap();

        assert_eq!(lib.member(member).unwrap().loan_ids(), &[loan]);
        assert_eq!(lib.book(book).unwrap().loan_history(), &[loan]);
        assert_eq!(lib.member(member).unwrap().borrowed_items(), 1);
        assert!(!lib.is_available(book).unwrap());
    }

    #[test]
    fn due_date_before_loan_date_is_rejected() {
        let (mut lib, member, book) = setup();
        assert!(lib.create_loan(member, book, day(10), day(9)).is_err());
        assert_eq!(lib.loans().count(), 0);
    }

    #[test]
    fn returning_settles_fee_and_count() {
        let (mut lib, member, book) = setup();
        let loan = lib.create_loan(member, book, day(1), day(10)).unwrap();
        lib.return_loan(loan, day(13)).unwrap();

        let loan_ref = lib.loan(loan).unwrap();
        assert!(loan_ref.is_overdue());
        assert_eq!(loan_ref.late_fee(), 3.0);
        assert_eq!(lib.member(member).unwrap().borrowed_items(), 0);
        // history keeps the returned loan
        assert_eq!(lib.book(book).unwrap().loan_history(), &[loan]);
        assert!(lib.return_loan(loan, day(14)).is_err());
    }

    #[test]
    fn check_overdue_uses_today() {
        let (mut lib, member, book) = setup();
        let loan = lib.create_loan(member, book, day(1), day(15)).unwrap();
        assert!(lib.check_overdue(loan).unwrap());
        assert_eq!(lib.loan(loan).unwrap().late_fee(), 5.0);
    }

    #[test]
    fn removing_detaches_from_both_sides() {
        let (mut lib, member, book) = setup();
        let loan = lib.create_loan(member, book, day(1), day(14)).unwrap();
        lib.remove_loan(loan).unwrap();

        assert!(lib.member(member).unwrap().loan_ids().is_empty());
        assert!(lib.book(book).unwrap().loan_history().is_empty());
        assert_eq!(lib.member(member).unwrap().borrowed_items(), 0);
        assert!(lib.loan(loan).is_err());
    }

    #[test]
    fn a_book_that_is_out_cannot_be_lent_again() {
        let (mut lib, member, book) = setup();
        let joan = other_member(&mut lib, MembershipStatus::Regular);
        let loan = lib.create_loan(member, book, day(1), day(14)).unwrap();

        assert!(matches!(
            lib.create_loan(joan, book, day(2), day(16)),
            Err(LibraryError::Rule(_))
        ));
        assert_eq!(lib.book(book).unwrap().loan_history(), &[loan]);
        assert!(lib.member(joan).unwrap().loan_ids().is_empty());
        assert_eq!(lib.member(joan).unwrap().borrowed_items(), 0);

        lib.return_loan(loan, day(10)).unwrap();
        lib.create_loan(joan, book, day(10), day(24)).unwrap();
    }

    #[test]
    fn active_loan_cannot_move_onto_a_book_that_is_out() {
        let (mut lib, member, book) = setup();
        let others = extra_books(&mut lib);
        let first = lib.create_loan(member, book, day(1), day(14)).unwrap();
        let second = lib.create_loan(member, others[0], day(1), day(14)).unwrap();

        assert!(lib.reassign_loan_book(second, book).is_err());
        assert_eq!(lib.book(book).unwrap().loan_history(), &[first]);
        assert_eq!(lib.loan(second).unwrap().book(), others[0]);

        // returned records may be filed anywhere
        lib.return_loan(second, day(5)).unwrap();
        lib.reassign_loan_book(second, book).unwrap();
        assert_eq!(lib.book(book).unwrap().loan_history(), &[first, second]);
    }

    #[test]
    fn moving_to_a_blacklisted_member_changes_nothing() {
        let (mut lib, member, book) = setup();
        let joan = other_member(&mut lib, MembershipStatus::Regular);
        let loan = lib.create_loan(member, book, day(1), day(14)).unwrap();
        lib.set_blacklisted(joan, true).unwrap();

        assert!(matches!(
            lib.reassign_loan_member(loan, joan),
            Err(LibraryError::Blacklisted(_))
        ));
        assert_eq!(lib.loan(loan).unwrap().member(), member);
        assert_eq!(lib.member(member).unwrap().loan_ids(), &[loan]);
        assert_eq!(lib.member(member).unwrap().borrowed_items(), 1);
        assert!(lib.member(joan).unwrap().loan_ids().is_empty());
        assert_eq!(lib.member(joan).unwrap().borrowed_items(), 0);
    }

    #[test]
    fn moving_to_a_member_at_the_limit_changes_nothing() {
        let (mut lib, member, book) = setup();
        let joan = other_member(&mut lib, MembershipStatus::Regular);
        for other in extra_books(&mut lib) {
            lib.create_loan(joan, other, day(1), day(14)).unwrap();
        }
        let loan = lib.create_loan(member, book, day(1), day(14)).unwrap();

        assert!(matches!(
            lib.reassign_loan_member(loan, joan),
            Err(LibraryError::BorrowLimit { limit: 5, .. })
        ));
        assert_eq!(lib.loan(loan).unwrap().member(), member);
        assert_eq!(lib.member(member).unwrap().borrowed_items(), 1);
        assert_eq!(lib.member(joan).unwrap().borrowed_items(), 5);
        assert!(!lib.member(joan).unwrap().loan_ids().contains(&loan));

        // a returned loan does not count against the limit
        lib.return_loan(loan, day(3)).unwrap();
        lib.reassign_loan_member(loan, joan).unwrap();
        assert_eq!(lib.member(joan).unwrap().loan_ids().len(), 6);
        assert_eq!(lib.member(joan).unwrap().borrowed_items(), 5);
    }
}
