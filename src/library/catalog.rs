//! Book extent: catalog fields, ratings and the book side of loans and
//! reservations.

use tracing::debug;

use super::Library;
use crate::error::{LibraryError, Result};
use crate::models::{Book, BookDetails, BookId, Loan, Reservation};
use crate::validation;

impl Library {
    pub fn add_book(&mut self, details: BookDetails) -> Result<BookId> {
        let details = details.validated(self.clock.current_year())?;
        self.ensure_isbn_free(&details.isbn, None)?;

        let id = BookId(self.next_id());
        self.extents.books.insert(id, Book::new(id, details));
        debug!(%id, "added book");
        self.commit()?;
        Ok(id)
    }

    pub fn update_book(&mut self, id: BookId, details: BookDetails) -> Result<()> {
        let details = details.validated(self.clock.current_year())?;
        self.book_ref(id)?;
        self.ensure_isbn_free(&details.isbn, Some(id))?;

        self.book_mut(id)?.apply(details);
        self.commit()
    }

    pub fn rate_book(&mut self, id: BookId, rating: f64) -> Result<()> {
        let rating = validation::rating(rating)?;
        self.book_mut(id)?.rating = Some(rating);
        self.commit()
    }

    /// Delete a book with its loan history and reservations. A book that is
    /// currently lent out cannot be removed.
    pub fn remove_book(&mut self, id: BookId) -> Result<()> {
        if !self.is_available(id)? {
            return Err(LibraryError::Rule(format!(
                "book {id} is on loan and cannot be removed"
            )));
        }
        let book = self.book_ref(id)?.clone();
        for loan in &book.loan_history {
            self.detach_loan(*loan)?;
        }
        for reservation in &book.reservations {
            self.detach_reservation(*reservation)?;
        }

        self.extents.books.remove(&id);
        debug!(%id, "removed book");
        self.commit()
    }

    pub fn book(&self, id: BookId) -> Result<&Book> {
        self.book_ref(id)
    }

    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.extents.books.values()
    }

    /// ISBNs compare without hyphens or spaces.
    pub fn find_book_by_isbn(&self, isbn: &str) -> Option<&Book> {
        let wanted = compact_isbn(isbn);
        self.books().find(|book| compact_isbn(&book.isbn) == wanted)
    }

    fn ensure_isbn_free(&self, isbn: &str, owner: Option<BookId>) -> Result<()> {
        match self.find_book_by_isbn(isbn) {
            Some(book) if Some(book.id) != owner => Err(LibraryError::Duplicate {
                field: "ISBN",
                value: isbn.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Every loan of the book, oldest record first.
    pub fn book_loan_history(&self, id: BookId) -> Result<Vec<&Loan>> {
        self.book_ref(id)?
            .loan_history
            .iter()
            .map(|loan| self.loan_ref(*loan))
            .collect()
    }

    /// Reservations ordered by reservation date (ties by creation order).
    pub fn book_reservations(&self, id: BookId) -> Result<Vec<&Reservation>> {
        let mut reservations = self
            .book_ref(id)?
            .reservations
            .iter()
            .map(|reservation| self.reservation_ref(*reservation))
            .collect::<Result<Vec<_>>>()?;
        reservations.sort_by_key(|reservation| (reservation.reservation_date, reservation.id));
        Ok(reservations)
    }

    /// A book is available when none of its loans is still active.
    pub fn is_available(&self, id: BookId) -> Result<bool> {
        Ok(self
            .book_loan_history(id)?
            .iter()
            .all(|loan| !loan.is_active()))
    }
}

fn compact_isbn(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| *c != '-' && *c != ' ')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::clock::FixedClock;
    use crate::models::BookCategory;

    fn library() -> Library {
        Library::with_clock(FixedClock::new(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()))
    }

    fn details(isbn: &str) -> BookDetails {
        BookDetails {
            isbn: isbn.into(),
            title: "The Mythical Man-Month".into(),
            author: "Frederick Brooks".into(),
            publication_year: 1975,
            category: BookCategory::NonFiction,
            page_count: 322,
        }
    }

    #[test]
    fn isbn_is_unique_regardless_of_hyphens() {
        let mut lib = library();
        lib.add_book(details("978-0-306-40615-7")).unwrap();
        let err = lib.add_book(details("9780306406157")).unwrap_err();
        assert!(matches!(err, LibraryError::Duplicate { field: "ISBN", .. }));
    }

    #[test]
    fn publication_year_cannot_be_in_the_future() {
        let mut lib = library();
        let mut d = details("0-306-40615-2");
        d.publication_year = 2025;
        assert!(lib.add_book(d.clone()).is_err());
        d.publication_year = 2024;
        assert!(lib.add_book(d).is_ok());
    }

    #[test]
    fn books_start_unrated() {
        let mut lib = library();
        let id = lib.add_book(details("0-306-40615-2")).unwrap();
        assert_eq!(lib.book(id).unwrap().rating(), None);
        assert!(lib.rate_book(id, 0.0).is_err());
        lib.rate_book(id, 4.5).unwrap();
        assert_eq!(lib.book(id).unwrap().rating(), Some(4.5));
    }

    #[test]
    fn update_rejects_zero_pages() {
        let mut lib = library();
        let id = lib.add_book(details("0-306-40615-2")).unwrap();
        let mut d = details("0-306-40615-2");
        d.page_count = 0;
        assert!(lib.update_book(id, d).is_err());
        assert_eq!(lib.book(id).unwrap().page_count(), 322);
    }
}
