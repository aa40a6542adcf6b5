use std::fmt;

use super::{BookCategory, BookId, LoanId, ReservationId};
use crate::error::Result;
use crate::validation;

/// Editable catalog fields of a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDetails {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    pub category: BookCategory,
    pub page_count: u32,
}

impl BookDetails {
    /// ISBN uniqueness is checked by the library against the book extent.
    pub(crate) fn validated(&self, current_year: i32) -> Result<Self> {
        Ok(Self {
            isbn: validation::isbn(&self.isbn)?,
            title: validation::text("title", &self.title)?,
            author: validation::text("author", &self.author)?,
            publication_year: validation::publication_year(self.publication_year, current_year)?,
            category: self.category,
            page_count: validation::positive("page count", self.page_count)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Book {
    pub(crate) id: BookId,
    pub(crate) isbn: String,
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) publication_year: i32,
    pub(crate) category: BookCategory,
    pub(crate) page_count: u32,
    pub(crate) rating: Option<f64>,
    /// Every loan of this book in the order it was recorded.
    pub(crate) loan_history: Vec<LoanId>,
    pub(crate) reservations: Vec<ReservationId>,
}

impl Book {
    pub(crate) fn new(id: BookId, details: BookDetails) -> Self {
        let mut book = Self {
            id,
            isbn: String::new(),
            title: String::new(),
            author: String::new(),
            publication_year: 0,
            category: details.category,
            page_count: 0,
            rating: None,
            loan_history: Vec::new(),
            reservations: Vec::new(),
        };
        book.apply(details);
        book
    }

    pub(crate) fn apply(&mut self, details: BookDetails) {
        self.isbn = details.isbn;
        self.title = details.title;
        self.author = details.author;
        self.publication_year = details.publication_year;
        self.category = details.category;
        self.page_count = details.page_count;
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn publication_year(&self) -> i32 {
        self.publication_year
    }

    pub fn category(&self) -> BookCategory {
        self.category
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// `None` until the book is rated for the first time.
    pub fn rating(&self) -> Option<f64> {
        self.rating
    }

    pub fn loan_history(&self) -> &[LoanId] {
        &self.loan_history
    }

    pub fn reservation_ids(&self) -> &[ReservationId] {
        &self.reservations
    }

    pub fn details(&self) -> BookDetails {
        BookDetails {
            isbn: self.isbn.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
            publication_year: self.publication_year,
            category: self.category,
            page_count: self.page_count,
        }
    }
}

impl fmt::Display for Book {
    /// `Title - Author`, the form used in lists and reports.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.author)
    }
}
