use crate::library::Library;
use crate::models::{BookId, ClubId, EventId, LoanId, MemberId, ReadingGroupId, ReservationId};

/// Top-level tabs, one per browsable extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tab {
    Books,
    Members,
    Loans,
    Reservations,
    Events,
    Groups,
}

impl Tab {
    pub(crate) const ALL: [Tab; 6] = [
        Tab::Books,
        Tab::Members,
        Tab::Loans,
        Tab::Reservations,
        Tab::Events,
        Tab::Groups,
    ];

    pub(crate) fn title(self) -> &'static str {
        match self {
            Tab::Books => "Books",
            Tab::Members => "Members",
            Tab::Loans => "Loans",
            Tab::Reservations => "Reservations",
            Tab::Events => "Events",
            Tab::Groups => "Groups",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|tab| *tab == self).unwrap_or(0)
    }

    pub(crate) fn next(self) -> Tab {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub(crate) fn previous(self) -> Tab {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// What a list row points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowKey {
    Book(BookId),
    Member(MemberId),
    Loan(LoanId),
    Reservation(ReservationId),
    Event(EventId),
    Club(ClubId),
    ReadingGroup(ReadingGroupId),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Row {
    pub(crate) key: RowKey,
    pub(crate) label: String,
}

/// Build the rows shown for `tab`, in extent order.
pub(crate) fn rows_for(tab: Tab, library: &Library) -> Vec<Row> {
    match tab {
        Tab::Books => library
            .books()
            .map(|book| Row {
                key: RowKey::Book(book.id()),
                label: format!("{} ({})", book, book.publication_year()),
            })
            .collect(),
        Tab::Members => library
            .members()
            .map(|member| Row {
                key: RowKey::Member(member.id()),
                label: format!("{} [{}]", member.person().full_name(), member.status()),
            })
            .collect(),
        Tab::Loans => library
            .loans()
            .map(|loan| {
                let title = library
                    .book(loan.book())
                    .map(|book| book.title().to_string())
                    .unwrap_or_default();
                let state = if !loan.is_active() {
                    "returned"
                } else if loan.is_overdue() {
                    "OVERDUE"
                } else {
                    "due"
                };
                Row {
                    key: RowKey::Loan(loan.id()),
                    label: format!("#{} {} - {} {}", loan.id(), title, state, loan.due_date()),
                }
            })
            .collect(),
        Tab::Reservations => library
            .reservations()
            .map(|reservation| {
                let title = library
                    .book(reservation.book())
                    .map(|book| book.title().to_string())
                    .unwrap_or_default();
                Row {
                    key: RowKey::Reservation(reservation.id()),
                    label: format!("#{} {} [{}]", reservation.id(), title, reservation.status()),
                }
            })
            .collect(),
        Tab::Events => library
            .events()
            .map(|event| Row {
                key: RowKey::Event(event.id()),
                label: format!(
                    "{} {} ({}/{})",
                    event.start_time().format("%Y-%m-%d %H:%M"),
                    event.name(),
                    event.registered_members().len(),
                    event.max_attendees()
                ),
            })
            .collect(),
        Tab::Groups => library
            .clubs()
            .map(|club| Row {
                key: RowKey::Club(club.id()),
                label: format!("Club: {}", club.name()),
            })
            .chain(library.reading_groups().map(|group| Row {
                key: RowKey::ReadingGroup(group.id()),
                label: format!("Reading group: {}", group.name()),
            }))
            .collect(),
    }
}

/// A filterable list with a selection cursor over the filtered rows.
pub(crate) struct ListScreen {
    pub(crate) tab: Tab,
    pub(crate) rows: Vec<Row>,
    pub(crate) filtered: Vec<usize>,
    pub(crate) filter: Option<String>,
    pub(crate) selected: usize,
}

impl ListScreen {
    pub(crate) fn new(tab: Tab, rows: Vec<Row>) -> Self {
        let mut screen = Self {
            tab,
            rows,
            filtered: Vec::new(),
            filter: None,
            selected: 0,
        };
        screen.apply_filter();
        screen
    }

    pub(crate) fn apply_filter(&mut self) {
        let query = self
            .filter
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .unwrap_or_default();
        self.filtered = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| query.is_empty() || row.label.to_lowercase().contains(&query))
            .map(|(idx, _)| idx)
            .collect();
        self.ensure_in_bounds();
    }

    pub(crate) fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter;
        self.apply_filter();
    }

    /// Swap in fresh rows, keeping the cursor on the same entity if it is
    /// still listed.
    pub(crate) fn set_rows(&mut self, rows: Vec<Row>) {
        let current = self.current().map(|row| row.key);
        self.rows = rows;
        self.apply_filter();
        if let Some(key) = current {
            if let Some(pos) = self
                .filtered
                .iter()
                .position(|idx| self.rows[*idx].key == key)
            {
                self.selected = pos;
            }
        }
    }

    pub(crate) fn visible(&self) -> impl Iterator<Item = &Row> {
        self.filtered.iter().map(|idx| &self.rows[*idx])
    }

    pub(crate) fn current(&self) -> Option<&Row> {
        self.filtered
            .get(self.selected)
            .and_then(|idx| self.rows.get(*idx))
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.filtered.is_empty() {
            return;
        }
        let len = self.filtered.len() as isize;
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.filtered.len().saturating_sub(1);
    }

    fn ensure_in_bounds(&mut self) {
        if self.filtered.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.filtered.len() {
            self.selected = self.filtered.len() - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(labels: &[&str]) -> Vec<Row> {
        labels
            .iter()
            .enumerate()
            .map(|(idx, label)| Row {
                key: RowKey::Book(BookId(idx as u64 + 1)),
                label: (*label).to_string(),
            })
            .collect()
    }

    #[test]
    fn tabs_wrap_around() {
        assert_eq!(Tab::Groups.next(), Tab::Books);
        assert_eq!(Tab::Books.previous(), Tab::Groups);
        assert_eq!(Tab::Loans.next(), Tab::Reservations);
    }

    #[test]
    fn filter_is_case_insensitive_and_clamps_selection() {
        let mut screen = ListScreen::new(Tab::Books, rows(&["Dune", "Emma", "Dracula"]));
        screen.select_last();
        screen.set_filter(Some("DU".into()));

        let visible: Vec<_> = screen.visible().map(|row| row.label.as_str()).collect();
        assert_eq!(visible, vec!["Dune"]);
        assert_eq!(screen.selected, 0);

        screen.set_filter(None);
        assert_eq!(screen.visible().count(), 3);
    }

    #[test]
    fn selection_follows_entity_across_reloads() {
        let mut screen = ListScreen::new(Tab::Books, rows(&["a", "b", "c"]));
        screen.move_selection(2);
        assert_eq!(screen.current().map(|row| row.key), Some(RowKey::Book(BookId(3))));

        // first row disappears; the cursor stays on book 3
        let mut fresh = rows(&["a", "b", "c"]);
        fresh.remove(0);
        screen.set_rows(fresh);
        assert_eq!(screen.current().map(|row| row.key), Some(RowKey::Book(BookId(3))));
        assert_eq!(screen.selected, 1);
    }

    #[test]
    fn movement_stays_in_range() {
        let mut screen = ListScreen::new(Tab::Books, rows(&["a", "b"]));
        screen.move_selection(-3);
        assert_eq!(screen.selected, 0);
        screen.move_selection(10);
        assert_eq!(screen.selected, 1);

        let mut empty = ListScreen::new(Tab::Loans, Vec::new());
        empty.move_selection(1);
        assert!(empty.current().is_none());
    }
}
