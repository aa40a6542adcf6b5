use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use super::screens::RowKey;
use crate::library::Library;
use crate::models::{Affiliation, Member};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

pub(crate) fn format_fee(fee: f64) -> String {
    format!("{fee:.2}")
}

fn field(name: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{name}: "),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(value.into()),
    ])
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}

fn member_name(member: &Member) -> String {
    format!("#{} {}", member.id(), member.person().full_name())
}

/// Detail pane content for the selected row. Unknown ids (the row went stale
/// between reload and draw) produce an empty pane.
pub(crate) fn detail_lines(library: &Library, key: RowKey) -> Vec<Line<'static>> {
    match key {
        RowKey::Book(id) => {
            let Ok(book) = library.book(id) else {
                return Vec::new();
            };
            let available = library.is_available(id).unwrap_or(false);
            let mut lines = vec![
                field("Title", book.title()),
                field("Author", book.author()),
                field("ISBN", book.isbn()),
                field("Year", book.publication_year().to_string()),
                field("Category", book.category().to_string()),
                field("Pages", book.page_count().to_string()),
                field(
                    "Rating",
                    book.rating()
                        .map(|rating| format!("{rating:.1}"))
                        .unwrap_or_else(|| "not rated".into()),
                ),
                field("Available", if available { "yes" } else { "no" }),
                Line::from(""),
                heading("Loan history"),
            ];
            for loan in library.book_loan_history(id).unwrap_or_default() {
                let borrower = library
                    .member(loan.member())
                    .map(member_name)
                    .unwrap_or_default();
                let returned = loan
                    .return_date()
                    .map(|date| format!("returned {date}"))
                    .unwrap_or_else(|| format!("due {}", loan.due_date()));
                lines.push(Line::from(format!("  {} {borrower}, {returned}", loan.loan_date())));
            }
            lines.push(heading("Reservations"));
            for reservation in library.book_reservations(id).unwrap_or_default() {
                lines.push(Line::from(format!(
                    "  #{} {} [{}]",
                    reservation.id(),
                    reservation.reservation_date(),
                    reservation.status()
                )));
            }
            lines
        }
        RowKey::Member(id) => {
            let Ok(member) = library.member(id) else {
                return Vec::new();
            };
            let person = member.person();
            let affiliation = match member.affiliation() {
                Some(Affiliation::Club(club)) => library
                    .club(club)
                    .map(|club| format!("club {}", club.name()))
                    .unwrap_or_default(),
                Some(Affiliation::ReadingGroup(group)) => library
                    .reading_group(group)
                    .map(|group| format!("reading group {}", group.name()))
                    .unwrap_or_default(),
                None => "none".into(),
            };
            let mut lines = vec![
                field("Number", member.id().to_string()),
                field("Name", person.full_name()),
                field("Born", person.date_of_birth().to_string()),
                field("Email", person.email()),
                field("Phone", person.phone_number()),
                field("Member since", member.registration_date().to_string()),
                field("Status", member.status().to_string()),
                field(
                    "Borrowed",
                    format!(
                        "{} of {}",
                        member.borrowed_items(),
                        member.status().borrow_limit()
                    ),
                ),
                field("Blacklisted", if member.is_blacklisted() { "yes" } else { "no" }),
                field("Affiliation", affiliation),
                Line::from(""),
                heading("Loans"),
            ];
            for loan in library.member_loans(id).unwrap_or_default() {
                let title = library
                    .book(loan.book())
                    .map(|book| book.title().to_string())
                    .unwrap_or_default();
                let flag = if loan.is_overdue() { " (overdue)" } else { "" };
                lines.push(Line::from(format!("  {title}, due {}{flag}", loan.due_date())));
            }
            lines.push(heading("Events"));
            for event in library.member_registered_events(id).unwrap_or_default() {
                let attended = if member.attended_events().contains(&event.id()) {
                    " (attended)"
                } else {
                    ""
                };
                lines.push(Line::from(format!("  {}{attended}", event.name())));
            }
            lines
        }
        RowKey::Loan(id) => {
            let Ok(loan) = library.loan(id) else {
                return Vec::new();
            };
            let borrower = library
                .member(loan.member())
                .map(member_name)
                .unwrap_or_default();
            let book = library
                .book(loan.book())
                .map(|book| book.to_string())
                .unwrap_or_default();
            vec![
                field("Loan", loan.id().to_string()),
                field("Book", book),
                field("Member", borrower),
                field("Loaned", loan.loan_date().to_string()),
                field("Due", loan.due_date().to_string()),
                field(
                    "Returned",
                    loan.return_date()
                        .map(|date| date.to_string())
                        .unwrap_or_else(|| "not yet".into()),
                ),
                field("Overdue", if loan.is_overdue() { "yes" } else { "no" }),
                field("Late fee", format_fee(loan.late_fee())),
            ]
        }
        RowKey::Reservation(id) => {
            let Ok(reservation) = library.reservation(id) else {
                return Vec::new();
            };
            let member = library
                .member(reservation.member())
                .map(member_name)
                .unwrap_or_default();
            let book = library
                .book(reservation.book())
                .map(|book| book.to_string())
                .unwrap_or_default();
            vec![
                field("Reservation", reservation.id().to_string()),
                field("Book", book),
                field("Member", member),
                field("Reserved", reservation.reservation_date().to_string()),
                field("Expires", reservation.expiration_date().to_string()),
                field("Status", reservation.status().to_string()),
            ]
        }
        RowKey::Event(id) => {
            let Ok(event) = library.event(id) else {
                return Vec::new();
            };
            let mut lines = vec![
                field("Event", event.name()),
                field("Location", event.location()),
                field("Starts", event.start_time().format("%Y-%m-%d %H:%M").to_string()),
                field("Ends", event.end_time().format("%Y-%m-%d %H:%M").to_string()),
                field(
                    "Registered",
                    format!("{} of {}", event.registered_members().len(), event.max_attendees()),
                ),
                field("Attended", event.attended_members().len().to_string()),
                Line::from(""),
                heading("Registrations"),
            ];
            for member in library.event_registrations(id).unwrap_or_default() {
                let mark = if event.attended_members().contains(&member.id()) {
                    "x"
                } else {
                    " "
                };
                lines.push(Line::from(format!("  [{mark}] {}", member_name(member))));
            }
            lines
        }
        RowKey::Club(id) => {
            let Ok(club) = library.club(id) else {
                return Vec::new();
            };
            let mut lines = vec![
                field("Club", club.name()),
                field("About", club.description()),
                field(
                    "Requires",
                    club.required_status()
                        .map(|status| status.to_string())
                        .unwrap_or_else(|| "any status".into()),
                ),
                Line::from(""),
                heading("Members"),
            ];
            for member in library.club_members(id).unwrap_or_default() {
                lines.push(Line::from(format!("  {}", member_name(member))));
            }
            lines
        }
        RowKey::ReadingGroup(id) => {
            let Ok(group) = library.reading_group(id) else {
                return Vec::new();
            };
            let mut lines = vec![
                field("Reading group", group.name()),
                field("Focus", group.focus_category().to_string()),
                field(
                    "Participants",
                    format!("{} of {}", group.participants().len(), group.max_capacity()),
                ),
                Line::from(""),
                heading("Participants"),
            ];
            for member in library.group_participants(id).unwrap_or_default() {
                lines.push(Line::from(format!("  {}", member_name(member))));
            }
            lines
        }
    }
}
