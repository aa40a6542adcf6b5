use anyhow::{anyhow, Context, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{BookId, MemberId, ReservationId};

/// Default loan length offered by the lending form.
pub(crate) const DEFAULT_LOAN_DAYS: &str = "14";

/// Lending form opened from the Books tab.
#[derive(Clone)]
pub(crate) struct LoanForm {
    pub(crate) book: BookId,
    pub(crate) book_label: String,
    pub(crate) member: String,
    pub(crate) days: String,
    pub(crate) active: LoanField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum LoanField {
    #[default]
    Member,
    Days,
}

impl LoanForm {
    pub(crate) fn for_book(book: BookId, book_label: String) -> Self {
        Self {
            book,
            book_label,
            member: String::new(),
            days: DEFAULT_LOAN_DAYS.to_string(),
            active: LoanField::Member,
            error: None,
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            LoanField::Member => LoanField::Days,
            LoanField::Days => LoanField::Member,
        };
    }

    /// Both fields are numeric; anything else is ignored.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if !ch.is_ascii_digit() {
            return false;
        }
        match self.active {
            LoanField::Member => self.member.push(ch),
            LoanField::Days => self.days.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            LoanField::Member => {
                self.member.pop();
            }
            LoanField::Days => {
                self.days.pop();
            }
        }
    }

    /// Member id and loan length in days.
    pub(crate) fn parse_inputs(&self) -> Result<(MemberId, u32)> {
        let member_raw = self.member.trim();
        if member_raw.is_empty() {
            return Err(anyhow!("Member number is required."));
        }
        let member = member_raw
            .parse::<u64>()
            .context("Member number must be a whole number.")?;
        let days = self
            .days
            .trim()
            .parse::<u32>()
            .context("Loan length must be a whole number of days.")?;
        if days == 0 {
            return Err(anyhow!("Loan length must be at least one day."));
        }
        Ok((MemberId(member), days))
    }

    pub(crate) fn build_line(&self, field_name: &str, field: LoanField) -> Line<'static> {
        let value = match field {
            LoanField::Member => &self.member,
            LoanField::Days => &self.days,
        };
        let display = if value.is_empty() {
            "<required>".to_string()
        } else {
            value.clone()
        };
        let style = if self.active == field {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum ReservationAction {
    Fulfill,
    Cancel,
}

impl ReservationAction {
    pub(crate) fn verb(self) -> &'static str {
        match self {
            ReservationAction::Fulfill => "Fulfil",
            ReservationAction::Cancel => "Cancel",
        }
    }
}

/// Pending y/n question about a reservation.
#[derive(Clone)]
pub(crate) struct ConfirmReservation {
    pub(crate) id: ReservationId,
    pub(crate) action: ReservationAction,
    pub(crate) label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loan_form_accepts_digits_only() {
        let mut form = LoanForm::for_book(BookId(4), "Dune".into());
        assert!(form.push_char('1'));
        assert!(!form.push_char('x'));
        form.push_char('2');
        assert_eq!(form.member, "12");

        form.toggle_field();
        form.backspace();
        form.backspace();
        form.push_char('7');
        let (member, days) = form.parse_inputs().unwrap();
        assert_eq!(member, MemberId(12));
        assert_eq!(days, 7);
    }

    #[test]
    fn loan_form_rejects_missing_member_and_zero_days() {
        let mut form = LoanForm::for_book(BookId(4), "Dune".into());
        assert!(form.parse_inputs().is_err());

        form.member = "3".into();
        form.days = "0".into();
        let err = form.parse_inputs().unwrap_err();
        assert!(err.to_string().contains("at least one day"));
    }
}
