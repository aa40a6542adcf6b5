use std::mem;

use anyhow::{anyhow, Context, Result};
use chrono::Days;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;
use tracing::info;

use crate::library::Library;

use super::forms::{ConfirmReservation, LoanField, LoanForm, ReservationAction};
use super::helpers::{centered_rect, detail_lines, format_fee, surface_error};
use super::screens::{rows_for, ListScreen, RowKey, Tab};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows moved by PageUp/PageDown.
const PAGE: isize = 10;

/// Fine-grained modes layered over the current tab.
enum Mode {
    Normal,
    Filtering(FilterState),
    Lending(LoanForm),
    Confirm(ConfirmReservation),
}

/// State for an active inline filter.
struct FilterState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    library: Library,
    screen: ListScreen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(library: Library) -> Self {
        let screen = ListScreen::new(Tab::Books, rows_for(Tab::Books, &library));
        let mut app = Self {
            library,
            screen,
            mode: Mode::Normal,
            status: None,
        };
        let overdue = app.library.overdue_loans().len();
        if overdue > 0 {
            app.set_status(
                format!("{overdue} overdue loan(s). Press [o] to refresh statuses."),
                StatusKind::Error,
            );
        }
        app
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Filtering(state) => self.handle_filter(code, state),
            Mode::Lending(form) => self.handle_lending(code, form),
            Mode::Confirm(confirm) => self.handle_confirm(code, confirm),
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Tab => self.switch_tab(self.screen.tab.next()),
            KeyCode::BackTab => self.switch_tab(self.screen.tab.previous()),
            KeyCode::Up => self.screen.move_selection(-1),
            KeyCode::Down => self.screen.move_selection(1),
            KeyCode::PageUp => self.screen.move_selection(-PAGE),
            KeyCode::PageDown => self.screen.move_selection(PAGE),
            KeyCode::Home => self.screen.select_first(),
            KeyCode::End => self.screen.select_last(),
            KeyCode::Char('f') | KeyCode::Char('/') => {
                let query = self.screen.filter.clone().unwrap_or_default();
                return Ok(Mode::Filtering(FilterState { query }));
            }
            KeyCode::Char('o') => {
                if let Err(err) = self.run_sweep() {
                    self.set_status(surface_error(&err), StatusKind::Error);
                }
            }
            KeyCode::Char('r') => match self.selected() {
                Some(RowKey::Loan(_)) => {
                    if let Err(err) = self.return_selected_loan() {
                        self.set_status(surface_error(&err), StatusKind::Error);
                    }
                }
                _ => self.set_status("Select a loan to return.", StatusKind::Error),
            },
            KeyCode::Char('l') => match self.selected() {
                Some(RowKey::Book(book)) => {
                    let label = self
                        .screen
                        .current()
                        .map(|row| row.label.clone())
                        .unwrap_or_default();
                    return Ok(Mode::Lending(LoanForm::for_book(book, label)));
                }
                _ => self.set_status("Select a book to lend.", StatusKind::Error),
            },
            KeyCode::Char(key @ ('u' | 'x')) => match self.selected() {
                Some(RowKey::Reservation(id)) => {
                    let action = if key == 'u' {
                        ReservationAction::Fulfill
                    } else {
                        ReservationAction::Cancel
                    };
                    let label = self
                        .screen
                        .current()
                        .map(|row| row.label.clone())
                        .unwrap_or_default();
                    return Ok(Mode::Confirm(ConfirmReservation { id, action, label }));
                }
                _ => self.set_status("Select a reservation first.", StatusKind::Error),
            },
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_filter(&mut self, code: KeyCode, mut state: FilterState) -> Mode {
        match code {
            KeyCode::Esc => {
                self.screen.set_filter(None);
                return Mode::Normal;
            }
            KeyCode::Enter => {
                self.clear_status();
                return Mode::Normal;
            }
            KeyCode::Up => self.screen.move_selection(-1),
            KeyCode::Down => self.screen.move_selection(1),
            KeyCode::Backspace => {
                state.query.pop();
                self.screen.set_filter(Some(state.query.clone()));
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                state.query.push(ch);
                self.screen.set_filter(Some(state.query.clone()));
            }
            _ => {}
        }
        Mode::Filtering(state)
    }

    fn handle_lending(&mut self, code: KeyCode, mut form: LoanForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Lending cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            KeyCode::Enter => match self.lend(&form) {
                Ok(()) => return Mode::Normal,
                Err(err) => form.error = Some(surface_error(&err)),
            },
            _ => {}
        }
        Mode::Lending(form)
    }

    fn handle_confirm(&mut self, code: KeyCode, confirm: ConfirmReservation) -> Mode {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Err(err) = self.settle_reservation(&confirm) {
                    self.set_status(surface_error(&err), StatusKind::Error);
                }
                Mode::Normal
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.set_status("No changes made.", StatusKind::Info);
                Mode::Normal
            }
            _ => Mode::Confirm(confirm),
        }
    }

    fn selected(&self) -> Option<RowKey> {
        self.screen.current().map(|row| row.key)
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.screen = ListScreen::new(tab, rows_for(tab, &self.library));
        self.clear_status();
    }

    fn reload(&mut self) {
        let rows = rows_for(self.screen.tab, &self.library);
        self.screen.set_rows(rows);
    }

    fn run_sweep(&mut self) -> Result<()> {
        let report = self
            .library
            .refresh_statuses()
            .context("failed to refresh statuses")?;
        self.reload();
        if report.is_empty() {
            self.set_status("Nothing became overdue or expired.", StatusKind::Info);
        } else {
            self.set_status(
                format!(
                    "{} loan(s) now overdue, {} reservation(s) expired.",
                    report.newly_overdue.len(),
                    report.newly_expired.len()
                ),
                StatusKind::Info,
            );
        }
        Ok(())
    }

    fn return_selected_loan(&mut self) -> Result<()> {
        let Some(RowKey::Loan(id)) = self.selected() else {
            return Err(anyhow!("No loan selected."));
        };
        let today = self.library.clock().today();
        self.library
            .return_loan(id, today)
            .with_context(|| format!("failed to return loan {id}"))?;
        let fee = self.library.loan(id)?.late_fee();
        info!(%id, fee, "loan returned from the browser");
        self.reload();
        if fee > 0.0 {
            self.set_status(
                format!("Loan {id} returned. Late fee due: {}.", format_fee(fee)),
                StatusKind::Error,
            );
        } else {
            self.set_status(format!("Loan {id} returned."), StatusKind::Info);
        }
        Ok(())
    }

    fn lend(&mut self, form: &LoanForm) -> Result<()> {
        let (member, days) = form.parse_inputs()?;
        let today = self.library.clock().today();
        let due = today
            .checked_add_days(Days::new(u64::from(days)))
            .ok_or_else(|| anyhow!("Loan length is too long."))?;
        let id = self
            .library
            .create_loan(member, form.book, today, due)
            .context("failed to create loan")?;
        self.reload();
        self.set_status(format!("Loan {id} created, due {due}."), StatusKind::Info);
        Ok(())
    }

    fn settle_reservation(&mut self, confirm: &ConfirmReservation) -> Result<()> {
        let outcome = match confirm.action {
            ReservationAction::Fulfill => self.library.fulfill_reservation(confirm.id),
            ReservationAction::Cancel => self.library.cancel_reservation(confirm.id),
        };
        outcome.with_context(|| format!("failed to update reservation {}", confirm.id))?;
        self.reload();
        let done = match confirm.action {
            ReservationAction::Fulfill => "fulfilled",
            ReservationAction::Cancel => "cancelled",
        };
        self.set_status(format!("Reservation {} {done}.", confirm.id), StatusKind::Info);
        Ok(())
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        self.draw_content(frame, content_area);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Filtering(state) => self.draw_filter_bar(frame, area, state),
            Mode::Lending(form) => self.draw_loan_form(frame, area, form),
            Mode::Confirm(confirm) => self.draw_confirm(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_content(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let selected_tab = Tab::ALL
            .iter()
            .position(|tab| *tab == self.screen.tab)
            .unwrap_or(0);
        let tabs = Tabs::new(Tab::ALL.iter().map(|tab| tab.title()))
            .select(selected_tab)
            .block(Block::default().borders(Borders::ALL).title("Library"))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[1]);
        self.draw_list(frame, body[0]);
        self.draw_detail(frame, body[1]);
    }

    fn draw_list(&self, frame: &mut Frame, area: Rect) {
        let mut title = self.screen.tab.title().to_string();
        if let Some(filter) = self.screen.filter.as_deref().filter(|f| !f.trim().is_empty()) {
            title.push_str(&format!(" (filter: {filter})"));
        }
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.screen.filtered.is_empty() {
            let message = if self.screen.rows.is_empty() {
                "Nothing here yet."
            } else {
                "Nothing matches the current filter."
            };
            let paragraph = Paragraph::new(message)
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = self
            .screen
            .visible()
            .map(|row| ListItem::new(row.label.clone()))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.screen.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Details");
        let lines = self
            .selected()
            .map(|key| detail_lines(&self.library, key))
            .unwrap_or_default();
        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let mut spans = match &self.mode {
            Mode::Filtering(_) => vec![
                Span::styled("[Enter]", key_style),
                Span::raw(" Keep Filter   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Clear"),
            ],
            Mode::Lending(_) => vec![
                Span::styled("[Tab]", key_style),
                Span::raw(" Next Field   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Lend   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ],
            Mode::Confirm(_) => vec![
                Span::styled("[y]", key_style),
                Span::raw(" Confirm   "),
                Span::styled("[n]", key_style),
                Span::raw(" Cancel"),
            ],
            Mode::Normal => vec![
                Span::styled("[Tab]", key_style),
                Span::raw(" Switch   "),
                Span::styled("[f]", key_style),
                Span::raw(" Filter   "),
                Span::styled("[o]", key_style),
                Span::raw(" Sweep   "),
            ],
        };
        if matches!(self.mode, Mode::Normal) {
            match self.screen.tab {
                Tab::Books => {
                    spans.push(Span::styled("[l]", key_style));
                    spans.push(Span::raw(" Lend   "));
                }
                Tab::Loans => {
                    spans.push(Span::styled("[r]", key_style));
                    spans.push(Span::raw(" Return   "));
                }
                Tab::Reservations => {
                    spans.push(Span::styled("[u]", key_style));
                    spans.push(Span::raw(" Fulfil   "));
                    spans.push(Span::styled("[x]", key_style));
                    spans.push(Span::raw(" Cancel   "));
                }
                _ => {}
            }
            spans.push(Span::styled("[q]", key_style));
            spans.push(Span::raw(" Quit"));
        }
        Line::from(spans)
    }

    fn draw_filter_bar(&self, frame: &mut Frame, area: Rect, state: &FilterState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Filter");
        let paragraph = Paragraph::new(Span::raw(format!("Filter: {}", state.query)))
            .block(block)
            .alignment(Alignment::Left);
        frame.render_widget(paragraph, popup_area);
    }

    fn draw_loan_form(&self, frame: &mut Frame, area: Rect, form: &LoanForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Lend Book").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            Line::from(form.book_label.clone()),
            Line::from(""),
            form.build_line("Member number", LoanField::Member),
            form.build_line("Days", LoanField::Days),
        ];
        if let Some(error) = &form.error {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmReservation) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!("{} Reservation", confirm.action.verb()))
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("{} {}?", confirm.action.verb(), confirm.label)),
            Line::from("Only pending reservations can change."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}
