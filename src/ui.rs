use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::debug;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

use tutor_roster::entities::parse_date;
use tutor_roster::{
    format_date, Attendance, BillingMode, ClassEdit, ClassEntryId, HomeworkDone, PaymentStatus,
    Removal, Roster, RosterError, SnapshotStore, StudentDraft, StudentId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Students,
    Classes,
    Payments,
}

impl Pane {
    pub fn next(&self) -> Self {
        match self {
            Pane::Students => Pane::Classes,
            Pane::Classes => Pane::Payments,
            Pane::Payments => Pane::Students,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Pane::Students => Pane::Payments,
            Pane::Classes => Pane::Students,
            Pane::Payments => Pane::Classes,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Pane::Students => "Students",
            Pane::Classes => "Classes",
            Pane::Payments => "Payments",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Email,
    Phone,
    Mode,
    Start,
}

impl FormField {
    const ORDER: [FormField; 5] = [
        FormField::Name,
        FormField::Email,
        FormField::Phone,
        FormField::Mode,
        FormField::Start,
    ];

    fn position(&self) -> usize {
        Self::ORDER.iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn previous(&self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn label(&self) -> &str {
        match self {
            FormField::Name => "Name",
            FormField::Email => "Email",
            FormField::Phone => "Phone",
            FormField::Mode => "Billing",
            FormField::Start => "Start (YYYY-MM-DD)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentForm {
    pub draft: StudentDraft,
    pub field: FormField,
}

impl StudentForm {
    fn new() -> Self {
        StudentForm {
            draft: StudentDraft::default(),
            field: FormField::Name,
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.field {
            FormField::Name => Some(&mut self.draft.name),
            FormField::Email => Some(&mut self.draft.email),
            FormField::Phone => Some(&mut self.draft.phone),
            FormField::Mode => None,
            FormField::Start => Some(&mut self.draft.start_date),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassText {
    Date,
    Assignment,
    Notes,
}

impl ClassText {
    fn label(&self) -> &str {
        match self {
            ClassText::Date => "Date (YYYY-MM-DD)",
            ClassText::Assignment => "Next assignment",
            ClassText::Notes => "Notes",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,
    EditClass {
        entry: ClassEntryId,
        field: ClassText,
        buffer: String,
    },
    NewStudent(StudentForm),
    ConfirmRemove {
        id: StudentId,
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub error: bool,
}

pub struct App<'r, S: SnapshotStore> {
    pub roster: &'r mut Roster<S>,
    pub date_format: String,
    pub focus: Pane,
    pub show_inactive: bool,
    pub mode: Mode,
    pub message: Option<Message>,
    pub should_quit: bool,
    pub student_state: TableState,
    pub class_state: TableState,
    pub payment_state: TableState,
}

impl<'r, S: SnapshotStore> App<'r, S> {
    pub fn new(roster: &'r mut Roster<S>, date_format: String) -> Self {
        let mut app = Self {
            roster,
            date_format,
            focus: Pane::Students,
            show_inactive: false,
            mode: Mode::Normal,
            message: None,
            should_quit: false,
            student_state: TableState::default(),
            class_state: TableState::default(),
            payment_state: TableState::default(),
        };
        app.sync_selection();
        app
    }

    fn visible_ids(&self) -> Vec<StudentId> {
        self.roster
            .list(self.show_inactive)
            .iter()
            .map(|s| s.id)
            .collect()
    }

    /// Point the highlights at the roster's selected student
    fn sync_selection(&mut self) {
        let ids = self.visible_ids();
        let selected = self.roster.selected_id();
        self.student_state
            .select(ids.iter().position(|id| *id == selected));
        self.reset_detail_rows();
    }

    fn reset_detail_rows(&mut self) {
        let student = self.roster.selected();
        let classes = student.class_log.len();
        let payments = student.payment.billing_mode.installments();
        self.class_state
            .select(if classes == 0 { None } else { Some(0) });
        self.payment_state
            .select(if payments == 0 { None } else { Some(0) });
    }

    fn info(&mut self, text: impl Into<String>) {
        self.message = Some(Message {
            text: text.into(),
            error: false,
        });
    }

    fn warn(&mut self, text: impl Into<String>) {
        self.message = Some(Message {
            text: text.into(),
            error: true,
        });
    }

    fn fail(&mut self, err: RosterError) {
        debug!("UI action failed: {}", err);
        if err.is_unsaved_change() {
            self.warn(format!("{err} (press w to retry)"));
        } else {
            self.warn(err.to_string());
        }
    }

    // ------------------------------------------------------------------------
    // Key handling
    // ------------------------------------------------------------------------

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        match mode {
            Mode::Normal => self.handle_normal(key),
            Mode::EditClass {
                entry,
                field,
                mut buffer,
            } => match key.code {
                KeyCode::Esc => self.info("Edit cancelled"),
                KeyCode::Enter => self.commit_class_edit(entry, field, buffer),
                KeyCode::Backspace => {
                    buffer.pop();
                    self.mode = Mode::EditClass { entry, field, buffer };
                }
                KeyCode::Char(c) => {
                    buffer.push(c);
                    self.mode = Mode::EditClass { entry, field, buffer };
                }
                _ => self.mode = Mode::EditClass { entry, field, buffer },
            },
            Mode::NewStudent(form) => self.handle_form(form, key),
            Mode::ConfirmRemove { id, name } => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.answer_remove(id, true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.answer_remove(id, false)
                }
                _ => self.mode = Mode::ConfirmRemove { id, name },
            },
        }
    }

    fn handle_normal(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Down | KeyCode::Char('j') => self.step(true),
            KeyCode::Up | KeyCode::Char('k') => self.step(false),
            KeyCode::Char('n') => self.mode = Mode::NewStudent(StudentForm::new()),
            KeyCode::Char('i') => {
                self.show_inactive = !self.show_inactive;
                self.sync_selection();
            }
            KeyCode::Char('x') => self.toggle_active(),
            KeyCode::Char('w') => self.flush(),
            KeyCode::Char('D') => self.request_remove(),
            KeyCode::Delete if self.focus == Pane::Students => self.request_remove(),
            code => match self.focus {
                Pane::Students => {
                    if code == KeyCode::Enter {
                        self.focus = Pane::Classes;
                    }
                }
                Pane::Classes => match code {
                    KeyCode::Char('a') => self.add_class(),
                    KeyCode::Char('d') | KeyCode::Delete => self.remove_class(),
                    KeyCode::Char('t') => self.toggle_attendance(),
                    KeyCode::Char('h') => self.toggle_homework(),
                    KeyCode::Char('g') => self.start_class_edit(ClassText::Date),
                    KeyCode::Char('e') => self.start_class_edit(ClassText::Assignment),
                    KeyCode::Char('o') => self.start_class_edit(ClassText::Notes),
                    _ => {}
                },
                Pane::Payments => {
                    if matches!(code, KeyCode::Enter | KeyCode::Char('p')) {
                        self.mark_paid();
                    }
                }
            },
        }
    }

    fn handle_form(&mut self, mut form: StudentForm, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.info("New student discarded");
                return;
            }
            KeyCode::Enter if form.field == FormField::Start => {
                self.submit_form(form);
                return;
            }
            KeyCode::Enter | KeyCode::Tab | KeyCode::Down => form.field = form.field.next(),
            KeyCode::BackTab | KeyCode::Up => form.field = form.field.previous(),
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if form.field == FormField::Mode => {
                form.draft.billing_mode = if key.code == KeyCode::Left {
                    previous_mode(form.draft.billing_mode)
                } else {
                    form.draft.billing_mode.next()
                };
            }
            KeyCode::Backspace => {
                if let Some(text) = form.text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(text) = form.text_mut() {
                    text.push(c);
                }
            }
            _ => {}
        }
        self.mode = Mode::NewStudent(form);
    }

    fn submit_form(&mut self, form: StudentForm) {
        match self.roster.add(&form.draft) {
            Ok(_) => {
                let name = self.roster.selected().name.clone();
                self.info(format!("Added {name}"));
                self.show_inactive_if_hidden();
                self.sync_selection();
            }
            Err(RosterError::Validation(reason)) => {
                self.warn(format!("Not added: {reason}"));
                self.mode = Mode::NewStudent(form);
            }
            Err(err) => {
                self.fail(err);
                self.sync_selection();
            }
        }
    }

    fn show_inactive_if_hidden(&mut self) {
        if !self.roster.selected().is_active() {
            self.show_inactive = true;
        }
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    fn step(&mut self, forward: bool) {
        match self.focus {
            Pane::Students => {
                let ids = self.visible_ids();
                if let Some(i) = step_index(self.student_state.selected(), ids.len(), forward) {
                    if let Err(err) = self.roster.select(ids[i]) {
                        self.fail(err);
                        return;
                    }
                    self.student_state.select(Some(i));
                    self.reset_detail_rows();
                }
            }
            Pane::Classes => {
                let len = self.roster.selected().class_log.len();
                self.class_state
                    .select(step_index(self.class_state.selected(), len, forward));
            }
            Pane::Payments => {
                let len = self.roster.selected().payment.billing_mode.installments();
                self.payment_state
                    .select(step_index(self.payment_state.selected(), len, forward));
            }
        }
    }

    fn toggle_active(&mut self) {
        let id = self.roster.selected_id();
        match self.roster.toggle_active(id) {
            Ok(status) => {
                let name = self.roster.selected().name.clone();
                self.info(format!("{name} is now {}", status.as_str()));
            }
            Err(err) => self.fail(err),
        }
        self.sync_selection();
    }

    fn flush(&mut self) {
        match self.roster.flush() {
            Ok(()) => self.info("Roster saved"),
            Err(err) => self.fail(err),
        }
    }

    fn request_remove(&mut self) {
        if !self.roster.has_live_selection() {
            self.warn("The sample student cannot be deleted");
            return;
        }
        let student = self.roster.selected();
        self.mode = Mode::ConfirmRemove {
            id: student.id,
            name: student.name.clone(),
        };
    }

    fn answer_remove(&mut self, id: StudentId, mut answer: bool) {
        match self.roster.remove(id, &mut answer) {
            Ok(Removal::Removed(student)) => self.info(format!("Removed {}", student.name)),
            Ok(Removal::Declined) => self.info("Nothing removed"),
            Err(err) => self.fail(err),
        }
        self.sync_selection();
    }

    fn add_class(&mut self) {
        match self.roster.class_log().append() {
            Ok(_) => {
                let len = self.roster.selected().class_log.len();
                self.class_state.select(Some(len - 1));
                self.info("Class logged");
            }
            Err(err) => self.fail(err),
        }
    }

    fn remove_class(&mut self) {
        let Some(index) = self.class_state.selected() else {
            return;
        };
        match self.roster.class_log().remove_at(index) {
            Ok(removed) => {
                let len = self.roster.selected().class_log.len();
                self.class_state
                    .select(if len == 0 { None } else { Some(index.min(len - 1)) });
                let date = format_date(removed.date, &self.date_format);
                self.info(format!("Removed class of {date}"));
            }
            Err(err) => self.fail(err),
        }
    }

    fn selected_class(&self) -> Option<(usize, Attendance, HomeworkDone)> {
        let index = self.class_state.selected()?;
        let entry = self.roster.selected().class_log.get(index)?;
        Some((index, entry.attendance, entry.homework_done))
    }

    fn toggle_attendance(&mut self) {
        if let Some((index, attendance, _)) = self.selected_class() {
            let edit = ClassEdit::Attendance(attendance.toggled());
            if let Err(err) = self.roster.class_log().set_field(index, edit) {
                self.fail(err);
            }
        }
    }

    fn toggle_homework(&mut self) {
        if let Some((index, _, homework)) = self.selected_class() {
            let edit = ClassEdit::HomeworkDone(homework.toggled());
            if let Err(err) = self.roster.class_log().set_field(index, edit) {
                self.fail(err);
            }
        }
    }

    fn start_class_edit(&mut self, field: ClassText) {
        let Some(index) = self.class_state.selected() else {
            return;
        };
        let Some(entry) = self.roster.selected().class_log.get(index) else {
            return;
        };
        let buffer = match field {
            ClassText::Date => entry.date.format("%Y-%m-%d").to_string(),
            ClassText::Assignment => entry.next_assignment.clone(),
            ClassText::Notes => entry.notes.clone(),
        };
        self.mode = Mode::EditClass {
            entry: entry.id,
            field,
            buffer,
        };
    }

    fn commit_class_edit(&mut self, entry: ClassEntryId, field: ClassText, buffer: String) {
        let edit = match field {
            ClassText::Date => match parse_date(&buffer) {
                Some(date) => ClassEdit::Date(date),
                None => {
                    self.warn(format!("{buffer:?} is not a YYYY-MM-DD date"));
                    self.mode = Mode::EditClass { entry, field, buffer };
                    return;
                }
            },
            ClassText::Assignment => ClassEdit::NextAssignment(buffer),
            ClassText::Notes => ClassEdit::Notes(buffer),
        };
        if let Err(err) = self.roster.class_log().set_field_by_id(entry, edit) {
            self.fail(err);
        }
    }

    fn mark_paid(&mut self) {
        let Some(index) = self.payment_state.selected() else {
            return;
        };
        match self.roster.payments().mark_paid(index) {
            Ok(true) => self.info(format!("Payment {} marked as paid", index + 1)),
            Ok(false) => self.info(format!("Payment {} was already paid", index + 1)),
            Err(err) => self.fail(err),
        }
    }
}

fn previous_mode(mode: BillingMode) -> BillingMode {
    mode.next().next()
}

/// Next/previous row with wrap-around; `None` for an empty table
fn step_index(current: Option<usize>, len: usize, forward: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let i = match current {
        Some(i) if forward => {
            if i >= len - 1 {
                0
            } else {
                i + 1
            }
        }
        Some(i) => {
            if i == 0 {
                len - 1
            } else {
                i - 1
            }
        }
        None => 0,
    };
    Some(i)
}

pub fn run_ui<S: SnapshotStore>(app: &mut App<'_, S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend, S: SnapshotStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<'_, S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                app.handle_key(key);
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui<S: SnapshotStore>(f: &mut Frame, app: &mut App<'_, S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with pane tabs
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[1]);

    render_students(f, body[0], app);

    let detail = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Student card
            Constraint::Min(5),    // Class log
            Constraint::Length(8), // Payments
        ])
        .split(body[1]);

    render_student_card(f, detail[0], app);
    render_classes(f, detail[1], app);
    render_payments(f, detail[2], app);

    render_status_bar(f, chunks[2], app);

    match &app.mode {
        Mode::NewStudent(form) => render_form(f, form),
        Mode::ConfirmRemove { name, .. } => render_confirm(f, name),
        Mode::EditClass { field, buffer, .. } => render_input(f, field.label(), buffer),
        Mode::Normal => {}
    }
}

fn pane_block<S: SnapshotStore>(app: &App<'_, S>, pane: Pane, title: String) -> Block<'static> {
    let color = if app.focus == pane {
        Color::Yellow
    } else {
        Color::White
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn highlight() -> Style {
    Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD)
}

fn render_header<S: SnapshotStore>(f: &mut Frame, area: Rect, app: &App<'_, S>) {
    let panes = [Pane::Students, Pane::Classes, Pane::Payments];

    let mut tab_spans = vec![];
    for (i, pane) in panes.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *pane == app.focus {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(pane.title().to_string(), style));
    }

    let active = app.roster.list(false).len();
    let inactive = app.roster.len() - active;
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Active: {active}"),
        Style::default().fg(Color::Green),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("History: {inactive}"),
        Style::default().fg(Color::DarkGray),
    ));
    if app.roster.is_dirty() {
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled(
            "● unsaved",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Tutor Roster "),
    );

    f.render_widget(header, area);
}

fn render_students<S: SnapshotStore>(f: &mut Frame, area: Rect, app: &mut App<'_, S>) {
    let rows: Vec<Row> = app
        .roster
        .list(app.show_inactive)
        .iter()
        .map(|student| {
            let style = if student.is_active() {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Row::new(vec![
                Cell::from(truncate(&student.name, 24)).style(style),
                Cell::from(format!(
                    "{}/{}",
                    student.payment.paid_count(),
                    student.payment.statuses.len()
                )),
            ])
        })
        .collect();

    let title = if app.show_inactive {
        " Students (all) ".to_string()
    } else {
        " Students ".to_string()
    };

    let table = Table::new(rows, [Constraint::Min(10), Constraint::Length(5)])
        .header(header_row(&["Name", "Paid"]))
        .block(pane_block(app, Pane::Students, title))
        .highlight_style(highlight())
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.student_state);
}

fn render_student_card<S: SnapshotStore>(f: &mut Frame, area: Rect, app: &App<'_, S>) {
    let student = app.roster.selected();
    let label = |text: &'static str| {
        Span::styled(
            text,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    };
    let status_color = if student.is_active() {
        Color::Green
    } else {
        Color::Red
    };

    let mut name_line = vec![
        Span::styled(
            student.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(student.status.as_str(), Style::default().fg(status_color)),
    ];
    if !app.roster.has_live_selection() {
        name_line.push(Span::styled(
            "  (sample, read-only)",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ));
    }

    let content = vec![
        Line::from(name_line),
        Line::from(vec![
            label("Email: "),
            Span::raw(student.email.clone()),
            Span::raw("   "),
            label("Phone: "),
            Span::raw(student.phone.clone()),
        ]),
        Line::from(vec![
            label("Billing: "),
            Span::raw(student.billing_mode.as_str()),
            Span::raw("   "),
            label("Start: "),
            Span::raw(format_date(student.start_date, &app.date_format)),
        ]),
    ];

    let card = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(card, area);
}

fn render_classes<S: SnapshotStore>(f: &mut Frame, area: Rect, app: &mut App<'_, S>) {
    let rows: Vec<Row> = app
        .roster
        .selected()
        .class_log
        .iter()
        .map(|class| {
            let attendance_color = match class.attendance {
                Attendance::Taken => Color::Green,
                Attendance::NotTaken => Color::Red,
            };
            let homework_color = match class.homework_done {
                HomeworkDone::Yes => Color::Green,
                HomeworkDone::No => Color::Red,
            };
            Row::new(vec![
                Cell::from(format_date(class.date, &app.date_format)),
                Cell::from(class.attendance.as_str()).style(Style::default().fg(attendance_color)),
                Cell::from(class.homework_done.as_str()).style(Style::default().fg(homework_color)),
                Cell::from(truncate(&class.next_assignment, 28)),
                Cell::from(truncate(&class.notes, 40)),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(9),
            Constraint::Length(30),
            Constraint::Min(10),
        ],
    )
    .header(header_row(&["Date", "Attendance", "Homework", "Next assignment", "Notes"]))
    .block(pane_block(app, Pane::Classes, " Classes ".to_string()))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.class_state);
}

fn render_payments<S: SnapshotStore>(f: &mut Frame, area: Rect, app: &mut App<'_, S>) {
    let student = app.roster.selected();
    let rows: Vec<Row> = match tutor_roster::payment_rows(student, app.roster.rollover()) {
        Ok(rows) => rows
            .iter()
            .map(|row| {
                let color = match row.status {
                    PaymentStatus::Paid => Color::Green,
                    PaymentStatus::Pending => Color::Red,
                };
                Row::new(vec![
                    Cell::from(format!("{}", row.index + 1)),
                    Cell::from(format_date(row.due, &app.date_format)),
                    Cell::from(row.status.as_str()).style(Style::default().fg(color)),
                ])
            })
            .collect(),
        Err(err) => vec![Row::new(vec![Cell::from(err.to_string())])],
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(12),
            Constraint::Min(8),
        ],
    )
    .header(header_row(&["#", "Due", "Status"]))
    .block(pane_block(app, Pane::Payments, " Payments ".to_string()))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.payment_state);
}

fn render_status_bar<S: SnapshotStore>(f: &mut Frame, area: Rect, app: &App<'_, S>) {
    let mut status_spans = vec![];

    if let Some(message) = &app.message {
        let color = if message.error { Color::Red } else { Color::Green };
        status_spans.push(Span::styled(
            format!(" {} ", message.text),
            Style::default().fg(color),
        ));
        status_spans.push(Span::raw(" | "));
    }

    let keys: &[(&str, &str)] = match (&app.mode, app.focus) {
        (Mode::NewStudent(_), _) => &[("Tab", "Field"), ("←/→", "Billing"), ("Enter", "Next/Save"), ("Esc", "Cancel")],
        (Mode::EditClass { .. }, _) => &[("Enter", "Save"), ("Esc", "Cancel")],
        (Mode::ConfirmRemove { .. }, _) => &[("y", "Delete"), ("n", "Keep")],
        (Mode::Normal, Pane::Students) => &[("n", "New"), ("x", "History"), ("D", "Delete"), ("i", "Show all")],
        (Mode::Normal, Pane::Classes) => &[("a", "Add"), ("t", "Attend"), ("h", "Homework"), ("e", "Assign"), ("o", "Notes"), ("g", "Date"), ("d", "Del")],
        (Mode::Normal, Pane::Payments) => &[("Enter", "Mark paid")],
    };

    for (key, action) in keys {
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(format!(" {action} | ")));
    }
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Pane | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_form(f: &mut Frame, form: &StudentForm) {
    let area = centered_rect(50, 9, f.size());

    let lines: Vec<Line> = FormField::ORDER
        .iter()
        .map(|field| {
            let value = match field {
                FormField::Name => form.draft.name.clone(),
                FormField::Email => form.draft.email.clone(),
                FormField::Phone => form.draft.phone.clone(),
                FormField::Mode => format!("◀ {} ▶", form.draft.billing_mode),
                FormField::Start => form.draft.start_date.clone(),
            };
            let focused = *field == form.field;
            let style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            Line::from(vec![
                Span::styled(format!("  {:<20}", field.label()), style),
                Span::raw(value),
                Span::raw(if focused && *field != FormField::Mode { "▏" } else { "" }),
            ])
        })
        .collect();

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" New student "),
    );
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn render_confirm(f: &mut Frame, name: &str) {
    let area = centered_rect(40, 5, f.size());
    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  Delete "),
            Span::styled(name.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("? "),
            Span::styled("y", Style::default().fg(Color::Yellow)),
            Span::raw("/"),
            Span::styled("n", Style::default().fg(Color::Yellow)),
        ]),
    ];
    let popup = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Confirm "),
    );
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn render_input(f: &mut Frame, label: &str, buffer: &str) {
    let area = centered_rect(60, 3, f.size());
    let popup = Paragraph::new(format!("{buffer}▏")).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(format!(" {label} ")),
    );
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let width = u32::from(r.width) * u32::from(percent_x.min(100)) / 100;
    let width = u16::try_from(width).unwrap_or(r.width);
    let height = height.min(r.height);
    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + (r.height - height) / 2,
        width,
        height,
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_roster::{MemoryStore, RosterOptions};

    fn seeded() -> Roster<MemoryStore> {
        Roster::open(MemoryStore::new(), RosterOptions::default()).unwrap()
    }

    fn press<S: SnapshotStore>(app: &mut App<'_, S>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text<S: SnapshotStore>(app: &mut App<'_, S>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_add_class_from_classes_pane() {
        let mut roster = seeded();
        let mut app = App::new(&mut roster, "%d/%m/%Y".to_string());

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Pane::Classes);
        press(&mut app, KeyCode::Char('a'));

        assert_eq!(app.class_state.selected(), Some(3));
        assert_eq!(roster.selected().class_log.len(), 4);
    }

    #[test]
    fn test_new_student_form_adds_and_selects() {
        let mut roster = seeded();
        let mut app = App::new(&mut roster, "%d/%m/%Y".to_string());

        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Ana");
        press(&mut app, KeyCode::Tab); // email
        press(&mut app, KeyCode::Tab); // phone
        press(&mut app, KeyCode::Tab); // billing
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Tab); // start
        type_text(&mut app, "2024-01-10");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.student_state.selected(), Some(1));
        let ana = roster.selected();
        assert_eq!(ana.name, "Ana");
        assert_eq!(ana.billing_mode, BillingMode::Bimonthly);
    }

    #[test]
    fn test_form_rejection_keeps_form_open() {
        let mut roster = seeded();
        let mut app = App::new(&mut roster, "%d/%m/%Y".to_string());

        press(&mut app, KeyCode::Char('n'));
        for _ in 0..4 {
            press(&mut app, KeyCode::Tab);
        }
        type_text(&mut app, "2024-01-10");
        press(&mut app, KeyCode::Enter);

        assert!(matches!(app.mode, Mode::NewStudent(_)));
        let message = app.message.clone().unwrap();
        assert!(message.error);
        assert!(message.text.contains("name is required"));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_delete_asks_before_removing() {
        let mut roster = seeded();
        let mut app = App::new(&mut roster, "%d/%m/%Y".to_string());

        press(&mut app, KeyCode::Char('D'));
        assert!(matches!(app.mode, Mode::ConfirmRemove { .. }));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.roster.len(), 1);

        press(&mut app, KeyCode::Char('D'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.roster.is_empty());
        assert!(app.roster.selected().id.is_seed());
        assert_eq!(app.student_state.selected(), None);

        // The fallback sample cannot be deleted again
        press(&mut app, KeyCode::Char('D'));
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_mark_paid_from_payments_pane() {
        let mut roster = seeded();
        let mut app = App::new(&mut roster, "%d/%m/%Y".to_string());

        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus, Pane::Payments);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);

        assert_eq!(
            roster.selected().payment.statuses,
            vec![
                PaymentStatus::Pending,
                PaymentStatus::Paid,
                PaymentStatus::Pending,
                PaymentStatus::Pending
            ]
        );
    }

    #[test]
    fn test_edit_notes_inline() {
        let mut roster = seeded();
        let mut app = App::new(&mut roster, "%d/%m/%Y".to_string());

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('o'));
        for _ in 0.."Bring staff paper".len() {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "Metronome at 80");
        press(&mut app, KeyCode::Enter);

        assert_eq!(roster.selected().class_log[1].notes, "Metronome at 80");
    }

    #[test]
    fn test_save_failure_is_shown() {
        let mut roster = seeded();
        roster.store_mut().set_fail_writes(true);
        let mut app = App::new(&mut roster, "%d/%m/%Y".to_string());

        press(&mut app, KeyCode::Char('x'));
        let message = app.message.clone().unwrap();
        assert!(message.error);
        assert!(message.text.contains("press w to retry"));
        assert!(app.roster.is_dirty());

        app.roster.store_mut().set_fail_writes(false);
        press(&mut app, KeyCode::Char('w'));
        assert!(!app.roster.is_dirty());
    }

    #[test]
    fn test_centered_rect_on_wide_terminal() {
        let screen = Rect {
            x: 0,
            y: 0,
            width: 2000,
            height: 60,
        };
        let popup = centered_rect(50, 9, screen);
        assert_eq!((popup.x, popup.y, popup.width, popup.height), (500, 25, 1000, 9));

        let small = Rect {
            x: 0,
            y: 0,
            width: 20,
            height: 4,
        };
        let narrow = centered_rect(60, 9, small);
        assert_eq!((narrow.x, narrow.y, narrow.width, narrow.height), (4, 0, 12, 4));
    }

    #[test]
    fn test_step_index_wraps() {
        assert_eq!(step_index(None, 0, true), None);
        assert_eq!(step_index(Some(2), 3, true), Some(0));
        assert_eq!(step_index(Some(0), 3, false), Some(2));
        assert_eq!(step_index(None, 3, false), Some(0));
    }
}
