use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use markdown_lists_config::{Config, ListConfig};
use markdown_lists_engine::lists::patterns::{DEFAULT_ORDERED_PATTERN, DEFAULT_UNORDERED_PATTERN};
use markdown_lists_engine::{
    Cmd, EditSession, ListEditWatcher, ListPatterns, TextBuffer, io,
    editing::buffer::{line_end, line_start},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use relative_path::RelativePathBuf;
use std::{env, io::stdout, path::PathBuf, process};

/// File opened when no argument is given
const DEFAULT_FILE: &str = "index.md";

struct App {
    session: EditSession,
    notes_root: PathBuf,
    relative_path: RelativePathBuf,
    continue_lists: bool,
    dirty: bool,
    status: String,
    scroll: u16,
}

impl App {
    fn new(
        notes_root: PathBuf,
        relative_path: RelativePathBuf,
        lists: &ListConfig,
    ) -> Result<Self> {
        let watcher = build_watcher(lists)?;
        let session = io::open_session(&relative_path, &notes_root, watcher)
            .with_context(|| format!("Failed to open {relative_path}"))?;

        Ok(Self {
            session,
            notes_root,
            relative_path,
            continue_lists: lists.continue_lists,
            dirty: false,
            status: String::new(),
            scroll: 0,
        })
    }

    fn caret(&self) -> usize {
        self.session.selection().end
    }

    fn set_caret(&mut self, caret: usize) {
        self.session.set_selection(caret..caret);
    }

    /// Handle one key press; returns `true` when the editor should exit
    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') => return Ok(true),
                KeyCode::Char('s') => self.save()?,
                _ => {}
            }
            return Ok(false);
        }

        let caret = self.caret();
        match key.code {
            KeyCode::Esc => return Ok(true),
            KeyCode::Char(c) => self.edit(Cmd::InsertText {
                at: caret,
                text: c.to_string(),
            }),
            KeyCode::Tab => self.edit(Cmd::InsertText {
                at: caret,
                text: "  ".to_string(),
            }),
            KeyCode::Enter => {
                let cmd = if self.continue_lists {
                    Cmd::SplitListItem { at: caret }
                } else {
                    Cmd::InsertText {
                        at: caret,
                        text: "\n".to_string(),
                    }
                };
                self.edit(cmd);
            }
            KeyCode::Backspace => {
                if let Some(previous) = self.previous_char(caret) {
                    self.edit(Cmd::DeleteRange {
                        range: previous..caret,
                    });
                }
            }
            KeyCode::Delete => {
                if let Some(next) = self.next_char(caret) {
                    self.edit(Cmd::DeleteRange { range: caret..next });
                }
            }
            KeyCode::Left => {
                if let Some(previous) = self.previous_char(caret) {
                    self.set_caret(previous);
                }
            }
            KeyCode::Right => {
                if let Some(next) = self.next_char(caret) {
                    self.set_caret(next);
                }
            }
            KeyCode::Up => self.move_vertically(false),
            KeyCode::Down => self.move_vertically(true),
            KeyCode::Home => self.set_caret(line_start(self.session.buffer(), caret)),
            KeyCode::End => self.set_caret(line_end(self.session.buffer(), caret)),
            _ => {}
        }
        Ok(false)
    }

    fn edit(&mut self, cmd: Cmd) {
        match self.session.apply(cmd) {
            Ok(patch) => {
                self.dirty = true;
                self.status = match patch.list_changes.renumbered_from {
                    Some(_) => "Renumbered list".to_string(),
                    None => String::new(),
                };
            }
            Err(e) => {
                log::warn!("edit rejected: {e}");
                self.status = format!("Edit rejected: {e}");
            }
        }
    }

    fn save(&mut self) -> Result<()> {
        match io::save_session(&self.session, &self.relative_path, &self.notes_root) {
            Ok(()) => {
                self.dirty = false;
                self.status = format!("Saved {}", self.relative_path);
            }
            Err(e) => {
                log::error!("save failed: {e}");
                self.status = format!("Save failed: {e}");
            }
        }
        Ok(())
    }

    fn previous_char(&self, offset: usize) -> Option<usize> {
        let buffer = self.session.buffer();
        let mut previous = offset.checked_sub(1)?;
        while !buffer.is_char_boundary(previous) {
            previous = previous.checked_sub(1)?;
        }
        Some(previous)
    }

    fn next_char(&self, offset: usize) -> Option<usize> {
        let c = self.session.buffer().char_at(offset)?;
        Some(offset + c.len_utf8())
    }

    /// Move to the line above or below, keeping the column where possible
    fn move_vertically(&mut self, down: bool) {
        let buffer = self.session.buffer();
        let caret = self.caret();
        let start = line_start(buffer, caret);
        let column = buffer.slice(start..caret).chars().count();

        let target_start = if down {
            let end = line_end(buffer, caret);
            if end >= buffer.len() {
                return;
            }
            end + 1
        } else {
            if start == 0 {
                return;
            }
            line_start(buffer, start - 1)
        };

        let target_end = line_end(buffer, target_start);
        let offset = buffer
            .slice(target_start..target_end)
            .char_indices()
            .nth(column)
            .map_or(target_end, |(i, _)| target_start + i);
        self.set_caret(offset);
    }

    /// Row of the caret, and its column in terminal cells
    fn caret_position(&self) -> (usize, usize) {
        let buffer = self.session.buffer();
        let caret = self.caret();
        let start = line_start(buffer, caret);
        let row = buffer.slice(0..start).matches('\n').count();
        let column = Span::raw(buffer.slice(start..caret)).width();
        (row, column)
    }
}

fn build_watcher(lists: &ListConfig) -> Result<ListEditWatcher> {
    let watcher = ListEditWatcher::new(lists.reorder_enabled);
    if lists.unordered_pattern.is_none() && lists.ordered_pattern.is_none() {
        return Ok(watcher);
    }

    let patterns = ListPatterns::from_sources(
        lists
            .unordered_pattern
            .as_deref()
            .unwrap_or(DEFAULT_UNORDERED_PATTERN),
        lists
            .ordered_pattern
            .as_deref()
            .unwrap_or(DEFAULT_ORDERED_PATTERN),
    )?;
    Ok(watcher.with_patterns(patterns))
}

/// Split a file argument into the root it lives under and its path relative to that root
fn resolve_target(arg: Option<&str>, notes_path: Option<PathBuf>) -> Result<(PathBuf, RelativePathBuf)> {
    let arg = PathBuf::from(arg.unwrap_or(DEFAULT_FILE));

    if arg.is_absolute() {
        let root = arg
            .parent()
            .map(PathBuf::from)
            .context("File path has no parent directory")?;
        let name = arg.file_name().context("File path has no file name")?;
        let relative = RelativePathBuf::from_path(name)?;
        return Ok((root, relative));
    }

    let root = match notes_path {
        Some(root) => root,
        None => env::current_dir()?,
    };
    Ok((root, RelativePathBuf::from_path(&arg)?))
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        eprintln!("Usage: {} [file.md]", args[0]);
        process::exit(1);
    }

    let config = match Config::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Config file location: {}", Config::config_path().display());
            process::exit(1);
        }
    };

    let (notes_root, relative_path) =
        resolve_target(args.get(1).map(String::as_str), config.notes_path.clone())?;
    let mut app = App::new(notes_root, relative_path, &config.lists)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && app.handle_key(key)?
        {
            return Ok(());
        }
    }
}

fn to_cells(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Scroll offset that keeps `row` inside a panel of `visible_rows` rows
fn scroll_to_row(scroll: u16, row: usize, visible_rows: usize) -> u16 {
    let scroll = usize::from(scroll);
    if row < scroll {
        to_cells(row)
    } else if visible_rows > 0 && row >= scroll + visible_rows {
        to_cells(row + 1 - visible_rows)
    } else {
        to_cells(scroll)
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)].as_ref())
        .split(f.area());

    let (row, column) = app.caret_position();
    let visible_rows = usize::from(chunks[0].height.saturating_sub(2));
    app.scroll = scroll_to_row(app.scroll, row, visible_rows);

    let text = app.session.text();
    let lines: Vec<Line> = text.split('\n').map(|line| Line::from(line.to_string())).collect();

    let title = format!(
        "{}{}",
        app.relative_path,
        if app.dirty { " [modified]" } else { "" }
    );
    let editor = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((app.scroll, 0));
    f.render_widget(editor, chunks[0]);

    let visible_row = row.saturating_sub(usize::from(app.scroll));
    f.set_cursor_position((
        chunks[0].x.saturating_add(1).saturating_add(to_cells(column)),
        chunks[0].y.saturating_add(1).saturating_add(to_cells(visible_row)),
    ));

    // Status and instructions
    let help_text = Line::from(vec![
        Span::styled(app.status.clone(), Style::default().fg(Color::Yellow)),
        Span::raw(if app.status.is_empty() { "" } else { " | " }),
        Span::raw("Ctrl-S: Save | "),
        Span::raw("Esc/Ctrl-Q: Quit"),
    ]);
    f.render_widget(Paragraph::new(vec![help_text]), chunks[1]);
}
