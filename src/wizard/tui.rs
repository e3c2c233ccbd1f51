use super::{
    PackageOption, Step, SummaryChoice, WizardState, apply_updates, dependency_options,
    package_options, version_options,
};
use crate::error::{DepwizError, Result};
use crate::navigator::{
    Commit, Entry, InputEvent, ListItem, Mode, NavigatorOptions, NavigatorState,
};
use crate::registry::{Packument, RegistryLookup};
use crate::report::colored_diff;
use crate::resolver::ResolvedDependency;
use crate::workspace::editor::EditResult;
use crate::workspace::{DependencyType, Workspace};
use colored::Colorize;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, ClearType};
use crossterm::{cursor, execute, queue};
use std::io::{self, Write};
use std::path::Path;

enum Picked<T> {
    Commit(Commit<T>),
    Leave,
}

/// Raw mode for the lifetime of the guard.
struct RawMode {
    needs_disable: bool,
}

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self {
            needs_disable: true,
        })
    }

    fn disable(mut self) -> io::Result<()> {
        self.needs_disable = false;
        terminal::disable_raw_mode()
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if self.needs_disable {
            let _ = terminal::disable_raw_mode();
        }
    }
}

/// Redraws a block of lines in place on stderr.
struct Screen {
    out: io::Stderr,
    drawn: u16,
}

impl Screen {
    fn new() -> Self {
        Self {
            out: io::stderr(),
            drawn: 0,
        }
    }

    fn draw(&mut self, lines: &[String]) -> io::Result<()> {
        self.clear()?;
        for line in lines {
            queue!(self.out, cursor::MoveToColumn(0))?;
            write!(self.out, "{line}\r\n")?;
        }
        self.drawn = u16::try_from(lines.len()).unwrap_or(u16::MAX);
        self.out.flush()
    }

    fn clear(&mut self) -> io::Result<()> {
        if self.drawn > 0 {
            queue!(self.out, cursor::MoveUp(self.drawn))?;
        }
        queue!(
            self.out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::FromCursorDown)
        )?;
        self.drawn = 0;
        self.out.flush()
    }
}

/// Runs the interactive upgrade flow and writes the chosen updates.
pub struct Wizard<'a> {
    workspace: &'a Workspace,
    report: &'a [ResolvedDependency],
    registry: &'a dyn RegistryLookup,
    root: &'a Path,
    limit: usize,
}

impl<'a> Wizard<'a> {
    pub fn new(
        workspace: &'a Workspace,
        report: &'a [ResolvedDependency],
        registry: &'a dyn RegistryLookup,
        root: &'a Path,
        limit: usize,
    ) -> Self {
        Self {
            workspace,
            report,
            registry,
            root,
            limit,
        }
    }

    pub fn run(&self) -> Result<Vec<EditResult>> {
        let mut state = WizardState::new();
        let mut packument = Packument::default();
        let mut screen = Screen::new();

        let mut stderr = io::stderr();
        let raw_mode = RawMode::enable()?;
        execute!(stderr, cursor::Hide)?;
        let outcome = self.drive(&mut state, &mut packument, &mut screen);
        screen.clear()?;
        execute!(stderr, cursor::Show)?;
        raw_mode.disable()?;
        outcome?;

        apply_updates(self.workspace, self.root, state.updates())
    }

    fn drive(
        &self,
        state: &mut WizardState,
        packument: &mut Packument,
        screen: &mut Screen,
    ) -> Result<()> {
        loop {
            match state.step() {
                Step::Dependency => {
                    let nav = NavigatorState::new(
                        dependency_options(self.report),
                        NavigatorOptions::single()
                            .searchable(true)
                            .limit(self.limit),
                    );
                    let picked = self.pick(screen, state, "Select a dependency", false, nav, |e| {
                        e.label().to_string()
                    })?;
                    let (name, is_new) = match picked {
                        Picked::Commit(Commit::Item(name)) => (name, false),
                        Picked::Commit(Commit::Create(name)) => (name, true),
                        _ => continue,
                    };

                    state.choose_dependency(name.clone(), is_new);
                    match self.packument(&name) {
                        Ok(found) => *packument = found,
                        Err(e) => state.versions_unavailable(e.to_string()),
                    }
                }
                Step::Version => {
                    let nav = NavigatorState::new(
                        version_options(packument),
                        NavigatorOptions::single()
                            .searchable(false)
                            .limit(self.limit),
                    );
                    if let Picked::Commit(Commit::Item(option)) =
                        self.pick(screen, state, "Select a version", false, nav, |e| {
                            e.label().to_string()
                        })?
                    {
                        state.choose_version(option.version);
                    }
                }
                Step::Packages => {
                    let (dependency, version) = match (state.dependency(), state.version()) {
                        (Some(d), Some(v)) => (d.name.clone(), v.to_string()),
                        _ => {
                            state.choose_summary(SummaryChoice::AddAnother);
                            continue;
                        }
                    };
                    let (options, selected) =
                        package_options(self.workspace, &dependency, &version);
                    let nav = NavigatorState::new(
                        options,
                        NavigatorOptions::multi(true).limit(self.limit),
                    )
                    .with_selected(selected);

                    let title = format!(
                        "Select packages {}",
                        "(<space> to select, <a> to select all)".dimmed()
                    );
                    if let Picked::Commit(Commit::Items(chosen)) =
                        self.pick(screen, state, &title, false, nav, render_package)?
                    {
                        let adds = chosen.iter().any(|p| p.declared.is_none());
                        let names = chosen.into_iter().map(|p| p.name).collect();
                        // an empty selection leaves the message on the state
                        let _ = state.choose_packages(names, adds);
                    }
                }
                Step::DependencyType => {
                    let nav = NavigatorState::new(
                        DependencyType::ALL.to_vec(),
                        NavigatorOptions::single(),
                    );
                    let title = "Add as which dependency type?";
                    if let Picked::Commit(Commit::Item(dep_type)) =
                        self.pick(screen, state, title, false, nav, |e| e.label().to_string())?
                    {
                        state.choose_dependency_type(dep_type);
                    }
                }
                Step::Summary => {
                    let nav = NavigatorState::new(
                        SummaryChoice::ALL.to_vec(),
                        NavigatorOptions::single(),
                    );
                    let title = summary_title(state, self.workspace.is_monorepo());
                    if let Picked::Commit(Commit::Item(choice)) =
                        self.pick(screen, state, &title, false, nav, |e| e.label().to_string())?
                    {
                        state.choose_summary(choice);
                    }
                }
                Step::Edit => {
                    let nav = NavigatorState::new(
                        state.updates().to_vec(),
                        NavigatorOptions::single().limit(self.limit),
                    );
                    let title = format!(
                        "Select updates to remove {}",
                        "(<enter> to remove update, <q> to return)".dimmed()
                    );
                    let picked = self.pick(screen, state, &title, true, nav, |e| {
                        e.label().to_string()
                    })?;
                    match picked {
                        Picked::Commit(Commit::Item(update)) => {
                            let index = state.updates().iter().position(|u| *u == update);
                            if let Some(index) = index {
                                state.remove_update(index);
                            }
                        }
                        Picked::Leave => state.leave_edit(),
                        _ => {}
                    }
                }
                Step::Done => return Ok(()),
            }
        }
    }

    /// Versions already fetched during resolution are reused.
    fn packument(&self, name: &str) -> Result<Packument> {
        let known = self
            .report
            .iter()
            .find(|dep| dep.name == name && !dep.versions.is_empty());
        match known {
            Some(dep) => Ok(Packument {
                versions: dep.versions.clone(),
                dist_tags: dep.dist_tags.clone(),
            }),
            None => Ok(self.registry.packument(name)?),
        }
    }

    fn pick<T: ListItem + Clone>(
        &self,
        screen: &mut Screen,
        state: &WizardState,
        title: &str,
        can_leave: bool,
        mut nav: NavigatorState<T>,
        render: impl Fn(&Entry<T>) -> String,
    ) -> Result<Picked<T>> {
        let mut notice = state.message().map(str::to_string);

        loop {
            screen.draw(&frame(state, title, notice.as_deref(), &nav, &render))?;

            let Event::Key(KeyEvent {
                kind: KeyEventKind::Press,
                code,
                modifiers,
                ..
            }) = event::read()?
            else {
                continue;
            };

            let options = *nav.options();
            let multi = !matches!(options.mode, Mode::Single);
            let input = match (code, modifiers) {
                (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => {
                    return Err(DepwizError::UserCancelled);
                }
                (KeyCode::Up, _) => InputEvent::Up,
                (KeyCode::Down, _) => InputEvent::Down,
                (KeyCode::Enter, _) => InputEvent::Commit,
                (KeyCode::Backspace, _) => InputEvent::Backspace,
                (KeyCode::Char(' '), _) if multi => InputEvent::Toggle,
                (KeyCode::Char('a'), _) if multi && !options.searchable => InputEvent::ToggleAll,
                (KeyCode::Char('q'), _) if can_leave && !options.searchable => {
                    return Ok(Picked::Leave);
                }
                (KeyCode::Char(c), _) if options.searchable => InputEvent::Input(c),
                _ => continue,
            };

            let (next, commit) = nav.reduce(input);
            nav = next;
            match commit {
                Some(Commit::Invalid(e)) => notice = Some(e.to_string()),
                Some(commit) => return Ok(Picked::Commit(commit)),
                None => {}
            }
        }
    }
}

fn frame<T: ListItem + Clone>(
    state: &WizardState,
    title: &str,
    notice: Option<&str>,
    nav: &NavigatorState<T>,
    render: &impl Fn(&Entry<T>) -> String,
) -> Vec<String> {
    let mut lines: Vec<String> = state
        .header()
        .into_iter()
        .map(|(label, value)| format!("{} {}", label.bold(), value.green()))
        .collect();
    if !lines.is_empty() {
        lines.push(String::new());
    }

    let mut title_lines = title.lines();
    lines.push(format!(
        "{} {}",
        "?".blue(),
        title_lines.next().unwrap_or_default()
    ));
    lines.extend(title_lines.map(str::to_string));

    let view = nav.view();
    let multi = !matches!(nav.options().mode, Mode::Single);
    if multi && !view.selected_indexes.is_empty() {
        lines.push(format!("  {} selected", view.selected_indexes.len()).dimmed().to_string());
    }
    if nav.options().searchable {
        lines.push(format!("search: {}", view.search_text));
    }
    if let Some(notice) = notice {
        lines.push(notice.red().to_string());
    }

    if nav.is_empty() {
        lines.push("  (no matches)".dimmed().to_string());
    }

    if nav.can_scroll() && view.view_start > 0 {
        lines.push("  ↑".dimmed().to_string());
    }
    for row in &view.rows {
        let pointer = if row.highlighted {
            "❯".blue().to_string()
        } else {
            " ".to_string()
        };
        let check = match (multi, row.selected) {
            (false, _) => "",
            (true, true) => "◉ ",
            (true, false) => "◯ ",
        };
        let label = if row.entry.is_create() {
            format!("{} {}", "[+]".green(), row.entry.label().green())
        } else if row.highlighted {
            render(row.entry).blue().to_string()
        } else {
            render(row.entry)
        };
        lines.push(format!("{pointer} {check}{label}"));
    }
    if nav.can_scroll() && view.view_start + nav.view_length() < nav.len() {
        lines.push("  ↓".dimmed().to_string());
    }
    if nav.can_scroll() {
        let position = format!("  ({}/{})", view.highlighted_index + 1, nav.len());
        lines.push(position.dimmed().to_string());
    }

    lines
}

fn render_package(entry: &Entry<PackageOption>) -> String {
    match entry {
        Entry::Item(option) if option.declared.is_some() => {
            format!("{} ({})", option.name, colored_diff(&option.diff))
        }
        other => other.label().to_string(),
    }
}

fn summary_title(state: &WizardState, monorepo: bool) -> String {
    let mut title = String::from("Summary:");
    for update in state.updates() {
        title.push_str(&format!("\n   {}", update.label()));
        if monorepo {
            title.push_str(&format!(" ({})", update.packages.join(", ")));
        }
    }
    title
}
