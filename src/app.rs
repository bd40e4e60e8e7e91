use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, warn};

use crate::branch;
use crate::dispatch::Command;
use crate::event::AppEvent;
use crate::filter;
use crate::model::task::TaskNode;
use crate::model::workspace::WorkspaceOutcome;
use crate::navigation::{self, Selection};
use crate::tree::{self, TaskTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Free-text branch entry. Initial mode.
    Input,
    IssueSelection,
    Search,
    /// Inline title entry under an "add subtask" placeholder.
    SubtaskInput,
    Loading,
    /// Terminal: a success or error message is shown until any key.
    Result,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultMessage {
    Success(String),
    Error(String),
}

pub struct App {
    pub mode: Mode,
    pub tree: TaskTree,
    /// Search view; meaningful only while `searching`.
    pub filtered_roots: Vec<TaskNode>,
    pub searching: bool,
    pub selection: Selection,
    pub search_query: String,
    pub custom_input: String,
    pub subtask_input: String,

    // Loading flags
    pub tickets_enabled: bool,
    pub loading_tickets: bool,
    pub creating_workspace: bool,
    pub creating_subtask: bool,
    /// The command that put the app into `Loading`.
    pub pending: Option<Command>,

    pub result: Option<ResultMessage>,
    /// Non-fatal error shown in the status bar.
    pub last_error: Option<String>,

    pub show_help: bool,
    pub spinner_frame: usize,
    pub should_quit: bool,
    pub dirty: bool,
}

impl App {
    pub fn new(tickets_enabled: bool) -> Self {
        App {
            mode: Mode::Input,
            tree: TaskTree::default(),
            filtered_roots: Vec::new(),
            searching: false,
            selection: Selection::Input,
            search_query: String::new(),
            custom_input: String::new(),
            subtask_input: String::new(),

            tickets_enabled,
            loading_tickets: false,
            creating_workspace: false,
            creating_subtask: false,
            pending: None,

            result: None,
            last_error: None,

            show_help: false,
            spinner_frame: 0,
            should_quit: false,
            dirty: true,
        }
    }

    /// Command to run as the loop starts.
    pub fn startup(&mut self) -> Option<Command> {
        self.refresh_tickets()
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Roots currently navigable: the search view while searching, else the tree.
    pub fn view_roots(&self) -> &[TaskNode] {
        if self.searching {
            &self.filtered_roots
        } else {
            self.tree.roots()
        }
    }

    pub fn selected_node(&self) -> Option<&TaskNode> {
        let id = self.selection.node_id()?;
        tree::find(self.view_roots(), id)
    }

    pub fn is_busy(&self) -> bool {
        self.mode == Mode::Loading || self.loading_tickets
    }

    /// 1 after an error result, 0 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self.result {
            Some(ResultMessage::Error(_)) => 1,
            _ => 0,
        }
    }

    /// Apply one inbound message. May hand back a command for the dispatcher.
    pub fn update(&mut self, event: AppEvent) -> Option<Command> {
        match event {
            AppEvent::Key(key) => {
                self.mark_dirty();
                self.handle_key(key)
            }
            AppEvent::Resize(..) => {
                self.mark_dirty();
                None
            }
            AppEvent::Tick => {
                if self.is_busy() {
                    self.spinner_frame = self.spinner_frame.wrapping_add(1);
                    self.mark_dirty();
                }
                None
            }
            AppEvent::TicketsLoaded(result) => {
                self.mark_dirty();
                self.apply_tickets(result);
                None
            }
            AppEvent::ChildrenLoaded { parent_id, result } => {
                self.mark_dirty();
                self.apply_children(&parent_id, result);
                None
            }
            AppEvent::SubtaskCreated { parent_id, result } => {
                self.mark_dirty();
                self.apply_subtask(&parent_id, result);
                None
            }
            AppEvent::WorkspaceCreated(result) => {
                self.mark_dirty();
                self.apply_workspace(result);
                None
            }
        }
    }

    // --- Keys ---

    fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        // Any key leaves the result screen.
        if self.mode == Mode::Result {
            self.should_quit = true;
            return None;
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return None;
        }

        match self.mode {
            Mode::Input => self.handle_input_key(key),
            Mode::IssueSelection => self.handle_selection_key(key),
            Mode::Search => self.handle_search_key(key),
            Mode::SubtaskInput => self.handle_subtask_key(key),
            Mode::Loading => {
                if key.code == KeyCode::Esc {
                    self.should_quit = true;
                }
                None
            }
            Mode::Result => None,
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => return self.submit_custom_input(),
            KeyCode::Backspace => {
                self.custom_input.pop();
            }
            KeyCode::Down => self.select_or_stay(navigation::first_visible(self.view_roots())),
            KeyCode::Up => self.select_or_stay(navigation::last_visible(self.view_roots())),
            KeyCode::Char('/') if self.custom_input.is_empty() => self.enter_search(),
            KeyCode::Char(c) if is_plain(&key) => {
                self.custom_input.push(c);
                self.last_error = None;
            }
            _ => {}
        }
        None
    }

    fn handle_selection_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Down => self.move_down(),
            KeyCode::Up => self.move_up(),
            KeyCode::Right => return self.expand_selected(),
            KeyCode::Left => self.collapse_selected(),
            KeyCode::Enter => {
                if let Selection::Placeholder(_) = self.selection {
                    self.start_subtask_input();
                    return None;
                }
                return self.create_workspace_for_selected();
            }
            KeyCode::Char('/') => self.enter_search(),
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('r') => return self.refresh_tickets(),
            _ => {}
        }
        None
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Esc => self.exit_search(),
            KeyCode::Enter => return self.create_workspace_for_selected(),
            KeyCode::Down => {
                self.selection = navigation::next_visible(self.view_roots(), &self.selection)
                    .unwrap_or(Selection::Input);
            }
            KeyCode::Up => {
                self.selection = navigation::prev_visible(self.view_roots(), &self.selection)
                    .unwrap_or(Selection::Input);
            }
            KeyCode::Backspace => {
                self.search_query.pop();
                self.refilter();
            }
            KeyCode::Char(c) if is_plain(&key) => {
                self.search_query.push(c);
                self.refilter();
            }
            _ => {}
        }
        None
    }

    fn handle_subtask_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Esc => {
                self.subtask_input.clear();
                self.set_mode(Mode::IssueSelection);
            }
            KeyCode::Enter => return self.submit_subtask(),
            KeyCode::Backspace => {
                self.subtask_input.pop();
            }
            KeyCode::Char(c) if is_plain(&key) => self.subtask_input.push(c),
            _ => {}
        }
        None
    }

    // --- Transitions ---

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            debug!(from = ?self.mode, to = ?mode, "mode");
            self.mode = mode;
        }
    }

    fn enter_loading(&mut self, command: Command) -> Option<Command> {
        match command {
            Command::CreateWorkspace { .. } => self.creating_workspace = true,
            Command::CreateSubtask { .. } => self.creating_subtask = true,
            _ => {}
        }
        self.pending = Some(command.clone());
        self.set_mode(Mode::Loading);
        Some(command)
    }

    /// Leave `Loading` if it was entered for a command matching `pred`.
    fn finish_pending(&mut self, pred: impl Fn(&Command) -> bool, next: Mode) {
        if self.mode == Mode::Loading && self.pending.as_ref().is_some_and(pred) {
            self.pending = None;
            self.set_mode(next);
        }
    }

    fn select_or_stay(&mut self, target: Option<Selection>) {
        if let Some(sel) = target {
            self.selection = sel;
            self.set_mode(Mode::IssueSelection);
        }
    }

    fn move_down(&mut self) {
        match navigation::next_visible(self.view_roots(), &self.selection) {
            Some(sel) => self.selection = sel,
            None => self.focus_input(),
        }
    }

    fn move_up(&mut self) {
        match navigation::prev_visible(self.view_roots(), &self.selection) {
            Some(sel) => self.selection = sel,
            None => self.focus_input(),
        }
    }

    fn focus_input(&mut self) {
        self.selection = Selection::Input;
        self.set_mode(Mode::Input);
    }

    fn expand_selected(&mut self) -> Option<Command> {
        match self.selection.clone() {
            Selection::Placeholder(_) => {
                self.start_subtask_input();
                None
            }
            Selection::Node(id) => {
                let node = self.tree.find(&id)?;
                if node.expanded {
                    return None;
                }
                if node.needs_fetch() {
                    return self.enter_loading(Command::FetchChildren { parent_id: id });
                }
                self.tree.set_expanded(&id, true);
                None
            }
            Selection::Input => None,
        }
    }

    fn collapse_selected(&mut self) {
        match self.selection.clone() {
            Selection::Node(id) => {
                let Some(node) = self.tree.find(&id) else {
                    return;
                };
                if node.expanded {
                    self.collapse(&id);
                } else if let Some(parent) = node.parent_id.clone() {
                    self.selection = Selection::Node(parent);
                }
            }
            Selection::Placeholder(owner) => self.collapse(&owner),
            Selection::Input => {}
        }
    }

    /// Collapse `id`; a selection inside it moves up to `id` itself.
    pub fn collapse(&mut self, id: &str) {
        let inside = navigation::is_within(self.tree.roots(), id, &self.selection);
        self.tree.set_expanded(id, false);
        if inside {
            self.selection = Selection::Node(id.to_string());
        }
    }

    fn start_subtask_input(&mut self) {
        self.subtask_input.clear();
        self.set_mode(Mode::SubtaskInput);
    }

    fn submit_subtask(&mut self) -> Option<Command> {
        let title = self.subtask_input.trim().to_string();
        if title.is_empty() {
            return None;
        }
        let Selection::Placeholder(parent_id) = self.selection.clone() else {
            return None;
        };
        self.enter_loading(Command::CreateSubtask { parent_id, title })
    }

    fn enter_search(&mut self) {
        self.searching = true;
        self.selection = Selection::Input;
        self.refilter();
        self.set_mode(Mode::Search);
    }

    fn exit_search(&mut self) {
        self.searching = false;
        self.search_query.clear();
        self.filtered_roots = self.tree.roots().to_vec();
        self.focus_input();
    }

    fn refilter(&mut self) {
        self.filtered_roots = filter::filter_roots(self.tree.roots(), &self.search_query);
        if !navigation::is_visible(self.view_roots(), &self.selection) {
            self.selection = Selection::Input;
        }
    }

    /// After the tree changed under the cursor: a selection that fell back to
    /// the input line takes the selection modes with it.
    fn settle_selection(&mut self) {
        if !navigation::is_visible(self.view_roots(), &self.selection) {
            self.selection = Selection::Input;
        }
        if self.selection != Selection::Input {
            return;
        }
        match self.mode {
            Mode::IssueSelection => self.set_mode(Mode::Input),
            Mode::SubtaskInput => {
                self.subtask_input.clear();
                self.last_error = Some("Tickets refreshed; subtask draft discarded".to_string());
                self.set_mode(Mode::Input);
            }
            _ => {}
        }
    }

    fn refresh_tickets(&mut self) -> Option<Command> {
        if !self.tickets_enabled || self.loading_tickets {
            return None;
        }
        self.loading_tickets = true;
        Some(Command::FetchTickets)
    }

    fn submit_custom_input(&mut self) -> Option<Command> {
        let name = self.custom_input.trim().to_string();
        if name.is_empty() {
            return None;
        }
        if let Err(e) = branch::validate_branch_name(&name) {
            self.last_error = Some(e.to_string());
            return None;
        }
        self.enter_loading(Command::CreateWorkspace { branch: name })
    }

    fn create_workspace_for_selected(&mut self) -> Option<Command> {
        let node = self.selected_node()?;
        let name = branch::branch_name_for_ticket(&node.identifier, &node.title);
        if name.is_empty() {
            let identifier = node.identifier.clone();
            self.last_error = Some(format!("Cannot derive a branch name from {}", identifier));
            return None;
        }
        self.enter_loading(Command::CreateWorkspace { branch: name })
    }

    // --- Completions ---

    fn apply_tickets(&mut self, result: Result<Vec<TaskNode>, String>) {
        self.loading_tickets = false;
        match result {
            Ok(nodes) => {
                debug!(count = nodes.len(), "tickets loaded");
                self.tree.set_roots(nodes);
                self.refilter();
                self.settle_selection();
            }
            Err(msg) => {
                warn!(error = %msg, "ticket fetch failed");
                self.last_error = Some(format!("Could not load tickets: {}", msg));
            }
        }
    }

    fn apply_children(&mut self, parent_id: &str, result: Result<Vec<TaskNode>, String>) {
        self.finish_pending(
            |c| matches!(c, Command::FetchChildren { parent_id: p } if p == parent_id),
            Mode::IssueSelection,
        );
        match result {
            Ok(children) => {
                if !self.tree.attach_children(parent_id, children) {
                    warn!(parent_id, "children arrived for a ticket no longer in the tree");
                }
            }
            Err(msg) => {
                warn!(parent_id, error = %msg, "child fetch failed");
                self.last_error = Some(format!("Could not load subtasks: {}", msg));
            }
        }
    }

    fn apply_subtask(&mut self, parent_id: &str, result: Result<TaskNode, String>) {
        self.creating_subtask = false;
        self.subtask_input.clear();
        self.finish_pending(
            |c| matches!(c, Command::CreateSubtask { parent_id: p, .. } if p == parent_id),
            Mode::IssueSelection,
        );
        match result {
            Ok(node) => match self.tree.find(parent_id).map(TaskNode::needs_fetch) {
                None => warn!(parent_id, "subtask created under a ticket no longer in the tree"),
                // A refresh reset the parent's children. Appending now would
                // leave it partially populated; the next expand fetches all.
                Some(true) => {
                    debug!(parent_id, subtask = %node.id, "parent unfetched; subtask left for the next fetch");
                    self.selection = Selection::Node(parent_id.to_string());
                }
                Some(false) => {
                    let id = node.id.clone();
                    self.tree.append_child(parent_id, node);
                    self.tree.set_expanded(parent_id, true);
                    self.selection = Selection::Node(id);
                }
            },
            Err(msg) => {
                warn!(parent_id, error = %msg, "subtask creation failed");
                self.last_error = Some(format!("Could not create subtask: {}", msg));
            }
        }
        self.settle_selection();
    }

    fn apply_workspace(&mut self, result: Result<WorkspaceOutcome, String>) {
        self.creating_workspace = false;
        self.pending = None;
        self.result = Some(match result {
            Ok(outcome) => {
                let mut msg = format!("Workspace created at {}", outcome.path.display());
                if let Some(err) = outcome.post_create_error {
                    msg.push_str(&format!("\nPost-create command failed: {}", err));
                }
                ResultMessage::Success(msg)
            }
            Err(msg) => ResultMessage::Error(format!("Failed to create workspace: {}", msg)),
        });
        self.set_mode(Mode::Result);
    }
}

/// Printable key without Ctrl/Alt.
fn is_plain(key: &KeyEvent) -> bool {
    !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}
