use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};

use crate::data::git;
use crate::event::AppEvent;
use crate::model::workspace::WorkspaceOutcome;
use crate::providers::{TicketProvider, WorkspaceProvider};

/// Deferred work requested by a state transition.
///
/// Commands carry everything they need by value and never touch app state;
/// their single result comes back as an [`AppEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchTickets,
    FetchChildren { parent_id: String },
    CreateSubtask { parent_id: String, title: String },
    CreateWorkspace { branch: String },
}

impl Command {
    pub fn describe(&self) -> String {
        match self {
            Command::FetchTickets => "Loading tickets".to_string(),
            Command::FetchChildren { .. } => "Loading subtasks".to_string(),
            Command::CreateSubtask { title, .. } => format!("Creating subtask \"{}\"", title),
            Command::CreateWorkspace { branch } => format!("Creating workspace {}", branch),
        }
    }
}

/// Runs commands on worker threads and posts completions to the app loop.
pub struct Dispatcher {
    tickets: Arc<dyn TicketProvider>,
    workspaces: Arc<dyn WorkspaceProvider>,
    post_create: Option<Vec<String>>,
    tx: mpsc::Sender<AppEvent>,
}

impl Dispatcher {
    pub fn new(
        tickets: Arc<dyn TicketProvider>,
        workspaces: Arc<dyn WorkspaceProvider>,
        post_create: Option<Vec<String>>,
        tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        Dispatcher {
            tickets,
            workspaces,
            post_create,
            tx,
        }
    }

    /// Start `command` off the loop. Never blocks; there is no cancellation.
    pub fn dispatch(&self, command: Command) {
        info!(?command, "dispatch");
        let tickets = Arc::clone(&self.tickets);
        let workspaces = Arc::clone(&self.workspaces);
        let post_create = self.post_create.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let event = execute(command, tickets.as_ref(), workspaces.as_ref(), post_create.as_deref());
            debug!(?event, "command finished");
            if tx.send(event).is_err() {
                warn!("app loop gone; dropping command result");
            }
        });
    }
}

/// Run `command` to completion and produce its one completion message.
pub fn execute(
    command: Command,
    tickets: &dyn TicketProvider,
    workspaces: &dyn WorkspaceProvider,
    post_create: Option<&[String]>,
) -> AppEvent {
    match command {
        Command::FetchTickets => AppEvent::TicketsLoaded(tickets.assigned_tickets().map_err(|e| e.to_string())),
        Command::FetchChildren { parent_id } => {
            let result = tickets.children(&parent_id).map_err(|e| e.to_string());
            AppEvent::ChildrenLoaded { parent_id, result }
        }
        Command::CreateSubtask { parent_id, title } => {
            let result = tickets
                .create_subtask(&parent_id, &title)
                .map_err(|e| e.to_string());
            AppEvent::SubtaskCreated { parent_id, result }
        }
        Command::CreateWorkspace { branch } => {
            let result = workspaces
                .create_workspace(&branch)
                .map(|path| {
                    let post_create_error = post_create.and_then(|argv| git::run_post_create(&path, argv));
                    WorkspaceOutcome {
                        path,
                        post_create_error,
                    }
                })
                .map_err(|e| e.to_string());
            AppEvent::WorkspaceCreated(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::model::task::TaskNode;
    use crate::providers::fakes::{FakeTickets, FakeWorkspaces};

    fn tickets() -> FakeTickets {
        FakeTickets::new(vec![TaskNode::new("a", "SPR-1", "Alpha").with_unfetched_children()])
            .with_children("a", vec![TaskNode::new("a1", "SPR-2", "Child")])
    }

    #[test]
    fn fetch_tickets_reports_roots() {
        let event = execute(Command::FetchTickets, &tickets(), &FakeWorkspaces::new(), None);
        match event {
            AppEvent::TicketsLoaded(Ok(nodes)) => assert_eq!(nodes[0].id, "a"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn fetch_children_echoes_parent() {
        let event = execute(
            Command::FetchChildren { parent_id: "a".into() },
            &tickets(),
            &FakeWorkspaces::new(),
            None,
        );
        match event {
            AppEvent::ChildrenLoaded { parent_id, result } => {
                assert_eq!(parent_id, "a");
                assert_eq!(result.unwrap()[0].id, "a1");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn provider_failures_become_messages() {
        let event = execute(
            Command::CreateSubtask { parent_id: "a".into(), title: "Sub".into() },
            &FakeTickets::failing("tracker down"),
            &FakeWorkspaces::new(),
            None,
        );
        match event {
            AppEvent::SubtaskCreated { result: Err(msg), .. } => assert!(msg.contains("tracker down")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn workspace_conflict_is_reported() {
        let workspaces = FakeWorkspaces::new();
        let event = execute(
            Command::CreateWorkspace { branch: "main".into() },
            &tickets(),
            &workspaces,
            None,
        );
        match event {
            AppEvent::WorkspaceCreated(Err(msg)) => assert!(msg.contains("conflict")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn failed_post_create_still_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let workspaces = FakeWorkspaces {
            base: dir.path().to_path_buf(),
            ..FakeWorkspaces::new()
        };
        std::fs::create_dir(dir.path().join("feature")).unwrap();
        let argv = vec!["sprout-no-such-binary".to_string()];
        let event = execute(
            Command::CreateWorkspace { branch: "feature".into() },
            &tickets(),
            &workspaces,
            Some(&argv),
        );
        match event {
            AppEvent::WorkspaceCreated(Ok(outcome)) => {
                assert_eq!(outcome.path, dir.path().join("feature"));
                assert!(outcome.post_create_error.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn dispatched_commands_report_back_through_the_channel() {
        let (tx, rx) = mpsc::channel();
        let dispatcher = Dispatcher::new(Arc::new(tickets()), Arc::new(FakeWorkspaces::new()), None, tx);

        dispatcher.dispatch(Command::FetchTickets);
        dispatcher.dispatch(Command::CreateWorkspace { branch: "spr-1-alpha".into() });

        let mut tickets_seen = false;
        let mut workspace_seen = false;
        for _ in 0..2 {
            match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                AppEvent::TicketsLoaded(Ok(_)) => tickets_seen = true,
                AppEvent::WorkspaceCreated(Ok(_)) => workspace_seen = true,
                other => panic!("unexpected {:?}", other),
            }
        }
        assert!(tickets_seen && workspace_seen);
    }
}
