use crossterm::event::KeyEvent;

use crate::model::task::TaskNode;
use crate::model::workspace::WorkspaceOutcome;

/// Everything the app loop handles, in arrival order.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    /// Redraw tick; advances the spinner.
    Tick,
    /// Background fetch of assigned tickets completed.
    TicketsLoaded(Result<Vec<TaskNode>, String>),
    /// Background fetch of one ticket's children completed.
    ChildrenLoaded {
        parent_id: String,
        result: Result<Vec<TaskNode>, String>,
    },
    /// Subtask creation under `parent_id` completed.
    SubtaskCreated {
        parent_id: String,
        result: Result<TaskNode, String>,
    },
    /// Workspace creation completed.
    WorkspaceCreated(Result<WorkspaceOutcome, String>),
}
