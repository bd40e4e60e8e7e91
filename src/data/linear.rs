use std::io::Read;
use std::process::{Child, Output};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::ProjectConfig;
use crate::error::{Result, SproutError};
use crate::model::linear::{LinearIssue, LinearUser};
use crate::model::task::{TaskNode, User};
use crate::providers::TicketProvider;

const ENDPOINT: &str = "https://api.linear.app/graphql";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const ISSUE_FIELDS: &str = "id identifier title description url updatedAt state { name type } assignee { name email } children(first: 1) { nodes { id } }";

/// Linear's GraphQL API, reached through `curl`.
pub struct LinearClient {
    api_key: String,
    team_key: Option<String>,
}

impl LinearClient {
    pub fn new(api_key: impl Into<String>, team_key: Option<String>) -> Self {
        LinearClient {
            api_key: api_key.into(),
            team_key,
        }
    }

    /// Client for the configured API key, if there is one.
    pub fn from_config(config: &ProjectConfig) -> Option<Self> {
        config
            .linear_api_key()
            .map(|key| LinearClient::new(key, config.linear_team().map(String::from)))
    }

    /// POST a GraphQL document and return its `data` member.
    fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let body = serde_json::to_string(&json!({ "query": query, "variables": variables }))?;
        debug!(bytes = body.len(), "linear request");

        let child = std::process::Command::new("curl")
            .args([
                "-s",
                "-X",
                "POST",
                "-H",
                "Content-Type: application/json",
                "-H",
                &format!("Authorization: {}", self.api_key),
                "-d",
                &body,
                ENDPOINT,
            ])
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()?;

        let output = collect_output(child, REQUEST_TIMEOUT)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SproutError::External(format!("curl failed: {}", stderr.trim())));
        }

        parse_data(&output.stdout)
    }
}

impl TicketProvider for LinearClient {
    fn assigned_tickets(&self) -> Result<Vec<TaskNode>> {
        let query = format!(
            "query($filter: IssueFilter) {{ viewer {{ assignedIssues(filter: $filter, first: 50, orderBy: updatedAt) {{ nodes {{ {} }} }} }} }}",
            ISSUE_FIELDS
        );
        let data = self.graphql(&query, json!({ "filter": assigned_filter(self.team_key.as_deref()) }))?;
        issues_at(&data, "/viewer/assignedIssues/nodes")
    }

    fn children(&self, ticket_id: &str) -> Result<Vec<TaskNode>> {
        let query = format!(
            "query($id: String!) {{ issue(id: $id) {{ children(first: 100) {{ nodes {{ {} }} }} }} }}",
            ISSUE_FIELDS
        );
        let data = self.graphql(&query, json!({ "id": ticket_id }))?;
        if data.get("issue").map_or(true, Value::is_null) {
            return Err(SproutError::NotFound(format!("ticket {}", ticket_id)));
        }
        issues_at(&data, "/issue/children/nodes")
    }

    fn create_subtask(&self, parent_id: &str, title: &str) -> Result<TaskNode> {
        let data = self.graphql(
            "query($id: String!) { issue(id: $id) { team { id } } }",
            json!({ "id": parent_id }),
        )?;
        let team_id = data
            .pointer("/issue/team/id")
            .and_then(Value::as_str)
            .ok_or_else(|| SproutError::NotFound(format!("ticket {}", parent_id)))?
            .to_string();

        let mutation = format!(
            "mutation($input: IssueCreateInput!) {{ issueCreate(input: $input) {{ success issue {{ {} }} }} }}",
            ISSUE_FIELDS
        );
        let data = self.graphql(
            &mutation,
            json!({ "input": { "teamId": team_id, "parentId": parent_id, "title": title } }),
        )?;
        parse_created_issue(&data)
    }

    fn current_user(&self) -> Result<User> {
        let data = self.graphql("query { viewer { name email } }", json!({}))?;
        let viewer = data
            .get("viewer")
            .cloned()
            .ok_or_else(|| SproutError::External("response has no viewer".to_string()))?;
        let user: LinearUser = serde_json::from_value(viewer)?;
        Ok(user.into())
    }

    fn test_connection(&self) -> Result<()> {
        self.graphql("query { viewer { id } }", json!({})).map(|_| ())
    }
}

/// Wait for `child` up to `timeout`, reading its pipes while it runs.
///
/// Both pipes are drained on their own threads: a response larger than the
/// pipe buffer would otherwise block the child before it can exit.
fn collect_output(mut child: Child, timeout: Duration) -> Result<Output> {
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if start.elapsed() > timeout {
            child.kill().ok();
            child.wait().ok();
            return Err(SproutError::External(format!(
                "Linear API request timed out after {}s",
                timeout.as_secs()
            )));
        }
        thread::sleep(Duration::from_millis(50));
    };

    Ok(Output {
        status,
        stdout: joined(stdout),
        stderr: joined(stderr),
    })
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf).ok();
        buf
    })
}

fn joined(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Open tickets only, optionally restricted to one team.
fn assigned_filter(team_key: Option<&str>) -> Value {
    let mut filter = json!({ "state": { "type": { "nin": ["completed", "canceled"] } } });
    if let Some(team) = team_key {
        filter["team"] = json!({ "key": { "eq": team } });
    }
    filter
}

/// Extract `data` from a GraphQL response, turning `errors` into a failure.
fn parse_data(body: &[u8]) -> Result<Value> {
    let value: Value = serde_json::from_slice(body)?;

    if let Some(first) = value
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        let msg = first
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(SproutError::External(format!("Linear API error: {}", msg)));
    }

    value
        .get("data")
        .cloned()
        .ok_or_else(|| SproutError::External("unexpected response structure from Linear API".to_string()))
}

fn issues_at(data: &Value, pointer: &str) -> Result<Vec<TaskNode>> {
    let nodes = data
        .pointer(pointer)
        .and_then(Value::as_array)
        .ok_or_else(|| SproutError::External("unexpected response structure from Linear API".to_string()))?;

    Ok(nodes
        .iter()
        .filter_map(|node| match serde_json::from_value::<LinearIssue>(node.clone()) {
            Ok(issue) => Some(issue),
            Err(e) => {
                warn!(error = %e, "skipping malformed Linear issue");
                None
            }
        })
        .map(TaskNode::from)
        .collect())
}

fn parse_created_issue(data: &Value) -> Result<TaskNode> {
    let success = data
        .pointer("/issueCreate/success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let issue = data.pointer("/issueCreate/issue").filter(|v| !v.is_null());
    match (success, issue) {
        (true, Some(issue)) => {
            let issue: LinearIssue = serde_json::from_value(issue.clone())?;
            Ok(issue.into())
        }
        _ => Err(SproutError::External("Linear refused to create the subtask".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::StatusCategory;
    use pretty_assertions::assert_eq;

    const ASSIGNED: &str = r#"{
      "data": { "viewer": { "assignedIssues": { "nodes": [
        {
          "id": "uuid-1", "identifier": "SPR-1", "title": "Parent",
          "description": "Body", "url": "https://linear.app/x/SPR-1",
          "updatedAt": "2026-10-01T12:00:00.000Z",
          "state": { "name": "In Progress", "type": "started" },
          "assignee": { "name": "Ada", "email": "ada@example.com" },
          "children": { "nodes": [ { "id": "uuid-2" } ] }
        },
        {
          "id": "uuid-3", "identifier": "SPR-3", "title": "Leaf",
          "description": null, "url": "",
          "state": { "name": "Todo", "type": "unstarted" },
          "assignee": null,
          "children": { "nodes": [] }
        },
        { "broken": true }
      ] } } }
    }"#;

    #[test]
    fn assigned_issues_become_root_nodes() {
        let data = parse_data(ASSIGNED.as_bytes()).unwrap();
        let nodes = issues_at(&data, "/viewer/assignedIssues/nodes").unwrap();

        assert_eq!(nodes.len(), 2);
        let parent = &nodes[0];
        assert_eq!(parent.id, "uuid-1");
        assert_eq!(parent.identifier, "SPR-1");
        assert!(parent.has_children);
        assert!(parent.needs_fetch());
        assert_eq!(parent.status.category, StatusCategory::Active);
        assert_eq!(parent.assignee.as_ref().map(|a| a.name.as_str()), Some("Ada"));
        assert!(parent.updated_at.is_some());

        let leaf = &nodes[1];
        assert!(!leaf.has_children);
        assert_eq!(leaf.status.category, StatusCategory::Backlog);
        assert!(leaf.assignee.is_none());
    }

    #[test]
    fn graphql_errors_are_external_failures() {
        let body = br#"{"errors":[{"message":"Authentication required"}]}"#;
        let err = parse_data(body).unwrap_err();
        assert_eq!(err.exit_code(), 5);
        assert!(err.to_string().contains("Authentication required"));
    }

    #[test]
    fn missing_data_is_rejected() {
        assert!(parse_data(b"{}").is_err());
        assert!(parse_data(b"not json").is_err());
    }

    #[test]
    fn filter_includes_team_only_when_set() {
        let plain = assigned_filter(None);
        assert!(plain.get("team").is_none());
        assert_eq!(plain["state"]["type"]["nin"][1], "canceled");

        let team = assigned_filter(Some("SPR"));
        assert_eq!(team["team"]["key"]["eq"], "SPR");
    }

    fn piped(program: &str, args: &[&str]) -> Child {
        std::process::Command::new(program)
            .args(args)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .unwrap()
    }

    #[test]
    fn output_larger_than_pipe_buffer_is_collected() {
        // Well past the usual 64 KiB pipe capacity.
        let child = piped("sh", &["-c", "head -c 300000 /dev/zero; echo done >&2"]);
        let output = collect_output(child, Duration::from_secs(10)).unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout.len(), 300_000);
        assert_eq!(String::from_utf8_lossy(&output.stderr).trim(), "done");
    }

    #[test]
    fn slow_child_is_killed_after_timeout() {
        let child = piped("sleep", &["5"]);
        let started = Instant::now();
        let err = collect_output(child, Duration::from_millis(200)).unwrap_err();
        assert_eq!(err.exit_code(), 5);
        assert!(err.to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn created_issue_is_parsed() {
        let data = json!({ "issueCreate": { "success": true, "issue": {
            "id": "uuid-9", "identifier": "SPR-9", "title": "Sub",
            "state": { "name": "Todo", "type": "unstarted" },
            "children": { "nodes": [] }
        } } });
        let node = parse_created_issue(&data).unwrap();
        assert_eq!(node.identifier, "SPR-9");
        assert!(!node.has_children);

        let refused = json!({ "issueCreate": { "success": false, "issue": null } });
        assert!(parse_created_issue(&refused).is_err());
    }
}
