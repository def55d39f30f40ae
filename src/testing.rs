//! Scripted in-process upstream used by unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::client::{ChannelScope, ConsoleApi};
use crate::errors::ConsoleError;
use crate::models::{
    Branch, ChannelRecord, DateRange, ExternalChannelRecord, Member, Role, Team, TeamDetail,
    Viewer, ViewerBranch, ViewerTeam,
};

struct Script {
    viewer: Option<Viewer>,
    channels: Vec<ChannelRecord>,
    live_channels: Result<Vec<ExternalChannelRecord>, ConsoleError>,
    last_scope: Option<ChannelScope>,
    branches: Result<Vec<Branch>, ConsoleError>,
    teams: HashMap<String, Result<Vec<Team>, ConsoleError>>,
    team_details: HashMap<String, Result<TeamDetail, ConsoleError>>,
    analytics: HashMap<(String, DateRange), Result<serde_json::Value, ConsoleError>>,
    gates: HashMap<String, Arc<Notify>>,
    calls: Vec<String>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            viewer: None,
            channels: Vec::new(),
            live_channels: Ok(Vec::new()),
            last_scope: None,
            branches: Ok(Vec::new()),
            teams: HashMap::new(),
            team_details: HashMap::new(),
            analytics: HashMap::new(),
            gates: HashMap::new(),
            calls: Vec::new(),
        }
    }
}

/// Upstream double: answers from a script, counts calls, and can hold a
/// response back until a gate is opened.
#[derive(Default)]
pub struct MockApi {
    script: Mutex<Script>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_viewer(&self, viewer: Viewer) {
        self.script.lock().unwrap().viewer = Some(viewer);
    }

    pub fn set_channels(&self, channels: Vec<ChannelRecord>) {
        self.script.lock().unwrap().channels = channels;
    }

    pub fn set_live_channels(&self, channels: Vec<ExternalChannelRecord>) {
        self.script.lock().unwrap().live_channels = Ok(channels);
    }

    pub fn fail_live_channels(&self, err: ConsoleError) {
        self.script.lock().unwrap().live_channels = Err(err);
    }

    pub fn last_channel_scope(&self) -> Option<ChannelScope> {
        self.script.lock().unwrap().last_scope.clone()
    }

    pub fn set_branches(&self, branches: Vec<Branch>) {
        self.script.lock().unwrap().branches = Ok(branches);
    }

    pub fn fail_branches(&self, err: ConsoleError) {
        self.script.lock().unwrap().branches = Err(err);
    }

    pub fn set_teams(&self, branch_id: &str, teams: Vec<Team>) {
        self.script
            .lock()
            .unwrap()
            .teams
            .insert(branch_id.to_string(), Ok(teams));
    }

    pub fn fail_teams(&self, branch_id: &str, err: ConsoleError) {
        self.script
            .lock()
            .unwrap()
            .teams
            .insert(branch_id.to_string(), Err(err));
    }

    pub fn set_team_detail(&self, detail: TeamDetail) {
        self.script
            .lock()
            .unwrap()
            .team_details
            .insert(detail.id.clone(), Ok(detail));
    }

    pub fn fail_team_detail(&self, team_id: &str, err: ConsoleError) {
        self.script
            .lock()
            .unwrap()
            .team_details
            .insert(team_id.to_string(), Err(err));
    }

    pub fn set_analytics(
        &self,
        entity_id: &str,
        range: DateRange,
        result: Result<serde_json::Value, ConsoleError>,
    ) {
        self.script
            .lock()
            .unwrap()
            .analytics
            .insert((entity_id.to_string(), range), result);
    }

    /// Hold back responses for `call` (as recorded in [`MockApi::calls`])
    /// until the returned gate is notified.
    pub fn gate(&self, call: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.script
            .lock()
            .unwrap()
            .gates
            .insert(call.to_string(), gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    async fn record(&self, call: String) {
        let gate = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(call.clone());
            script.gates.remove(&call)
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl ConsoleApi for MockApi {
    async fn current_user(&self) -> Result<Viewer, ConsoleError> {
        self.record("me".to_string()).await;
        self.script
            .lock()
            .unwrap()
            .viewer
            .clone()
            .ok_or_else(|| ConsoleError::Unauthorized("no viewer scripted".into()))
    }

    async fn list_channels(&self, scope: &ChannelScope) -> Result<Vec<ChannelRecord>, ConsoleError> {
        self.record("channels".to_string()).await;
        let mut script = self.script.lock().unwrap();
        script.last_scope = Some(scope.clone());
        Ok(script.channels.clone())
    }

    async fn list_connected_account_channels(
        &self,
    ) -> Result<Vec<ExternalChannelRecord>, ConsoleError> {
        self.record("live".to_string()).await;
        self.script.lock().unwrap().live_channels.clone()
    }

    async fn list_branches(&self) -> Result<Vec<Branch>, ConsoleError> {
        self.record("branches".to_string()).await;
        self.script.lock().unwrap().branches.clone()
    }

    async fn list_teams_for_branch(&self, branch_id: &str) -> Result<Vec<Team>, ConsoleError> {
        self.record(format!("teams:{}", branch_id)).await;
        self.script
            .lock()
            .unwrap()
            .teams
            .get(branch_id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn get_team_detail(&self, team_id: &str) -> Result<TeamDetail, ConsoleError> {
        self.record(format!("team:{}", team_id)).await;
        self.script
            .lock()
            .unwrap()
            .team_details
            .get(team_id)
            .cloned()
            .unwrap_or_else(|| Err(ConsoleError::NotFound(format!("team {}", team_id))))
    }

    async fn get_analytics(
        &self,
        entity_id: &str,
        range: &DateRange,
    ) -> Result<serde_json::Value, ConsoleError> {
        self.record(format!("analytics:{}:{}", entity_id, range.start_date))
            .await;
        self.script
            .lock()
            .unwrap()
            .analytics
            .get(&(entity_id.to_string(), *range))
            .cloned()
            .unwrap_or_else(|| Err(ConsoleError::NotFound("no report".into())))
    }
}

pub fn branch(id: &str) -> Branch {
    Branch {
        id: id.to_string(),
        name: format!("Branch {}", id),
    }
}

pub fn team(id: &str, branch_id: &str) -> Team {
    Team {
        id: id.to_string(),
        name: format!("Team {}", id),
        branch_id: Some(branch_id.to_string()),
    }
}

pub fn member(id: &str, role: &str) -> Member {
    Member {
        id: id.to_string(),
        name: format!("Member {}", id),
        email: Some(format!("{}@example.com", id)),
        role: role.to_string(),
    }
}

pub fn team_detail(id: &str, branch_id: &str, members: Vec<Member>) -> TeamDetail {
    TeamDetail {
        id: id.to_string(),
        name: format!("Team {}", id),
        branch_id: Some(branch_id.to_string()),
        members,
    }
}

pub fn viewer(role: Role, branch_id: Option<&str>, team_id: Option<&str>) -> Viewer {
    Viewer {
        id: "u1".to_string(),
        name: Some("Viewer".to_string()),
        role,
        branch: branch_id.map(|id| ViewerBranch {
            id: id.to_string(),
            name: None,
        }),
        team: team_id.map(|id| ViewerTeam {
            id: id.to_string(),
            name: None,
            branch_id: branch_id.map(str::to_string),
        }),
    }
}
