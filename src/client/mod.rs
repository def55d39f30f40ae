//! Fetch contracts against the upstream console backend.
//!
//! The core only sees [`ConsoleApi`]; [`HttpConsoleApi`] is the production
//! implementation. Each method fails independently.

mod http;

pub use http::*;

use async_trait::async_trait;

use crate::errors::ConsoleError;
use crate::models::{
    Branch, ChannelRecord, DateRange, ExternalChannelRecord, Role, Team, TeamDetail, Viewer,
};

/// Which system channels to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelScope {
    Team(String),
    Branch(String),
    All,
}

impl ChannelScope {
    /// Scope a viewer manages: managers their team, branch directors their
    /// branch, everyone else the whole organization.
    pub fn for_viewer(viewer: &Viewer) -> Self {
        match viewer.role {
            Role::Manager => viewer
                .team_id()
                .map(|id| ChannelScope::Team(id.to_string()))
                .unwrap_or(ChannelScope::All),
            Role::BranchDirector => viewer
                .branch_id()
                .map(|id| ChannelScope::Branch(id.to_string()))
                .unwrap_or(ChannelScope::All),
            _ => ChannelScope::All,
        }
    }

    /// Query parameters for the channel list endpoint.
    pub fn query(&self) -> Vec<(&'static str, &str)> {
        match self {
            ChannelScope::Team(id) => vec![("teamId", id.as_str())],
            ChannelScope::Branch(id) => vec![("branchId", id.as_str())],
            ChannelScope::All => Vec::new(),
        }
    }
}

/// Upstream data contracts consumed by the core.
#[async_trait]
pub trait ConsoleApi: Send + Sync {
    /// Identity and role of the session's user.
    async fn current_user(&self) -> Result<Viewer, ConsoleError>;

    /// Channels stored in the internal system database.
    async fn list_channels(&self, scope: &ChannelScope) -> Result<Vec<ChannelRecord>, ConsoleError>;

    /// Channels of the OAuth-connected account. Empty without a credential.
    async fn list_connected_account_channels(
        &self,
    ) -> Result<Vec<ExternalChannelRecord>, ConsoleError>;

    async fn list_branches(&self) -> Result<Vec<Branch>, ConsoleError>;

    async fn list_teams_for_branch(&self, branch_id: &str) -> Result<Vec<Team>, ConsoleError>;

    async fn get_team_detail(&self, team_id: &str) -> Result<TeamDetail, ConsoleError>;

    /// Opaque analytics payload. `NotFound` means no data for the range.
    async fn get_analytics(
        &self,
        entity_id: &str,
        range: &DateRange,
    ) -> Result<serde_json::Value, ConsoleError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ViewerBranch, ViewerTeam};

    fn viewer(role: Role) -> Viewer {
        Viewer {
            id: "u1".into(),
            name: None,
            role,
            branch: Some(ViewerBranch {
                id: "b1".into(),
                name: None,
            }),
            team: Some(ViewerTeam {
                id: "t1".into(),
                name: None,
                branch_id: Some("b1".into()),
            }),
        }
    }

    #[test]
    fn test_scope_for_viewer() {
        assert_eq!(
            ChannelScope::for_viewer(&viewer(Role::Manager)),
            ChannelScope::Team("t1".into())
        );
        assert_eq!(
            ChannelScope::for_viewer(&viewer(Role::BranchDirector)),
            ChannelScope::Branch("b1".into())
        );
        assert_eq!(
            ChannelScope::for_viewer(&viewer(Role::Admin)),
            ChannelScope::All
        );
    }

    #[test]
    fn test_scope_query() {
        assert_eq!(
            ChannelScope::Team("t1".into()).query(),
            vec![("teamId", "t1")]
        );
        assert!(ChannelScope::All.query().is_empty());
    }
}
