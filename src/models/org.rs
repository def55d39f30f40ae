//! Organizational hierarchy: branches own teams, teams own members.

use serde::{Deserialize, Serialize};

/// A branch as listed by the upstream backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A team as listed under its branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub branch_id: Option<String>,
}

/// A team with its member roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetail {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
}

/// A person attached to a team.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: String,
}

/// Expandable tree level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Branch,
    Team,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Branch => f.write_str("branch"),
            Level::Team => f.write_str("team"),
        }
    }
}

/// View state of an expandable node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    #[default]
    Collapsed,
    /// Expansion requested, children fetch in flight
    Expanding,
    Expanded,
}

/// Tree node, one variant per level.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OrgNode {
    Branch(BranchNode),
    Team(TeamNode),
    Member(Member),
}

/// Branch as rendered to the UI. `teams` is `None` until first loaded.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BranchNode {
    pub id: String,
    pub name: String,
    pub state: NodeState,
    pub teams: Option<Vec<TeamNode>>,
}

/// Team as rendered to the UI. `members` is `None` until first loaded.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeamNode {
    pub id: String,
    pub name: String,
    pub branch_id: String,
    pub state: NodeState,
    pub members: Option<Vec<Member>>,
}

/// Ids currently expanded, per level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedSet {
    pub branches: std::collections::BTreeSet<String>,
    pub teams: std::collections::BTreeSet<String>,
}

impl ExpandedSet {
    pub fn contains(&self, level: Level, id: &str) -> bool {
        match level {
            Level::Branch => self.branches.contains(id),
            Level::Team => self.teams.contains(id),
        }
    }
}

/// Point-in-time view of the org tree.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrgTreeSnapshot {
    /// False until the branch list has been applied at least once
    pub loaded: bool,
    pub branches: Vec<BranchNode>,
    pub expanded: ExpandedSet,
}

impl OrgTreeSnapshot {
    /// All teams currently materialized, across branches.
    pub fn teams(&self) -> impl Iterator<Item = &TeamNode> {
        self.branches
            .iter()
            .filter_map(|b| b.teams.as_ref())
            .flatten()
    }

    /// Look up a node by level and id.
    pub fn find(&self, level: Level, id: &str) -> Option<OrgNode> {
        match level {
            Level::Branch => self
                .branches
                .iter()
                .find(|b| b.id == id)
                .cloned()
                .map(OrgNode::Branch),
            Level::Team => self.teams().find(|t| t.id == id).cloned().map(OrgNode::Team),
        }
    }

    /// Loaded children of a node, empty while unloaded.
    pub fn children(&self, level: Level, id: &str) -> Vec<OrgNode> {
        match self.find(level, id) {
            Some(OrgNode::Branch(branch)) => branch
                .teams
                .unwrap_or_default()
                .into_iter()
                .map(OrgNode::Team)
                .collect(),
            Some(OrgNode::Team(team)) => team
                .members
                .unwrap_or_default()
                .into_iter()
                .map(OrgNode::Member)
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> OrgTreeSnapshot {
        OrgTreeSnapshot {
            loaded: true,
            branches: vec![BranchNode {
                id: "b1".into(),
                name: "North".into(),
                state: NodeState::Expanded,
                teams: Some(vec![TeamNode {
                    id: "t1".into(),
                    name: "Alpha".into(),
                    branch_id: "b1".into(),
                    state: NodeState::Collapsed,
                    members: Some(vec![Member {
                        id: "m1".into(),
                        name: "Ed".into(),
                        email: None,
                        role: "editor".into(),
                    }]),
                }]),
            }],
            expanded: ExpandedSet::default(),
        }
    }

    #[test]
    fn test_children_by_level() {
        let snapshot = snapshot();

        let teams = snapshot.children(Level::Branch, "b1");
        assert!(matches!(teams.as_slice(), [OrgNode::Team(t)] if t.id == "t1"));

        let members = snapshot.children(Level::Team, "t1");
        assert!(matches!(members.as_slice(), [OrgNode::Member(m)] if m.id == "m1"));

        assert!(snapshot.children(Level::Team, "t9").is_empty());
    }

    #[test]
    fn test_node_wire_shape() {
        let node = snapshot().find(Level::Team, "t1").unwrap();
        let value = serde_json::to_value(&node).unwrap();

        assert_eq!(value["kind"], "team");
        assert_eq!(value["branchId"], "b1");
        assert_eq!(value["state"], "collapsed");
        assert_eq!(value["members"][0]["role"], "editor");
    }
}
