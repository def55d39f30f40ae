//! The signed-in user whose role scopes what the console shows.

use serde::{Deserialize, Serialize};

/// Console role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Director,
    BranchDirector,
    Manager,
    Editor,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Director => "director",
            Role::BranchDirector => "branch_director",
            Role::Manager => "manager",
            Role::Editor => "editor",
            Role::Other(s) => s,
        }
    }

    /// Roles that see the whole organization, empty branches included.
    pub fn sees_everything(&self) -> bool {
        matches!(self, Role::Admin | Role::Director)
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "director" => Role::Director,
            "branch_director" => Role::BranchDirector,
            "manager" => Role::Manager,
            "editor" => Role::Editor,
            _ => Role::Other(s),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// Branch the viewer belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ViewerBranch {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Team the viewer belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ViewerTeam {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub branch_id: Option<String>,
}

/// Identity returned by the upstream `auth/me` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub branch: Option<ViewerBranch>,
    #[serde(default)]
    pub team: Option<ViewerTeam>,
}

impl Viewer {
    pub fn branch_id(&self) -> Option<&str> {
        self.branch.as_ref().map(|b| b.id.as_str())
    }

    pub fn team_id(&self) -> Option<&str> {
        self.team.as_ref().map(|t| t.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from("Branch_Director".to_string()), Role::BranchDirector);
        assert_eq!(Role::from("editor".to_string()), Role::Editor);
        assert_eq!(
            Role::from("auditor".to_string()),
            Role::Other("auditor".to_string())
        );
        assert!(Role::Director.sees_everything());
        assert!(!Role::Manager.sees_everything());
    }

    #[test]
    fn test_viewer_from_json() {
        let viewer: Viewer = serde_json::from_value(json!({
            "id": "u1",
            "role": "manager",
            "team": { "id": "t1", "branchId": "b1" }
        }))
        .unwrap();
        assert_eq!(viewer.role, Role::Manager);
        assert_eq!(viewer.team_id(), Some("t1"));
        assert_eq!(viewer.branch_id(), None);
        assert_eq!(
            serde_json::to_value(&viewer).unwrap()["role"],
            json!("manager")
        );
    }
}
