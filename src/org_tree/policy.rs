//! Which parts of the organization a viewer may see.

use crate::models::{Member, Role, Viewer};

/// Role used for team children; members of other roles are never attached.
pub const TEAM_MEMBER_ROLE: Role = Role::Editor;

/// Visibility rules derived from the viewer's role and memberships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    role: Role,
    branch_id: Option<String>,
    team_id: Option<String>,
    team_branch_id: Option<String>,
}

impl RolePolicy {
    pub fn for_viewer(viewer: &Viewer) -> Self {
        Self {
            role: viewer.role.clone(),
            branch_id: viewer.branch_id().map(str::to_string),
            team_id: viewer.team_id().map(str::to_string),
            team_branch_id: viewer.team.as_ref().and_then(|t| t.branch_id.clone()),
        }
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Editors get no tree at all, and no upstream calls are made for them.
    pub fn loads_tree(&self) -> bool {
        self.role != Role::Editor
    }

    pub fn admits_branch(&self, branch_id: &str) -> bool {
        match self.role {
            Role::Editor => false,
            Role::Admin | Role::Director => true,
            Role::BranchDirector => self.branch_id.as_deref() == Some(branch_id),
            Role::Manager => self
                .team_branch_id
                .as_deref()
                .map_or(true, |own| own == branch_id),
            Role::Other(_) => true,
        }
    }

    pub fn admits_team(&self, team_id: &str) -> bool {
        match self.role {
            Role::Manager => self.team_id.as_deref() == Some(team_id),
            _ => true,
        }
    }

    pub fn admits_member(&self, member: &Member) -> bool {
        Role::from(member.role.clone()) == TEAM_MEMBER_ROLE
    }

    /// Whether branches left with no teams are hidden. Admins and directors
    /// see empty branches so they can manage them.
    pub fn prunes_empty_branches(&self) -> bool {
        !self.role.sees_everything()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{member, viewer};

    #[test]
    fn test_admin_and_director_see_everything() {
        for role in [Role::Admin, Role::Director] {
            let policy = RolePolicy::for_viewer(&viewer(role, Some("b1"), None));
            assert!(policy.admits_branch("b9"));
            assert!(policy.admits_team("t9"));
            assert!(!policy.prunes_empty_branches());
        }
    }

    #[test]
    fn test_branch_director_sees_own_branch_only() {
        let policy = RolePolicy::for_viewer(&viewer(Role::BranchDirector, Some("b2"), None));
        assert!(policy.admits_branch("b2"));
        assert!(!policy.admits_branch("b1"));
        assert!(policy.prunes_empty_branches());

        let homeless = RolePolicy::for_viewer(&viewer(Role::BranchDirector, None, None));
        assert!(!homeless.admits_branch("b1"));
    }

    #[test]
    fn test_manager_sees_own_team_only() {
        let policy = RolePolicy::for_viewer(&viewer(Role::Manager, Some("b1"), Some("t1")));
        assert!(policy.admits_branch("b1"));
        assert!(!policy.admits_branch("b2"));
        assert!(policy.admits_team("t1"));
        assert!(!policy.admits_team("t2"));

        // Without the team's branch every branch is a candidate
        let unplaced = RolePolicy::for_viewer(&viewer(Role::Manager, None, Some("t1")));
        assert!(unplaced.admits_branch("b7"));
    }

    #[test]
    fn test_editor_loads_nothing() {
        let policy = RolePolicy::for_viewer(&viewer(Role::Editor, Some("b1"), Some("t1")));
        assert!(!policy.loads_tree());
        assert!(!policy.admits_branch("b1"));
    }

    #[test]
    fn test_only_editors_become_team_children() {
        let policy = RolePolicy::for_viewer(&viewer(Role::Admin, None, None));
        assert!(policy.admits_member(&member("m1", "editor")));
        assert!(policy.admits_member(&member("m2", "Editor")));
        assert!(!policy.admits_member(&member("m3", "manager")));
    }
}
