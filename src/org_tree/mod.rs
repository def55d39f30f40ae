//! Role-filtered organization tree with lazy, cached child loading.
//!
//! Nodes live in an arena keyed by `(Level, id)`. Each expandable node carries
//! its view state (`collapsed → expanding → expanded`) and its children cache.
//! Collapsing keeps the cache, so re-expanding never refetches. A failed child
//! fetch settles the node as expanded with no children; it is never removed.
//!
//! Every fetch is issued with a ticket holding the tree epoch and the node's
//! fetch sequence. A response whose ticket no longer matches (full reload,
//! node invalidation, or shutdown in the meantime) is discarded.

mod policy;

pub use policy::*;

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;

use crate::client::ConsoleApi;
use crate::config::TreeStrategy;
use crate::errors::ConsoleError;
use crate::models::{
    Branch, BranchNode, ExpandedSet, Level, Member, NodeState, OrgTreeSnapshot, Team, TeamNode,
    Viewer,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Children {
    Unloaded,
    Loading,
    Loaded(Vec<String>),
    /// Fetch failed; shown as no children
    Failed,
}

impl Children {
    fn ids(&self) -> Option<&[String]> {
        match self {
            Children::Loaded(ids) => Some(ids),
            Children::Failed => Some(&[]),
            Children::Unloaded | Children::Loading => None,
        }
    }
}

#[derive(Debug, Clone)]
struct NodeMeta {
    state: NodeState,
    children: Children,
    fetch_seq: u64,
}

impl NodeMeta {
    fn new() -> Self {
        Self {
            state: NodeState::Collapsed,
            children: Children::Unloaded,
            fetch_seq: 0,
        }
    }

    fn start_fetch(&mut self) -> u64 {
        self.children = Children::Loading;
        self.fetch_seq += 1;
        self.fetch_seq
    }

    fn settle(&mut self, children: Children) {
        self.children = children;
        if self.state == NodeState::Expanding {
            self.state = NodeState::Expanded;
        }
    }
}

/// Permission to apply one child fetch.
#[derive(Debug, Clone)]
struct FetchTicket {
    level: Level,
    id: String,
    epoch: u64,
    seq: u64,
}

enum Transition {
    Done(NodeState),
    Fetch(FetchTicket),
}

#[derive(Default)]
struct TreeState {
    /// Generation of the arena; bumped whenever the branch list is replaced
    epoch: u64,
    /// Sequence of branch list requests
    load_seq: u64,
    closed: bool,
    loaded: bool,
    branch_order: Vec<String>,
    branches: HashMap<String, Branch>,
    teams: HashMap<String, Team>,
    members: HashMap<String, Member>,
    nodes: HashMap<(Level, String), NodeMeta>,
    /// Expanded ids to re-apply after a full reload
    restore: ExpandedSet,
}

impl TreeState {
    fn is_current(&self, epoch: u64) -> bool {
        !self.closed && self.epoch == epoch
    }

    fn accepts(&self, ticket: &FetchTicket) -> bool {
        self.is_current(ticket.epoch)
            && self
                .node(ticket.level, &ticket.id)
                .is_some_and(|meta| meta.fetch_seq == ticket.seq)
    }

    fn node(&self, level: Level, id: &str) -> Option<&NodeMeta> {
        self.nodes.get(&(level, id.to_string()))
    }

    fn node_mut(&mut self, level: Level, id: &str) -> Result<&mut NodeMeta, ConsoleError> {
        self.nodes
            .get_mut(&(level, id.to_string()))
            .ok_or_else(|| ConsoleError::NotFound(format!("Unknown {} {}", level, id)))
    }

    fn clear(&mut self) {
        self.branch_order.clear();
        self.branches.clear();
        self.teams.clear();
        self.members.clear();
        self.nodes.clear();
    }

    fn replace_branches(&mut self, branches: Vec<Branch>) {
        self.clear();
        for branch in branches {
            self.nodes
                .insert((Level::Branch, branch.id.clone()), NodeMeta::new());
            self.branch_order.push(branch.id.clone());
            self.branches.insert(branch.id.clone(), branch);
        }
    }

    /// Attach a branch's teams, keeping the state of teams seen before.
    fn attach_teams(&mut self, branch_id: &str, teams: Vec<Team>) {
        let ids: Vec<String> = teams.iter().map(|t| t.id.clone()).collect();
        let stale: Vec<String> = self
            .teams
            .values()
            .filter(|t| t.branch_id.as_deref() == Some(branch_id) && !ids.contains(&t.id))
            .map(|t| t.id.clone())
            .collect();
        for id in stale {
            self.teams.remove(&id);
            self.nodes.remove(&(Level::Team, id));
        }
        for team in teams {
            self.nodes
                .entry((Level::Team, team.id.clone()))
                .or_insert_with(NodeMeta::new);
            self.teams.insert(team.id.clone(), team);
        }
        if let Some(meta) = self.nodes.get_mut(&(Level::Branch, branch_id.to_string())) {
            meta.settle(Children::Loaded(ids));
        }
    }

    fn attach_members(&mut self, team_id: &str, members: Vec<Member>) {
        let ids = members.iter().map(|m| m.id.clone()).collect();
        for member in members {
            self.members.insert(member.id.clone(), member);
        }
        if let Some(meta) = self.nodes.get_mut(&(Level::Team, team_id.to_string())) {
            meta.settle(Children::Loaded(ids));
        }
    }

    fn mark_failed(&mut self, level: Level, id: &str) {
        if let Some(meta) = self.nodes.get_mut(&(level, id.to_string())) {
            meta.settle(Children::Failed);
        }
    }

    /// Move a collapsed node towards expanded, fetching children if needed.
    fn begin_expand(&mut self, level: Level, id: &str) -> Result<Transition, ConsoleError> {
        let epoch = self.epoch;
        let meta = self.node_mut(level, id)?;
        if meta.state != NodeState::Collapsed {
            return Ok(Transition::Done(meta.state));
        }
        match meta.children {
            Children::Loaded(_) | Children::Failed => {
                meta.state = NodeState::Expanded;
                Ok(Transition::Done(NodeState::Expanded))
            }
            Children::Loading => {
                meta.state = NodeState::Expanding;
                Ok(Transition::Done(NodeState::Expanding))
            }
            Children::Unloaded => {
                meta.state = NodeState::Expanding;
                let seq = meta.start_fetch();
                Ok(Transition::Fetch(FetchTicket {
                    level,
                    id: id.to_string(),
                    epoch,
                    seq,
                }))
            }
        }
    }

    /// Start a background child fetch without touching view state.
    fn begin_prefetch(&mut self, level: Level, id: &str) -> Option<FetchTicket> {
        let epoch = self.epoch;
        let meta = self.node_mut(level, id).ok()?;
        if meta.children != Children::Unloaded {
            return None;
        }
        let seq = meta.start_fetch();
        Some(FetchTicket {
            level,
            id: id.to_string(),
            epoch,
            seq,
        })
    }

    fn team_ids_in_order(&self) -> Vec<String> {
        self.branch_order
            .iter()
            .filter_map(|b| self.node(Level::Branch, b))
            .filter_map(|meta| meta.children.ids())
            .flatten()
            .cloned()
            .collect()
    }

    fn visible_branch_ids(&self, prune_empty: bool) -> Vec<&String> {
        self.branch_order
            .iter()
            .filter(|id| {
                if !prune_empty {
                    return true;
                }
                !matches!(
                    self.node(Level::Branch, id).map(|m| &m.children),
                    Some(Children::Loaded(teams)) if teams.is_empty()
                )
            })
            .collect()
    }

    fn expanded_set(&self) -> ExpandedSet {
        let mut expanded = ExpandedSet::default();
        for ((level, id), meta) in &self.nodes {
            if meta.state == NodeState::Collapsed {
                continue;
            }
            match level {
                Level::Branch => expanded.branches.insert(id.clone()),
                Level::Team => expanded.teams.insert(id.clone()),
            };
        }
        expanded
    }

    fn team_node(&self, team_id: &str, branch_id: &str) -> Option<TeamNode> {
        let team = self.teams.get(team_id)?;
        let meta = self.node(Level::Team, team_id)?;
        Some(TeamNode {
            id: team.id.clone(),
            name: team.name.clone(),
            branch_id: branch_id.to_string(),
            state: meta.state,
            members: meta.children.ids().map(|ids| {
                ids.iter()
                    .filter_map(|id| self.members.get(id).cloned())
                    .collect()
            }),
        })
    }

    fn branch_node(&self, branch_id: &str) -> Option<BranchNode> {
        let branch = self.branches.get(branch_id)?;
        let meta = self.node(Level::Branch, branch_id)?;
        Some(BranchNode {
            id: branch.id.clone(),
            name: branch.name.clone(),
            state: meta.state,
            teams: meta.children.ids().map(|ids| {
                ids.iter()
                    .filter_map(|id| self.team_node(id, branch_id))
                    .collect()
            }),
        })
    }

    fn snapshot(&self, prune_empty: bool) -> OrgTreeSnapshot {
        OrgTreeSnapshot {
            loaded: self.loaded,
            branches: self
                .visible_branch_ids(prune_empty)
                .into_iter()
                .filter_map(|id| self.branch_node(id))
                .collect(),
            expanded: self.expanded_set(),
        }
    }
}

/// First error of a fan-out, if any. Child fetches only report errors that
/// must reach the session (Unauthorized); the rest are absorbed per node.
fn settle_all(results: Vec<Result<(), ConsoleError>>) -> Result<(), ConsoleError> {
    results.into_iter().find_map(Result::err).map_or(Ok(()), Err)
}

/// Loads and caches the org tree for one viewer.
pub struct OrgTreeLoader {
    api: Arc<dyn ConsoleApi>,
    policy: RolePolicy,
    strategy: TreeStrategy,
    state: Mutex<TreeState>,
}

impl OrgTreeLoader {
    pub fn new(api: Arc<dyn ConsoleApi>, viewer: &Viewer, strategy: TreeStrategy) -> Self {
        Self {
            api,
            policy: RolePolicy::for_viewer(viewer),
            strategy,
            state: Mutex::new(TreeState::default()),
        }
    }

    /// Fetch the branch list and rebuild the tree from it.
    ///
    /// On failure of the branch list the previous tree stays in place.
    pub async fn load(&self) -> Result<(), ConsoleError> {
        let request = {
            let mut tree = self.state.lock().await;
            if tree.closed {
                tracing::debug!("Org tree loader is shut down, ignoring load");
                return Ok(());
            }
            if !self.policy.loads_tree() {
                tree.epoch += 1;
                tree.clear();
                tree.loaded = true;
                tracing::debug!(role = self.policy.role().as_str(), "Org tree not shown for role");
                return Ok(());
            }
            tree.load_seq += 1;
            tree.load_seq
        };

        let branches = self.api.list_branches().await;

        let restore = {
            let mut tree = self.state.lock().await;
            if tree.closed || tree.load_seq != request {
                tracing::debug!(request, "Discarding stale branch list");
                return Ok(());
            }
            let admitted: Vec<Branch> = branches?
                .into_iter()
                .filter(|b| self.policy.admits_branch(&b.id))
                .collect();
            tracing::info!(
                branches = admitted.len(),
                role = self.policy.role().as_str(),
                "Branch list loaded"
            );
            tree.epoch += 1;
            tree.replace_branches(admitted);
            tree.loaded = true;
            std::mem::take(&mut tree.restore)
        };

        // Pruning needs every branch's team list before anything is shown
        let cascade = self.strategy == TreeStrategy::Cascade;
        if cascade || self.policy.prunes_empty_branches() {
            let branch_ids = self.state.lock().await.branch_order.clone();
            self.prefetch(Level::Branch, branch_ids).await?;
        }
        if cascade {
            let team_ids = self.state.lock().await.team_ids_in_order();
            self.prefetch(Level::Team, team_ids).await?;
        }

        if restore.branches.is_empty() && restore.teams.is_empty() {
            let single = {
                let tree = self.state.lock().await;
                let visible = tree.visible_branch_ids(self.policy.prunes_empty_branches());
                match visible.as_slice() {
                    [only] => Some((*only).clone()),
                    _ => None,
                }
            };
            if let Some(id) = single {
                tracing::debug!(branch_id = %id, "Auto-expanding the only branch");
                self.expand_many(Level::Branch, vec![id]).await?;
            }
        } else {
            self.expand_many(Level::Branch, restore.branches.into_iter().collect())
                .await?;
            self.expand_many(Level::Team, restore.teams.into_iter().collect())
                .await?;
        }

        Ok(())
    }

    /// Toggle a node between collapsed and expanded.
    ///
    /// The first expansion fetches children; later ones reuse the cache. A
    /// toggle while the node is still expanding is ignored.
    pub async fn toggle_expand(&self, level: Level, id: &str) -> Result<NodeState, ConsoleError> {
        let transition = {
            let mut tree = self.state.lock().await;
            let current = tree.node_mut(level, id)?.state;
            match current {
                NodeState::Expanded => {
                    tree.node_mut(level, id)?.state = NodeState::Collapsed;
                    Transition::Done(NodeState::Collapsed)
                }
                NodeState::Expanding => {
                    tracing::debug!(%level, id, "Toggle ignored while children load");
                    Transition::Done(NodeState::Expanding)
                }
                NodeState::Collapsed => tree.begin_expand(level, id)?,
            }
        };

        match transition {
            Transition::Done(state) => Ok(state),
            Transition::Fetch(ticket) => {
                self.fetch_children(ticket).await?;
                Ok(self.node_state(level, id).await.unwrap_or_default())
            }
        }
    }

    /// Drop everything and reload from the branch list. Expanded nodes that
    /// still exist afterwards are expanded again.
    pub async fn invalidate(&self) -> Result<(), ConsoleError> {
        {
            let mut tree = self.state.lock().await;
            let expanded = tree.expanded_set();
            tree.restore = expanded;
        }
        tracing::info!("Org tree invalidated, reloading");
        self.load().await
    }

    /// Refetch one node's children. The node itself is kept, and stays
    /// expanded if it was.
    pub async fn invalidate_node(&self, level: Level, id: &str) -> Result<(), ConsoleError> {
        let ticket = {
            let mut tree = self.state.lock().await;
            let epoch = tree.epoch;
            let meta = tree.node_mut(level, id)?;
            meta.fetch_seq += 1;
            meta.children = Children::Unloaded;
            if meta.state == NodeState::Collapsed {
                None
            } else {
                meta.state = NodeState::Expanding;
                let seq = meta.start_fetch();
                Some(FetchTicket {
                    level,
                    id: id.to_string(),
                    epoch,
                    seq,
                })
            }
        };

        tracing::debug!(%level, id, "Node invalidated");
        match ticket {
            Some(ticket) => self.fetch_children(ticket).await,
            None => Ok(()),
        }
    }

    /// Discard the tree; any response still in flight is dropped on arrival.
    pub async fn shutdown(&self) {
        let mut tree = self.state.lock().await;
        tree.closed = true;
        tree.epoch += 1;
        tree.clear();
        tree.loaded = false;
    }

    pub async fn node_state(&self, level: Level, id: &str) -> Option<NodeState> {
        self.state.lock().await.node(level, id).map(|meta| meta.state)
    }

    pub async fn snapshot(&self) -> OrgTreeSnapshot {
        self.state
            .lock()
            .await
            .snapshot(self.policy.prunes_empty_branches())
    }

    async fn prefetch(&self, level: Level, ids: Vec<String>) -> Result<(), ConsoleError> {
        let tickets: Vec<FetchTicket> = {
            let mut tree = self.state.lock().await;
            ids.iter()
                .filter_map(|id| tree.begin_prefetch(level, id))
                .collect()
        };
        settle_all(join_all(tickets.into_iter().map(|t| self.fetch_children(t))).await)
    }

    async fn expand_many(&self, level: Level, ids: Vec<String>) -> Result<(), ConsoleError> {
        let tickets: Vec<FetchTicket> = {
            let mut tree = self.state.lock().await;
            ids.iter()
                .filter_map(|id| match tree.begin_expand(level, id) {
                    Ok(Transition::Fetch(ticket)) => Some(ticket),
                    Ok(Transition::Done(_)) | Err(_) => None,
                })
                .collect()
        };
        settle_all(join_all(tickets.into_iter().map(|t| self.fetch_children(t))).await)
    }

    async fn fetch_children(&self, ticket: FetchTicket) -> Result<(), ConsoleError> {
        match ticket.level {
            Level::Branch => {
                let result = self.api.list_teams_for_branch(&ticket.id).await;
                let mut tree = self.state.lock().await;
                if !tree.accepts(&ticket) {
                    tracing::debug!(branch_id = %ticket.id, "Discarding stale team list");
                    return Ok(());
                }
                match result {
                    Ok(teams) => {
                        let admitted: Vec<Team> = teams
                            .into_iter()
                            .filter(|t| self.policy.admits_team(&t.id))
                            .map(|mut t| {
                                t.branch_id = Some(ticket.id.clone());
                                t
                            })
                            .collect();
                        tracing::debug!(branch_id = %ticket.id, teams = admitted.len(), "Teams loaded");
                        tree.attach_teams(&ticket.id, admitted);
                        Ok(())
                    }
                    Err(err) => {
                        tracing::warn!(branch_id = %ticket.id, error = %err, "Failed to load teams");
                        tree.mark_failed(Level::Branch, &ticket.id);
                        if matches!(err, ConsoleError::Unauthorized(_)) {
                            Err(err)
                        } else {
                            Ok(())
                        }
                    }
                }
            }
            Level::Team => {
                let result = self.api.get_team_detail(&ticket.id).await;
                let mut tree = self.state.lock().await;
                if !tree.accepts(&ticket) {
                    tracing::debug!(team_id = %ticket.id, "Discarding stale team detail");
                    return Ok(());
                }
                match result {
                    Ok(detail) => {
                        let members: Vec<Member> = detail
                            .members
                            .into_iter()
                            .filter(|m| self.policy.admits_member(m))
                            .collect();
                        tracing::debug!(team_id = %ticket.id, members = members.len(), "Members loaded");
                        tree.attach_members(&ticket.id, members);
                        Ok(())
                    }
                    Err(err) => {
                        tracing::warn!(team_id = %ticket.id, error = %err, "Failed to load members");
                        tree.mark_failed(Level::Team, &ticket.id);
                        if matches!(err, ConsoleError::Unauthorized(_)) {
                            Err(err)
                        } else {
                            Ok(())
                        }
                    }
                }
            }
        }
    }
}
