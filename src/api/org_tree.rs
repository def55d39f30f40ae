//! Org tree endpoints.

use axum::{
    extract::{Extension, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{error, success, ApiResult, SessionHandle};
use crate::errors::ConsoleError;
use crate::models::{Level, NodeState, OrgNode, OrgTreeSnapshot};
use crate::AppState;

/// Request body for toggling a node.
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub level: Level,
    pub id: String,
}

/// Request body for invalidation. Without a node the whole tree is reloaded.
#[derive(Debug, Default, Deserialize)]
pub struct InvalidateRequest {
    pub level: Option<Level>,
    pub id: Option<String>,
}

/// Toggle result with the tree as it stands afterwards.
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub state: NodeState,
    /// The toggled node; absent if it is hidden from the viewer
    pub node: Option<OrgNode>,
    pub children: Vec<OrgNode>,
    pub tree: OrgTreeSnapshot,
}

/// GET /api/org-tree - Current tree snapshot.
pub async fn get_org_tree(Extension(handle): Extension<SessionHandle>) -> ApiResult<OrgTreeSnapshot> {
    success(handle.session.tree.snapshot().await)
}

/// POST /api/org-tree/toggle - Expand or collapse a branch or team.
pub async fn toggle_node(
    State(state): State<AppState>,
    Extension(handle): Extension<SessionHandle>,
    Json(request): Json<ToggleRequest>,
) -> ApiResult<ToggleResponse> {
    if request.id.trim().is_empty() {
        return Err(ConsoleError::Validation("Node id is required".to_string()));
    }

    let tree = &handle.session.tree;
    match tree.toggle_expand(request.level, &request.id).await {
        Ok(node_state) => {
            let snapshot = tree.snapshot().await;
            success(ToggleResponse {
                state: node_state,
                node: snapshot.find(request.level, &request.id),
                children: snapshot.children(request.level, &request.id),
                tree: snapshot,
            })
        }
        Err(e) => error(&state, &handle, e).await,
    }
}

/// POST /api/org-tree/invalidate - Reload the tree, or one node's children.
pub async fn invalidate_org_tree(
    State(state): State<AppState>,
    Extension(handle): Extension<SessionHandle>,
    Json(request): Json<InvalidateRequest>,
) -> ApiResult<OrgTreeSnapshot> {
    let tree = &handle.session.tree;
    let result = match (request.level, request.id) {
        (Some(level), Some(id)) => tree.invalidate_node(level, &id).await,
        (None, None) => tree.invalidate().await,
        _ => {
            return Err(ConsoleError::Validation(
                "Both level and id are required to invalidate a node".to_string(),
            ))
        }
    };

    match result {
        Ok(()) => success(tree.snapshot().await),
        Err(e) => error(&state, &handle, e).await,
    }
}
