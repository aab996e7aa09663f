//! Network, Spaces & Subgroups command handlers (Section 21.2).

use std::sync::Arc;

use serde_json::Value;

use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Get all joined groups/Spaces.
pub async fn get_my_groups(state: &Arc<DaemonState>) -> Result {
    let db = state.db.lock().await;
    let spaces = ochra_db::queries::spaces::list(&db)
        .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?;

    let result: Vec<Value> = spaces
        .iter()
        .map(|s| {
            serde_json::json!({
                "group_id": hex::encode(&s.group_id),
                "name": s.name,
                "template": s.template,
                "my_role": s.my_role,
                "member_count": s.member_count,
                "last_activity_at": s.last_activity_at,
                "pinned": s.pinned,
            })
        })
        .collect();

    Ok(serde_json::json!(result))
}

/// Create a new Space/group.
pub async fn create_group(state: &Arc<DaemonState>, params: &Value) -> Result {
    let name = params
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("name required"))?;
    let template = params
        .get("template")
        .and_then(|v| v.as_str())
        .unwrap_or("storefront");

    // Generate group_id
    let mut group_id = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut group_id);

    let owner_pik = [0u8; 32]; // Would use actual PIK
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let db = state.db.lock().await;
    ochra_db::queries::spaces::insert(&db, &group_id, name, template, "host", &owner_pik, now)
        .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?;

    Ok(serde_json::json!({
        "group_id": hex::encode(group_id),
    }))
}

/// Join a Space via invite URI.
pub async fn join_group(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _invite_uri = params
        .get("invite_uri")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("invite_uri required"))?;

    // Would parse invite, contact rendezvous, join MLS group
    Ok(serde_json::json!({"group_id": "stub-group-id"}))
}

/// Leave a Space.
pub async fn leave_group(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    Ok(serde_json::json!({"left": true}))
}

/// Kick a member from a Space.
pub async fn kick_member(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    let _target_pik = params
        .get("target_pik")
        .ok_or_else(|| RpcError::invalid_params("target_pik required"))?;
    Ok(serde_json::json!({"kicked": true}))
}

/// Generate an invite link.
pub async fn generate_invite(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    let _uses = params.get("uses").and_then(|v| v.as_u64());
    let _ttl_days = params.get("ttl_days").and_then(|v| v.as_u64()).unwrap_or(7);

    Ok(serde_json::json!({"invite_uri": "ochra://invite/stub"}))
}

/// Revoke an invite.
pub async fn revoke_invite(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _invite_hash = params
        .get("invite_hash")
        .ok_or_else(|| RpcError::invalid_params("invite_hash required"))?;
    Ok(serde_json::json!({"revoked": true}))
}

/// Get active invites for a Space.
pub async fn get_active_invites(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    Ok(serde_json::json!([]))
}

/// Get members of a Space.
pub async fn get_group_members(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    Ok(serde_json::json!([]))
}

/// Grant publisher/Creator role.
pub async fn grant_publisher_role(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    let _target_pik = params
        .get("target_pik")
        .ok_or_else(|| RpcError::invalid_params("target_pik required"))?;
    Ok(serde_json::json!({"granted": true}))
}

/// Revoke publisher/Creator role.
pub async fn revoke_publisher_role(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    let _target_pik = params
        .get("target_pik")
        .ok_or_else(|| RpcError::invalid_params("target_pik required"))?;
    Ok(serde_json::json!({"revoked": true}))
}

/// Grant moderator role.
pub async fn grant_moderator_role(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    let _target_pik = params
        .get("target_pik")
        .ok_or_else(|| RpcError::invalid_params("target_pik required"))?;
    Ok(serde_json::json!({"granted": true}))
}

/// Revoke moderator role.
pub async fn revoke_moderator_role(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    let _target_pik = params
        .get("target_pik")
        .ok_or_else(|| RpcError::invalid_params("target_pik required"))?;
    Ok(serde_json::json!({"revoked": true}))
}

/// Transfer group ownership (30-day timelock).
pub async fn transfer_group_ownership(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    let _new_owner_pik = params
        .get("new_owner_pik")
        .ok_or_else(|| RpcError::invalid_params("new_owner_pik required"))?;
    Ok(serde_json::json!({
        "status": "pending",
        "veto_window_ends": 0,
    }))
}

/// Veto a pending ownership transfer.
pub async fn veto_ownership_transfer(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    Ok(serde_json::json!({"vetoed": true}))
}

/// Update group settings.
pub async fn update_group_settings(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    let _settings = params
        .get("settings")
        .ok_or_else(|| RpcError::invalid_params("settings required"))?;
    Ok(serde_json::json!({"updated": true}))
}

/// Update group profile (name, icon, description).
pub async fn update_group_profile(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    Ok(serde_json::json!({"updated": true}))
}

/// Create a subgroup/channel within a Space.
pub async fn create_subgroup(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    let _name = params
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("name required"))?;
    Ok(serde_json::json!({"subgroup_id": "stub-subgroup-id"}))
}

/// Get subgroup members.
pub async fn get_subgroup_members(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _subgroup_id = params
        .get("subgroup_id")
        .ok_or_else(|| RpcError::invalid_params("subgroup_id required"))?;
    Ok(serde_json::json!([]))
}

/// Grant subgroup access via MLS.
pub async fn mls_grant_subgroup_access(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _subgroup_id = params
        .get("subgroup_id")
        .ok_or_else(|| RpcError::invalid_params("subgroup_id required"))?;
    Ok(serde_json::json!({"granted": true}))
}

/// Revoke subgroup access via MLS.
pub async fn mls_revoke_subgroup_access(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _subgroup_id = params
        .get("subgroup_id")
        .ok_or_else(|| RpcError::invalid_params("subgroup_id required"))?;
    Ok(serde_json::json!({"revoked": true}))
}

/// Preview a layout manifest.
pub async fn preview_layout_manifest(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _config = params
        .get("config")
        .ok_or_else(|| RpcError::invalid_params("config required"))?;
    Ok(serde_json::json!({"layout": "stub-preview"}))
}

/// Update a group's layout manifest.
pub async fn update_group_layout_manifest(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    Ok(serde_json::json!({"updated": true}))
}

/// Get onion circuit health metrics.
pub async fn get_onion_circuit_health(_state: &Arc<DaemonState>) -> Result {
    Ok(serde_json::json!({
        "active_circuits": 0,
        "avg_latency_ms": 0,
        "relay_cache_size": 0,
    }))
}

/// Set per-Space notification settings.
pub async fn set_group_notification_settings(
    _state: &Arc<DaemonState>,
    params: &Value,
) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    Ok(serde_json::json!({"updated": true}))
}

/// Get Space stats (host dashboard).
pub async fn get_space_stats(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    Ok(serde_json::json!({
        "member_count": 0,
        "content_count": 0,
        "total_revenue": 0,
    }))
}

/// Get Space activity feed.
pub async fn get_space_activity(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    Ok(serde_json::json!([]))
}

/// Get content reports for moderation.
pub async fn get_content_reports(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    Ok(serde_json::json!([]))
}

/// Dismiss a content report.
pub async fn dismiss_content_report(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _group_id = params
        .get("group_id")
        .ok_or_else(|| RpcError::invalid_params("group_id required"))?;
    let _content_hash = params
        .get("content_hash")
        .ok_or_else(|| RpcError::invalid_params("content_hash required"))?;
    Ok(serde_json::json!({"dismissed": true}))
}

/// Report content.
pub async fn report_content(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _content_hash = params
        .get("content_hash")
        .ok_or_else(|| RpcError::invalid_params("content_hash required"))?;
    let _reason = params
        .get("reason")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("reason required"))?;
    Ok(serde_json::json!({"reported": true}))
}

/// Tombstone content (host action).
pub async fn owner_tombstone_content(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _content_hash = params
        .get("content_hash")
        .ok_or_else(|| RpcError::invalid_params("content_hash required"))?;
    Ok(serde_json::json!({"tombstoned": true}))
}
