use crate::database::{DatabaseError, StoreTx};

/// Decide, inside the caller's transaction, whether a map config has lost its
/// last referrer once `excluding_component_id` goes away, and delete it if so.
///
/// The map config row is locked exclusively before counting, so two deleters
/// racing on the same map config serialise and exactly one of them observes a
/// zero count. A map config that is already gone reports `false`.
pub async fn resolve_and_maybe_delete(
    tx: &mut dyn StoreTx,
    map_config_id: i64,
    excluding_component_id: i64,
) -> Result<bool, DatabaseError> {
    if tx.lock_map_config(map_config_id, true).await?.is_none() {
        tracing::debug!("Map config {} already removed", map_config_id);
        return Ok(false);
    }

    let referrers = tx
        .count_map_config_referrers(map_config_id, excluding_component_id)
        .await?;
    if referrers > 0 {
        tracing::debug!(
            "Map config {} kept, {} other component(s) reference it",
            map_config_id,
            referrers
        );
        return Ok(false);
    }

    tx.delete_map_config(map_config_id).await
}
