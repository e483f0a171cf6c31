use crate::model::SessionId;

/// Whether `local` sends the offer to `remote`. The side whose id sorts lower
/// initiates, so both ends reach the same answer without coordination.
pub fn initiates(local: &SessionId, remote: &SessionId) -> bool {
    local < remote
}
