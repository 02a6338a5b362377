//! Guards that tie a request to a client owned by the calling CA

use crate::domain::{ClientView, StringUuid};
use crate::error::{AppError, Result};
use crate::repository::ClientRepository;

/// Resolve `client_id` (as sent in a request body) to an active client owned
/// by `owner_id`. Malformed ids, other CAs' clients and deactivated clients
/// are all reported as the same 404 so ownership cannot be probed.
pub async fn require_active_owned_client<C: ClientRepository + ?Sized>(
    clients: &C,
    owner_id: StringUuid,
    client_id: &str,
    not_found: &str,
) -> Result<ClientView> {
    let id = StringUuid::parse_str(client_id)
        .map_err(|_| AppError::NotFound(not_found.to_string()))?;

    match clients.find_owned(owner_id, id).await? {
        Some(view) if view.client.is_active => Ok(view),
        _ => Err(AppError::NotFound(not_found.to_string())),
    }
}
