use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;
use trawl_common::{Result, TrawlError};
use trawl_drivers::pacing::Pacing;
use trawl_drivers::MobileSession;

/// Bring `package` to the foreground if something else is showing.
///
/// Returns `true` when the app had to be activated, after waiting
/// `launch_wait` for it to draw.
pub async fn ensure_foreground(
    session: &dyn MobileSession,
    package: &str,
    launch_wait: Duration,
    cancel: &CancellationToken,
) -> Result<bool> {
    let current = session.current_package().await?;
    if current == package {
        info!(target: "trawl.traversal", package, "target app already in foreground");
        return Ok(false);
    }

    info!(target: "trawl.traversal", current = %current, package, "activating target app");
    session
        .execute_mobile("mobile: activateApp", json!({ "appId": package }))
        .await?;
    if !Pacing::new().pause(launch_wait, cancel).await {
        return Err(TrawlError::Cancelled);
    }
    Ok(true)
}
