use tracing::{debug, error, info, warn};

use crate::addresses::{MODAL_WINDOW, STATUS_BAR, VKEY_ENTER};
use crate::platforms::Session;

/// Confirm the auxiliary modal window with Enter until it is gone.
///
/// Best effort: lookup or key faults end the sweep and are logged, never
/// returned. Stops after `max_sweeps` confirmations if the modal keeps coming
/// back. Returns whether at least one modal was confirmed.
pub fn drain_dialogs(session: &dyn Session, max_sweeps: usize) -> bool {
    let mut confirmed = 0usize;

    loop {
        let modal = match session.try_find_by_id(MODAL_WINDOW) {
            Ok(Some(modal)) => modal,
            Ok(None) => break,
            Err(e) => {
                error!(
                    "Modal lookup failed (status bar: '{}'): {}",
                    status_text(session),
                    e
                );
                break;
            }
        };

        if confirmed >= max_sweeps {
            warn!(
                confirmed,
                "Modal {} still present after {} confirmations, giving up",
                MODAL_WINDOW,
                max_sweeps
            );
            break;
        }

        debug!("Confirming modal {}", MODAL_WINDOW);
        if let Err(e) = modal.send_vkey(VKEY_ENTER) {
            error!(
                "Failed to confirm modal (status bar: '{}'): {}",
                status_text(session),
                e
            );
            break;
        }
        confirmed += 1;
    }

    if confirmed > 0 {
        info!(confirmed, "Dismissed modal dialogs");
    }
    confirmed > 0
}

fn status_text(session: &dyn Session) -> String {
    session
        .try_find_by_id(STATUS_BAR)
        .ok()
        .flatten()
        .and_then(|bar| bar.text().ok())
        .unwrap_or_default()
}
