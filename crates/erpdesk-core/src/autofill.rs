// ── Postal auto-fill ──
//
// Typing a pincode schedules a lookup after a quiet period; each new
// keystroke cancels the pending one. Results come back on a channel
// and are applied to the draft only if it still asks for them.

use std::sync::Arc;
use std::time::Duration;

use erpdesk_api::PostalPlace;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::backend::PostalLookup;
use crate::debounce::{Debouncer, POSTAL_DEBOUNCE};
use crate::edit::EditSession;
use crate::model::display_value;

/// A finished lookup for `pincode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostalFill {
    pub pincode: String,
    pub place: PostalPlace,
}

/// Indian pincodes are exactly six digits.
pub fn is_valid_pincode(pin: &str) -> bool {
    pin.len() == 6 && pin.bytes().all(|b| b.is_ascii_digit())
}

pub struct PostalAutofill<P> {
    lookup: Arc<P>,
    debouncer: Debouncer,
    tx: mpsc::UnboundedSender<PostalFill>,
}

impl<P: PostalLookup> PostalAutofill<P> {
    pub fn new(lookup: Arc<P>) -> (Self, mpsc::UnboundedReceiver<PostalFill>) {
        Self::with_delay(lookup, POSTAL_DEBOUNCE)
    }

    pub fn with_delay(
        lookup: Arc<P>,
        delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<PostalFill>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let this = Self {
            lookup,
            debouncer: Debouncer::new(delay),
            tx,
        };
        (this, rx)
    }

    /// Call on every pincode edit. Incomplete pincodes only cancel.
    pub fn pincode_changed(&mut self, pin: &str) {
        let pin = pin.trim();
        if !is_valid_pincode(pin) {
            self.debouncer.cancel();
            return;
        }

        let pincode = pin.to_owned();
        let lookup = Arc::clone(&self.lookup);
        let tx = self.tx.clone();
        self.debouncer.schedule(async move {
            match lookup.lookup(&pincode).await {
                Ok(Some(place)) => {
                    debug!(pincode, state = %place.state, "pincode resolved");
                    let _ = tx.send(PostalFill { pincode, place });
                }
                Ok(None) => debug!(pincode, "pincode unknown"),
                Err(e) => warn!(pincode, error = %e, "pincode lookup failed"),
            }
        });
    }

    pub fn cancel(&mut self) {
        self.debouncer.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

/// Write `fill` into a vendor-style draft.
///
/// Applies only while the draft is Domestic and its pincode still
/// matches the one looked up. Returns whether anything changed.
pub fn apply_fill(draft: &mut Map<String, Value>, fill: &PostalFill) -> bool {
    let field = |k: &str| draft.get(k).map(display_value).unwrap_or_default();
    if field("type") != "Domestic" || field("pincode").trim() != fill.pincode {
        return false;
    }
    draft.insert("state".into(), Value::String(fill.place.state.clone()));
    draft.insert("city".into(), Value::String(fill.place.district.clone()));
    true
}

/// [`apply_fill`] on an open session's draft, through `set_field`.
pub fn fill_session(session: &mut EditSession, fill: &PostalFill) -> bool {
    let Some(mut draft) = session.draft().cloned() else {
        return false;
    };
    if !apply_fill(&mut draft, fill) {
        return false;
    }
    ["state", "city"].into_iter().all(|key| {
        let value = draft.get(key).cloned().unwrap_or_default();
        session.set_field(key, value).is_ok()
    })
}
