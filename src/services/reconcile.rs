use std::collections::HashSet;

use crate::models::Message;

/// Merge freshly fetched server history with the local list.
///
/// Only the pending entries of `local` survive, appended after the server
/// history. Server entries are de-duplicated by `response_id`, keeping the
/// first occurrence. Server entries without a `response_id` are dropped so the
/// result is a fixed point: `reconcile(&reconcile(l, s), s) == reconcile(l, s)`.
pub fn reconcile(local: &[Message], server: &[Message]) -> Vec<Message> {
    let pending = local.iter().filter(|m| m.is_pending()).cloned();

    let mut seen = HashSet::new();
    server
        .iter()
        .filter(|m| !m.is_pending())
        .filter(|m| seen.insert(m.response_id.as_str()))
        .cloned()
        .chain(pending)
        .collect()
}
