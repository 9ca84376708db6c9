//! The identity resolver.
//!
//! [`resolve`] reconciles one incoming (email, phone) fragment against the
//! stored contacts in a fixed pipeline:
//!
//! 1. look up every contact sharing the email or the phone number;
//! 2. with no match, record a fresh primary and stop;
//! 3. map each match to the primary heading its group;
//! 4. if several groups were hit, fold them into the oldest one;
//! 5. record a secondary if the fragment carries something the group lacks;
//! 6. read the group back and consolidate it.
//!
//! The resolver keeps no state between calls. Atomicity is the caller's
//! concern: backends run a whole call inside one transaction.

use tracing::{debug, info};

use crate::{
  contact::{Contact, ContactId, ContactUpdate, NewContact},
  error::{ResolveError, Result},
  identity::{ConsolidatedContact, IdentifyRequest, consolidate},
  store::ContactRecords,
};

/// Reconcile `request` against `records` and return the consolidated identity.
pub fn resolve<R: ContactRecords>(
  records: &mut R,
  request: &IdentifyRequest,
) -> Result<ConsolidatedContact, R::Error> {
  let request = request.clone().normalized();
  if request.is_empty() {
    return Err(ResolveError::InvalidRequest);
  }
  let email = request.email();
  let phone = request.phone_number();

  let matches = records
    .find_by_value(email, phone)
    .map_err(ResolveError::Store)?;
  debug!(matches = matches.len(), "looked up contacts by value");

  let Some((first, rest)) = matches.split_first() else {
    let contact = records
      .create(NewContact::primary(
        request.email.clone(),
        request.phone_number.clone(),
      ))
      .map_err(ResolveError::Store)?;
    info!(contact_id = %contact.id, "created primary contact");
    return consolidate_or_broken(contact.id, &[contact]);
  };

  // ── Group resolution ────────────────────────────────────────────────────
  let mut primary_ids = Vec::new();
  let mut intermediates = Vec::new();
  for contact in std::iter::once(first).chain(rest) {
    let chain = follow_chain(records, contact)?;
    if !primary_ids.contains(&chain.root) {
      primary_ids.push(chain.root);
    }
    for id in chain.intermediates {
      if !intermediates.contains(&id) {
        intermediates.push(id);
      }
    }
  }
  primary_ids.sort_unstable();

  // Non-empty: every match yields exactly one root.
  let survivor = primary_ids[0];
  let losers = &primary_ids[1..];

  // ── Merge ───────────────────────────────────────────────────────────────
  for &loser in losers {
    // Demotion first, then relink of the loser's former dependents.
    records
      .update(loser, ContactUpdate::demote_to(survivor))
      .map_err(ResolveError::Store)?;
    let relinked = records
      .update_many_by_linked_id(loser, survivor)
      .map_err(ResolveError::Store)?;
    info!(%survivor, demoted = %loser, relinked, "merged identity groups");
  }

  for &stale in &intermediates {
    records
      .update(stale, ContactUpdate {
        link_precedence: None,
        linked_id:       Some(survivor),
      })
      .map_err(ResolveError::Store)?;
    let relinked = records
      .update_many_by_linked_id(stale, survivor)
      .map_err(ResolveError::Store)?;
    info!(%survivor, contact_id = %stale, relinked, "repaired secondary chain");
  }

  // ── Gap fill ────────────────────────────────────────────────────────────
  let group = records.find_group(survivor).map_err(ResolveError::Store)?;
  if needs_gap_fill(&group, email, phone) {
    let contact = records
      .create(NewContact::secondary(
        request.email.clone(),
        request.phone_number.clone(),
        survivor,
      ))
      .map_err(ResolveError::Store)?;
    info!(contact_id = %contact.id, %survivor, "created secondary contact");
  } else {
    debug!(%survivor, "request adds nothing new to the group");
  }

  // ── Consolidation ───────────────────────────────────────────────────────
  let group = records.find_group(survivor).map_err(ResolveError::Store)?;
  consolidate_or_broken(survivor, &group)
}

/// The consolidated identity of the group containing `id`. Read-only.
///
/// Returns `Ok(None)` if no contact has that id.
pub fn view<R: ContactRecords>(
  records: &mut R,
  id: ContactId,
) -> Result<Option<ConsolidatedContact>, R::Error> {
  let Some(contact) = records.find_by_id(id).map_err(ResolveError::Store)? else {
    return Ok(None);
  };
  let chain = follow_chain(records, &contact)?;
  let group = records.find_group(chain.root).map_err(ResolveError::Store)?;
  consolidate_or_broken(chain.root, &group).map(Some)
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Where a contact's links lead.
struct Chain {
  root:          ContactId,
  /// Secondaries passed through on the way to `root`, excluding the start.
  /// Anything linking to them sits deeper than one hop.
  intermediates: Vec<ContactId>,
}

/// Follow `linked_id` from `contact` until a primary is reached.
fn follow_chain<R: ContactRecords>(
  records: &mut R,
  contact: &Contact,
) -> Result<Chain, R::Error> {
  let mut current = contact.clone();
  let mut seen = vec![current.id];
  let mut intermediates = Vec::new();

  while !current.is_primary() {
    let broken = ResolveError::BrokenReference {
      contact_id: current.id,
      linked_id:  current.linked_id,
    };
    let Some(linked_id) = current.linked_id else {
      return Err(broken);
    };
    let Some(next) = records.find_by_id(linked_id).map_err(ResolveError::Store)?
    else {
      return Err(broken);
    };
    if seen.contains(&next.id) {
      return Err(broken);
    }
    seen.push(next.id);
    if !next.is_primary() {
      intermediates.push(next.id);
    }
    current = next;
  }

  Ok(Chain { root: current.id, intermediates })
}

/// Whether the group lacks the requested email or phone and no single member
/// already carries the exact pair.
fn needs_gap_fill(group: &[Contact], email: Option<&str>, phone: Option<&str>) -> bool {
  let has_email = email.is_some_and(|e| {
    group.iter().any(|c| c.email.as_deref() == Some(e))
  });
  let has_phone = phone.is_some_and(|p| {
    group.iter().any(|c| c.phone_number.as_deref() == Some(p))
  });
  let exact_match = group
    .iter()
    .any(|c| c.email.as_deref() == email && c.phone_number.as_deref() == phone);

  let missing = (email.is_some() && !has_email) || (phone.is_some() && !has_phone);
  missing && !exact_match
}

/// `primary` is the id the group was read for.
fn consolidate_or_broken<E>(
  primary: ContactId,
  group: &[Contact],
) -> Result<ConsolidatedContact, E> {
  consolidate(group).ok_or(ResolveError::BrokenReference {
    contact_id: primary,
    linked_id:  None,
  })
}
