//! Integration tests for `SqliteStore` against an in-memory database.

use ident_core::{
  ResolveError,
  contact::{ContactId, ContactUpdate, LinkPrecedence, NewContact},
  identity::IdentifyRequest,
  store::{ContactRecords, ContactStore},
};

use crate::{SqliteRecords, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn req(email: Option<&str>, phone: Option<&str>) -> IdentifyRequest {
  IdentifyRequest::new(email.map(str::to_owned), phone.map(str::to_owned))
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[test]
fn records_assign_increasing_ids() {
  let conn = rusqlite::Connection::open_in_memory().unwrap();
  conn.execute_batch(crate::schema::SCHEMA).unwrap();
  let mut records = SqliteRecords::new(&conn);

  let a = records
    .create(NewContact::primary(Some("a@x.com".into()), None))
    .unwrap();
  let b = records
    .create(NewContact::secondary(None, Some("111".into()), a.id))
    .unwrap();

  assert!(a.id < b.id);
  let fetched = records.find_by_id(b.id).unwrap().unwrap();
  assert_eq!(fetched, b);
}

#[test]
fn records_find_by_value_matches_either_column() {
  let conn = rusqlite::Connection::open_in_memory().unwrap();
  conn.execute_batch(crate::schema::SCHEMA).unwrap();
  let mut records = SqliteRecords::new(&conn);

  let a = records
    .create(NewContact::primary(Some("a@x.com".into()), Some("111".into())))
    .unwrap();
  let b = records
    .create(NewContact::primary(Some("b@x.com".into()), Some("222".into())))
    .unwrap();
  records
    .create(NewContact::primary(Some("c@x.com".into()), None))
    .unwrap();

  let found = records.find_by_value(Some("a@x.com"), Some("222")).unwrap();
  let ids: Vec<_> = found.iter().map(|c| c.id).collect();
  assert_eq!(ids, [a.id, b.id]);

  // An absent value must not match rows where that column is NULL.
  let found = records.find_by_value(None, Some("111")).unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].id, a.id);
}

#[test]
fn records_demote_and_relink() {
  let conn = rusqlite::Connection::open_in_memory().unwrap();
  conn.execute_batch(crate::schema::SCHEMA).unwrap();
  let mut records = SqliteRecords::new(&conn);

  let p1 = records.create(NewContact::primary(Some("a".into()), None)).unwrap();
  let p2 = records.create(NewContact::primary(Some("b".into()), None)).unwrap();
  let s2 = records
    .create(NewContact::secondary(Some("c".into()), None, p2.id))
    .unwrap();

  records.update(p2.id, ContactUpdate::demote_to(p1.id)).unwrap();
  let touched = records.update_many_by_linked_id(p2.id, p1.id).unwrap();
  assert_eq!(touched, 1);

  let group = records.find_group(p1.id).unwrap();
  let ids: Vec<_> = group.iter().map(|c| c.id).collect();
  assert_eq!(ids, [p1.id, p2.id, s2.id]);

  let demoted = records.find_by_id(p2.id).unwrap().unwrap();
  assert_eq!(demoted.link_precedence, LinkPrecedence::Secondary);
  assert_eq!(demoted.linked_id, Some(p1.id));
  assert_eq!(demoted.email.as_deref(), Some("b"));
}

#[test]
fn schema_rejects_contact_without_values() {
  let conn = rusqlite::Connection::open_in_memory().unwrap();
  conn.execute_batch(crate::schema::SCHEMA).unwrap();
  let mut records = SqliteRecords::new(&conn);

  let err = records.create(NewContact::primary(None, None)).unwrap_err();
  assert!(matches!(err, crate::Error::Sqlite(_)));
}

// ─── Identify ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn identify_new_email_creates_primary() {
  let s = store().await;

  let view = s.identify(req(Some("a@x.com"), None)).await.unwrap();
  assert_eq!(view.emails, ["a@x.com"]);
  assert!(view.phone_numbers.is_empty());
  assert!(view.secondary_contact_ids.is_empty());

  let all = s.list_contacts().await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].id, view.primary_contact_id);
  assert!(all[0].is_primary());
}

#[tokio::test]
async fn identify_rejects_empty_request() {
  let s = store().await;
  let err = s.identify(req(None, Some(""))).await.unwrap_err();
  assert!(matches!(err, ResolveError::InvalidRequest));
  assert!(s.list_contacts().await.unwrap().is_empty());
}

#[tokio::test]
async fn identify_keeps_whitespace_email() {
  let s = store().await;
  let view = s.identify(req(Some(" "), Some("111"))).await.unwrap();
  assert_eq!(view.emails, [" "]);

  let stored = s.get_contact(view.primary_contact_id).await.unwrap().unwrap();
  assert_eq!(stored.email.as_deref(), Some(" "));
  assert_eq!(stored.phone_number.as_deref(), Some("111"));
}

#[tokio::test]
async fn identify_gap_fill_and_resubmission() {
  let s = store().await;
  let primary = s.identify(req(Some("a@x.com"), Some("111"))).await.unwrap();

  let view = s.identify(req(Some("a@x.com"), Some("222"))).await.unwrap();
  assert_eq!(view.primary_contact_id, primary.primary_contact_id);
  assert_eq!(view.emails, ["a@x.com"]);
  assert_eq!(view.phone_numbers, ["111", "222"]);
  assert_eq!(view.secondary_contact_ids.len(), 1);

  let again = s.identify(req(Some("a@x.com"), Some("222"))).await.unwrap();
  assert_eq!(again, view);
  assert_eq!(s.list_contacts().await.unwrap().len(), 2);
}

#[tokio::test]
async fn identify_merges_groups_and_relinks_dependents() {
  let s = store().await;
  let p1 = s.identify(req(Some("a"), Some("1"))).await.unwrap().primary_contact_id;
  let p2 = s.identify(req(Some("b"), Some("2"))).await.unwrap().primary_contact_id;
  let s2 = s.identify(req(Some("c"), Some("2"))).await.unwrap().secondary_contact_ids[0];

  let view = s.identify(req(Some("a"), Some("2"))).await.unwrap();
  assert_eq!(view.primary_contact_id, p1);
  assert_eq!(view.emails, ["a", "b", "c"]);
  assert_eq!(view.phone_numbers, ["1", "2"]);
  assert_eq!(view.secondary_contact_ids, [p2, s2]);

  let demoted = s.get_contact(p2).await.unwrap().unwrap();
  assert_eq!(demoted.link_precedence, LinkPrecedence::Secondary);
  assert_eq!(demoted.linked_id, Some(p1));

  let dependent = s.get_contact(s2).await.unwrap().unwrap();
  assert_eq!(dependent.linked_id, Some(p1));
}

#[tokio::test]
async fn failed_merge_rolls_back_demotion() {
  let s = store().await;
  let p1 = s.identify(req(Some("a"), Some("1"))).await.unwrap().primary_contact_id;
  let p2 = s.identify(req(Some("b"), Some("2"))).await.unwrap().primary_contact_id;
  s.identify(req(Some("c"), Some("2"))).await.unwrap();

  // Let the demotion of p2 through but refuse the relink of its dependent.
  s.conn
    .call(|conn| {
      conn.execute_batch(
        "CREATE TRIGGER refuse_relink BEFORE UPDATE OF linked_id ON contacts
         WHEN OLD.email = 'c'
         BEGIN SELECT RAISE(ABORT, 'relink refused'); END;",
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let err = s.identify(req(Some("a"), Some("2"))).await.unwrap_err();
  assert!(matches!(err, ResolveError::Store(crate::Error::Sqlite(_))));

  let p2_row = s.get_contact(p2).await.unwrap().unwrap();
  assert!(p2_row.is_primary());
  assert_eq!(p2_row.linked_id, None);

  let view = s.identity_of(p1).await.unwrap().unwrap();
  assert!(view.secondary_contact_ids.is_empty());
}

#[tokio::test]
async fn concurrent_identify_creates_single_primary() {
  let s = store().await;

  let handles: Vec<_> = (0..16)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move { s.identify(req(Some("same@x.com"), None)).await })
    })
    .collect();

  let mut primaries = Vec::new();
  for handle in handles {
    primaries.push(handle.await.unwrap().unwrap().primary_contact_id);
  }

  assert!(primaries.windows(2).all(|w| w[0] == w[1]));
  let all = s.list_contacts().await.unwrap();
  assert_eq!(all.len(), 1);
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_contact_missing_returns_none() {
  let s = store().await;
  assert!(s.get_contact(ContactId(7)).await.unwrap().is_none());
}

#[tokio::test]
async fn identity_of_any_member_matches_identify() {
  let s = store().await;
  s.identify(req(Some("a"), Some("1"))).await.unwrap();
  let full = s.identify(req(Some("b"), Some("1"))).await.unwrap();

  let from_secondary = s
    .identity_of(full.secondary_contact_ids[0])
    .await
    .unwrap()
    .unwrap();
  assert_eq!(from_secondary, full);

  let from_primary = s.identity_of(full.primary_contact_id).await.unwrap().unwrap();
  assert_eq!(from_primary, full);

  assert!(s.identity_of(ContactId(99)).await.unwrap().is_none());
}

#[tokio::test]
async fn store_survives_reopen() {
  let dir = std::env::temp_dir().join(format!("ident-store-{}", std::process::id()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("reopen.db");
  let _ = std::fs::remove_file(&path);

  let first = {
    let s = SqliteStore::open(&path).await.unwrap();
    s.identify(req(Some("a"), Some("1"))).await.unwrap()
  };

  let s = SqliteStore::open(&path).await.unwrap();
  let again = s.identify(req(Some("a"), None)).await.unwrap();
  assert_eq!(again, first);

  let next = s.identify(req(Some("fresh"), None)).await.unwrap();
  assert!(next.primary_contact_id > first.primary_contact_id);
}
