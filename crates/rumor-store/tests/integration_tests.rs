//! Integration tests for rumor-store
//!
//! The same scenarios run against both repository implementations.

use rumor_domain::traits::{Page, RumorFilter, RumorRepository, UpdateStatus};
use rumor_domain::{
    Category, EntityId, Rumor, RumorRecord, Severity, SpreadPolicy, SubjectId, Variant,
};
use rumor_store::{InMemoryStore, SqliteStore, StoreError};

fn npc(id: &str) -> EntityId {
    EntityId::new(id).unwrap()
}

fn record(content: &str, severity: Severity, truth: f64, categories: &[Category]) -> RumorRecord {
    RumorRecord::new(rumor(content, severity, truth, categories))
}

fn rumor(content: &str, severity: Severity, truth: f64, categories: &[Category]) -> Rumor {
    Rumor::new(
        npc("npc_58"),
        content,
        categories.iter().copied(),
        severity,
        truth,
        1_000,
    )
    .unwrap()
}

/// A record with a fixed id, for ordering assertions
fn record_with_id(id: u128, content: &str, severity: Severity, truth: f64, categories: &[Category]) -> RumorRecord {
    let mut r = rumor(content, severity, truth, categories);
    r.id = SubjectId::from_value(id);
    RumorRecord::new(r)
}

/// A record with one variant and a belief in it
fn spread_record() -> (RumorRecord, SubjectId) {
    let mut rec = record("The king is ill", Severity::Major, 0.4, &[Category::Political]);
    let variant = Variant::new(
        rec.id(),
        "The king might be dying",
        0.6,
        npc("npc_58"),
        "word_substitution",
        1_100,
    )
    .unwrap();
    let variant_id = variant.id;
    rec.lineage.add_variant(variant).unwrap();
    rec.ledger.expose(
        variant_id,
        &npc("npc_104"),
        &npc("npc_58"),
        0.8,
        &SpreadPolicy::default(),
        1_100,
    );
    rec.seed_entity(npc("npc_7"), 0.5, 1_000).unwrap();
    (rec, variant_id)
}

fn check_create_and_get<S: RumorRepository<Error = StoreError>>(store: &S) {
    let (rec, _) = spread_record();
    let id = store.create(rec.clone()).unwrap();
    assert_eq!(id, rec.id());

    let loaded = store.get(id).unwrap().expect("record should exist");
    assert_eq!(loaded, rec);
    assert!(store.get(SubjectId::new()).unwrap().is_none());
}

fn check_duplicate<S: RumorRepository<Error = StoreError>>(store: &S) {
    let rec = record("Wolves in the forest", Severity::Minor, 0.9, &[Category::Danger]);
    store.create(rec.clone()).unwrap();
    assert!(matches!(store.create(rec), Err(StoreError::Duplicate(_))));
}

fn check_root_of<S: RumorRepository<Error = StoreError>>(store: &S) {
    let (rec, variant_id) = spread_record();
    let id = store.create(rec).unwrap();

    assert_eq!(store.root_of(id).unwrap(), Some(id));
    assert_eq!(store.root_of(variant_id).unwrap(), Some(id));
    assert_eq!(store.root_of(SubjectId::new()).unwrap(), None);
}

fn check_optimistic_update<S: RumorRepository<Error = StoreError>>(store: &S) {
    let rec = record("Bread prices will double", Severity::Moderate, 0.3, &[Category::Economic]);
    let id = store.create(rec).unwrap();

    let mut first = store.get(id).unwrap().unwrap();
    let second = store.get(id).unwrap().unwrap();

    first.seed_entity(npc("npc_2"), 0.4, 2_000).unwrap();
    first.touch(2_000);
    assert_eq!(
        store.update(&first).unwrap(),
        UpdateStatus::Committed { version: 1 }
    );

    // The second writer loaded version 0 and must not overwrite
    assert_eq!(store.update(&second).unwrap(), UpdateStatus::Stale { current: 1 });

    let loaded = store.get(id).unwrap().unwrap();
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.rumor.updated_at, 2_000);
    assert!(loaded.ledger.entity_knows(&npc("npc_2")));
}

fn check_update_adds_variants<S: RumorRepository<Error = StoreError>>(store: &S) {
    let rec = record("A dragon was seen", Severity::Critical, 0.1, &[Category::Danger]);
    let id = store.create(rec).unwrap();

    let mut loaded = store.get(id).unwrap().unwrap();
    let variant = Variant::new(id, "A dragon might have been seen", 0.2, npc("npc_58"), "template", 1_500).unwrap();
    let variant_id = variant.id;
    loaded.lineage.add_variant(variant).unwrap();
    store.update(&loaded).unwrap();

    let reloaded = store.get(id).unwrap().unwrap();
    assert_eq!(reloaded.lineage.len(), 1);
    assert_eq!(reloaded.content_of(variant_id), Some("A dragon might have been seen"));
    assert_eq!(store.root_of(variant_id).unwrap(), Some(id));
}

fn check_update_missing<S: RumorRepository<Error = StoreError>>(store: &S) {
    let rec = record("Never stored", Severity::Trivial, 0.5, &[]);
    assert!(matches!(store.update(&rec), Err(StoreError::NotFound(_))));
}

fn check_list_filters<S: RumorRepository<Error = StoreError>>(store: &S) {
    let a = record_with_id(1, "The Duke hoards grain", Severity::Major, 0.8, &[Category::Political, Category::Economic]);
    let b = record_with_id(2, "The miller's daughter eloped", Severity::Minor, 0.5, &[Category::Personal]);
    let c = record_with_id(3, "Bandits on the north road", Severity::Critical, 0.2, &[Category::Danger]);
    let (a_id, b_id, c_id) = (a.id(), b.id(), c.id());
    for rec in [a, b, c] {
        store.create(rec).unwrap();
    }

    let all = store.list(&RumorFilter::default(), Page::default()).unwrap();
    assert_eq!(all.total, 3);
    // Newest first
    assert_eq!(all.rumors[0].id, c_id);
    assert_eq!(all.rumors[2].id, a_id);

    let political = RumorFilter {
        categories: vec![Category::Political],
        ..Default::default()
    };
    let page = store.list(&political, Page::default()).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.rumors[0].id, a_id);

    let truthful = RumorFilter {
        min_truth: Some(0.5),
        ..Default::default()
    };
    assert_eq!(store.list(&truthful, Page::default()).unwrap().total, 2);

    let serious = RumorFilter {
        min_severity: Some(Severity::Major),
        ..Default::default()
    };
    assert_eq!(store.list(&serious, Page::default()).unwrap().total, 2);

    let exact = RumorFilter {
        severity: Some(Severity::Minor),
        ..Default::default()
    };
    let page = store.list(&exact, Page::default()).unwrap();
    assert_eq!(page.rumors[0].id, b_id);

    let text = RumorFilter {
        search_text: Some("BANDITS".to_string()),
        ..Default::default()
    };
    assert_eq!(store.list(&text, Page::default()).unwrap().rumors[0].id, c_id);

    let paged = store.list(&RumorFilter::default(), Page { limit: 1, offset: 1 }).unwrap();
    assert_eq!(paged.total, 3);
    assert_eq!(paged.rumors.len(), 1);
    assert_eq!(paged.rumors[0].id, b_id);

    let past_end = store.list(&RumorFilter::default(), Page { limit: 10, offset: 5 }).unwrap();
    assert!(past_end.rumors.is_empty());
    assert_eq!(past_end.total, 3);
}

fn check_list_known_by<S: RumorRepository<Error = StoreError>>(store: &S) {
    let (rec, _) = spread_record();
    let id = store.create(rec).unwrap();
    store
        .create(record("Unrelated", Severity::Minor, 0.5, &[]))
        .unwrap();

    let known = RumorFilter {
        known_by: Some(npc("npc_104")),
        ..Default::default()
    };
    let page = store.list(&known, Page::default()).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.rumors[0].id, id);

    let stranger = RumorFilter {
        known_by: Some(npc("npc_999")),
        ..Default::default()
    };
    assert_eq!(store.list(&stranger, Page::default()).unwrap().total, 0);
}

fn check_delete<S: RumorRepository<Error = StoreError>>(store: &S) {
    let (rec, variant_id) = spread_record();
    let id = store.create(rec).unwrap();

    assert!(store.delete(id).unwrap());
    assert!(store.get(id).unwrap().is_none());
    assert_eq!(store.root_of(variant_id).unwrap(), None);
    assert!(store.ids().unwrap().is_empty());
    assert!(!store.delete(id).unwrap());
}

fn check_ids_sorted<S: RumorRepository<Error = StoreError>>(store: &S) {
    let mut expected = Vec::new();
    for i in 0..5 {
        let rec = record(&format!("rumor {}", i), Severity::Minor, 0.5, &[]);
        expected.push(store.create(rec).unwrap());
    }
    expected.sort();
    assert_eq!(store.ids().unwrap(), expected);
}

macro_rules! store_suite {
    ($name:ident, $make:expr) => {
        mod $name {
            use super::*;

            #[test]
            fn create_and_get() {
                check_create_and_get(&$make);
            }

            #[test]
            fn duplicate_is_rejected() {
                check_duplicate(&$make);
            }

            #[test]
            fn root_of_resolves_variants() {
                check_root_of(&$make);
            }

            #[test]
            fn optimistic_update() {
                check_optimistic_update(&$make);
            }

            #[test]
            fn update_adds_variants() {
                check_update_adds_variants(&$make);
            }

            #[test]
            fn update_missing_record() {
                check_update_missing(&$make);
            }

            #[test]
            fn list_filters_and_pages() {
                check_list_filters(&$make);
            }

            #[test]
            fn list_known_by() {
                check_list_known_by(&$make);
            }

            #[test]
            fn delete_cascades() {
                check_delete(&$make);
            }

            #[test]
            fn ids_sorted() {
                check_ids_sorted(&$make);
            }
        }
    };
}

store_suite!(sqlite, SqliteStore::in_memory().unwrap());
store_suite!(memory, InMemoryStore::new());

#[test]
fn test_sqlite_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rumors.db");
    let (rec, variant_id) = spread_record();
    let id = rec.id();

    {
        let store = SqliteStore::new(&path).unwrap();
        store.create(rec.clone()).unwrap();
    }

    let store = SqliteStore::new(&path).unwrap();
    let loaded = store.get(id).unwrap().unwrap();
    assert_eq!(loaded, rec);
    assert_eq!(store.root_of(variant_id).unwrap(), Some(id));
}

#[test]
fn test_sqlite_store_is_shareable_across_threads() {
    use std::sync::Arc;

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                let rec = record(&format!("thread {}", i), Severity::Minor, 0.5, &[]);
                store.create(rec).unwrap()
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.ids().unwrap().len(), 4);
}
