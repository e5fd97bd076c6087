//! Concurrency tests for the rumor service
//!
//! Threads share one service behind an `Arc`.

use rumor_domain::traits::RumorRepository;
use rumor_domain::{EntityId, RumorId, Severity};
use rumor_engine::{CreateRumor, EngineConfig, RumorService, SpreadParams, SpreadRequest};
use rumor_store::{InMemoryStore, SqliteStore};
use std::sync::Arc;
use std::thread;

fn npc(id: String) -> EntityId {
    EntityId::new(id).unwrap()
}

fn create<R: RumorRepository>(service: &RumorService<R>, originator: &str) -> RumorId {
    service
        .create(CreateRumor {
            originator_id: npc(originator.to_string()),
            content: "The guard is angry and will march at the gate tomorrow".to_string(),
            categories: vec![],
            severity: Severity::Moderate,
            truth_value: 0.5,
            initial_entities: vec![],
        })
        .unwrap()
}

fn patient_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.locking.lock_timeout_ms = 2_000;
    config.locking.max_retries = 5;
    config
}

/// Many threads retell one rumor to distinct listeners, half of them mutating
fn same_rumor_contention<R: RumorRepository + 'static>(repo: R, threads: usize, per_thread: usize) {
    let service = Arc::new(RumorService::new(repo, patient_config()).unwrap());
    let id = create(&service, "npc_0");

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for i in 0..per_thread {
                    let params = if i % 2 == 0 {
                        SpreadParams::mutating(0.5, 0.0)
                    } else {
                        SpreadParams::faithful(0.2)
                    };
                    service
                        .spread(SpreadRequest {
                            subject_id: id,
                            from_entity_id: npc("npc_0".to_string()),
                            to_entity_id: npc(format!("npc_{}_{}", t, i)),
                            params,
                        })
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let record = service.get(id).unwrap();
    let total = threads * per_thread;
    let mutating = threads * per_thread.div_ceil(2);

    assert_eq!(record.version, total as u64);
    assert_eq!(record.ledger.len(), total + 1);
    assert_eq!(record.lineage.len(), mutating);

    // Every variant was committed together with the belief that references it
    for variant in record.lineage.variants() {
        let believers = record
            .ledger
            .entries()
            .iter()
            .filter(|e| e.subject_id == variant.id)
            .count();
        assert_eq!(believers, 1);
        assert_eq!(record.lineage.root_of(variant.id).unwrap(), id);
    }
    for entry in record.ledger.entries() {
        assert!((0.0..=1.0).contains(&entry.believability));
        assert!(record.contains(entry.subject_id));
    }
}

#[test]
fn test_same_rumor_contention_memory() {
    same_rumor_contention(InMemoryStore::new(), 8, 20);
}

#[test]
fn test_same_rumor_contention_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::new(dir.path().join("rumors.db")).unwrap();
    same_rumor_contention(store, 4, 6);
}

#[test]
fn test_different_rumors_are_independent() {
    let service = Arc::new(RumorService::new(InMemoryStore::new(), patient_config()).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let originator = format!("npc_{}", t);
                let id = create(&service, &originator);
                let mut subject = id;
                let mut teller = originator;
                for hop in 0..10 {
                    let listener = format!("npc_{}_{}", t, hop);
                    let result = service
                        .spread(SpreadRequest {
                            subject_id: subject,
                            from_entity_id: npc(teller.clone()),
                            to_entity_id: npc(listener.clone()),
                            params: SpreadParams::mutating(0.2, 1.0),
                        })
                        .unwrap();
                    subject = result.resulting_subject_id;
                    teller = listener;
                }
                (id, subject)
            })
        })
        .collect();

    for handle in handles {
        let (id, last) = handle.join().unwrap();
        let ancestors = service.ancestors_of(last).unwrap();
        assert_eq!(ancestors.len(), 10);
        assert_eq!(ancestors.last(), Some(&id));
        assert_eq!(service.get(id).unwrap().version, 10);
    }
    assert_eq!(service.statistics().unwrap().total_rumors, 8);
}

#[test]
fn test_decay_runs_alongside_spreads() {
    let service = Arc::new(RumorService::new(InMemoryStore::new(), patient_config()).unwrap());
    let id = create(&service, "npc_0");

    let spreader = {
        let service = Arc::clone(&service);
        thread::spawn(move || {
            for i in 0..50 {
                service
                    .spread(SpreadRequest {
                        subject_id: id,
                        from_entity_id: npc("npc_0".to_string()),
                        to_entity_id: npc(format!("npc_{}", i + 1)),
                        params: SpreadParams::faithful(0.0),
                    })
                    .unwrap();
            }
        })
    };
    let decayer = {
        let service = Arc::clone(&service);
        thread::spawn(move || {
            for _ in 0..50 {
                service.decay_now().unwrap();
            }
        })
    };

    spreader.join().unwrap();
    decayer.join().unwrap();

    let record = service.get(id).unwrap();
    assert_eq!(record.ledger.len(), 51);
}
