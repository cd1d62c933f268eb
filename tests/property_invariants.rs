use std::{collections::BTreeMap, sync::Arc};

use proptest::prelude::*;

use potluck::{
    persist::{RsvpStore, memory::MemoryRsvpStore, sqlite::SqliteRsvpStore},
    repo::{RepoError, RsvpRepository, UpsertOutcome},
    rsvp::RsvpRecord,
};

const BASE_NAMES: [&str; 6] = ["Ana", "Ben", "Priya", "Zoë", "Li Wei", "Omar"];

#[derive(Debug, Clone)]
struct Submission {
    name_idx: usize,
    upper_mask: u8,
    pad_left: u8,
    pad_right: u8,
    attending: bool,
    dish: Option<String>,
}

impl Submission {
    fn raw_name(&self) -> String {
        let base = BASE_NAMES[self.name_idx];
        let cased: String = base
            .chars()
            .enumerate()
            .map(|(i, c)| {
                if self.upper_mask & (1 << (i % 8)) != 0 {
                    c.to_uppercase().collect::<String>()
                } else {
                    c.to_lowercase().collect::<String>()
                }
            })
            .collect();
        format!(
            "{}{}{}",
            " ".repeat(usize::from(self.pad_left)),
            cased,
            "\t".repeat(usize::from(self.pad_right))
        )
    }
}

fn submission_strategy() -> impl Strategy<Value = Submission> {
    (
        0..BASE_NAMES.len(),
        any::<u8>(),
        0u8..3,
        0u8..3,
        any::<bool>(),
        prop_oneof![Just(None), Just(Some(String::new())), "[a-z]{1,8}".prop_map(Some)],
    )
        .prop_map(|(name_idx, upper_mask, pad_left, pad_right, attending, dish)| Submission {
            name_idx,
            upper_mask,
            pad_left,
            pad_right,
            attending,
            dish,
        })
}

fn blank_strategy() -> impl Strategy<Value = String> {
    "[ \t\n]{0,6}"
}

fn run<T>(fut: impl std::future::Future<Output = T>) -> T {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(fut)
}

fn sqlite_store() -> Arc<dyn RsvpStore> {
    let store = SqliteRsvpStore::open_in_memory().expect("open sqlite");
    run(store.ensure_schema()).expect("schema");
    Arc::new(store)
}

fn check_one_record_per_guest(store: Arc<dyn RsvpStore>, subs: &[Submission]) -> Result<(), TestCaseError> {
    let repo = RsvpRepository::new(store);

    let (records, outcomes) = run(async {
        let mut outcomes = Vec::new();
        for sub in subs {
            let outcome = repo
                .upsert(&sub.raw_name(), sub.attending, sub.dish.as_deref())
                .await
                .expect("upsert");
            outcomes.push(outcome);
        }
        (repo.list_all().await.expect("list"), outcomes)
    });

    let mut expected: BTreeMap<usize, &Submission> = BTreeMap::new();
    let mut first_ids: BTreeMap<usize, i64> = BTreeMap::new();
    for (sub, outcome) in subs.iter().zip(&outcomes) {
        match first_ids.get(&sub.name_idx) {
            Some(id) => prop_assert_eq!(*outcome, UpsertOutcome::Updated(*id)),
            None => {
                prop_assert!(!outcome.is_update());
                first_ids.insert(sub.name_idx, outcome.id());
            }
        }
        expected.insert(sub.name_idx, sub);
    }

    prop_assert_eq!(records.len(), expected.len());
    for (idx, sub) in expected {
        let rec: &RsvpRecord = records
            .iter()
            .find(|r| r.name.to_lowercase() == BASE_NAMES[idx].to_lowercase())
            .expect("guest present");
        prop_assert_eq!(rec.id, first_ids[&idx]);
        prop_assert_eq!(rec.attending, sub.attending);
        let want_dish = sub.dish.clone().filter(|d| !d.is_empty());
        prop_assert_eq!(&rec.dish, &want_dish);
        prop_assert_eq!(rec.name.trim(), rec.name.as_str());
    }

    for pair in records.windows(2) {
        prop_assert!(pair[0].created_at >= pair[1].created_at);
    }
    Ok(())
}

proptest! {
    #[test]
    fn one_record_per_guest_with_latest_answer(subs in prop::collection::vec(submission_strategy(), 1..60)) {
        check_one_record_per_guest(Arc::new(MemoryRsvpStore::new()), &subs)?;
    }

    #[test]
    fn sqlite_keeps_one_record_per_guest(subs in prop::collection::vec(submission_strategy(), 1..40)) {
        check_one_record_per_guest(sqlite_store(), &subs)?;
    }

    #[test]
    fn blank_names_never_mutate(blank in blank_strategy(), attending in any::<bool>()) {
        let store = Arc::new(MemoryRsvpStore::new());
        let repo = RsvpRepository::new(store.clone());

        let err = run(async {
            repo.upsert("Ana", true, Some("Salad")).await.expect("seed");
            repo.upsert(&blank, attending, Some("Pie")).await
        });

        prop_assert!(matches!(err, Err(RepoError::NameRequired)));
        prop_assert_eq!(store.len(), 1);
    }
}
