mod common;

use std::collections::HashSet;
use std::future::pending;
use std::io::Write;
use std::time::Duration;

use brute_samourai::oracle::{contains_marker, Aes256CbcOracle, Oracle};
use brute_samourai::payload::read_wallet;
use brute_samourai::{ChunkSpec, Coordinator, Outcome, PatternSpace, SearchPlan, SearchSpace};
use common::{seal, wallet_json, words, Recording, BACKUP_JSON, ROUNDS};

#[test]
fn oracle_accepts_only_the_right_passphrase() {
    let container = seal("correct horse", BACKUP_JSON, ROUNDS);
    let oracle = Aes256CbcOracle::with_iterations(ROUNDS);

    let plaintext = oracle.decrypt(&container, "correct horse").unwrap();
    assert_eq!(plaintext, BACKUP_JSON);
    assert!(contains_marker(&plaintext));

    for wrong in ["", "Correct horse", "correct horse ", "correct hors", "hunter2", "ab"] {
        let plaintext = oracle.decrypt(&container, wrong).unwrap();
        assert!(!contains_marker(&plaintext), "{wrong:?} matched");
    }
}

#[tokio::test]
async fn finds_two_letter_passphrase_from_wallet_file() {
    let container = seal("ab", BACKUP_JSON, Aes256CbcOracle::new().iterations());
    let mut wallet = tempfile::NamedTempFile::new().unwrap();
    wallet.write_all(wallet_json(&container).as_bytes()).unwrap();

    let ciphertext = read_wallet(wallet.path()).unwrap();
    assert_eq!(ciphertext, container);

    let space = SearchSpace::Pattern(PatternSpace::new("ab", "a?").unwrap());
    let enumerated: HashSet<String> = (0..space.size()).map(|i| space.generate(i)).collect();
    assert_eq!(enumerated, HashSet::from(["aa".to_owned(), "ab".to_owned()]));

    let plan = SearchPlan::new(space, ChunkSpec::default(), 2, 0).unwrap();
    let coordinator = Coordinator::new(plan, Aes256CbcOracle::new(), ciphertext);
    match coordinator.run(pending()).await.unwrap() {
        Outcome::Found {
            passphrase,
            plaintext,
        } => {
            assert_eq!(passphrase, "ab");
            assert_eq!(plaintext, BACKUP_JSON);
        }
        other => panic!("expected a match, got {other:?}"),
    }
}

#[tokio::test]
async fn list_search_across_chunks() {
    let container = seal("pw0077", BACKUP_JSON, ROUNDS);
    let mut found_in = Vec::new();
    for index in 0..3 {
        let plan = SearchPlan::new(
            SearchSpace::List(words(100)),
            ChunkSpec { index, total: 3 },
            3,
            0,
        )
        .unwrap();
        let coordinator = Coordinator::new(
            plan,
            Aes256CbcOracle::with_iterations(ROUNDS),
            container.clone(),
        );
        if let Outcome::Found { passphrase, .. } = coordinator.run(pending()).await.unwrap() {
            assert_eq!(passphrase, "pw0077");
            found_in.push(index);
        }
    }
    // chunk size 33: [0,33) [33,66) [66,100)
    assert_eq!(found_in, [2]);
}

#[tokio::test]
async fn cancel_then_resume_finds_planted_passphrase() {
    const SIZE: usize = 600;
    const WORKERS: usize = 2;
    let container = seal("planted", BACKUP_JSON, ROUNDS);

    // First run: the passphrase is nowhere in the list.
    let oracle = Recording::new(
        Aes256CbcOracle::with_iterations(ROUNDS),
        Duration::from_millis(2),
    );
    let log = oracle.log();
    let plan = SearchPlan::new(SearchSpace::List(words(SIZE)), ChunkSpec::default(), WORKERS, 0)
        .unwrap();
    let starts: Vec<u64> = plan.ranges().iter().map(|r| r.start).collect();
    assert_eq!(starts, [0, 300]);

    let coordinator = Coordinator::new(plan, oracle, container.clone());
    let shared = coordinator.shared();
    let interrupt = async move {
        while shared.tried() < 20 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    };

    let resume = match coordinator.run(interrupt).await.unwrap() {
        Outcome::Cancelled { resume_offset } => resume_offset,
        other => panic!("expected cancellation, got {other:?}"),
    };
    assert!(resume < 300, "resume offset {resume} beyond the block");

    let tried: HashSet<String> = log.lock().unwrap().iter().cloned().collect();
    let list = words(SIZE);
    for start in &starts {
        for ordinal in *start..*start + resume {
            assert!(
                tried.contains(&list[ordinal as usize]),
                "ordinal {ordinal} below resume offset {resume} was never tried"
            );
        }
    }

    // Second run: plant the passphrase exactly where worker 1 resumes.
    let mut planted = words(SIZE);
    planted[300 + resume as usize] = "planted".to_owned();
    let plan = SearchPlan::new(SearchSpace::List(planted), ChunkSpec::default(), WORKERS, resume)
        .unwrap();
    let coordinator = Coordinator::new(
        plan,
        Aes256CbcOracle::with_iterations(ROUNDS),
        container,
    );
    match coordinator.run(pending()).await.unwrap() {
        Outcome::Found { passphrase, .. } => assert_eq!(passphrase, "planted"),
        other => panic!("expected a match after resume, got {other:?}"),
    }
}

#[tokio::test]
async fn resumed_run_reports_offset_relative_to_origin() {
    let container = seal("absent", BACKUP_JSON, ROUNDS);
    let plan = SearchPlan::new(SearchSpace::List(words(200)), ChunkSpec::default(), 4, 10).unwrap();
    let coordinator = Coordinator::new(
        plan,
        Aes256CbcOracle::with_iterations(ROUNDS),
        container,
    );
    coordinator.shared().cancel();

    let outcome = coordinator.run(pending()).await.unwrap();
    assert_eq!(outcome, Outcome::Cancelled { resume_offset: 10 });
}

#[tokio::test]
async fn truncated_container_aborts() {
    let plan = SearchPlan::new(SearchSpace::List(words(8)), ChunkSpec::default(), 2, 0).unwrap();
    let coordinator = Coordinator::new(
        plan,
        Aes256CbcOracle::with_iterations(ROUNDS),
        vec![0u8; 12],
    );
    let err = coordinator.run(pending()).await.unwrap_err();
    assert!(matches!(err, brute_samourai::Error::MalformedPayload(_)));
}
