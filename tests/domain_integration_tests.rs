//! Integration tests for isolated state domains
//!
//! These tests verify that an IsolatedDomain:
//! - Never loses an update under concurrent hops from tasks and threads
//! - Runs one caller's operations in the order it submitted them
//! - Rejects a blocking hop into itself but allows hops into other domains
//! - Keeps account invariants across domains (transfers, overdrafts)

use isobridge::models::ErrorKind;
use isobridge::state::{AccountError, BankAccount, DomainError, IsolatedDomain, in_any_domain};
use proptest::prelude::*;
use std::thread;
use tokio::time::{Duration, timeout};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // Every increment lands exactly once, however the work is split
    #[test]
    fn concurrent_increments_from_threads(threads in 1usize..8, per_thread in 1usize..50) {
        let domain = IsolatedDomain::new("counter", 0usize).unwrap();

        let workers: Vec<_> = (0..threads)
            .map(|_| {
                let domain = domain.clone();
                thread::spawn(move || {
                    for _ in 0..per_thread {
                        domain.hop_blocking(|n| *n += 1).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        prop_assert_eq!(domain.hop_blocking(|n| *n).unwrap(), threads * per_thread);
    }

    // A read submitted after a batch of writes observes all of them
    #[test]
    fn read_after_writes_sees_every_write(values in proptest::collection::vec(any::<i32>(), 0..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let seen = runtime.block_on(async {
            let domain = IsolatedDomain::new("log", Vec::new()).unwrap();
            for value in values.clone() {
                domain.post(move |log: &mut Vec<i32>| log.push(value)).await.unwrap();
            }
            domain.hop(|log| log.clone()).await.unwrap()
        });

        prop_assert_eq!(seen, values);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hops_from_detached_tasks() {
    let domain = IsolatedDomain::new("detached", Vec::<u32>::new()).unwrap();

    let tasks: Vec<_> = (0..50)
        .map(|i| {
            let domain = domain.clone();
            tokio::spawn(async move { domain.hop(move |v| v.push(i)).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let mut values = domain.hop(|v| v.clone()).await.unwrap();
    values.sort_unstable();
    assert_eq!(values, (0..50).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_cross_domain_blocking_hop_and_reentrancy() {
    let inner = IsolatedDomain::new("inner", 5_i32).unwrap();
    let outer = IsolatedDomain::new("outer", 0_i32).unwrap();

    let inner_for_outer = inner.clone();
    let outer_for_outer = outer.clone();
    let (copied, reentrant) = outer
        .hop(move |n| {
            // Hopping into another domain from an executor is allowed
            *n = inner_for_outer.hop_blocking(|m| *m).unwrap();
            // Hopping into ourselves would deadlock
            let reentrant = outer_for_outer.hop_blocking(|m| *m);
            (*n, reentrant)
        })
        .await
        .unwrap();

    assert_eq!(copied, 5);
    assert!(matches!(reentrant, Err(DomainError::Reentrant { .. })));
    assert_eq!(
        ErrorKind::from(reentrant.unwrap_err()),
        ErrorKind::Cancelled
    );
}

#[tokio::test]
async fn test_identity_and_location() {
    let a = IsolatedDomain::new("a", ()).unwrap();
    let b = IsolatedDomain::new("b", ()).unwrap();

    assert!(a.same_domain(&a.clone()));
    assert!(!a.same_domain(&b));
    assert_ne!(a.id(), b.id());

    assert!(!in_any_domain());
    let a_probe = a.clone();
    let (current, foreign) = a
        .hop(move |_| (a_probe.is_current(), in_any_domain()))
        .await
        .unwrap();
    assert!(current);
    assert!(foreign);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transfers_conserve_money() {
    let left = BankAccount::with_balance("left", 1_000).unwrap();
    let right = BankAccount::with_balance("right", 1_000).unwrap();

    let mut tasks = Vec::new();
    for i in 0..40 {
        let (from, to) = if i % 2 == 0 {
            (left.clone(), right.clone())
        } else {
            (right.clone(), left.clone())
        };
        tasks.push(tokio::spawn(async move { from.transfer(&to, 25).await }));
    }
    for task in tasks {
        let _ = timeout(Duration::from_secs(2), task)
            .await
            .expect("Timeout waiting for transfer")
            .unwrap();
    }

    let total = left.balance().await.unwrap() + right.balance().await.unwrap();
    assert_eq!(total, 2_000);
}

#[tokio::test]
async fn test_overdraft_never_goes_negative() {
    let account = BankAccount::with_balance("guarded", 100).unwrap();

    let results: Vec<_> = withdraw_concurrently(&account, 5, 30).await;
    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(AccountError::InsufficientFunds { .. })))
        .count();

    assert_eq!(accepted, 3);
    assert_eq!(rejected, 2);
    assert_eq!(account.balance().await.unwrap(), 10);
}

async fn withdraw_concurrently(
    account: &BankAccount,
    count: usize,
    amount: i64,
) -> Vec<Result<i64, AccountError>> {
    let tasks: Vec<_> = (0..count)
        .map(|_| {
            let account = account.clone();
            tokio::spawn(async move { account.withdraw(amount).await })
        })
        .collect();

    let mut results = Vec::with_capacity(count);
    for task in tasks {
        results.push(task.await.unwrap());
    }
    results
}
