//! # Concurrent Issuance Scenarios
//!
//! Many simultaneous issuance flows against one issuer: every flow
//! commits a distinct transaction, and every holder's vault balances.

#[cfg(test)]
mod tests {
    use crate::integration::support::{holdings, run_issuance, Network};
    use rand::Rng;
    use shared_types::Hash;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_ten_concurrent_issuances_commit_distinct_transactions() {
        let net = Arc::new(Network::new());
        let issuer = Arc::new(net.join("Bank"));

        let mut rng = rand::thread_rng();
        let amounts: Vec<u64> = (0..10).map(|_| rng.gen_range(1..10_000)).collect();
        let holders: Vec<_> = (0..10)
            .map(|i| Arc::new(net.join(&format!("Holder-{i}"))))
            .collect();

        let mut tasks = Vec::new();
        for (holder, amount) in holders.iter().cloned().zip(amounts.clone()) {
            let net = net.clone();
            let issuer = issuer.clone();
            tasks.push(tokio::spawn(async move {
                run_issuance(&net, &issuer, &holder, vec!["GBP".into()], amount, "GBP")
                    .await
                    .0
            }));
        }

        let mut tx_ids: HashSet<Hash> = HashSet::new();
        for task in tasks {
            let committed = task.await.unwrap().unwrap();
            tx_ids.insert(committed.id());
        }
        assert_eq!(tx_ids.len(), 10, "every issuance commits its own transaction");

        for (holder, amount) in holders.iter().zip(amounts) {
            assert_eq!(holdings(holder, "GBP"), amount);
            assert_eq!(holder.ledger.unconsumed().unwrap().len(), 1);
        }
    }
}
