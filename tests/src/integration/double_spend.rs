//! # Double-Spend Scenarios
//!
//! Two flows competing for the same cash: the vault's soft locks stop
//! honest races early, and the notary's uniqueness ordering is the
//! authoritative backstop for anything that slips past them.

#[cfg(test)]
mod tests {
    use crate::integration::support::{holdings, run_issuance, run_transfer, Network, Node};
    use ed25519_dalek::SigningKey;
    use pact_finance::Cash;
    use pact_flow::{FinalityGateway, FlowError};
    use rand::rngs::OsRng;
    use shared_types::{
        Command, Party, PartySignature, SignedTransaction, StateRef, TransactionBuilder,
    };
    use uuid::Uuid;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_transfers_commit_exactly_once() {
        let net = Network::new();
        let issuer = net.join("Bank");
        let payer = net.join("Alice");
        let first = net.join("Bob");
        let second = net.join("Carol");

        run_issuance(&net, &issuer, &payer, vec!["GBP".into()], 100, "GBP")
            .await
            .0
            .unwrap();

        // Both recipients demand the payer's entire holding at once.
        let (to_first, to_second) = tokio::join!(
            run_transfer(&net, &payer, &first, 100, "GBP"),
            run_transfer(&net, &payer, &second, 100, "GBP"),
        );

        let commits = [to_first.0.is_ok(), to_second.0.is_ok()];
        assert_eq!(
            commits.iter().filter(|ok| **ok).count(),
            1,
            "exactly one racing flow may commit"
        );

        // The loser never touched the ledger. Which error it saw depends
        // on where the race was caught: the vault's soft locks reject it
        // early, or the notary refuses it and the peer just goes away.
        let loser = if commits[0] { to_second.0 } else { to_first.0 };
        match loser.unwrap_err() {
            FlowError::Rejected { .. }
            | FlowError::NotaryConflict { .. }
            | FlowError::PeerDisconnected => {}
            other => panic!("unexpected loser outcome: {other}"),
        }

        assert_eq!(holdings(&payer, "GBP"), 0);
        assert_eq!(
            holdings(&first, "GBP") + holdings(&second, "GBP"),
            100,
            "the cash moved exactly once"
        );
    }

    /// A dishonest node could ignore soft locks entirely; the notary
    /// still refuses the second consumption of any input.
    #[tokio::test]
    async fn test_notary_is_the_backstop_when_locks_are_bypassed() {
        let net = Network::new();
        let key = SigningKey::generate(&mut OsRng);
        let owner = key.verifying_key().to_bytes();
        let owner_party = Party::new(owner, "Mallory");

        let issue = signed_tx(&key, &net.notary_party, None, 100);
        let input = StateRef::new(issue.id(), 0);
        net.notary.finalize(issue, &[]).await.unwrap();

        let spend_a = signed_tx(&key, &net.notary_party, Some(input), 1);
        let spend_b = signed_tx(&key, &net.notary_party, Some(input), 2);
        let committed = net.notary.finalize(spend_a, &[owner_party.clone()]).await.unwrap();

        let err = net.notary.finalize(spend_b, &[owner_party]).await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::NotaryConflict { conflicting_tx } if conflicting_tx == committed.id()
        ));
    }

    /// A notary conflict must not strand the payer's other inputs under
    /// the dead flow's soft locks.
    #[tokio::test]
    async fn test_notary_conflict_releases_surviving_inputs() {
        let net = Network::new();
        let recipient = net.join("Bob");

        // Alice's vault lags the notary: it still carries a state the
        // notary has already seen consumed.
        let payer = Node::new("Alice");
        let stale = credit(&payer, 60);
        credit(&payer, 50);

        let bypass = signed_tx(&payer.key, &net.notary_party, Some(stale), 1);
        net.notary.finalize(bypass, &[]).await.unwrap();

        // The transfer needs both holdings, locks them, and dies at the
        // notary on the stale one.
        let (_, responded) = run_transfer(&net, &payer, &recipient, 80, "GBP").await;
        assert!(matches!(
            responded.unwrap_err(),
            FlowError::NotaryConflict { .. }
        ));

        // Neither holding stays locked for the next flow.
        let fresh = Uuid::new_v4();
        assert_eq!(payer.ledger.selectable(fresh).unwrap().len(), 2);
        assert_eq!(holdings(&recipient, "GBP"), 0);
    }

    /// Record an unsigned issuance straight into the node's vault,
    /// returning the produced state's reference.
    fn credit(node: &Node, amount: u64) -> StateRef {
        let owner = node.party.public_key;
        let mut builder = TransactionBuilder::new(Party::new([0xEE; 32], "Notary"));
        builder
            .add_output(Cash::new(amount, "GBP", owner).to_output().unwrap())
            .add_command(Command {
                name: "Issue".into(),
                signers: vec![owner],
            });
        let stx = SignedTransaction::new(builder.build().unwrap());
        let state_ref = StateRef::new(stx.id(), 0);
        node.ledger.record(&stx).unwrap();
        state_ref
    }

    fn signed_tx(
        key: &SigningKey,
        notary: &Party,
        input: Option<StateRef>,
        nonce: u64,
    ) -> SignedTransaction {
        let owner = key.verifying_key().to_bytes();
        let mut builder = TransactionBuilder::new(notary.clone());
        if let Some(input) = input {
            builder.add_input(input);
        }
        builder
            .add_output(Cash::new(nonce, "GBP", owner).to_output().unwrap())
            .add_command(Command {
                name: if input.is_some() { "Move" } else { "Issue" }.into(),
                signers: vec![owner],
            });
        let core = builder.build().unwrap();
        let tx_id = core.id();
        SignedTransaction::new(core).with_signature(PartySignature::create(key, &tx_id))
    }
}
