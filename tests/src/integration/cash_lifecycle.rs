//! # Cash Lifecycle Scenarios
//!
//! An issuer creates cash for a holder, then the holder pays a third
//! party, with every vault audited after each commitment.

#[cfg(test)]
mod tests {
    use crate::integration::support::{holdings, run_issuance, run_transfer, Network};
    use pact_flow::FlowError;

    #[tokio::test]
    async fn test_million_unit_issuance_then_transfer() {
        let net = Network::new();
        let issuer = net.join("Bank");
        let holder = net.join("Alice");
        let merchant = net.join("Bob");

        let (initiated, responded) = run_issuance(
            &net,
            &issuer,
            &holder,
            vec!["GBP".into()],
            1_000_000,
            "GBP",
        )
        .await;
        let issued = initiated.unwrap();
        assert_eq!(issued.id(), responded.unwrap().id());
        issued.verify_complete().unwrap();
        assert_eq!(holdings(&holder, "GBP"), 1_000_000);

        let (paid, sent) = run_transfer(&net, &holder, &merchant, 250_000, "GBP").await;
        let payment = paid.unwrap();
        assert_eq!(payment.id(), sent.unwrap().id());

        // Holder keeps the change, the merchant holds the payment, and
        // the original issued state is consumed.
        assert_eq!(holdings(&holder, "GBP"), 750_000);
        assert_eq!(holdings(&merchant, "GBP"), 250_000);
        let consumed = holder.ledger.consumed().unwrap();
        assert_eq!(consumed.len(), 1);
        assert_eq!(consumed[0].0.tx_id, issued.id());

        // Both vaults can resolve the committed payment.
        assert!(holder.ledger.transaction(&payment.id()).unwrap().is_some());
        assert!(merchant.ledger.transaction(&payment.id()).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rejected_currency_leaves_every_ledger_untouched() {
        let net = Network::new();
        let issuer = net.join("Bank");
        let holder = net.join("Alice");

        let (initiated, responded) =
            run_issuance(&net, &issuer, &holder, vec!["GBP".into()], 500, "ZWL").await;

        assert!(matches!(initiated.unwrap_err(), FlowError::Rejected { .. }));
        assert!(matches!(responded.unwrap_err(), FlowError::Rejected { .. }));

        assert_eq!(holdings(&holder, "ZWL"), 0);
        assert!(holder.ledger.unconsumed().unwrap().is_empty());
        assert!(issuer.ledger.unconsumed().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transfer_beyond_holdings_is_rejected() {
        let net = Network::new();
        let issuer = net.join("Bank");
        let holder = net.join("Alice");
        let merchant = net.join("Bob");

        run_issuance(&net, &issuer, &holder, vec!["GBP".into()], 100, "GBP")
            .await
            .0
            .unwrap();

        let (paid, sent) = run_transfer(&net, &holder, &merchant, 1_000, "GBP").await;
        assert!(matches!(paid.unwrap_err(), FlowError::Rejected { .. }));
        assert!(matches!(sent.unwrap_err(), FlowError::Rejected { .. }));

        // The holder's cash is intact and unlocked for later flows.
        assert_eq!(holdings(&holder, "GBP"), 100);
        let (paid, _) = run_transfer(&net, &holder, &merchant, 100, "GBP").await;
        paid.unwrap();
        assert_eq!(holdings(&merchant, "GBP"), 100);
    }
}
