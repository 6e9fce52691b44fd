//! Integration tests for the transfer engine
//!
//! Full flows over the in-memory store: money movement, atomic
//! rollback, notification fanout, and the documented sharp edges.

#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;

    use crate::account::{AccountService, MoniNumber, Resolver};
    use crate::core_types::AccountKey;
    use crate::money::parse_amount;
    use crate::notify::{
        NotificationEvent, NotificationHub, NotificationKind, NotificationService,
    };
    use crate::store::{LedgerStore, MemoryStore};
    use crate::transfer::{
        DisplayData, TransferDetails, TransferEngine, TransferError, TransferKind, TransferSpec,
    };

    struct TestHarness {
        store: Arc<MemoryStore>,
        accounts: Arc<AccountService>,
        engine: TransferEngine,
        hub: Arc<NotificationHub>,
        notifications: NotificationService,
    }

    impl TestHarness {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let ledger: Arc<dyn LedgerStore> = store.clone();
            let accounts = Arc::new(AccountService::new(ledger.clone()));
            let resolver = Arc::new(Resolver::new(ledger.clone()));
            let hub = Arc::new(NotificationHub::new());
            let engine =
                TransferEngine::new(ledger.clone(), accounts.clone(), resolver, hub.clone());
            let notifications = NotificationService::new(ledger, hub.clone());
            Self {
                store,
                accounts,
                engine,
                hub,
                notifications,
            }
        }

        /// Provision an account and fund it with one deposit.
        async fn funded(&self, key: &str, name: &str, balance: u64) -> (AccountKey, MoniNumber) {
            let key = AccountKey::new(key);
            let account = self.accounts.ensure(&key, name).await.unwrap();
            if balance > 0 {
                self.engine
                    .perform_transfer(&key, deposit_spec(balance))
                    .await
                    .unwrap();
            }
            (key, account.moni_number)
        }
    }

    fn display(title: &str) -> DisplayData {
        DisplayData {
            title: title.to_string(),
            description: String::new(),
            icon: "arrow-up-right".to_string(),
            color: "text-red-500".to_string(),
        }
    }

    fn deposit_spec(amount: u64) -> TransferSpec {
        TransferSpec {
            kind: TransferKind::Deposit,
            amount,
            recipient: None,
            message: None,
            reference: None,
            details: TransferDetails::MobileMoney {
                operator: "Orange Money".to_string(),
                phone: "+221770000000".to_string(),
            },
            display: display("Deposit"),
        }
    }

    fn send_spec(amount: u64, recipient: &str, message: Option<&str>) -> TransferSpec {
        TransferSpec {
            kind: TransferKind::Send,
            amount,
            recipient: Some(recipient.to_string()),
            message: message.map(str::to_string),
            reference: Some("TRF-1724580000000".to_string()),
            details: TransferDetails::None,
            display: display("Transfer sent"),
        }
    }

    // ========================================================================
    // Happy Path
    // ========================================================================

    #[tokio::test]
    async fn send_moves_money_and_notifies_the_recipient() {
        let h = TestHarness::new();
        let amount = parse_amount("40.00").unwrap();
        let (alice, alice_moni) = h
            .funded("alice", "Alice", parse_amount("100.00").unwrap())
            .await;
        let (bob, bob_moni) = h
            .funded("bob", "Bob", parse_amount("10.00").unwrap())
            .await;

        let receipt = h
            .engine
            .perform_transfer(&alice, send_spec(amount, bob_moni.as_str(), Some("lunch")))
            .await
            .unwrap();

        assert_eq!(receipt.kind, TransferKind::Send);
        assert_eq!(receipt.amount, amount);
        assert_eq!(receipt.counterparty, Some(bob_moni.clone()));

        // both balances moved, and the total is conserved
        assert_eq!(h.store.balance_of(&alice), Some(6_000));
        assert_eq!(h.store.balance_of(&bob), Some(5_000));

        // one debit posting for the sender, one credit posting for the
        // recipient, joined by the same transfer id
        let alice_history = h.engine.history(&alice, 10).await.unwrap();
        assert_eq!(alice_history.len(), 2);
        assert_eq!(alice_history[0].kind, TransferKind::Send);
        assert_eq!(alice_history[0].counterparty_name.as_deref(), Some("Bob"));

        let bob_history = h.engine.history(&bob, 10).await.unwrap();
        assert_eq!(bob_history.len(), 2);
        assert_eq!(bob_history[0].kind, TransferKind::Receive);
        assert_eq!(bob_history[0].transfer_id, receipt.transfer_id);
        assert_eq!(bob_history[0].counterparty_name.as_deref(), Some("Alice"));
        assert_eq!(
            bob_history[0].counterparty_moni.as_ref(),
            Some(&alice_moni)
        );

        // the transfer notification joins the funding deposit's confirmation
        let unread = h.notifications.unread_for(&bob).await.unwrap();
        assert_eq!(unread.len(), 2);
        let n = unread
            .iter()
            .find(|n| n.kind == NotificationKind::TransferReceived)
            .unwrap();
        assert_eq!(n.amount, Some(amount));
        assert_eq!(n.sender_name.as_deref(), Some("Alice"));
        assert_eq!(n.sender_moni.as_ref(), Some(&alice_moni));
        assert_eq!(n.title, "You received 40.00");
        assert_eq!(n.message, "Alice sent you 40.00: lunch");
        assert_eq!(n.posting_id, Some(bob_history[0].id));
        assert!(n.action_required);

        // reading it is one-way; the deposit confirmation stays unread
        let read = h.notifications.mark_read(&bob, n.id).await.unwrap();
        assert!(read.read);
        assert!(!read.action_required);
        assert_eq!(h.notifications.unread_count(&bob).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn balances_are_conserved_across_a_chain_of_transfers() {
        let h = TestHarness::new();
        let (alice, _) = h.funded("alice", "Alice", 10_000).await;
        let (bob, bob_moni) = h.funded("bob", "Bob", 0).await;

        h.engine
            .perform_transfer(&alice, send_spec(3_000, bob_moni.as_str(), None))
            .await
            .unwrap();

        let withdraw = TransferSpec {
            kind: TransferKind::Withdraw,
            amount: 1_000,
            recipient: None,
            message: None,
            reference: None,
            details: TransferDetails::None,
            display: display("Withdrawal"),
        };
        h.engine.perform_transfer(&bob, withdraw).await.unwrap();

        // 10_000 entered, 1_000 left
        let total = h.store.balance_of(&alice).unwrap() + h.store.balance_of(&bob).unwrap();
        assert_eq!(total, 9_000);
    }

    #[tokio::test]
    async fn recipient_gets_a_live_event_after_commit() {
        let h = TestHarness::new();
        let (alice, _) = h.funded("alice", "Alice", 10_000).await;
        let (bob, bob_moni) = h.funded("bob", "Bob", 0).await;

        let mut rx = h.hub.subscribe(&bob);
        h.engine
            .perform_transfer(&alice, send_spec(2_500, bob_moni.as_str(), None))
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            NotificationEvent::Posted(n) => {
                assert_eq!(n.kind, NotificationKind::TransferReceived);
                assert_eq!(n.amount, Some(2_500));
            }
            other => panic!("expected posted event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cash_kinds_write_self_confirmations() {
        let h = TestHarness::new();
        let (alice, _) = h.funded("alice", "Alice", 10_000).await;

        let withdraw = TransferSpec {
            kind: TransferKind::Withdraw,
            amount: 1_000,
            recipient: None,
            message: None,
            reference: None,
            details: TransferDetails::None,
            display: display("Withdrawal"),
        };
        h.engine.perform_transfer(&alice, withdraw).await.unwrap();

        let bill = TransferSpec {
            kind: TransferKind::Bill,
            amount: 1_500,
            recipient: None,
            message: None,
            reference: None,
            details: TransferDetails::Bill {
                provider: "Senelec".to_string(),
                due_date: None,
            },
            display: display("Bill payment"),
        };
        h.engine.perform_transfer(&alice, bill).await.unwrap();

        assert_eq!(h.store.balance_of(&alice), Some(7_500));

        let notifications = h.notifications.notifications_for(&alice).await.unwrap();
        let kinds: Vec<_> = notifications.iter().map(|n| n.kind).collect();
        assert!(kinds.contains(&NotificationKind::DepositCompleted));
        assert!(kinds.contains(&NotificationKind::WithdrawCompleted));
        assert!(kinds.contains(&NotificationKind::BillPaid));
        assert!(notifications.iter().all(|n| !n.action_required));

        let bill_note = notifications
            .iter()
            .find(|n| n.kind == NotificationKind::BillPaid)
            .unwrap();
        assert_eq!(bill_note.message, "You paid 15.00 to Senelec");
    }

    #[tokio::test]
    async fn ussd_records_a_posting_without_touching_the_balance() {
        let h = TestHarness::new();
        let (alice, _) = h.funded("alice", "Alice", 10_000).await;

        let ussd = TransferSpec {
            kind: TransferKind::Ussd,
            amount: 100,
            recipient: None,
            message: None,
            reference: None,
            details: TransferDetails::Ussd {
                code: "#144#".to_string(),
            },
            display: display("USSD action"),
        };
        h.engine.perform_transfer(&alice, ussd).await.unwrap();

        assert_eq!(h.store.balance_of(&alice), Some(10_000));
        let history = h.engine.history(&alice, 10).await.unwrap();
        assert_eq!(history[0].kind, TransferKind::Ussd);

        // the deposit confirmation is the only notification
        assert_eq!(
            h.notifications.notifications_for(&alice).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn history_is_most_recent_first_and_bounded() {
        let h = TestHarness::new();
        let (alice, _) = h.funded("alice", "Alice", 10_000).await;
        let (_, bob_moni) = h.funded("bob", "Bob", 0).await;

        h.engine
            .perform_transfer(&alice, send_spec(1_000, bob_moni.as_str(), None))
            .await
            .unwrap();
        let withdraw = TransferSpec {
            kind: TransferKind::Withdraw,
            amount: 500,
            recipient: None,
            message: None,
            reference: None,
            details: TransferDetails::None,
            display: display("Withdrawal"),
        };
        h.engine.perform_transfer(&alice, withdraw).await.unwrap();

        let page = h.engine.history(&alice, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].kind, TransferKind::Withdraw);
        assert_eq!(page[1].kind, TransferKind::Send);
    }

    // ========================================================================
    // Validation and Failure
    // ========================================================================

    #[tokio::test]
    async fn validation_failures_write_nothing() {
        let h = TestHarness::new();
        let (alice, _) = h.funded("alice", "Alice", 10_000).await;

        let cases: Vec<(TransferSpec, fn(&TransferError) -> bool)> = vec![
            (
                send_spec(0, "MN10001", None),
                |e| matches!(e, TransferError::InvalidAmount),
            ),
            (
                TransferSpec {
                    kind: TransferKind::Receive,
                    ..send_spec(1_000, "MN10001", None)
                },
                |e| matches!(e, TransferError::KindNotInitiable(_)),
            ),
            (
                TransferSpec {
                    recipient: None,
                    ..send_spec(1_000, "MN10001", None)
                },
                |e| matches!(e, TransferError::RecipientRequired(_)),
            ),
            (
                TransferSpec {
                    recipient: Some("MN10001".to_string()),
                    ..deposit_spec(1_000)
                },
                |e| matches!(e, TransferError::UnexpectedRecipient(_)),
            ),
            (
                TransferSpec {
                    details: TransferDetails::Bill {
                        provider: "Senelec".to_string(),
                        due_date: None,
                    },
                    ..deposit_spec(1_000)
                },
                |e| matches!(e, TransferError::DetailsMismatch(_)),
            ),
            (
                send_spec(1_000, "12345", None),
                |e| matches!(e, TransferError::InvalidRecipient(_)),
            ),
            (
                send_spec(1_000, "MN100999", None),
                |e| matches!(e, TransferError::RecipientNotFound(_)),
            ),
        ];

        for (spec, check) in cases {
            let err = h.engine.perform_transfer(&alice, spec).await.unwrap_err();
            assert!(check(&err), "unexpected error: {err}");
        }

        assert!(matches!(
            h.engine
                .perform_transfer(&AccountKey::new(""), deposit_spec(1_000))
                .await
                .unwrap_err(),
            TransferError::Unauthenticated
        ));

        // only the funding deposit is on record
        assert_eq!(h.store.balance_of(&alice), Some(10_000));
        assert_eq!(h.engine.history(&alice, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn insufficient_funds_is_reported_before_any_write() {
        let h = TestHarness::new();
        let (alice, _) = h.funded("alice", "Alice", 1_000).await;
        let (bob, bob_moni) = h.funded("bob", "Bob", 0).await;

        let err = h
            .engine
            .perform_transfer(&alice, send_spec(5_000, bob_moni.as_str(), None))
            .await
            .unwrap_err();
        match err {
            TransferError::InsufficientFunds { balance, requested } => {
                assert_eq!(balance, 1_000);
                assert_eq!(requested, 5_000);
            }
            other => panic!("expected insufficient funds, got {other}"),
        }

        assert_eq!(h.store.balance_of(&alice), Some(1_000));
        assert_eq!(h.store.balance_of(&bob), Some(0));
        assert!(h.notifications.notifications_for(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_failure_rolls_the_whole_transfer_back() {
        let h = TestHarness::new();
        let (alice, _) = h.funded("alice", "Alice", 10_000).await;
        let (bob, bob_moni) = h.funded("bob", "Bob", 0).await;

        h.store.set_fail_commit(true);
        let err = h
            .engine
            .perform_transfer(&alice, send_spec(4_000, bob_moni.as_str(), None))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::StoreUnavailable(_)));

        // nothing moved, nothing was recorded
        assert_eq!(h.store.balance_of(&alice), Some(10_000));
        assert_eq!(h.store.balance_of(&bob), Some(0));
        assert!(h.engine.history(&bob, 10).await.unwrap().is_empty());
        assert!(h.notifications.notifications_for(&bob).await.unwrap().is_empty());

        // same submission succeeds once the store recovers
        h.store.set_fail_commit(false);
        h.engine
            .perform_transfer(&alice, send_spec(4_000, bob_moni.as_str(), None))
            .await
            .unwrap();
        assert_eq!(h.store.balance_of(&alice), Some(6_000));
        assert_eq!(h.store.balance_of(&bob), Some(4_000));
    }

    // ========================================================================
    // Documented Sharp Edges
    // ========================================================================

    #[tokio::test]
    async fn identical_resubmission_pays_twice() {
        let h = TestHarness::new();
        let (alice, _) = h.funded("alice", "Alice", 10_000).await;
        let (bob, bob_moni) = h.funded("bob", "Bob", 0).await;

        let spec = send_spec(2_000, bob_moni.as_str(), Some("rent"));
        let first = h
            .engine
            .perform_transfer(&alice, spec.clone())
            .await
            .unwrap();
        let second = h.engine.perform_transfer(&alice, spec).await.unwrap();

        // no idempotency key: two distinct transfers, double the money
        assert_ne!(first.transfer_id, second.transfer_id);
        assert_eq!(h.store.balance_of(&alice), Some(6_000));
        assert_eq!(h.store.balance_of(&bob), Some(4_000));
        assert_eq!(h.notifications.unread_count(&bob).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn sending_to_your_own_wallet_is_a_net_zero_round_trip() {
        let h = TestHarness::new();
        let (alice, alice_moni) = h.funded("alice", "Alice", 10_000).await;

        let receipt = h
            .engine
            .perform_transfer(&alice, send_spec(1_000, alice_moni.as_str(), None))
            .await
            .unwrap();

        assert_eq!(h.store.balance_of(&alice), Some(10_000));
        let history = h.engine.history(&alice, 10).await.unwrap();
        let legs: Vec<_> = history
            .iter()
            .filter(|p| p.transfer_id == receipt.transfer_id)
            .collect();
        assert_eq!(legs.len(), 2);
    }

    #[tokio::test]
    async fn first_transfer_provisions_the_sender_wallet() {
        let h = TestHarness::new();
        let fresh = AccountKey::new("newcomer");

        h.engine
            .perform_transfer(&fresh, deposit_spec(5_000))
            .await
            .unwrap();

        let account = h.accounts.account(&fresh).await.unwrap().unwrap();
        assert_eq!(account.balance, 5_000);
        assert_eq!(account.display_name, "Unknown");
        assert!(account.moni_number.as_str().starts_with("MN1000"));
    }
}
