//! Outbox worker: drains queued [`ServerMessage`]s on the tokio runtime.
//!
//! Messages are delivered one at a time.  Pending submissions go before
//! pending actions; each queue keeps its own order.  Action and
//! common-word failures are only logged.  Every `Update` produces a
//! [`DeliveryReport`] so the UI can tell a stored revision from a lost one.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{DeliveryReport, OutboxQueues, ReviewTransport, ServerMessage};

/// Run until every [`Outbox`](super::Outbox) sender has been dropped and
/// both queues are empty.
pub async fn run_outbox(
    transport: Arc<dyn ReviewTransport>,
    queues: OutboxQueues,
    report_tx: mpsc::Sender<DeliveryReport>,
) {
    log::info!("outbox: worker started");

    let OutboxQueues {
        mut submissions,
        mut actions,
    } = queues;
    let mut submissions_open = true;
    let mut actions_open = true;

    while submissions_open || actions_open {
        tokio::select! {
            biased;
            msg = submissions.recv(), if submissions_open => match msg {
                Some(msg) => deliver(transport.as_ref(), msg, &report_tx).await,
                None => submissions_open = false,
            },
            msg = actions.recv(), if actions_open => match msg {
                Some(msg) => deliver(transport.as_ref(), msg, &report_tx).await,
                None => actions_open = false,
            },
        }
    }

    log::info!("outbox: queues closed, worker exiting");
}

async fn deliver(
    transport: &dyn ReviewTransport,
    msg: ServerMessage,
    report_tx: &mpsc::Sender<DeliveryReport>,
) {
    match msg {
        ServerMessage::Action {
            job_id,
            button,
            utterance,
            current_time,
        } => {
            if let Err(e) = transport
                .action_register(&job_id, button, &utterance, current_time)
                .await
            {
                log::warn!("outbox: action {} not delivered: {e}", button.as_str());
            }
        }

        ServerMessage::Update {
            job_id,
            utterance,
            revision,
            text,
        } => {
            let report = match transport
                .update_transcription(&job_id, &utterance, &text)
                .await
            {
                Ok(()) => {
                    log::debug!("outbox: submitted {utterance} (revision {revision})");
                    DeliveryReport::Submitted {
                        utterance,
                        revision,
                    }
                }
                Err(e) => {
                    log::warn!("outbox: submission of {utterance} failed: {e}");
                    DeliveryReport::Failed {
                        utterance,
                        revision,
                        reason: e.to_string(),
                    }
                }
            };
            // The UI may already be gone on shutdown.
            let _ = report_tx.send(report).await;
        }

        ServerMessage::CommonWord {
            job_id,
            utterance,
            word,
        } => {
            if let Err(e) = transport.add_word(&job_id, &utterance, &word).await {
                log::warn!("outbox: common word {word:?} not delivered: {e}");
            }
        }
    }
}

/// Wait up to `limit` for a spawned [`run_outbox`] to deliver what is still
/// queued.  Every `Outbox` must already be dropped.  Returns whether the
/// worker finished in time.
pub async fn drain_outbox(worker: JoinHandle<()>, limit: Duration) -> bool {
    match tokio::time::timeout(limit, worker).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            log::warn!("outbox: worker ended abnormally: {e}");
            false
        }
        Err(_) => {
            log::warn!("outbox: undelivered messages dropped after {limit:?}");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::session::UtteranceId;
    use crate::transport::{ActionKind, Outbox, TransportError};

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Records every call; fails updates whose text equals `fail_text`.
    /// Each call takes `delay` when set.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        fail_text: Option<String>,
        delay: Option<Duration>,
    }

    impl Recorder {
        async fn record(&self, call: String) {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl ReviewTransport for Recorder {
        async fn action_register(
            &self,
            _job_id: &str,
            button: ActionKind,
            utterance: &UtteranceId,
            _current_time: f64,
        ) -> Result<(), TransportError> {
            self.record(format!("action:{}:{utterance}", button.as_str()))
                .await;
            Err(TransportError::Timeout)
        }

        async fn update_transcription(
            &self,
            _job_id: &str,
            utterance: &UtteranceId,
            text: &str,
        ) -> Result<(), TransportError> {
            self.record(format!("update:{utterance}:{text}")).await;
            if self.fail_text.as_deref() == Some(text) {
                return Err(TransportError::Rejected("locked".into()));
            }
            Ok(())
        }

        async fn add_word(
            &self,
            _job_id: &str,
            _utterance: &UtteranceId,
            word: &str,
        ) -> Result<(), TransportError> {
            self.record(format!("word:{word}")).await;
            Ok(())
        }

        async fn fetch_words(&self, _url: &str) -> Result<Vec<String>, TransportError> {
            Ok(Vec::new())
        }
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn delivers_submissions_first_and_reports_updates() {
        let transport = Arc::new(Recorder {
            fail_text: Some("bad".into()),
            ..Recorder::default()
        });
        let (outbox, queues) = Outbox::channel("9", 16);
        let (report_tx, mut report_rx) = mpsc::channel(16);

        let u1 = UtteranceId::from("u1");
        let u2 = UtteranceId::from("u2");
        outbox.action(ActionKind::Tick, &u1, 0.0);
        outbox.submit(&u1, 1, "the sat").unwrap();
        outbox.common_word(&u1, "cat").unwrap();
        outbox.action(ActionKind::Next, &u1, 0.0);
        outbox.submit(&u2, 1, "bad").unwrap();
        drop(outbox);

        run_outbox(transport.clone(), queues, report_tx).await;

        assert_eq!(
            *transport.calls.lock().unwrap(),
            vec![
                "update:u1:the sat".to_string(),
                "word:cat".to_string(),
                "update:u2:bad".to_string(),
                "action:tick:u1".to_string(),
                "action:next:u1".to_string(),
            ]
        );

        assert_eq!(
            report_rx.recv().await,
            Some(DeliveryReport::Submitted {
                utterance: u1,
                revision: 1
            })
        );
        assert!(matches!(
            report_rx.recv().await,
            Some(DeliveryReport::Failed { utterance, revision: 1, .. }) if utterance == u2
        ));
    }

    #[tokio::test]
    async fn failed_actions_do_not_stop_the_worker() {
        let transport = Arc::new(Recorder::default());
        let (outbox, queues) = Outbox::channel("9", 16);
        let (report_tx, mut report_rx) = mpsc::channel(16);

        let u1 = UtteranceId::from("u1");
        outbox.action(ActionKind::Next, &u1, 0.0);
        outbox.action(ActionKind::Previous, &u1, 0.0);
        outbox.submit(&u1, 3, "ok").unwrap();
        drop(outbox);

        run_outbox(transport.clone(), queues, report_tx).await;

        assert_eq!(transport.calls.lock().unwrap().len(), 3);
        assert_eq!(
            report_rx.recv().await,
            Some(DeliveryReport::Submitted {
                utterance: u1,
                revision: 3
            })
        );
    }

    #[tokio::test]
    async fn drain_waits_for_queued_submissions() {
        let transport = Arc::new(Recorder {
            delay: Some(Duration::from_millis(100)),
            ..Recorder::default()
        });
        let (outbox, queues) = Outbox::channel("9", 16);
        let (report_tx, _report_rx) = mpsc::channel(16);
        let worker = tokio::spawn(run_outbox(transport.clone(), queues, report_tx));

        let u1 = UtteranceId::from("u1");
        outbox.action(ActionKind::Tick, &u1, 0.0);
        outbox.submit(&u1, 1, "the sat").unwrap();
        drop(outbox);

        assert!(drain_outbox(worker, Duration::from_secs(10)).await);
        assert_eq!(
            *transport.calls.lock().unwrap(),
            vec!["update:u1:the sat".to_string(), "action:tick:u1".to_string()]
        );
    }

    #[tokio::test]
    async fn drain_gives_up_after_the_limit() {
        let transport = Arc::new(Recorder {
            delay: Some(Duration::from_secs(5)),
            ..Recorder::default()
        });
        let (outbox, queues) = Outbox::channel("9", 16);
        let (report_tx, _report_rx) = mpsc::channel(16);
        let worker = tokio::spawn(run_outbox(transport.clone(), queues, report_tx));

        outbox.submit(&UtteranceId::from("u1"), 1, "slow").unwrap();
        drop(outbox);

        assert!(!drain_outbox(worker, Duration::from_millis(20)).await);
        assert!(transport.calls.lock().unwrap().is_empty());
    }
}
