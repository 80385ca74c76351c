use {tokio::sync::mpsc, tracing::debug, tradepost_protocol::Event};

use crate::ConnId;

/// One snapshotted fan-out target: the connection id (for logging) and a
/// clone of its outbound queue.
pub type Recipient = (ConnId, mpsc::UnboundedSender<String>);

/// Push one event to an already-snapshotted recipient set.
///
/// The event is serialized once; delivery is best-effort and never blocks —
/// a recipient whose write loop has stopped is skipped, with no retry and
/// no delivery guarantee. Recipient sets are snapshotted under the state
/// lock by the caller, so a connection mid-teardown is never listed.
pub fn deliver(recipients: &[Recipient], event: &Event) {
    let line = event.to_line();
    for (conn_id, sender) in recipients {
        if sender.send(line.clone()).is_err() {
            debug!(%conn_id, "skipping broadcast to closed connection");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn delivers_to_every_open_recipient() {
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let recipients = vec![(ConnId::new_v4(), tx1), (ConnId::new_v4(), tx2)];

        deliver(&recipients, &Event::UserCount { count: 2 });

        assert_eq!(rx1.recv().await.unwrap(), r#"{"type":"userCount","count":2}"#);
        assert_eq!(rx2.recv().await.unwrap(), r#"{"type":"userCount","count":2}"#);
    }

    #[tokio::test]
    async fn closed_recipient_does_not_stop_the_rest() {
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        drop(rx1);
        let recipients = vec![(ConnId::new_v4(), tx1), (ConnId::new_v4(), tx2)];

        deliver(&recipients, &Event::UserCount { count: 1 });

        assert!(rx2.recv().await.is_some());
    }
}
