// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capturing subscriber double.

use std::sync::Mutex;

use async_trait::async_trait;

use linkio_core::error::LinkioError;
use linkio_core::traits::Subscriber;
use linkio_core::types::Notification;

/// A subscriber that records every notification pushed at it.
pub struct MockSubscriber {
    id: String,
    received: Mutex<Vec<Notification>>,
    fail_next: Mutex<bool>,
}

impl MockSubscriber {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            received: Mutex::new(Vec::new()),
            fail_next: Mutex::new(false),
        }
    }

    /// All notifications received so far, in delivery order.
    pub fn received(&self) -> Vec<Notification> {
        self.received.lock().unwrap().clone()
    }

    pub fn received_count(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.received.lock().unwrap().clear();
    }

    /// Make the next `notify` call fail with a channel error.
    pub fn fail_next(&self) {
        *self.fail_next.lock().unwrap() = true;
    }
}

#[async_trait]
impl Subscriber for MockSubscriber {
    fn id(&self) -> &str {
        &self.id
    }

    async fn notify(&self, note: Notification) -> Result<(), LinkioError> {
        let mut fail = self.fail_next.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(LinkioError::Channel {
                message: "mock subscriber failure".into(),
                source: None,
            });
        }
        drop(fail);
        self.received.lock().unwrap().push(note);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkio_core::types::StatusPhase;

    #[tokio::test]
    async fn captures_in_order() {
        let sub = MockSubscriber::new("s1");
        sub.notify(Notification::status(StatusPhase::Connecting))
            .await
            .unwrap();
        sub.notify(Notification::status(StatusPhase::Open))
            .await
            .unwrap();
        let received = sub.received();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0], Notification::status(StatusPhase::Connecting));
        assert_eq!(received[1], Notification::status(StatusPhase::Open));
    }

    #[tokio::test]
    async fn fail_next_fails_once() {
        let sub = MockSubscriber::new("s1");
        sub.fail_next();
        assert!(sub
            .notify(Notification::status(StatusPhase::Open))
            .await
            .is_err());
        assert!(sub
            .notify(Notification::status(StatusPhase::Open))
            .await
            .is_ok());
        assert_eq!(sub.received_count(), 1);
    }
}
