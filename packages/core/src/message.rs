//! Mailbox message types.

/// A message travelling through a gen-server mailbox.
///
/// `Terminate` is the control message that ends the receive loop; every other
/// message carries an application payload for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<T> {
    /// Stop processing and exit.
    Terminate,
    /// Application payload handed to the dispatcher.
    Payload(T),
}

impl<T> Message<T> {
    /// Check if this is the terminate message.
    pub fn is_terminate(&self) -> bool {
        matches!(self, Message::Terminate)
    }

    /// Take the payload, if any.
    pub fn into_payload(self) -> Option<T> {
        match self {
            Message::Terminate => None,
            Message::Payload(payload) => Some(payload),
        }
    }
}

impl<T> From<T> for Message<T> {
    fn from(payload: T) -> Self {
        Message::Payload(payload)
    }
}

/// Outcome of writing a message to a mailbox.
///
/// Sending never fails loudly; the outcome is returned for callers that care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The message was queued in the mailbox.
    Delivered,
    /// No worker is registered under the name.
    NotFound,
    /// The worker has exited and its mailbox is closed.
    Closed,
    /// The mailbox had no free slot and the send did not wait.
    Full,
    /// The mailbox stayed full for the configured send timeout.
    TimedOut,
    /// The caller cancelled the send while waiting for capacity.
    Cancelled,
}

impl Delivery {
    /// Check if the message reached the mailbox.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered)
    }

    /// Get a simple string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Delivery::Delivered => "delivered",
            Delivery::NotFound => "not_found",
            Delivery::Closed => "closed",
            Delivery::Full => "full",
            Delivery::TimedOut => "timed_out",
            Delivery::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_and_terminate_are_distinguished() {
        let message: Message<u32> = 7.into();
        assert!(!message.is_terminate());
        assert_eq!(message.into_payload(), Some(7));

        let stop: Message<u32> = Message::Terminate;
        assert!(stop.is_terminate());
        assert_eq!(stop.into_payload(), None);
    }

    #[test]
    fn only_delivered_counts_as_delivered() {
        assert!(Delivery::Delivered.is_delivered());
        for outcome in [
            Delivery::NotFound,
            Delivery::Closed,
            Delivery::Full,
            Delivery::TimedOut,
            Delivery::Cancelled,
        ] {
            assert!(!outcome.is_delivered(), "{outcome}");
        }
    }
}
