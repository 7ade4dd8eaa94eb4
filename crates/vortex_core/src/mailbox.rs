//! # Feedback Mailbox
//!
//! Single-slot channel between the engine and the decoder.
//!
//! ```text
//! ┌────────┐  publish(Vec<i32>)  ┌──────┐  take(session, tick)  ┌────────────┐
//! │ Engine │────────────────────>│ slot │──────────────────────>│ Simulation │
//! └────────┘                     └──────┘                       └────────────┘
//! ```
//!
//! The engine refills the slot once per tick. Reading twice in one tick is a
//! contract violation on the engine side, so the mailbox refuses the second
//! read before it reaches the channel. Ticks restart with every session, so
//! reads are stamped with `(session, tick)`.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::error::{CoreError, CoreResult};

/// Creates a connected publisher/mailbox pair.
#[must_use]
pub fn feedback_channel() -> (FeedbackPublisher, FeedbackMailbox) {
    let (sender, receiver) = bounded(1);
    (FeedbackPublisher { sender }, FeedbackMailbox { receiver, last_read: None })
}

/// Engine end.
#[derive(Clone, Debug)]
pub struct FeedbackPublisher {
    sender: Sender<Vec<i32>>,
}

impl FeedbackPublisher {
    /// Publishes one tick's statistics (non-blocking).
    ///
    /// Returns `false` if the previous buffer was not read yet or the
    /// mailbox is gone; the buffer is dropped in that case.
    #[inline]
    pub fn publish(&self, stats: Vec<i32>) -> bool {
        match self.sender.try_send(stats) {
            Ok(()) => true,
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Simulation end.
#[derive(Debug)]
pub struct FeedbackMailbox {
    receiver: Receiver<Vec<i32>>,
    last_read: Option<(u64, u64)>,
}

impl FeedbackMailbox {
    /// Takes the buffer for `tick` of `session`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::FeedbackAlreadyRead`] if this tick of this session was
    ///   already read. The channel is not touched.
    /// - [`CoreError::FeedbackUnavailable`] if nothing is published.
    pub fn take(&mut self, session: u64, tick: u64) -> CoreResult<Vec<i32>> {
        if self.last_read == Some((session, tick)) {
            return Err(CoreError::FeedbackAlreadyRead { tick });
        }
        let stats = self.receiver.try_recv().map_err(|_| CoreError::FeedbackUnavailable)?;
        self.last_read = Some((session, tick));
        Ok(stats)
    }

    /// Whether a buffer is waiting.
    #[inline]
    #[must_use]
    pub fn has_feedback(&self) -> bool {
        !self.receiver.is_empty()
    }

    /// Last `(session, tick)` that was read.
    #[must_use]
    pub fn last_read(&self) -> Option<(u64, u64)> {
        self.last_read
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_read_per_tick() {
        let (publisher, mut mailbox) = feedback_channel();
        assert!(publisher.publish(vec![1, 2, 3]));
        assert!(mailbox.has_feedback());

        assert_eq!(mailbox.take(1, 1).unwrap(), vec![1, 2, 3]);
        assert!(publisher.publish(vec![4]));
        assert_eq!(mailbox.take(1, 1), Err(CoreError::FeedbackAlreadyRead { tick: 1 }));
        // The refused read left the buffer in place.
        assert!(mailbox.has_feedback());
        assert_eq!(mailbox.take(1, 2).unwrap(), vec![4]);
        assert_eq!(mailbox.last_read(), Some((1, 2)));
    }

    #[test]
    fn test_new_session_reads_same_tick() {
        let (publisher, mut mailbox) = feedback_channel();
        assert!(publisher.publish(vec![1]));
        assert_eq!(mailbox.take(1, 1).unwrap(), vec![1]);

        assert!(publisher.publish(vec![2]));
        assert_eq!(mailbox.take(2, 1).unwrap(), vec![2]);
        assert_eq!(mailbox.last_read(), Some((2, 1)));
    }

    #[test]
    fn test_unavailable_before_publish() {
        let (_publisher, mut mailbox) = feedback_channel();
        assert_eq!(mailbox.take(1, 0), Err(CoreError::FeedbackUnavailable));
        assert_eq!(mailbox.last_read(), None);
    }

    #[test]
    fn test_slot_holds_one_buffer() {
        let (publisher, _mailbox) = feedback_channel();
        assert!(publisher.publish(vec![1]));
        assert!(!publisher.publish(vec![2]));
    }
}
