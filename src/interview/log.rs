use super::types::Message;

/// Append-only sequence of messages for the active session.
///
/// Timestamps never decrease along the log, so sorting by timestamp always
/// gives back the append order.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log holding a single message
    pub fn with_first(message: Message) -> Self {
        Self {
            messages: vec![message],
        }
    }

    /// Rebuild a log from a stored snapshot
    pub fn from_snapshot(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn append(&mut self, mut message: Message) -> &Message {
        if let Some(last) = self.messages.last() {
            message.timestamp = message.timestamp.max(last.timestamp);
        }
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }
}
