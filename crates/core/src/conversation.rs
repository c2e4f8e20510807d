//! Conversation-related types.

/// Who wrote a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The person typing into the shell.
    User,
    /// The agent.
    Assistant,
}

/// A message in the transcript. Messages are immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Returns the role of the author.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text of this message.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// The ordered, append-only history of a session.
#[derive(Clone, Default, Debug)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Creates a transcript seeded with an assistant greeting.
    #[inline]
    pub fn with_greeting<S: Into<String>>(greeting: S) -> Self {
        Self {
            messages: vec![Message::assistant(greeting)],
        }
    }

    /// Appends a message to the end of the transcript.
    #[inline]
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Returns a copy of all messages in chronological order.
    #[inline]
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Borrows the messages without copying.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if nothing has been appended yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the most recent message.
    #[inline]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut transcript = Transcript::with_greeting("Hi there");
        transcript.append(Message::user("What is Rust?"));
        transcript.append(Message::assistant("A language."));

        let roles: Vec<_> = transcript.messages().iter().map(Message::role).collect();
        assert_eq!(roles, [Role::Assistant, Role::User, Role::Assistant]);
        assert_eq!(transcript.last().unwrap().content(), "A language.");
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut transcript = Transcript::with_greeting("Hi there");
        let snapshot = transcript.snapshot();
        transcript.append(Message::user("Hello"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(transcript.len(), 2);
        assert_eq!(snapshot[0], transcript.messages()[0]);
    }
}
