//! Streaming delta reassembly
//!
//! A streaming completion arrives as a line-oriented event stream. The
//! reassembler classifies each line, emits decoded text fragments to the
//! consumer as they arrive, and commits the full accumulation to the
//! conversation exactly once, when the transport stream is exhausted.
//!
//! Dropping the returned stream before exhaustion commits nothing.

use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::conversation::Conversation;
use crate::error::{Error, Result};
use crate::message::Message;

/// A lazy, forward-only sequence of text lines from a transport
pub type LineStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Classification of one line from a provider event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A decoded incremental text fragment
    Delta(String),
    /// A well-formed frame carrying no text (control events, keep-alives)
    Control,
    /// An undecodable frame, dropped without aborting the stream
    Discard,
}

struct Session<'a, S, D> {
    lines: S,
    conversation: &'a mut Conversation,
    decode: D,
    accumulated: String,
}

/// Reassemble streamed text deltas into fragments and a final message
///
/// Each line is classified by `decode`. `Frame::Delta` fragments are emitted
/// in arrival order and appended to an accumulator; `Control` and `Discard`
/// frames are skipped ([`Discard`] is logged). When `lines` ends, exactly one
/// assistant message holding the full accumulation (possibly empty) is
/// appended to `conversation` and the fragment stream ends.
///
/// A transport error is yielded to the consumer and terminates the stream
/// without appending anything; the same holds if the consumer drops the
/// stream early. The concatenation of every emitted fragment always equals
/// the appended content.
///
/// [`Discard`]: Frame::Discard
pub fn reassemble<'a, S, D>(
    lines: S,
    conversation: &'a mut Conversation,
    decode: D,
) -> impl Stream<Item = Result<String>> + 'a
where
    S: Stream<Item = Result<String>> + Unpin + 'a,
    D: FnMut(&str) -> Frame + 'a,
{
    let session = Session {
        lines,
        conversation,
        decode,
        accumulated: String::new(),
    };

    futures::stream::unfold(Some(session), |state| async move {
        let mut session = state?;
        loop {
            match session.lines.next().await {
                Some(Ok(line)) => match (session.decode)(&line) {
                    Frame::Delta(delta) => {
                        session.accumulated.push_str(&delta);
                        return Some((Ok(delta), Some(session)));
                    }
                    Frame::Control => continue,
                    Frame::Discard => {
                        tracing::warn!(len = line.len(), "dropping undecodable stream frame");
                        continue;
                    }
                },
                Some(Err(e)) => {
                    // Hard failure: surface the error and end without commit.
                    return Some((Err(e), None));
                }
                None => {
                    let content = std::mem::take(&mut session.accumulated);
                    session.conversation.add_message(Message::assistant(content));
                    return None;
                }
            }
        }
    })
}

/// Builder for canned line streams (useful for testing)
#[derive(Default)]
pub struct MockLineStream {
    lines: Vec<Result<String>>,
}

impl MockLineStream {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line
    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(Ok(line.into()));
        self
    }

    /// Add a transport error
    pub fn error(mut self, error: Error) -> Self {
        self.lines.push(Err(error));
        self
    }

    /// Build the stream
    pub fn build(self) -> LineStream {
        Box::pin(futures::stream::iter(self.lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    fn decode(line: &str) -> Frame {
        if line.is_empty() {
            return Frame::Control;
        }
        match line.strip_prefix("delta:") {
            Some(rest) => Frame::Delta(rest.to_string()),
            None => Frame::Discard,
        }
    }

    async fn collect_fragments(
        lines: LineStream,
        conversation: &mut Conversation,
    ) -> Vec<Result<String>> {
        reassemble(lines, conversation, decode).collect().await
    }

    #[tokio::test]
    async fn test_fragments_concatenate_to_final_content() {
        let lines = MockLineStream::new()
            .line("delta:Hel")
            .line("delta:lo, ")
            .line("delta:world")
            .build();

        let mut conversation = Conversation::new();
        let fragments = collect_fragments(lines, &mut conversation).await;

        let emitted: Vec<String> = fragments
            .into_iter()
            .map(|f| f.expect("no errors expected"))
            .collect();
        assert_eq!(emitted, vec!["Hel", "lo, ", "world"]);

        assert_eq!(conversation.len(), 1);
        let message = conversation.last_message().expect("message appended");
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.text(), "Hello, world");
    }

    #[tokio::test]
    async fn test_empty_stream_appends_empty_message() {
        let lines = MockLineStream::new().build();

        let mut conversation = Conversation::new();
        let fragments = collect_fragments(lines, &mut conversation).await;

        assert!(fragments.is_empty());
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.last_message().map(|m| m.text()).as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_garbage_frames_dropped() {
        let lines = MockLineStream::new()
            .line("delta:A")
            .line("garbage")
            .line("")
            .line("delta:B")
            .build();

        let mut conversation = Conversation::new();
        let fragments = collect_fragments(lines, &mut conversation).await;

        let emitted: Vec<String> = fragments
            .into_iter()
            .map(|f| f.expect("no errors expected"))
            .collect();
        assert_eq!(emitted, vec!["A", "B"]);
        assert_eq!(conversation.last_message().map(|m| m.text()).as_deref(), Some("AB"));
    }

    #[tokio::test]
    async fn test_abandoned_stream_commits_nothing() {
        let lines = MockLineStream::new()
            .line("delta:A")
            .line("delta:B")
            .build();

        let mut conversation = Conversation::new();
        {
            let mut fragments = Box::pin(reassemble(lines, &mut conversation, decode));
            let first = fragments.next().await;
            assert_eq!(first.map(|f| f.expect("fragment")), Some("A".to_string()));
            // Consumer walks away mid-stream.
        }

        assert!(conversation.is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_aborts_without_commit() {
        let lines = MockLineStream::new()
            .line("delta:A")
            .error(Error::ProviderApi("connection reset".to_string()))
            .build();

        let mut conversation = Conversation::new();
        let fragments = collect_fragments(lines, &mut conversation).await;

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].as_deref().expect("first fragment"), "A");
        assert!(fragments[1].is_err());
        assert!(conversation.is_empty());
    }
}
