//! Paced word streaming of generated answers.

use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::Sleep;

/// Yields an answer word by word, each followed by a single space.
///
/// After every token the stream waits `pacing` before producing the next
/// one. Words are split on whitespace, so runs of spaces and newlines
/// collapse. Dropping the stream stops emission.
pub struct TokenStream {
    words: std::vec::IntoIter<String>,
    pacing: Duration,
    delay: Option<Pin<Box<Sleep>>>,
}

impl TokenStream {
    pub fn new(text: &str, pacing: Duration) -> Self {
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        Self {
            words: words.into_iter(),
            pacing,
            delay: None,
        }
    }
}

impl Stream for TokenStream {
    type Item = String;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        let this = self.get_mut();

        if let Some(delay) = this.delay.as_mut() {
            if delay.as_mut().poll(cx).is_pending() {
                return Poll::Pending;
            }
            this.delay = None;
        }

        match this.words.next() {
            Some(word) => {
                if !this.pacing.is_zero() {
                    this.delay = Some(Box::pin(tokio::time::sleep(this.pacing)));
                }
                Poll::Ready(Some(word + " "))
            }
            None => Poll::Ready(None),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.words.len(), Some(self.words.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_tokens_carry_trailing_space() {
        let tokens: Vec<String> = TokenStream::new("Hola mundo", Duration::ZERO).collect().await;
        assert_eq!(tokens, vec!["Hola ", "mundo "]);
    }

    #[tokio::test]
    async fn test_whitespace_collapses() {
        let tokens: Vec<String> =
            TokenStream::new("  Uno\n\ndos   tres ", Duration::ZERO).collect().await;
        assert_eq!(tokens, vec!["Uno ", "dos ", "tres "]);
    }

    #[tokio::test]
    async fn test_empty_answer() {
        let mut stream = TokenStream::new("", Duration::from_millis(50));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_between_tokens() {
        let start = tokio::time::Instant::now();
        let tokens: Vec<String> =
            TokenStream::new("a b c", Duration::from_millis(50)).collect().await;

        assert_eq!(tokens.len(), 3);
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_exhausted_stream_stays_done() {
        let mut stream = TokenStream::new("fin", Duration::ZERO);
        assert_eq!(stream.next().await.as_deref(), Some("fin "));
        assert_eq!(stream.next().await, None);
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_size_hint_counts_down() {
        let mut stream = TokenStream::new("Hola mundo", Duration::ZERO);
        assert_eq!(stream.size_hint(), (2, Some(2)));
        stream.next().await;
        assert_eq!(stream.size_hint(), (1, Some(1)));
    }
}
