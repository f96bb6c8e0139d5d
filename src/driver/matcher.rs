//! Waits on installer output for the next prompt-level event.

use crate::PromptTable;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};

/// Output kept while waiting for a prompt. Older text is discarded.
const MAX_BUFFER_BYTES: usize = 64 * 1024;

/// What the installer did next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WaitEvent {
    /// A prompt rule matched.
    Prompt {
        /// Position of the rule in the table.
        rule: usize,
        /// Output between the previous event and the match.
        before: String,
        /// The matched text.
        matched: String,
    },
    /// The installer went quiet on something that looks like a question no
    /// rule recognises.
    Unrecognized {
        /// Output since the previous event.
        text: String,
    },
    /// The output stream closed.
    EndOfOutput,
    /// The session deadline passed.
    TimedOut {
        /// Output since the previous event.
        buffered: String,
    },
}

/// Buffers terminal output and turns it into [`WaitEvent`]s.
pub(crate) struct OutputMatcher<'a> {
    output: mpsc::Receiver<String>,
    table: &'a PromptTable,
    buffer: String,
    stripper: AnsiStripper,
    // rest of an answered prompt's line is still arriving
    skip_line: bool,
    closed: bool,
    idle_prompt: Duration,
}

impl<'a> OutputMatcher<'a> {
    pub(crate) fn new(
        output: mpsc::Receiver<String>,
        table: &'a PromptTable,
        idle_prompt: Duration,
    ) -> Self {
        Self {
            output,
            table,
            buffer: String::new(),
            stripper: AnsiStripper::default(),
            skip_line: false,
            closed: false,
            idle_prompt,
        }
    }

    /// Wait for the next event, giving up at `deadline`.
    ///
    /// Each raw chunk is passed to `on_chunk` as it arrives. Prompts already
    /// in the buffer are reported before end of output, so a final prompt
    /// written just before the stream closes is still answered.
    ///
    /// A matched prompt consumes the rest of its line, so one question is
    /// answered once and its trailing text is never searched again.
    pub(crate) async fn next_event<F>(&mut self, deadline: Instant, mut on_chunk: F) -> WaitEvent
    where
        F: FnMut(&str),
    {
        loop {
            if let Some(m) = self.table.find(&self.buffer) {
                let before = self.buffer[..m.start].to_string();
                let matched = self.buffer[m.start..m.end].to_string();
                self.consume_line(m.end);
                return WaitEvent::Prompt {
                    rule: m.rule,
                    before,
                    matched,
                };
            }

            if self.closed {
                return WaitEvent::EndOfOutput;
            }

            let now = Instant::now();
            if now >= deadline {
                return WaitEvent::TimedOut {
                    buffered: std::mem::take(&mut self.buffer),
                };
            }

            let wake = (now + self.idle_prompt).min(deadline);
            match timeout_at(wake, self.output.recv()).await {
                Ok(Some(chunk)) => {
                    on_chunk(&chunk);
                    self.push(&chunk);
                }
                Ok(None) => self.closed = true,
                Err(_) if Instant::now() >= deadline => {
                    return WaitEvent::TimedOut {
                        buffered: std::mem::take(&mut self.buffer),
                    };
                }
                Err(_) => {
                    if looks_like_prompt(&self.buffer) {
                        return WaitEvent::Unrecognized {
                            text: std::mem::take(&mut self.buffer),
                        };
                    }
                }
            }
        }
    }

    /// Drop the buffer up to the end of the line containing `from`.
    fn consume_line(&mut self, from: usize) {
        match self.buffer[from..].find('\n') {
            Some(newline) => {
                self.buffer.drain(..from + newline + 1);
            }
            None => {
                self.buffer.clear();
                self.skip_line = true;
            }
        }
    }

    fn push(&mut self, chunk: &str) {
        let text = self.stripper.strip(chunk);
        let text = if self.skip_line {
            match text.find('\n') {
                Some(newline) => {
                    self.skip_line = false;
                    &text[newline + 1..]
                }
                None => "",
            }
        } else {
            text.as_str()
        };
        self.buffer.push_str(text);

        if self.buffer.len() > MAX_BUFFER_BYTES {
            let mut cut = self.buffer.len() - MAX_BUFFER_BYTES;
            while !self.buffer.is_char_boundary(cut) {
                cut += 1;
            }
            self.buffer.drain(..cut);
        }
    }
}

/// Removes ANSI escapes from a chunked stream.
///
/// One parser sees every chunk, so an escape sequence split across two reads
/// is still removed whole. Line endings are normalized to `\n` first, since
/// the parser discards carriage returns.
pub(crate) struct AnsiStripper {
    writer: strip_ansi_escapes::Writer<SharedBuffer>,
    output: SharedBuffer,
}

impl Default for AnsiStripper {
    fn default() -> Self {
        let output = SharedBuffer::default();
        Self {
            writer: strip_ansi_escapes::Writer::new(output.clone()),
            output,
        }
    }
}

impl AnsiStripper {
    /// Strip `chunk`, holding back an unfinished escape for the next call.
    pub(crate) fn strip(&mut self, chunk: &str) -> String {
        let normalized = chunk.replace("\r\n", "\n").replace('\r', "\n");
        // the writer buffers by line until flushed
        if let Err(e) = self
            .writer
            .write_all(normalized.as_bytes())
            .and_then(|_| self.writer.flush())
        {
            tracing::warn!(error = %e, "ansi stripping failed, passing chunk through");
            return strip_ansi_escapes::strip_str(&normalized);
        }
        String::from_utf8_lossy(&self.output.take()).into_owned()
    }
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Whether quiet output ends in something shaped like a question.
pub(crate) fn looks_like_prompt(text: &str) -> bool {
    let Some(line) = text.lines().rev().map(str::trim).find(|l| !l.is_empty()) else {
        return false;
    };

    // clack marks the active question with a filled diamond
    line.contains('◆') || line.ends_with(['?', ':', '›', '❯', '>'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(chunks: &[&str], close: bool) -> (mpsc::Receiver<String>, Option<mpsc::Sender<String>>) {
        let (tx, rx) = mpsc::channel(chunks.len() + 1);
        for chunk in chunks {
            tx.try_send(chunk.to_string()).unwrap();
        }
        (rx, if close { None } else { Some(tx) })
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    #[test]
    fn test_stripper_removes_escapes() {
        let mut stripper = AnsiStripper::default();
        assert_eq!(stripper.strip("\x1b[1m◆\x1b[0m  Name?\r\n"), "◆  Name?\n");
        assert_eq!(stripper.strip("a\rb"), "a\nb");
    }

    #[test]
    fn test_stripper_joins_split_escape() {
        let mut stripper = AnsiStripper::default();
        assert_eq!(stripper.strip("◆  Choose output\x1b["), "◆  Choose output");
        assert_eq!(stripper.strip("0m folder\n"), " folder\n");
    }

    #[test]
    fn test_looks_like_prompt() {
        assert!(looks_like_prompt("Pick a colour theme?"));
        assert!(looks_like_prompt("◆  Choose an IDE\n│  ○ cursor\n│  ● vscode\n◆ pick"));
        assert!(looks_like_prompt("Password:   \n\n"));
        assert!(!looks_like_prompt("Downloading packages..."));
        assert!(!looks_like_prompt("   \n"));
    }

    #[tokio::test]
    async fn test_prompts_in_order_then_end() {
        let table = PromptTable::standard();
        let (rx, _tx) = channel(&["What is your name?", "\nPreferred communication language?\n"], true);
        let mut matcher = OutputMatcher::new(rx, &table, Duration::from_secs(10));

        match matcher.next_event(far_deadline(), |_| {}).await {
            WaitEvent::Prompt { rule, matched, .. } => {
                assert_eq!(rule, 0);
                assert_eq!(matched, "What is your name");
            }
            other => panic!("expected prompt, got {:?}", other),
        }
        match matcher.next_event(far_deadline(), |_| {}).await {
            WaitEvent::Prompt { rule, before, .. } => {
                assert_eq!(rule, 1);
                assert!(before.contains("Preferred"));
            }
            other => panic!("expected prompt, got {:?}", other),
        }
        assert_eq!(
            matcher.next_event(far_deadline(), |_| {}).await,
            WaitEvent::EndOfOutput
        );
    }

    #[tokio::test]
    async fn test_prompt_split_across_chunks() {
        let table = PromptTable::standard();
        let (rx, _tx) = channel(&["What is your ", "name?"], true);
        let mut matcher = OutputMatcher::new(rx, &table, Duration::from_secs(10));
        let mut seen = Vec::new();

        let event = matcher
            .next_event(far_deadline(), |chunk| seen.push(chunk.to_string()))
            .await;
        assert!(matches!(event, WaitEvent::Prompt { rule: 0, .. }));
        assert_eq!(seen, vec!["What is your ", "name?"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_reports_buffered_output() {
        let table = PromptTable::standard();
        let (rx, _tx) = channel(&["Installing modules"], false);
        let mut matcher = OutputMatcher::new(rx, &table, Duration::from_secs(10));

        let deadline = Instant::now() + Duration::from_secs(1);
        assert_eq!(
            matcher.next_event(deadline, |_| {}).await,
            WaitEvent::TimedOut {
                buffered: "Installing modules".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_question_is_unrecognized() {
        let table = PromptTable::standard();
        let (rx, _tx) = channel(&["Pick a colour theme?"], false);
        let mut matcher = OutputMatcher::new(rx, &table, Duration::from_secs(10));

        assert_eq!(
            matcher.next_event(far_deadline(), |_| {}).await,
            WaitEvent::Unrecognized {
                text: "Pick a colour theme?".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_progress_keeps_waiting_until_deadline() {
        let table = PromptTable::standard();
        let (rx, _tx) = channel(&["Copying files..."], false);
        let mut matcher = OutputMatcher::new(rx, &table, Duration::from_secs(1));

        let deadline = Instant::now() + Duration::from_secs(5);
        assert!(matches!(
            matcher.next_event(deadline, |_| {}).await,
            WaitEvent::TimedOut { .. }
        ));
    }

    #[tokio::test]
    async fn test_prompt_line_answered_once() {
        let table = PromptTable::standard();
        let (rx, _tx) = channel(&["◆  Proceed with installation? (y/n)\n"], true);
        let mut matcher = OutputMatcher::new(rx, &table, Duration::from_secs(10));

        assert!(matches!(
            matcher.next_event(far_deadline(), |_| {}).await,
            WaitEvent::Prompt { rule: 3, .. }
        ));
        assert_eq!(
            matcher.next_event(far_deadline(), |_| {}).await,
            WaitEvent::EndOfOutput
        );
    }

    #[tokio::test]
    async fn test_prompt_line_tail_in_later_chunk_is_skipped() {
        let table = PromptTable::standard();
        let (rx, _tx) = channel(&["◆  Proceed? ", "(y/n)\n", "◆  What is your name?\n"], true);
        let mut matcher = OutputMatcher::new(rx, &table, Duration::from_secs(10));

        assert!(matches!(
            matcher.next_event(far_deadline(), |_| {}).await,
            WaitEvent::Prompt { rule: 3, .. }
        ));
        assert!(matches!(
            matcher.next_event(far_deadline(), |_| {}).await,
            WaitEvent::Prompt { rule: 0, .. }
        ));
        assert_eq!(
            matcher.next_event(far_deadline(), |_| {}).await,
            WaitEvent::EndOfOutput
        );
    }

    #[tokio::test]
    async fn test_escape_split_across_chunks() {
        let table = PromptTable::standard();
        let (rx, _tx) = channel(&["◆  Choose output\x1b[", "0m folder\n"], true);
        let mut matcher = OutputMatcher::new(rx, &table, Duration::from_secs(10));

        match matcher.next_event(far_deadline(), |_| {}).await {
            WaitEvent::Prompt { rule, matched, .. } => {
                assert_eq!(rule, 2);
                assert_eq!(matched, "output folder");
            }
            other => panic!("expected prompt, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_after_answered_prompt_keeps_waiting() {
        let table = PromptTable::standard();
        let (rx, _tx) = channel(&["◆  What is your name?\n"], false);
        let mut matcher = OutputMatcher::new(rx, &table, Duration::from_secs(10));

        assert!(matches!(
            matcher.next_event(far_deadline(), |_| {}).await,
            WaitEvent::Prompt { rule: 0, .. }
        ));
        assert!(matches!(
            matcher.next_event(far_deadline(), |_| {}).await,
            WaitEvent::TimedOut { .. }
        ));
    }

    #[test]
    fn test_buffer_is_bounded() {
        let table = PromptTable::standard();
        let (rx, _tx) = channel(&[], true);
        let mut matcher = OutputMatcher::new(rx, &table, Duration::from_secs(1));
        let chunk = "◇".repeat(MAX_BUFFER_BYTES);
        matcher.push(&chunk);
        assert!(matcher.buffer.len() <= MAX_BUFFER_BYTES);
        assert!(matcher.buffer.chars().all(|c| c == '◇'));
    }
}
