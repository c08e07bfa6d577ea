use crate::error::StreamError;
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use std::fmt::Display;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

/// Receives the tidied running text after every consumed chunk. Implemented
/// by the UI layer; the manager owns the message list itself.
pub trait StreamSink: Send + Sync {
    fn on_text(&self, snapshot: &str);
}

#[derive(Debug, Default)]
pub struct NullStreamSink;

impl StreamSink for NullStreamSink {
    fn on_text(&self, _snapshot: &str) {}
}

/// Terminal sink producing the live-typing effect: prints only the unseen
/// suffix of each snapshot. Falls back to a fresh line when tidying rewrote
/// already-printed text.
pub struct CliStreamSink {
    seen: Mutex<String>,
    writer: Arc<dyn Fn(&str) + Send + Sync>,
}

impl CliStreamSink {
    pub fn new() -> Self {
        Self {
            seen: Mutex::new(String::new()),
            writer: Arc::new(|text| {
                use std::io::Write;
                print!("{text}");
                let _ = std::io::stdout().flush();
            }),
        }
    }

    #[cfg(test)]
    fn with_writer(writer: Arc<dyn Fn(&str) + Send + Sync>) -> Self {
        Self {
            seen: Mutex::new(String::new()),
            writer,
        }
    }
}

impl Default for CliStreamSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSink for CliStreamSink {
    fn on_text(&self, snapshot: &str) {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(suffix) = snapshot.strip_prefix(seen.as_str()) {
            if !suffix.is_empty() {
                (self.writer)(suffix);
            }
        } else {
            (self.writer)("\n");
            (self.writer)(snapshot);
        }
        seen.clear();
        seen.push_str(snapshot);
    }
}

/// Incremental decoder for the chat event stream.
///
/// Chunks append to a line buffer; everything before the last newline is
/// processed as complete `data: ` event lines, the trailing partial line
/// waits for the next chunk. Tolerates lines split across reads, several
/// complete lines in one read, and streams that never produce a fragment.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    buffer: String,
    content: String,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one chunk and return the tidied running text.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> String {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let pending = std::mem::take(&mut self.buffer);
        let mut lines: Vec<&str> = pending.split('\n').collect();
        let rest = lines.pop().unwrap_or("");
        for line in lines {
            if let Some(fragment) = extract_fragment(line.trim()) {
                self.content.push_str(&fragment);
            }
        }
        self.buffer = rest.to_string();

        self.snapshot()
    }

    pub fn snapshot(&self) -> String {
        tidy_text(&self.content)
    }

    /// Parse whatever is left in the buffer and return the final text.
    pub fn finish(mut self) -> String {
        let residual = std::mem::take(&mut self.buffer);
        let residual = residual.trim();
        if !residual.is_empty()
            && let Some(fragment) = extract_fragment(residual)
        {
            self.content.push_str(&fragment);
        }
        tidy_text(&self.content)
    }
}

/// Extract the text carried by one complete event line.
///
/// `data: <payload>` payloads are opportunistically JSON-parsed: objects
/// yield the first non-empty of `content`/`text`/`message`, JSON strings
/// yield themselves, other JSON values carry no text, and anything that is
/// not JSON is taken verbatim.
fn extract_fragment(line: &str) -> Option<String> {
    let payload = line.strip_prefix("data: ")?;
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => ["content", "text", "message"].iter().find_map(|key| {
            map.get(*key)
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        }),
        Ok(Value::String(text)) => Some(text),
        Ok(_) => None,
        Err(_) => Some(payload.to_string()),
    }
}

/// Cosmetic normalization applied to every snapshot: collapse runs of
/// spaces, trim, and drop very short fragments with no letters or digits
/// (stray service output). Also applied to history rows so stored and
/// streamed text render the same.
pub(crate) fn tidy_text(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut prev_space = false;
    for ch in text.chars() {
        if ch == ' ' {
            if prev_space {
                continue;
            }
            prev_space = true;
        } else {
            prev_space = false;
        }
        collapsed.push(ch);
    }

    let trimmed = collapsed.trim();
    if trimmed.chars().count() < 10 && !trimmed.chars().any(char::is_alphanumeric) {
        return String::new();
    }
    trimmed.to_string()
}

/// Drive the assembler over a byte-chunk stream, reporting the tidied
/// running text after every chunk. The cancellation token is checked between
/// chunk reads so navigating away or starting a new exchange aborts the read
/// cleanly; text applied so far is kept by the caller.
///
/// A stream that ends without producing any text is reported as
/// [`StreamError::Empty`] so the caller can fall back to the non-streaming
/// exchange.
pub async fn consume_stream<S, C, E, F>(
    stream: S,
    cancel: &CancellationToken,
    mut on_snapshot: F,
) -> Result<String, StreamError>
where
    S: Stream<Item = Result<C, E>>,
    C: AsRef<[u8]>,
    E: Display,
    F: FnMut(&str),
{
    let mut assembler = StreamAssembler::new();
    let mut stream = std::pin::pin!(stream);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(StreamError::Cancelled),
            chunk = stream.next() => match chunk {
                Some(Ok(bytes)) => {
                    let snapshot = assembler.push_chunk(bytes.as_ref());
                    on_snapshot(&snapshot);
                }
                Some(Err(error)) => return Err(StreamError::Read(error.to_string())),
                None => break,
            }
        }
    }

    let text = assembler.finish();
    if text.is_empty() {
        Err(StreamError::Empty)
    } else {
        on_snapshot(&text);
        Ok(text)
    }
}
