//! Server-sent event decoding
//!
//! Network chunks are buffered as bytes until a full line is available, so
//! payloads split across chunks (even inside a UTF-8 sequence) decode intact.

/// Incremental decoder yielding the `data` payload of each complete event
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a network chunk, returning the payloads of completed events
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(newline_pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(payload) = self.handle_line(line.trim_end_matches(['\n', '\r'])) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush an event left unterminated at end of body
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let line: Vec<u8> = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&line);
            if let Some(payload) = self.handle_line(line.trim_end_matches('\r')) {
                return Some(payload);
            }
        }
        self.flush_event()
    }

    fn handle_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.flush_event();
        }

        // Comment / keep-alive
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }

    fn flush_event(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();
        Some(payload)
    }
}
