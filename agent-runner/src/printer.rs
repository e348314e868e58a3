//! Console rendering of a turn

use std::io::Write;

use sa_core::GroundingMetadata;
use tracing::{debug, warn};

use crate::error::Result;
use crate::stream::EventStream;

/// What happened while a turn was printed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnSummary {
    pub partial_events: usize,
    pub final_events: usize,
    pub errors: usize,
    /// Text of the last final event
    pub final_text: String,
    /// Grounding of the last final event that carried any
    pub grounding: Option<GroundingMetadata>,
    /// The stream ended because its token was cancelled
    pub cancelled: bool,
}

impl TurnSummary {
    pub fn source_count(&self) -> usize {
        self.grounding.as_ref().map_or(0, |g| g.sources.len())
    }
}

/// Consume `stream`, writing partial text to `sink` as it arrives
///
/// Thought parts are not written, so the printed text matches the final
/// event's text. Errors are reported inline and consumption continues.
/// Final events only mark the end of a response; their text has already
/// been streamed and is not written again.
pub async fn print_turn<W: Write>(stream: &mut EventStream, sink: &mut W) -> Result<TurnSummary> {
    let mut summary = TurnSummary::default();

    while let Some(item) = stream.next().await {
        match item {
            Ok(event) if event.partial => {
                summary.partial_events += 1;
                for part in event.parts().iter().filter(|p| !p.thought) {
                    sink.write_all(part.as_text().as_bytes())?;
                }
                sink.flush()?;
            }
            Ok(event) => {
                summary.final_events += 1;
                debug!(
                    "Final event {} from {} (finish reason {:?})",
                    event.id, event.author, event.finish_reason
                );
                summary.final_text = event.text();
                if event.grounding.is_some() {
                    summary.grounding = event.grounding;
                }
            }
            Err(e) => {
                summary.errors += 1;
                warn!("Agent error: {}", e);
                write!(sink, "\nAGENT_ERROR: {}", e)?;
                sink.flush()?;
            }
        }
    }

    summary.cancelled = stream.is_cancelled();
    Ok(summary)
}
