//! Reads event records as JSON lines and feeds them to the handler.

use std::io::BufRead;

use tracing::{debug, warn};

use crate::cel::EventRecord;
use crate::handler::CelEventHandler;

/// Counters for one run of the reader
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SourceStats {
    pub received: u64,
    pub malformed: u64,
}

/// Dispatches every record read from `reader` until end of input.
///
/// Blank lines are skipped. Lines that are not a valid record are logged and
/// counted, then skipped. An I/O error ends the run.
pub fn run<R: BufRead>(
    reader: R,
    mut dispatch: impl FnMut(&EventRecord),
) -> std::io::Result<SourceStats> {
    let mut stats = SourceStats::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match EventRecord::from_json(line) {
            Ok(record) => {
                stats.received += 1;
                dispatch(&record);
            }
            Err(err) => {
                stats.malformed += 1;
                warn!("skipping malformed event on line {}: {}", index + 1, err);
            }
        }
    }

    debug!("event source finished: {:?}", stats);
    Ok(stats)
}

/// [`run`] with the CEL handler as the dispatch target
pub fn run_with_handler<R: BufRead>(
    reader: R,
    handler: &CelEventHandler,
) -> std::io::Result<SourceStats> {
    run(reader, |record| handler.handle(record))
}
