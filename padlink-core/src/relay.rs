//! Uplink consumption: framed report extraction and bulk serial drain.
//!
//! The uplink ring carries one of two stream shapes depending on device
//! mode. In NORMAL mode the attached MCU emits marker-framed controller
//! reports and [`take_report`] lifts them out whole; in every other mode
//! the bytes are opaque and [`drain`] ships them to the host verbatim.
//!
//! Extraction is deliberately passive about desynchronization: a head
//! byte that is not the marker means the stream is scrambled, and we
//! neither guess nor resynchronize. Stale bytes sit until the lossy
//! uplink producer laps the ring and the cursors realign on fresh frames.

use crate::ring::Consumer;
use heapless::Vec;
use padlink_proto::report::{ReportKind, MAX_REPORT_SIZE, REPORT_MARKER};

/// One extracted controller report, marker stripped.
pub type Report = Vec<u8, MAX_REPORT_SIZE>;

/// Occupancy at or above which a timed drain should not wait for the
/// next tick. Three quarters of the usable capacity.
#[must_use]
pub const fn flush_threshold(capacity: usize) -> usize {
    capacity - capacity / 4
}

/// Whether a buffered-serial context should flush now instead of waiting
/// for its periodic tick.
#[must_use]
pub fn should_flush<const N: usize>(uplink: &Consumer<'_, N>) -> bool {
    uplink.len() >= flush_threshold(uplink.capacity())
}

/// Try to extract one complete report from the uplink.
///
/// A report is taken only when the ring holds strictly more bytes than
/// the report payload (marker plus payload) *and* the oldest byte is the
/// frame marker. Anything less leaves the ring untouched, so a report
/// mid-arrival is never torn. On a non-marker head byte nothing is
/// consumed either; see the module docs for why.
pub fn take_report<const N: usize>(
    uplink: &mut Consumer<'_, N>,
    kind: ReportKind,
) -> Option<Report> {
    let size = kind.report_size();
    if uplink.len() <= size {
        return None;
    }
    if uplink.peek()? != REPORT_MARKER {
        return None;
    }
    // Marker verified and the full payload is buffered: the pops below
    // cannot come up short.
    uplink.pop()?;
    let mut report = Report::new();
    for _ in 0..size {
        let byte = uplink.pop()?;
        let _ = report.push(byte);
    }
    Some(report)
}

/// Move as many buffered uplink bytes as fit into `buf`, returning the
/// count. Used for the raw passthrough in CONFIG and handoff modes.
pub fn drain<const N: usize>(uplink: &mut Consumer<'_, N>, buf: &mut [u8]) -> usize {
    let mut n = 0;
    while n < buf.len() {
        match uplink.pop() {
            Some(byte) => {
                buf[n] = byte;
                n += 1;
            }
            None => break,
        }
    }
    n
}
