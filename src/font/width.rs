//! Compacting width tables into `/W` and `/W2` arrays.
//!
//! A CID font lists the widths of the glyphs it uses in one of two run
//! forms: `first [w1 w2 ...]` for consecutive codes with individual widths,
//! and `first last w` for consecutive codes sharing one width.

use std::collections::BTreeSet;
use std::fmt::Write;

use super::metrics::WidthTable;

/// The vertical position of the origin for vertical writing.
const V1Y: i32 = 880;

/// The displacement used when a code has no horizontal width.
const DEFAULT_WIDTH: i32 = 1000;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    /// A single code whose width has not been written yet.
    First,
    /// Inside an explicit `[w1 w2 ...]` list.
    Bracket,
    /// Inside a run of equal widths.
    Serial,
}

/// Build the `/W` array for the used `codes`.
///
/// Codes without a width are skipped. Returns `None` if none of the codes
/// has a width.
pub fn compact_horizontal(codes: &BTreeSet<u16>, widths: &WidthTable) -> Option<String> {
    let mut entries = codes
        .iter()
        .map(|&code| (u32::from(code), widths.get(code)))
        .filter(|(_, width)| *width != 0);

    let (mut last_code, mut last_width) = entries.next()?;
    let mut buf = format!("[{last_code}");
    let mut state = State::First;

    for (code, width) in entries {
        let contiguous = code == last_code + 1;

        // Writing into a `String` can't fail.
        let _ = match state {
            State::First => {
                if contiguous && width == last_width {
                    state = State::Serial;
                    Ok(())
                } else if contiguous {
                    state = State::Bracket;
                    write!(buf, "[{last_width}")
                } else {
                    write!(buf, "[{last_width}]{code}")
                }
            }
            State::Bracket => {
                if contiguous && width == last_width {
                    state = State::Serial;
                    write!(buf, "]{last_code}")
                } else if contiguous {
                    write!(buf, " {last_width}")
                } else {
                    state = State::First;
                    write!(buf, " {last_width}]{code}")
                }
            }
            State::Serial => {
                if !contiguous || width != last_width {
                    state = State::First;
                    write!(buf, " {last_code} {last_width} {code}")
                } else {
                    Ok(())
                }
            }
        };

        last_code = code;
        last_width = width;
    }

    let _ = match state {
        State::First => write!(buf, "[{last_width}]]"),
        State::Bracket => write!(buf, " {last_width}]]"),
        State::Serial => write!(buf, " {last_code} {last_width}]"),
    };

    Some(buf)
}

/// Build the `/W2` array for the used `codes`.
///
/// Every code with a vertical metric gets its own `c c w1y vx vy` entry.
/// `vx` is half the horizontal width of the same code, or half of 1000 if
/// it has none. Returns `None` if none of the codes has a vertical metric.
pub fn compact_vertical(
    codes: &BTreeSet<u16>,
    vertical: &WidthTable,
    horizontal: &WidthTable,
) -> Option<String> {
    let mut entries = codes
        .iter()
        .map(|&code| (code, vertical.get(code)))
        .filter(|(_, width)| *width != 0)
        .peekable();

    entries.peek()?;
    let mut buf = String::from("[");

    for (code, width) in entries {
        let h_width = match horizontal.get(code) {
            0 => DEFAULT_WIDTH,
            w => w,
        };

        let _ = write!(buf, "{code} {code} {} {} {V1Y} ", -width, h_width / 2);
    }

    buf.push(']');

    Some(buf)
}
