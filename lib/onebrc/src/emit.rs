use crate::aggregate::Aggregate;
use crate::reduce::GlobalResult;
use std::io::{self, Write};

/// Integer division rounding half away from zero. `den` must be positive.
pub fn round_div_half_up(num: i128, den: i128) -> i128 {
    let q = num / den;
    let r = num % den;
    if 2 * r.abs() >= den { q + num.signum() } else { q }
}

/// Mean of `count` values in tenths, rounded to the nearest tenth. Lies between min and max, so
/// it always fits back into `i64`.
pub fn mean_tenths(agg: &Aggregate) -> i64 { round_div_half_up(agg.sum, agg.count as i128) as i64 }

pub fn write_tenths<W: Write>(w: &mut W, tenths: i64) -> io::Result<()> {
    let sign = if tenths < 0 { "-" } else { "" };
    let abs = tenths.unsigned_abs();
    write!(w, "{}{}.{}", sign, abs / 10, abs % 10)
}

pub fn format_tenths(tenths: i64) -> String {
    let mut out = Vec::with_capacity(8);
    // writing into a Vec cannot fail
    let _ = write_tenths(&mut out, tenths);
    String::from_utf8_lossy(&out).into_owned()
}

/// Writes `{key=min/mean/max, ...}` with keys in byte order. Keys are written as raw bytes.
pub fn render_into<W: Write>(result: &GlobalResult, w: &mut W) -> io::Result<()> {
    w.write_all(b"{")?;
    for (i, (key, agg)) in result.sorted().into_iter().enumerate() {
        if i > 0 { w.write_all(b", ")?; }
        w.write_all(key)?;
        w.write_all(b"=")?;
        write_tenths(w, agg.min)?;
        w.write_all(b"/")?;
        write_tenths(w, mean_tenths(agg))?;
        w.write_all(b"/")?;
        write_tenths(w, agg.max)?;
    }
    w.write_all(b"}")
}

pub fn render(result: &GlobalResult) -> Vec<u8> {
    let mut out = Vec::with_capacity(result.len() * 32 + 2);
    // writing into a Vec cannot fail
    let _ = render_into(result, &mut out);
    out
}

pub fn render_string(result: &GlobalResult) -> String { String::from_utf8_lossy(&render(result)).into_owned() }
