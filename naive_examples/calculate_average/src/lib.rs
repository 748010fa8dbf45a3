use anyhow::{anyhow, Result};
use onebrc::parse::parse_record;
use onebrc::{AggregateMap, GlobalResult};
use std::io::BufRead;

/// Reads records line by line on the calling thread. Content after the last terminator that is
/// only whitespace is ignored; every other line must be a valid record.
pub fn aggregate_reader<R: BufRead>(mut reader: R) -> Result<GlobalResult> {
    let mut map = AggregateMap::with_capacity(1024);
    let mut line = Vec::with_capacity(128);
    let mut offset: u64 = 0;
    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 { break; }
        let record = line.strip_suffix(b"\n").unwrap_or(&line);
        if !record.iter().all(u8::is_ascii_whitespace) || line.ends_with(b"\n") {
            let (key, value) = parse_record(record).map_err(|e| anyhow!("line at byte {}: {}", offset, e))?;
            map.add(key, value);
        }
        offset += n as u64;
    }
    Ok(GlobalResult::new(map))
}
