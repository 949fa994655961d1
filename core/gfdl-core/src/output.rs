//! Streaming output helpers (made by FontLab https://www.fontlab.com/)
//!
//! Catalog listings, family details and error-log entries all leave the
//! building through here. Some readers like their JSON laid out with room
//! to breathe; others pipe it into `jq` one line at a time. Both get served.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

/// Write items as a prettified JSON array, indented for human eyes.
pub fn write_json_pretty<T: Serialize>(items: &[T], mut w: impl Write) -> Result<()> {
    let json = serde_json::to_string_pretty(items)?;
    w.write_all(json.as_bytes())?;
    w.write_all(b"\n")?;
    Ok(())
}

/// Write items as newline-delimited JSON (NDJSON), one record per line so
/// downstream tools can start chewing before the list ends.
pub fn write_ndjson<T: Serialize>(items: &[T], mut w: impl Write) -> Result<()> {
    for item in items {
        let line = serde_json::to_string(item)?;
        w.write_all(line.as_bytes())?;
        w.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FontRecord;

    #[test]
    fn ndjson_writes_one_line_per_record() {
        let records = vec![
            FontRecord::new("Roboto").with_variants(["regular"]),
            FontRecord::new("Lato").with_variants(["700"]),
        ];
        let mut buf = Vec::new();

        write_ndjson(&records, &mut buf).expect("write ndjson");

        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: FontRecord = serde_json::from_str(lines[1]).expect("parse");
        assert_eq!(parsed.family, "Lato");
    }
}
