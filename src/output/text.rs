//! Human-readable text output

use super::ProbeResult;
use std::io::{self, Write};

/// One line per probe: `<kind>: <raw value> <unit> (<human>)`
pub fn format_result(result: &ProbeResult) -> String {
    format!(
        "{}: {} {} ({})",
        result.kind,
        result.value,
        result.kind.unit(),
        result.human()
    )
}

/// Write all results, one per line
pub fn write_results<W: Write>(writer: &mut W, results: &[ProbeResult]) -> io::Result<()> {
    for result in results {
        writeln!(writer, "{}", format_result(result))?;
    }
    Ok(())
}
