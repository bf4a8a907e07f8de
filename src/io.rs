use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::constants::Word;
use crate::memory::PhysicalMemory;
use crate::translation;

/// One operation of a trace file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Read(u64),
    Write(u64, Word),
}

/// Parse a trace: one operation per line, `r <addr>` or `w <addr> <value>`.
/// Addresses take decimal or `0x` hex. Blank lines and `#` comments skip.
pub fn parse_trace(content: &str) -> Result<Vec<Op>> {
    let mut ops = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let op = match tokens.as_slice() {
            ["r", addr] => Op::Read(parse_address(addr, line_no)?),
            ["w", addr, value] => {
                let value: Word = value
                    .parse()
                    .with_context(|| format!("line {}: invalid value: {}", line_no + 1, value))?;
                Op::Write(parse_address(addr, line_no)?, value)
            }
            _ => bail!(
                "line {}: expected `r <addr>` or `w <addr> <value>`, got: {}",
                line_no + 1,
                line
            ),
        };
        ops.push(op);
    }

    Ok(ops)
}

fn parse_address(token: &str, line_no: usize) -> Result<u64> {
    let parsed = match token.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => token.parse(),
    };
    parsed.with_context(|| format!("line {}: invalid address: {}", line_no + 1, token))
}

/// Read and parse a trace file
pub fn read_trace<P: AsRef<Path>>(path: P) -> Result<Vec<Op>> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("failed to read trace file {}", path.as_ref().display()))?;
    parse_trace(&content)
}

/// Execute a trace in order against an initialized memory. Every operation
/// yields one output token: reads the value, writes `ok`, failures `fault`.
pub fn run_trace<M: PhysicalMemory>(mem: &mut M, ops: &[Op]) -> Vec<String> {
    let mut results = Vec::with_capacity(ops.len());

    for op in ops {
        let outcome = match *op {
            Op::Read(addr) => translation::read(mem, addr).map(|value| value.to_string()),
            Op::Write(addr, value) => translation::write(mem, addr, value).map(|_| "ok".into()),
        };
        results.push(outcome.unwrap_or_else(|_| "fault".into()));
    }

    results
}

/// Write trace results to an output file, one per line
pub fn write_results<P: AsRef<Path>>(path: P, results: &[String]) -> Result<()> {
    let mut content = results.join("\n");
    content.push('\n');
    fs::write(path.as_ref(), content)
        .with_context(|| format!("failed to write results to {}", path.as_ref().display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SimulatedRam;
    use crate::translation::initialize;

    #[test]
    fn test_parse_simple_trace() {
        let ops = parse_trace("w 13 3\nr 13\n").unwrap();
        assert_eq!(ops, vec![Op::Write(13, 3), Op::Read(13)]);
    }

    #[test]
    fn test_parse_hex_addresses_and_comments() {
        let content = "# warm-up\nw 0x375 7\n\nr 0x375\n";
        let ops = parse_trace(content).unwrap();
        assert_eq!(ops, vec![Op::Write(0x375, 7), Op::Read(0x375)]);
    }

    #[test]
    fn test_parse_negative_values() {
        let ops = parse_trace("w 13 -25\n").unwrap();
        assert_eq!(ops, vec![Op::Write(13, -25)]);
    }

    #[test]
    fn test_parse_rejects_malformed_line() {
        let err = parse_trace("w 13\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_parse_rejects_bad_address() {
        let err = parse_trace("r abc\n").unwrap_err();
        assert!(err.to_string().contains("invalid address"));
    }

    #[test]
    fn test_parse_empty_trace() {
        assert!(parse_trace("").unwrap().is_empty());
    }

    #[test]
    fn test_run_trace_round_trip() {
        let mut ram = SimulatedRam::new();
        initialize(&mut ram);

        let ops = parse_trace("w 13 3\nr 13\nr 14\n").unwrap();
        let results = run_trace(&mut ram, &ops);

        assert_eq!(results, vec!["ok", "3", "0"]);
    }

    #[test]
    fn test_run_trace_reports_faults() {
        let mut ram = SimulatedRam::new();
        initialize(&mut ram);

        let ops = vec![Op::Read(1 << 40), Op::Write(1 << 40, 1)];
        let results = run_trace(&mut ram, &ops);

        assert_eq!(results, vec!["fault", "fault"]);
    }

    #[test]
    fn test_write_results() {
        let path = std::env::temp_dir().join("paged_memory_results.txt");
        let results = vec!["ok".to_string(), "3".to_string()];

        write_results(&path, &results).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "ok\n3\n");

        fs::remove_file(&path).ok();
    }
}
