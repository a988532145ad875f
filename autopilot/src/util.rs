use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// Decimal, or hex with a `0x` prefix.
pub fn parse_seed(seed: &str) -> Result<u32> {
    let token = seed.trim();
    let parsed = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => token.parse::<u32>(),
    };
    parsed.with_context(|| format!("invalid seed {token:?}"))
}

pub fn seed_to_hex(seed: u32) -> String {
    format!("0x{seed:08x}")
}

fn collect_seeds<'a>(tokens: impl Iterator<Item = &'a str>, source: &str) -> Result<Vec<u32>> {
    let seeds = tokens
        .map(str::trim)
        .filter(|t| !t.is_empty() && !t.starts_with('#'))
        .map(parse_seed)
        .collect::<Result<Vec<_>>>()?;
    if seeds.is_empty() {
        bail!("no seeds in {source}");
    }
    Ok(seeds)
}

pub fn parse_seed_csv(input: &str) -> Result<Vec<u32>> {
    collect_seeds(input.split(','), "--seeds")
}

/// One seed per line; blank lines and `#` comments are skipped.
pub fn parse_seed_file(path: &Path) -> Result<Vec<u32>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading seed file {}", path.display()))?;
    collect_seeds(data.lines(), &path.display().to_string())
}

/// Consecutive benchmark seeds: an LCG walk from `start`, so nearby starts
/// still give unrelated tracks.
pub fn seed_sequence(start: u32, count: u32) -> Vec<u32> {
    let mut out = Vec::with_capacity(count as usize);
    let mut cur = start;
    for _ in 0..count {
        out.push(cur);
        cur = cur.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_parse_in_decimal_and_hex() {
        assert_eq!(parse_seed("42").expect("decimal"), 42);
        assert_eq!(parse_seed(" 0xA57E0001 ").expect("hex"), 0xA57E_0001);
        assert!(parse_seed("").is_err());
        assert!(parse_seed("0xZZ").is_err());
        assert_eq!(seed_to_hex(0xbeef), "0x0000beef");
    }

    #[test]
    fn csv_skips_blanks_and_rejects_empty() {
        assert_eq!(parse_seed_csv("1, 0x2,,3").expect("csv"), vec![1, 2, 3]);
        assert!(parse_seed_csv(" , ").is_err());
    }

    #[test]
    fn seed_file_ignores_comments() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("seeds.txt");
        fs::write(&path, "# smoke set\n7\n\n0x10\n")?;
        assert_eq!(parse_seed_file(&path)?, vec![7, 16]);
        Ok(())
    }

    #[test]
    fn sequence_starts_at_start_and_has_requested_length() {
        let seeds = seed_sequence(5, 4);
        assert_eq!(seeds.len(), 4);
        assert_eq!(seeds[0], 5);
        assert_eq!(seeds[1], 5u32.wrapping_mul(1_664_525).wrapping_add(1_013_904_223));
    }
}
