use anyhow::{Result, bail};
use std::collections::HashSet;

/// Seeds used when the caller asks for `all`.
pub const STANDARD_SEEDS: [u64; 5] = [1337, 42, 7, 2024, 0xC0FF_EE];

/// Resolve CLI seed tokens into a deduplicated seed list.
///
/// Accepts decimal integers (negative values use their magnitude), `0x`
/// prefixed hex, and `all` which expands to [`STANDARD_SEEDS`].
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut pending = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        if token.eq_ignore_ascii_case("all") {
            pending.extend(STANDARD_SEEDS);
            continue;
        }
        if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            && let Ok(value) = u64::from_str_radix(hex, 16)
        {
            pending.push(value);
            continue;
        }
        if let Ok(value) = token.parse::<u64>() {
            pending.push(value);
            continue;
        }
        if let Ok(value) = token.parse::<i64>() {
            pending.push(value.unsigned_abs());
            continue;
        }
        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    pending.retain(|seed| seen.insert(*seed));

    if pending.is_empty() {
        pending.push(STANDARD_SEEDS[0]);
    }
    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parses_and_dedupes() {
        let seeds = resolve_seed_inputs(&tokens(&["5", "-5", "0x10", "16", "42"])).unwrap();
        assert_eq!(seeds, vec![5, 16, 42]);
    }

    #[test]
    fn all_expands_to_standard_set() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "all"])).unwrap();
        assert_eq!(seeds.len(), STANDARD_SEEDS.len());
        assert_eq!(seeds[0], 42);
    }

    #[test]
    fn empty_falls_back_and_garbage_fails() {
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![1337]);
        assert!(resolve_seed_inputs(&tokens(&["merlot"])).is_err());
    }
}
