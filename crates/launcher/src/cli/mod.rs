//! Command implementations.

pub mod cache;
pub mod config;
pub mod kickstart;
pub mod load;

/// Parse a `WIDTHxHEIGHT` size such as `117x165`.
pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("invalid dimension {part:?} in {value:?}"))
    };
    Ok((parse(width)?, parse(height)?))
}
