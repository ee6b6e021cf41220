use anyhow::{Context, Result};

const DEFAULT_MONEY_DP: u32 = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocatorConfig {
    /// Submit plans that could only be partly allocated.
    pub allow_partial: bool,
    /// Decimal places used for submitted money amounts.
    pub money_dp: u32,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            allow_partial: false,
            money_dp: DEFAULT_MONEY_DP,
        }
    }
}

impl AllocatorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let allow_partial = match lookup("ALLOCATION_ALLOW_PARTIAL") {
            Some(raw) => parse_flag(&raw)
                .with_context(|| format!("ALLOCATION_ALLOW_PARTIAL is not a boolean: {raw}"))?,
            None => false,
        };

        let money_dp = match lookup("ALLOCATION_MONEY_DP") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("ALLOCATION_MONEY_DP is not a whole number: {raw}"))?,
            None => DEFAULT_MONEY_DP,
        };

        if money_dp > 28 {
            anyhow::bail!("ALLOCATION_MONEY_DP must be at most 28, got {money_dp}");
        }

        Ok(Self {
            allow_partial,
            money_dp,
        })
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("unrecognised flag value: {other}"),
    }
}
