//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                                  |
//! |---------|------------------|----------------------------------------------|
//! | 0       | Universal        | Success / statement fully reconciled         |
//! | 1       | Universal        | Reconciliation finished with outstanding items |
//! | 2       | Universal        | CLI usage error (bad args, missing file)     |
//! | 60-69   | recon            | Config, input and engine failures            |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (1, 60-69)
// =============================================================================

/// Report produced, but mismatches, missing entries, invalid amounts or a
/// non-zero difference remain. Like `diff(1)`, exit 1 means "they differ."
pub const EXIT_RECON_OUTSTANDING: u8 = 1;

/// Config file failed to parse or validate.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 60;

/// Runtime failure: unreadable file, malformed CSV, missing column, write error.
pub const EXIT_RECON_RUNTIME: u8 = 61;

/// Duplicate join keys found and the config says `duplicates = "reject"`.
pub const EXIT_RECON_DUPLICATE: u8 = 62;

/// The engine's own accounting checks failed. Indicates a bug, never bad data.
pub const EXIT_RECON_INTEGRITY: u8 = 63;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recon_codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_RECON_OUTSTANDING,
            EXIT_USAGE,
            EXIT_RECON_INVALID_CONFIG,
            EXIT_RECON_RUNTIME,
            EXIT_RECON_DUPLICATE,
            EXIT_RECON_INTEGRITY,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
