use thiserror::Error;

/// Error type for symbol tree construction and queries.
#[derive(Debug, Error)]
pub enum SizeError {
    /// An address lookup did not resolve to exactly one member.
    #[error("{count} symbols found at address {address:#x}")]
    AddressLookup { count: usize, address: u64 },

    /// A textual address could not be parsed as hex.
    #[error("Invalid hex address: {0}")]
    InvalidAddress(String),

    /// A `where_*_matches` pattern failed to compile.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] fancy_regex::Error),

    /// One-letter section abbreviation with no known section name.
    #[error("Unknown section: {0}")]
    UnknownSection(String),

    /// Set algebra was attempted between groups backed by different symbol tables.
    #[error("Symbol groups are backed by different symbol tables")]
    ForeignTable,

    /// An alias group declaration violated the alias invariants.
    #[error("Invalid alias group: {0}")]
    AliasGroup(String),

    /// The arena ran out of 32-bit handles.
    #[error("Symbol table is full at {0} entries")]
    TableFull(usize),

    /// A symbol index did not refer to a symbol known to the builder.
    #[error("Unknown symbol index {0}")]
    UnknownSymbol(usize),
}

/// Convenience result type for symbol tree operations.
pub type SizeResult<T> = Result<T, SizeError>;
