use std::fmt;

/// Default lookahead limit (10 MiB) for a single cursor scan
pub const DEFAULT_LOOKAHEAD_LIMIT: usize = 10 * 1024 * 1024;
/// Maximum element nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 100;
/// Children count at which compaction fans out to workers
pub const DEFAULT_COMPACT_FAN_OUT: usize = 100;
/// Children count above which serialization fans out to workers
pub const DEFAULT_SERIALIZE_FAN_OUT: usize = 200;
/// Children rendered by a worker between flushes into the shared output
pub const DEFAULT_FLUSH_EVERY: usize = 100;
/// XML declaration written before the first top-level element
pub const XML_DECLARATION: &str = "<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>";

/// Configuration for the reading side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum number of bytes the cursor may buffer ahead of its front
    pub lookahead_limit: usize,
    /// Maximum element nesting depth
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            lookahead_limit: DEFAULT_LOOKAHEAD_LIMIT,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl fmt::Display for ParserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ParserConfig {{ lookahead_limit: {}, max_depth: {} }}",
            self.lookahead_limit, self.max_depth
        )
    }
}

/// Configuration for compaction and serialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Compaction recurses into children in parallel from this many children on
    pub compact_fan_out: usize,
    /// Serialization renders children in parallel above this many children
    pub serialize_fan_out: usize,
    /// Each serialization worker flushes its private buffer after this many children
    pub flush_every: usize,
    /// Number of spaces per nesting level
    pub indent_width: usize,
    /// Declaration line written once before the document
    pub declaration: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compact_fan_out: DEFAULT_COMPACT_FAN_OUT,
            serialize_fan_out: DEFAULT_SERIALIZE_FAN_OUT,
            flush_every: DEFAULT_FLUSH_EVERY,
            indent_width: 2,
            declaration: XML_DECLARATION.to_string(),
        }
    }
}

impl fmt::Display for WriterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WriterConfig {{ compact_fan_out: {}, serialize_fan_out: {}, flush_every: {}, indent_width: {} }}",
            self.compact_fan_out, self.serialize_fan_out, self.flush_every, self.indent_width
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_limits() {
        let parser = ParserConfig::default();
        assert_eq!(parser.lookahead_limit, 10_485_760);
        assert_eq!(parser.max_depth, 100);

        let writer = WriterConfig::default();
        assert_eq!(writer.compact_fan_out, 100);
        assert_eq!(writer.serialize_fan_out, 200);
        assert_eq!(writer.flush_every, 100);
        assert!(writer.declaration.starts_with("<?xml version='1.0'"));
    }

    #[test]
    fn test_display() {
        let shown = ParserConfig::default().to_string();
        assert!(shown.contains("lookahead_limit: 10485760"));
    }
}
