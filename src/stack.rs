//! Call-stack capture and caller attribution.
//!
//! This module resolves the call site an error is attributed to. An error
//! value may carry a stack captured at construction time; otherwise the
//! locator walks the live call stack at the point of notification. In both
//! cases frames belonging to the agent itself are skipped so the locator
//! points at application code.

use backtrace::{resolve_frame, trace};

/// Maximum number of frames resolved during a live capture.
///
/// Keeps worst-case notification latency bounded; the first application
/// frame is always within a handful of frames of the notification call.
pub const MAX_FRAMES: usize = 20;

/// An ordered sequence of symbolized stack frames, innermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackTrace {
    frames: Vec<String>,
}

impl StackTrace {
    /// Build a trace from already-resolved symbol names, innermost first.
    pub fn from_symbols(symbols: Vec<String>) -> Self {
        Self { frames: symbols }
    }

    /// Capture the live call stack, bounded at [`MAX_FRAMES`] resolved frames.
    ///
    /// Frames whose symbol cannot be resolved are omitted rather than
    /// recorded as placeholders.
    pub fn capture() -> Self {
        let mut frames = Vec::with_capacity(MAX_FRAMES);
        trace(|frame| {
            let mut name = None;
            resolve_frame(frame, |symbol| {
                if name.is_none() {
                    name = symbol.name().map(|n| n.to_string());
                }
            });
            if let Some(name) = name {
                frames.push(name);
            }
            frames.len() < MAX_FRAMES
        });
        Self { frames }
    }

    /// The resolved symbol names, innermost first.
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Whether the trace contains no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Resolves the first application frame of a stack to a caller locator.
///
/// The locator holds a list of symbol prefixes considered internal to the
/// agent (and its capture machinery); frames matching any prefix are
/// skipped. The first remaining frame is formatted as
/// `<namespace>.<FunctionName>`, where the namespace is the symbol's root
/// path segment. An empty string means no application frame was found.
#[derive(Debug, Clone)]
pub struct StackLocator {
    /// Symbol prefixes whose frames are never attributed, in match order.
    internal_prefixes: Vec<String>,
}

impl Default for StackLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl StackLocator {
    /// A locator that skips this crate's own frames plus the frames of the
    /// capture machinery and the standard library.
    pub fn new() -> Self {
        Self {
            internal_prefixes: vec![
                env!("CARGO_CRATE_NAME").to_string(),
                "backtrace".to_string(),
                "std".to_string(),
                "core".to_string(),
            ],
        }
    }

    /// Add a symbol prefix to treat as internal.
    ///
    /// A prefix matches whole path segments only: `"agent"` skips
    /// `agent::notify` but not `agent_demo::run`.
    pub fn with_internal_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.internal_prefixes.push(prefix.into());
        self
    }

    /// Resolve a caller locator from pre-captured frames, or from the live
    /// call stack when none were supplied.
    ///
    /// Returns an empty string when every candidate frame is internal.
    pub fn locate(&self, pre_captured: Option<&StackTrace>) -> String {
        match pre_captured {
            Some(stack) => self.first_application_frame(stack),
            None => self.first_application_frame(&StackTrace::capture()),
        }
    }

    /// Walk the frames in order and format the first non-internal one.
    fn first_application_frame(&self, stack: &StackTrace) -> String {
        stack
            .frames()
            .iter()
            .find(|symbol| !self.is_internal(symbol))
            .map(|symbol| format_locator(symbol))
            .unwrap_or_default()
    }

    fn is_internal(&self, symbol: &str) -> bool {
        self.internal_prefixes.iter().any(|prefix| {
            symbol
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
        })
    }
}

/// Format a resolved symbol as `<namespace>.<FunctionName>`.
///
/// The trailing legacy hash segment emitted by the Rust mangling scheme
/// (`::hdeadbeef01234567`) is dropped before taking the root and leaf
/// segments. A symbol with a single segment is returned as-is.
fn format_locator(symbol: &str) -> String {
    let mut segments: Vec<&str> = symbol.split("::").collect();
    if segments.len() > 1 && is_hash_segment(segments[segments.len() - 1]) {
        segments.pop();
    }
    match (segments.first(), segments.last()) {
        (Some(first), Some(last)) if segments.len() > 1 => format!("{first}.{last}"),
        (Some(only), _) => (*only).to_string(),
        _ => String::new(),
    }
}

/// `h` followed by 16 hex digits.
fn is_hash_segment(segment: &str) -> bool {
    segment.len() == 17
        && segment.starts_with('h')
        && segment[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace_of(symbols: &[&str]) -> StackTrace {
        StackTrace::from_symbols(symbols.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_capture_is_bounded() {
        let stack = StackTrace::capture();
        assert!(stack.frames().len() <= MAX_FRAMES);
        assert!(!stack.is_empty());
    }

    #[test]
    fn test_locate_skips_internal_frames() {
        let locator = StackLocator::new().with_internal_prefix("agent_core");
        let stack = trace_of(&[
            "agent_core::notify::record::h0011223344556677",
            "myapp::handlers::checkout::h8899aabbccddeeff",
            "myapp::main::h0000000000000000",
        ]);
        assert_eq!(locator.locate(Some(&stack)), "myapp.checkout");
    }

    #[test]
    fn test_locate_all_internal_returns_empty() {
        let locator = StackLocator::new().with_internal_prefix("agent_core");
        let stack = trace_of(&[
            "agent_core::notify::h0011223344556677",
            "std::rt::lang_start::h8899aabbccddeeff",
        ]);
        assert_eq!(locator.locate(Some(&stack)), "");
    }

    #[test]
    fn test_locate_empty_pre_captured_returns_empty() {
        let locator = StackLocator::new();
        assert_eq!(locator.locate(Some(&StackTrace::default())), "");
    }

    #[test]
    fn test_locate_live_capture_finds_caller() {
        let locator = StackLocator::new();
        let caller = locator.locate(None);
        assert!(!caller.is_empty());
        // The crate's own frames must never be attributed.
        assert!(!caller.starts_with(concat!(env!("CARGO_CRATE_NAME"), ".")));
    }

    #[test]
    fn test_prefix_matches_whole_segments_only() {
        let locator = StackLocator::new().with_internal_prefix("agent");
        let stack = trace_of(&["agent_demo::run::h0123456789abcdef"]);
        assert_eq!(locator.locate(Some(&stack)), "agent_demo.run");
    }

    #[test]
    fn test_format_locator_strips_hash_segment() {
        assert_eq!(
            format_locator("myapp::orders::submit::hcafebabe12345678"),
            "myapp.submit"
        );
    }

    #[test]
    fn test_format_locator_without_hash() {
        assert_eq!(format_locator("myapp::orders::submit"), "myapp.submit");
    }

    #[test]
    fn test_format_locator_single_segment() {
        assert_eq!(format_locator("main"), "main");
    }

    #[test]
    fn test_is_hash_segment() {
        assert!(is_hash_segment("h0123456789abcdef"));
        assert!(!is_hash_segment("submit"));
        assert!(!is_hash_segment("h012345"));
        assert!(!is_hash_segment("hzzzzzzzzzzzzzzzz"));
    }

    #[test]
    fn test_locate_is_deterministic() {
        let locator = StackLocator::new();
        let stack = trace_of(&[
            "backtrace::trace::h0000000000000000",
            "shop::cart::add_item::h1111111111111111",
        ]);
        assert_eq!(locator.locate(Some(&stack)), locator.locate(Some(&stack)));
        assert_eq!(locator.locate(Some(&stack)), "shop.add_item");
    }
}
