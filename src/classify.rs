//! Polymorphic error classification.
//!
//! Instrumented code reports error values of arbitrary shape. The
//! [`Noticeable`] trait is the capability surface the pipeline understands:
//! only [`std::fmt::Display`] is mandatory, while a self-reported class
//! label and a pre-captured stack are optional capabilities that default to
//! absent. Classification detects what the value offers and falls back to a
//! synthesized, type-derived label so the class is never empty.

use std::fmt;

use crate::stack::StackTrace;

/// Logical namespace the agent reports under.
///
/// Synthesized class labels are formatted as
/// `<AGENT_NAMESPACE>.<TypeName>`.
pub const AGENT_NAMESPACE: &str = "watchtower";

/// An error value that can be reported through
/// [`Transaction::notice_error`](crate::transaction::Transaction::notice_error).
///
/// Implementations override the capability methods only when the error type
/// genuinely carries that information:
///
/// ```
/// use std::fmt;
/// use watchtower::classify::Noticeable;
///
/// #[derive(Debug)]
/// struct PaymentDeclined;
///
/// impl fmt::Display for PaymentDeclined {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "payment declined")
///     }
/// }
///
/// impl Noticeable for PaymentDeclined {
///     fn error_class(&self) -> Option<String> {
///         Some("PaymentError".to_string())
///     }
/// }
/// ```
pub trait Noticeable: fmt::Display {
    /// Class label supplied by the error value itself.
    ///
    /// Returning `Some("")` is treated the same as returning `None`.
    fn error_class(&self) -> Option<String> {
        None
    }

    /// Stack captured when the error value was constructed.
    ///
    /// When absent, the pipeline walks the live call stack at the point of
    /// notification instead.
    fn stack_trace(&self) -> Option<StackTrace> {
        None
    }
}

/// Result of classifying one error value.
#[derive(Debug, Clone)]
pub struct Classified {
    /// Class label; never empty.
    pub class: String,
    /// Pre-captured frames, when the value carried them.
    pub stack: Option<StackTrace>,
}

/// Classify an error value into a class label and optional pre-captured
/// stack.
///
/// A non-empty self-reported class is used verbatim. Otherwise the label is
/// synthesized as `<namespace>.<TypeName>` from the value's concrete type,
/// which is deterministic and non-empty even for opaque error values.
/// Pure: no side effects.
pub fn classify<E: Noticeable>(error: &E, namespace: &str) -> Classified {
    let class = match error.error_class() {
        Some(class) if !class.is_empty() => class,
        _ => format!("{namespace}.{}", short_type_name::<E>()),
    };
    Classified {
        class,
        stack: error.stack_trace(),
    }
}

/// Final path segment of a type's name, generic parameters stripped.
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
