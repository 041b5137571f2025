//! Configuration shared by inference and evaluation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::equality::EqualityMode;

/// Configuration and state for a pass.
///
/// Passed to both type inference and evaluation and controls recursion
/// limits, interruption, tracing and how types are compared.
#[derive(Debug, Clone)]
pub struct EvalContext {
    /// Maximum call depth (stack overflow protection)
    pub max_call_depth: usize,

    /// Interrupt flag - set to true to abort the pass
    pub interrupt: Arc<AtomicBool>,

    /// Render every visited node at debug level
    pub trace: bool,

    /// How struct and union types are compared in type assertions
    pub equality: EqualityMode,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            max_call_depth: 1000,
            interrupt: Arc::new(AtomicBool::new(false)),
            trace: false,
            equality: EqualityMode::Structural,
        }
    }
}

impl EvalContext {
    /// Create a new context with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with a custom call depth limit.
    pub fn with_max_call_depth(max_depth: usize) -> Self {
        Self {
            max_call_depth: max_depth,
            ..Default::default()
        }
    }

    /// Create a context comparing struct/union types in `mode`.
    pub fn with_equality(mode: EqualityMode) -> Self {
        Self {
            equality: mode,
            ..Default::default()
        }
    }

    /// Check if the pass has been interrupted.
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
    }

    /// Request interruption of the running pass.
    pub fn interrupt(&self) {
        self.interrupt.store(true, Ordering::Relaxed);
    }

    /// Reset the interrupt flag.
    pub fn reset_interrupt(&self) {
        self.interrupt.store(false, Ordering::Relaxed);
    }
}
