use std::sync::{Arc, Mutex, MutexGuard};

/// Pending input shared between speech capture and the session controller.
///
/// Cloning hands out another handle to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    inner: Arc<Mutex<String>>,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, String> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a dictated fragment, separated from existing text by a space
    pub fn push_fragment(&self, fragment: &str) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }
        let mut buf = self.lock();
        if !buf.is_empty() && !buf.ends_with(char::is_whitespace) {
            buf.push(' ');
        }
        buf.push_str(fragment);
    }

    /// Replace the whole buffer
    pub fn set(&self, text: impl Into<String>) {
        *self.lock() = text.into();
    }

    /// Drain the buffer
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.lock())
    }

    pub fn snapshot(&self) -> String {
        self.lock().clone()
    }

    pub fn is_blank(&self) -> bool {
        self.lock().trim().is_empty()
    }
}
