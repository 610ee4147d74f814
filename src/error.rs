use std::fmt;

/// Errors surfaced by the simulator's public API.
///
/// Runtime degradation (missing reference frame, unbound input) is logged and
/// never reported through this type.
#[derive(Debug, thiserror::Error)]
pub enum XrSimError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot {op} while simulator is {state}")]
    Lifecycle {
        op: &'static str,
        state: &'static str,
    },

    #[error("Unknown action code {0}")]
    UnknownAction(u32),

    #[error("Invalid hand index {0}")]
    InvalidHand(i32),

    #[error("Sink stream stopped")]
    StreamStopped,

    #[error("Timeout waiting for frame")]
    Timeout,
}

/// Thread-safe last-error storage for the C FFI layer.
pub(crate) struct LastError {
    message: std::sync::Mutex<String>,
}

impl LastError {
    pub const fn new() -> Self {
        Self {
            message: std::sync::Mutex::new(String::new()),
        }
    }

    pub fn set(&self, err: &XrSimError) {
        if let Ok(mut msg) = self.message.lock() {
            *msg = fmt::format(format_args!("{}\0", err));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut msg) = self.message.lock() {
            msg.clear();
        }
    }

    pub fn as_ptr(&self) -> *const std::ffi::c_char {
        match self.message.lock() {
            Ok(msg) if !msg.is_empty() => msg.as_ptr() as *const std::ffi::c_char,
            _ => std::ptr::null(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_message() {
        let err = XrSimError::Lifecycle {
            op: "tick",
            state: "disposed",
        };
        assert_eq!(err.to_string(), "Cannot tick while simulator is disposed");
    }

    #[test]
    fn test_last_error_round_trip() {
        let last = LastError::new();
        assert!(last.as_ptr().is_null());
        last.set(&XrSimError::Timeout);
        assert!(!last.as_ptr().is_null());
        last.clear();
        assert!(last.as_ptr().is_null());
    }
}
