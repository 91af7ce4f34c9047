use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Result of one analyzer run. A degraded outcome still carries a usable
/// (neutral/default) result together with the reason it was degraded.
///
/// Serializes as `{"status": "ok", "result": ..}` or
/// `{"status": "degraded", "result": .., "reason": ..}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ok(T),
    Degraded { result: T, reason: String },
}

impl<T> Outcome<T> {
    pub fn degraded(result: T, reason: impl Into<String>) -> Self {
        Outcome::Degraded {
            result,
            reason: reason.into(),
        }
    }

    /// Run a fallible computation; on error fall back to `default`.
    pub fn from_result<F>(result: anyhow::Result<T>, default: F) -> Self
    where
        F: FnOnce() -> T,
    {
        match result {
            Ok(value) => Outcome::Ok(value),
            Err(e) => Outcome::degraded(default(), format!("{:#}", e)),
        }
    }

    pub fn result(&self) -> &T {
        match self {
            Outcome::Ok(result) | Outcome::Degraded { result, .. } => result,
        }
    }

    pub fn into_result(self) -> T {
        match self {
            Outcome::Ok(result) | Outcome::Degraded { result, .. } => result,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Degraded { reason, .. } => Some(reason),
        }
    }
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let fields = if self.is_degraded() { 3 } else { 2 };
        let mut state = serializer.serialize_struct("Outcome", fields)?;
        state.serialize_field("status", if self.is_degraded() { "degraded" } else { "ok" })?;
        state.serialize_field("result", self.result())?;
        if let Some(reason) = self.reason() {
            state.serialize_field("reason", reason)?;
        }
        state.end()
    }
}
