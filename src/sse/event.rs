use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::SseError;

/// Name written to the `event:` field of a frame.
///
/// Construction rejects names the client could not parse back: empty names
/// and names containing `\r` or `\n`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventName(Cow<'static, str>);

impl EventName {
    /// Generic event; browsers dispatch it to `onmessage`.
    pub const MESSAGE: EventName = EventName(Cow::Borrowed("message"));
    /// Error-channel event.
    pub const ERROR: EventName = EventName(Cow::Borrowed("error"));

    /// Build a name from a literal, validated at compile time in const contexts.
    ///
    /// # Panics
    ///
    /// If `name` is empty or contains a line break.
    pub const fn from_static(name: &'static str) -> Self {
        let bytes = name.as_bytes();
        assert!(!bytes.is_empty(), "event name must not be empty");
        let mut i = 0;
        while i < bytes.len() {
            assert!(bytes[i] != b'\n' && bytes[i] != b'\r', "event name must not contain line breaks");
            i += 1;
        }
        EventName(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Result<Self, SseError> {
        let name = name.into();
        if name.is_empty() || name.contains(['\r', '\n']) {
            return Err(SseError::InvalidEventName {
                name: name.into_owned(),
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EventName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for EventName {
    type Err = SseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

/// A payload type that knows which event it is sent as.
///
/// ```
/// use brrtrouter_sse::sse::{EventName, NamedEvent};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Progress {
///     percent: u8,
/// }
///
/// const PROGRESS: EventName = EventName::from_static("progress");
///
/// impl NamedEvent for Progress {
///     fn event_name(&self) -> EventName {
///         PROGRESS
///     }
/// }
/// ```
pub trait NamedEvent: Serialize {
    fn event_name(&self) -> EventName;
}
