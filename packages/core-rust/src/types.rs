//! Routing vocabulary shared by the dispatch engine and its collaborators.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved identifier / product-code value meaning "match any".
pub const WILDCARD: &str = "*";

/// Segment separator used in method names and routing signatures.
pub const SEPARATOR: &str = ".";

/// Well-known event identifiers emitted by devices.
pub mod events {
    /// A device connected to the platform.
    pub const DEVICE_ONLINE: &str = "device.online";
    /// A device disconnected from the platform.
    pub const DEVICE_OFFLINE: &str = "device.offline";
}

// ---------------------------------------------------------------------------
// StreamDirection
// ---------------------------------------------------------------------------

/// Whether a message flows from a device into the platform or the other way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamDirection {
    /// Device -> platform.
    Inputting,
    /// Platform -> device.
    Outputting,
}

impl StreamDirection {
    /// Wire/log name of the direction.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inputting => "INPUTTING",
            Self::Outputting => "OUTPUTTING",
        }
    }
}

impl fmt::Display for StreamDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MethodType
// ---------------------------------------------------------------------------

/// Coarse classifier taken from the second segment of a method name
/// (`thing.event.device.online` -> `Event`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MethodType {
    Event,
    Service,
    Property,
    /// Generic classifier: used when the method name carries no recognizable
    /// method-type segment, and by registrations that apply to every type.
    AllMethod,
}

impl MethodType {
    /// Classifies a method-type token, ignoring ASCII case.
    ///
    /// Unknown tokens classify as [`MethodType::AllMethod`].
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        if token.eq_ignore_ascii_case("event") {
            Self::Event
        } else if token.eq_ignore_ascii_case("service") {
            Self::Service
        } else if token.eq_ignore_ascii_case("property") {
            Self::Property
        } else {
            Self::AllMethod
        }
    }

    /// Classifies a full dotted method name by its second segment.
    #[must_use]
    pub fn from_method(method: &str) -> Self {
        method
            .split(SEPARATOR)
            .nth(1)
            .map_or(Self::AllMethod, Self::from_token)
    }

    /// Whether a registration qualified with `self` applies to a message of
    /// type `other`.
    #[must_use]
    pub fn accepts(self, other: MethodType) -> bool {
        self == Self::AllMethod || self == other
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Event => "EVENT",
            Self::Service => "SERVICE",
            Self::Property => "PROPERTY",
            Self::AllMethod => "ALL_METHOD",
        }
    }
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
