use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

macro_rules! newtype {
    ($name:ident, $doc:expr, $pattern:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parses a validated identifier from a string.
            pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
                static PATTERN: OnceLock<Regex> = OnceLock::new();
                let s = value.into();
                let re = PATTERN.get_or_init(|| Regex::new($pattern).expect("invalid regex"));
                if !re.is_match(&s) {
                    return Err(ValidationError::Malformed {
                        kind: stringify!($name),
                        value: s,
                    });
                }
                Ok(Self(s))
            }

            /// Borrowed string form.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

newtype!(
    FullName,
    "Fully-qualified protobuf message name such as `cosmos.bank.v1beta1.MsgSend`.",
    r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$"
);
newtype!(
    TypeUrl,
    "Message type identifier as carried in an `Any` (`/pkg.Msg` or `host/pkg.Msg`).",
    r"^[A-Za-z0-9._~:/-]+$"
);

impl TypeUrl {
    /// Strips any path prefix and returns the bare message name.
    pub fn message_name(&self) -> Result<FullName, ValidationError> {
        let bare = match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => self.0.as_str(),
        };
        FullName::parse(bare)
    }
}

impl FullName {
    /// The conventional `/`-prefixed type URL for this name.
    pub fn to_type_url(&self) -> TypeUrl {
        TypeUrl(format!("/{}", self.0))
    }

    /// Name of the package portion (everything before the last `.`).
    pub fn package(&self) -> &str {
        match self.0.rfind('.') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }
}
