use thiserror::Error;

/// Errors that can occur when writing a member through a [`Resolved`][crate::Resolved]
/// instance or through a [`Members`][crate::Members] implementation.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum MemberError {
    /// The member belongs to the awaiting protocol or to the internal plumbing of the instance
    /// and is not writable through a resolved instance.
    #[error("member '{name}' is hidden on resolved instances and cannot be written")]
    Hidden {
        /// Name of the rejected member.
        name: String,
    },

    /// The type has no member with this name.
    #[error("no member named '{name}'")]
    Unknown {
        /// Name of the missing member.
        name: String,
    },

    /// The member exists but only supports reading.
    #[error("member '{name}' is read-only")]
    ReadOnly {
        /// Name of the read-only member.
        name: String,
    },

    /// The member exists but cannot hold the provided value.
    #[error("member '{name}' cannot hold the provided value: expected {expected}")]
    TypeMismatch {
        /// Name of the member.
        name: String,

        /// A human-readable description of what the member accepts.
        expected: String,
    },
}

impl MemberError {
    pub(crate) fn hidden(name: &str) -> Self {
        Self::Hidden {
            name: name.to_string(),
        }
    }

    /// Shorthand for [`MemberError::Unknown`], for use by [`Members`][crate::Members]
    /// implementations.
    #[must_use]
    pub fn unknown(name: &str) -> Self {
        Self::Unknown {
            name: name.to_string(),
        }
    }

    /// Shorthand for [`MemberError::ReadOnly`], for use by [`Members`][crate::Members]
    /// implementations.
    #[must_use]
    pub fn read_only(name: &str) -> Self {
        Self::ReadOnly {
            name: name.to_string(),
        }
    }
}
