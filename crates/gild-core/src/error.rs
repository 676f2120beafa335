//! Error types shared by the decoration engine
//!
//! One enum per failure layer, mirroring where each failure is detected:
//! [`RegistrationError`] at type-decoration time, [`LookupError`] at the
//! lookup-service boundary, and [`DispatchError`] during dispatch against
//! a decorated instance. Errors raised by user-supplied handlers, coerced
//! callbacks, or lookup services travel through the transparent `Raised`
//! variants and keep their original identity and message.

use crate::types::LookupKey;

/// Boxed collaborator error, identity-preserving
pub type RaisedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Malformed declarations detected when a type is decorated
///
/// Fatal for the type: a type that fails registration cannot be decorated.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// Two distinct injection markers on the same member
    #[error("Conflicting injection markers on {type_name}.{member}: `{first}` and `{second}`")]
    ConflictingInjectionMarkers {
        /// Declaring type
        type_name: String,
        /// Member carrying the markers
        member: String,
        /// First marker name
        first: String,
        /// Second marker name
        second: String,
    },

    /// Injection marker on a member that is not a zero-argument getter
    /// (or its paired single-argument setter)
    #[error("Injection marker on {type_name}.{member}, which is not a value-returning zero-argument method")]
    InjectableNotGetter {
        /// Declaring type
        type_name: String,
        /// Offending member
        member: String,
    },

    /// Setter parameter type cannot accept the getter's declared type
    #[error("Setter for injection point {type_name}.{member} takes `{setter}`, incompatible with getter type `{getter}`")]
    SetterTypeMismatch {
        /// Declaring type
        type_name: String,
        /// Injection point name
        member: String,
        /// Getter's declared type
        getter: String,
        /// Setter's parameter type
        setter: String,
    },

    /// Two overloads with identical parameter lists
    #[error("Duplicate overload {type_name}.{member}({params})")]
    DuplicateOverload {
        /// Declaring type
        type_name: String,
        /// Member name
        member: String,
        /// Rendered parameter list
        params: String,
    },
}

/// Failure reported by a lookup service
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// No provider registered under the key
    #[error("no provider registered for key `{0}`")]
    NotFound(LookupKey),

    /// More than one provider registered under the key
    #[error("multiple providers registered for key `{0}`")]
    Ambiguous(LookupKey),

    /// Arbitrary failure raised inside the service; propagates unchanged
    #[error(transparent)]
    Raised(RaisedError),
}

/// Failure during dispatch against a decorated instance
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No declared method matched and no method-missing hook is configured
    #[error("Unknown method: {name}/{arity}")]
    UnknownMethod {
        /// Requested method name
        name: String,
        /// Number of supplied arguments
        arity: usize,
    },

    /// No declared property matched and no property hook is configured
    #[error("Unknown property: {name}")]
    UnknownProperty {
        /// Requested property name
        name: String,
    },

    /// An injection point's lookup failed
    #[error("Unresolved dependency for injection point `{point}` (key `{key}`): {reason}")]
    UnresolvedDependency {
        /// Injection point name
        point: String,
        /// Key that was looked up
        key: LookupKey,
        /// Why the lookup failed
        reason: String,
    },

    /// Type registration failed
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// Error raised by a user-supplied body, handler, callback, or
    /// service; propagates with its original identity and message
    #[error(transparent)]
    Raised(RaisedError),
}

impl DispatchError {
    /// Wrap a collaborator error for identity-preserving propagation
    pub fn raised<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DispatchError::Raised(Box::new(err))
    }

    /// Check for the unknown-method kind
    pub fn is_unknown_method(&self) -> bool {
        matches!(self, DispatchError::UnknownMethod { .. })
    }

    /// Check for the unknown-property kind
    pub fn is_unknown_property(&self) -> bool {
        matches!(self, DispatchError::UnknownProperty { .. })
    }
}

/// Dispatch result alias
pub type DispatchResult<T> = Result<T, DispatchError>;
