//! Error taxonomy for expression evaluation.

use scenario_core::ParseError;

use crate::client::ClientError;
use crate::value::ValueKind;

/// Errors raised while resolving an expression to a value.
///
/// Dispatch never recovers locally from these. The only place two errors
/// compete is the dual parse in [`crate::coerce::map_value`], which keeps
/// the literal error over the evaluation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// An atom failed a cheap, tag-specific literal interpretation.
    #[error("cannot read `{text}` as {expected}: {reason}")]
    Literal {
        expected: ValueKind,
        text: String,
        reason: String,
    },

    /// A value's tag did not match the tag the caller required.
    #[error("expected {expected} from {expression}, got: {actual}")]
    TypeMismatch {
        expected: ValueKind,
        expression: String,
        actual: String,
    },

    /// No fetcher in the consulted registry carries this name.
    #[error("unknown {namespace} command: {name}")]
    UnknownCommand { namespace: String, name: String },

    /// A name matched but no overload accepted the arguments.
    #[error(
        "{namespace} command {name} rejected {expression} (tried: {tried}): {cause}",
        tried = .signatures.join(" | ")
    )]
    ArgumentMismatch {
        namespace: String,
        name: String,
        expression: String,
        signatures: Vec<String>,
        cause: Box<EvalError>,
    },

    /// An overload was skipped because the argument count did not fit.
    #[error("expected {expected} argument(s), got {given}")]
    Arity { expected: String, given: usize },

    /// The expression does not start with a command name.
    #[error(
        "{namespace} expression must start with a command name, got {expression}"
    )]
    InvalidExpression {
        namespace: String,
        expression: String,
    },

    /// A resolver asked for an argument its fetcher never declared.
    #[error("missing argument: {name}")]
    MissingArgument { name: String },

    /// Required context state (last contract, last invocation, receipt) is absent.
    #[error("{message}")]
    Precondition { message: String },

    /// World configuration could not be loaded or is invalid.
    #[error("config error: {message}")]
    Config { message: String },

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl EvalError {
    pub fn precondition(message: impl Into<String>) -> Self {
        EvalError::Precondition {
            message: message.into(),
        }
    }
}

/// Fetcher table misconfiguration, detected when a registry is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{namespace}: command name must not be empty")]
    EmptyName { namespace: String },

    #[error("{namespace} {command}: duplicate argument `{arg}`")]
    DuplicateArgument {
        namespace: String,
        command: String,
        arg: String,
    },

    #[error(
        "{namespace} {command}: variadic argument `{arg}` must be the last argument"
    )]
    VariadicNotLast {
        namespace: String,
        command: String,
        arg: String,
    },

    #[error(
        "{namespace} {command}: variadic argument `{arg}` cannot have a default"
    )]
    VariadicDefault {
        namespace: String,
        command: String,
        arg: String,
    },

    #[error(
        "{namespace} {command}: required argument `{arg}` follows a defaulted argument"
    )]
    RequiredAfterDefault {
        namespace: String,
        command: String,
        arg: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_mismatch_lists_signatures_and_cause() {
        let err = EvalError::ArgumentMismatch {
            namespace: "Core".into(),
            name: "Pick".into(),
            expression: "(Pick)".into(),
            signatures: vec!["Pick a".into(), "Pick a b".into()],
            cause: Box::new(EvalError::Arity {
                expected: "2".into(),
                given: 0,
            }),
        };
        assert_eq!(
            err.to_string(),
            "Core command Pick rejected (Pick) (tried: Pick a | Pick a b): \
             expected 2 argument(s), got 0"
        );
    }

    #[test]
    fn literal_error_display() {
        let err = EvalError::Literal {
            expected: ValueKind::Number,
            text: "abc".into(),
            reason: "not a number".into(),
        };
        assert_eq!(err.to_string(), "cannot read `abc` as Number: not a number");
    }
}
