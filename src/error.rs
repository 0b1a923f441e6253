//! Error types produced while parsing pointcut expressions and weaving.
//!
//! Everything in here is fatal for the weave that raised it: a partially woven system is never
//! handed to callers. Runtime failures of advice or method bodies are a different thing and are
//! modelled by [`crate::runtime::InvocationError`].

use std::fmt;

/// Weave-time error
///
/// Returned by the expression parser, the aspect registry, the matching engine and the proxy
/// builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AopError {
    /// The pointcut expression could not be parsed
    InvalidExpression {
        /// The offending expression or token
        expression: String,
        /// What is wrong with it
        reason: String,
        /// Where the expression was declared, e.g. `Acme::LoggingAspect::log (around)`
        source_hint: String,
    },
    /// The aspect configuration is inconsistent
    ///
    /// Covers empty aspects, custom filters that cannot be resolved, advice without a
    /// registered implementation, method-name conflicts between introductions and introduced
    /// methods without any implementation.
    Configuration {
        /// Human-readable description
        message: String,
    },
    /// A pointcut reference names a pointcut that does not exist
    UnknownPointcut {
        /// Aspect class the reference points into
        aspect: String,
        /// Name of the missing pointcut
        pointcut: String,
    },
    /// Pointcut references form a cycle
    CircularPointcutReference {
        /// The references visited, in order, ending with the one that closed the cycle
        chain: Vec<String>,
    },
    /// The class manifest refers to classes or interfaces it does not define
    Manifest {
        /// Human-readable description
        message: String,
    },
}

impl AopError {
    pub(crate) fn invalid_expression(
        expression: impl Into<String>,
        reason: impl Into<String>,
        source_hint: impl Into<String>,
    ) -> Self {
        AopError::InvalidExpression {
            expression: expression.into(),
            reason: reason.into(),
            source_hint: source_hint.into(),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        AopError::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn manifest(message: impl Into<String>) -> Self {
        AopError::Manifest {
            message: message.into(),
        }
    }
}

impl fmt::Display for AopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AopError::InvalidExpression {
                expression,
                reason,
                source_hint,
            } => write!(
                f,
                "Invalid pointcut expression \"{}\": {}, defined in {}",
                expression, reason, source_hint
            ),
            AopError::Configuration { message } => {
                write!(f, "AOP configuration error: {}", message)
            }
            AopError::UnknownPointcut { aspect, pointcut } => write!(
                f,
                "No pointcut \"{}\" found in aspect class \"{}\"",
                pointcut, aspect
            ),
            AopError::CircularPointcutReference { chain } => write!(
                f,
                "Circular pointcut reference detected: {}",
                chain.join(" -> ")
            ),
            AopError::Manifest { message } => write!(f, "Class manifest error: {}", message),
        }
    }
}

impl std::error::Error for AopError {}

/// Convenience alias used throughout the weaver
pub type Result<T> = std::result::Result<T, AopError>;
