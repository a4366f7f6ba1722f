//! Cast expressions: type assertions over untyped envelope values.
//!
//! A [`Cast`] wraps a value-producing [`Expr`] with a target [`TypeRef`].
//! Evaluating it performs no conversion. The operand's value is either
//! assignable to the target, in which case it is passed through tagged with
//! the target type, or evaluation fails with [`CastError::TypeMismatch`].
//! Casts are themselves expressions, so they compose as operands of further
//! casts or as invocation arguments.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::contract::{TypeRef, value_kind};
use crate::error::CastError;

/// Values visible to an expression during evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvalScope<'a> {
    parameters: &'a [Value],
}

impl<'a> EvalScope<'a> {
    /// Creates a scope over an envelope's ordered parameter list.
    #[must_use]
    pub const fn new(parameters: &'a [Value]) -> Self {
        Self { parameters }
    }

    /// Reads the parameter at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CastError::MissingParameter`] when the index is out of range.
    pub fn parameter(&self, index: usize) -> Result<&'a Value, CastError> {
        self.parameters
            .get(index)
            .ok_or(CastError::MissingParameter {
                index,
                available: self.parameters.len(),
            })
    }
}

/// A value-producing expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Reads an envelope parameter by position.
    Parameter(usize),
    /// A constant value.
    Literal(Value),
    /// A nested cast.
    Cast(Box<Cast>),
}

impl Expr {
    /// Reads the envelope parameter at `index`.
    #[must_use]
    pub const fn parameter(index: usize) -> Self {
        Self::Parameter(index)
    }

    /// Returns the static type the expression is known to produce.
    #[must_use]
    pub fn static_type(&self) -> TypeRef {
        match self {
            Self::Parameter(_) | Self::Literal(_) => TypeRef::any(),
            Self::Cast(cast) => cast.target().clone(),
        }
    }

    /// Evaluates the expression against `scope`.
    ///
    /// # Errors
    ///
    /// Propagates [`CastError`] from parameter reads and nested casts.
    pub fn evaluate(&self, scope: &EvalScope<'_>) -> Result<TypedValue, CastError> {
        match self {
            Self::Parameter(index) => Ok(TypedValue::new(
                TypeRef::any(),
                scope.parameter(*index)?.clone(),
            )),
            Self::Literal(value) => Ok(TypedValue::new(TypeRef::any(), value.clone())),
            Self::Cast(cast) => cast.evaluate(scope),
        }
    }
}

impl From<Cast> for Expr {
    fn from(cast: Cast) -> Self {
        Self::Cast(Box::new(cast))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameter(index) => write!(f, "params[{index}]"),
            Self::Literal(value) => write!(f, "{value}"),
            Self::Cast(cast) => write!(f, "{cast}"),
        }
    }
}

/// A type assertion wrapping an operand expression.
///
/// # Example
///
/// ```
/// use courier_core::cast::{Cast, EvalScope, Expr};
/// use courier_core::contract::TypeRef;
/// use serde_json::json;
///
/// let cast = Cast::to(TypeRef::text(), Expr::parameter(0));
/// assert_eq!(cast.to_string(), "(String) params[0]");
///
/// let parameters = [json!("Ada")];
/// let value = cast.evaluate(&EvalScope::new(&parameters)).unwrap();
/// assert_eq!(value.value(), &json!("Ada"));
/// assert_eq!(value.ty(), &TypeRef::text());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Cast {
    target: TypeRef,
    operand: Expr,
}

impl Cast {
    /// Wraps `operand` with the target type.
    pub fn to(target: TypeRef, operand: impl Into<Expr>) -> Self {
        Self {
            target,
            operand: operand.into(),
        }
    }

    /// Returns the target type.
    #[must_use]
    pub const fn target(&self) -> &TypeRef {
        &self.target
    }

    /// Returns the wrapped operand.
    #[must_use]
    pub const fn operand(&self) -> &Expr {
        &self.operand
    }

    /// Evaluates the operand and asserts its value against the target type.
    ///
    /// # Errors
    ///
    /// Returns [`CastError::TypeMismatch`] if the value is not assignable,
    /// or any error raised while evaluating the operand.
    pub fn evaluate(&self, scope: &EvalScope<'_>) -> Result<TypedValue, CastError> {
        let operand = self.operand.evaluate(scope)?;
        if !self.target.admits(operand.value()) {
            return Err(CastError::TypeMismatch {
                expected: self.target.name().to_owned(),
                found: value_kind(operand.value()),
            });
        }
        Ok(TypedValue::new(self.target.clone(), operand.into_value()))
    }
}

impl fmt::Display for Cast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {}", self.target.name(), self.operand)
    }
}

/// A wire value paired with the static type it was asserted against.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    ty: TypeRef,
    value: Value,
}

impl TypedValue {
    /// Pairs a value with its static type.
    #[must_use]
    pub const fn new(ty: TypeRef, value: Value) -> Self {
        Self { ty, value }
    }

    /// Returns the static type.
    #[must_use]
    pub const fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Returns the wire value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the pair, returning the wire value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Hands the value to the marshalling layer, decoding it as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`CastError::Decode`] when the value does not deserialize.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CastError> {
        T::deserialize(&self.value).map_err(|source| CastError::Decode {
            target: type_name::<T>().to_owned(),
            source: Arc::new(source),
        })
    }
}
