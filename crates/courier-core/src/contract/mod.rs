//! Closed contract descriptions built once by the generation pass.
//!
//! A [`ServiceContract`] is an explicit, ordered list of
//! [`MethodDescriptor`]s. Nothing here is discovered by runtime
//! introspection: contracts come from the build-step manifest (or are
//! assembled directly with [`ServiceContract::builder`]) and are immutable
//! once built.

use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::GenerationError;

/// Wire shape a static type admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    /// `true` or `false`.
    Boolean,
    /// Whole numbers.
    Integer,
    /// Any number.
    Float,
    /// Strings.
    Text,
    /// Ordered sequences.
    List,
    /// String-keyed maps.
    Map,
    /// Structured records serialised as JSON objects.
    Record,
    /// Any value, including null.
    Any,
}

/// Values a type admits within its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Range {
    Unbounded,
    /// Two's complement integer of the given width.
    Signed(u32),
    /// Non-negative integer of the given width.
    Unsigned(u32),
    /// Exactly one Unicode scalar value.
    SingleChar,
}

impl Range {
    fn infer(segment: &str, shape: ValueShape) -> Self {
        match (shape, segment) {
            (ValueShape::Integer, "i8") => Self::Signed(8),
            (ValueShape::Integer, "i16") => Self::Signed(16),
            (ValueShape::Integer, "i32") => Self::Signed(32),
            (ValueShape::Integer, "i64" | "isize") => Self::Signed(64),
            (ValueShape::Integer, "i128") => Self::Signed(128),
            (ValueShape::Integer, "u8") => Self::Unsigned(8),
            (ValueShape::Integer, "u16") => Self::Unsigned(16),
            (ValueShape::Integer, "u32") => Self::Unsigned(32),
            (ValueShape::Integer, "u64" | "usize") => Self::Unsigned(64),
            (ValueShape::Integer, "u128") => Self::Unsigned(128),
            (ValueShape::Text, "char") => Self::SingleChar,
            _ => Self::Unbounded,
        }
    }

    fn admits_integer(self, number: &Number) -> bool {
        match self {
            Self::Signed(bits) if bits < 64 => {
                let half = 1_i64 << (bits - 1);
                number.as_i64().is_some_and(|value| (-half..half).contains(&value))
            }
            Self::Signed(64) => number.is_i64(),
            Self::Unsigned(bits) if bits < 64 => {
                number.as_u64().is_some_and(|value| value < 1_u64 << bits)
            }
            Self::Unsigned(_) => number.is_u64(),
            Self::Signed(_) | Self::Unbounded | Self::SingleChar => {
                number.is_i64() || number.is_u64()
            }
        }
    }

    fn admits_text(self, text: &str) -> bool {
        match self {
            Self::SingleChar => {
                let mut chars = text.chars();
                chars.next().is_some() && chars.next().is_none()
            }
            _ => true,
        }
    }
}

/// A static type reference as declared on a contract method.
///
/// The declared name is preserved verbatim for rendering. Signature
/// derivation only sees the erased name, so `Vec<String>` and `Vec<i64>`
/// are the same parameter type as far as overload resolution goes.
///
/// Fixed-width integers admit only values in their range, and `char` admits
/// only one-character strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeRef {
    name: String,
    shape: ValueShape,
    nullable: bool,
    #[serde(skip)]
    range: Range,
}

impl TypeRef {
    /// Creates a non-nullable type with an explicit shape.
    pub fn new(name: impl Into<String>, shape: ValueShape) -> Self {
        let name = name.into();
        let range = Range::infer(type_segment(&name), shape);
        Self {
            name,
            shape,
            nullable: false,
            range,
        }
    }

    /// Parses a declared type name, inferring its wire shape.
    ///
    /// `Option<T>` yields a nullable type with the shape of `T`. References
    /// and their lifetimes are looked through, so `&'a str` is text. Unknown
    /// names are treated as records.
    ///
    /// # Example
    ///
    /// ```
    /// use courier_core::contract::{TypeRef, ValueShape};
    ///
    /// let ty = TypeRef::parse("Option<Vec<String>>");
    /// assert_eq!(ty.shape(), ValueShape::List);
    /// assert!(ty.is_nullable());
    /// assert_eq!(ty.erased_name(), "Option");
    /// ```
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if let Some(inner) = generic_argument(strip_reference(name), "Option") {
            let inner = Self::parse(inner);
            return Self {
                name: name.to_owned(),
                nullable: true,
                ..inner
            };
        }
        Self::new(name, infer_shape(type_segment(name)))
    }

    /// `String`.
    #[must_use]
    pub fn text() -> Self {
        Self::new("String", ValueShape::Text)
    }

    /// `i64`.
    #[must_use]
    pub fn integer() -> Self {
        Self::new("i64", ValueShape::Integer)
    }

    /// `f64`.
    #[must_use]
    pub fn float() -> Self {
        Self::new("f64", ValueShape::Float)
    }

    /// `bool`.
    #[must_use]
    pub fn boolean() -> Self {
        Self::new("bool", ValueShape::Boolean)
    }

    /// An untyped wire value.
    #[must_use]
    pub fn any() -> Self {
        Self::new("Value", ValueShape::Any)
    }

    /// Wraps a type in `Option`, making it nullable.
    #[must_use]
    pub fn optional(inner: &Self) -> Self {
        Self {
            name: format!("Option<{}>", inner.name),
            nullable: true,
            ..inner.clone()
        }
    }

    /// Returns the declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the declared name with generic arguments removed.
    #[must_use]
    pub fn erased_name(&self) -> &str {
        base_name(&self.name)
    }

    /// Returns the wire shape.
    #[must_use]
    pub const fn shape(&self) -> ValueShape {
        self.shape
    }

    /// Returns whether null is assignable to this type.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns whether the value is assignable to this type.
    #[must_use]
    pub fn admits(&self, value: &Value) -> bool {
        match value {
            Value::Null => self.nullable || self.shape == ValueShape::Any,
            Value::Bool(_) => matches!(self.shape, ValueShape::Boolean | ValueShape::Any),
            Value::Number(number) => match self.shape {
                ValueShape::Integer => self.range.admits_integer(number),
                ValueShape::Float | ValueShape::Any => true,
                _ => false,
            },
            Value::String(text) => match self.shape {
                ValueShape::Text => self.range.admits_text(text),
                ValueShape::Any => true,
                _ => false,
            },
            Value::Array(_) => matches!(self.shape, ValueShape::List | ValueShape::Any),
            Value::Object(_) => matches!(
                self.shape,
                ValueShape::Map | ValueShape::Record | ValueShape::Any
            ),
        }
    }
}

/// Names the kind of a wire value for diagnostics.
#[must_use]
pub const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn base_name(name: &str) -> &str {
    name.split_once('<').map_or(name, |(base, _)| base).trim()
}

/// Strips leading `&`, `&mut` and `&'a` from a reference type.
fn strip_reference(name: &str) -> &str {
    let Some(rest) = name.strip_prefix('&') else {
        return name;
    };
    let rest = rest.trim_start();
    let rest = match rest.strip_prefix('\'') {
        Some(lifetime) => lifetime
            .split_once(char::is_whitespace)
            .map_or("", |(_, ty)| ty),
        None => rest,
    };
    let rest = rest.trim_start();
    let rest = rest
        .strip_prefix("mut")
        .filter(|ty| ty.starts_with(char::is_whitespace))
        .unwrap_or(rest);
    strip_reference(rest.trim_start())
}

/// The unqualified, non-generic name shape inference matches on.
fn type_segment(name: &str) -> &str {
    last_segment(base_name(strip_reference(name)))
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

fn generic_argument<'a>(name: &'a str, expected: &str) -> Option<&'a str> {
    let (base, rest) = name.split_once('<')?;
    if last_segment(base.trim()) != expected {
        return None;
    }
    rest.trim_end().strip_suffix('>').map(str::trim)
}

fn infer_shape(segment: &str) -> ValueShape {
    if segment.starts_with('[') {
        return ValueShape::List;
    }
    match segment {
        "String" | "str" | "char" => ValueShape::Text,
        "bool" => ValueShape::Boolean,
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
        | "u128" | "usize" => ValueShape::Integer,
        "f32" | "f64" => ValueShape::Float,
        "Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet" => ValueShape::List,
        "HashMap" | "BTreeMap" => ValueShape::Map,
        "Value" | "Any" => ValueShape::Any,
        _ => ValueShape::Record,
    }
}

/// One exposed method of a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    name: String,
    parameters: Vec<TypeRef>,
    returns: Option<TypeRef>,
}

impl MethodDescriptor {
    /// Creates a method with no parameters and no return value.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            returns: None,
        }
    }

    /// Appends a parameter type.
    #[must_use]
    pub fn with_parameter(mut self, parameter: TypeRef) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Sets the return type.
    #[must_use]
    pub fn returning(mut self, returns: TypeRef) -> Self {
        self.returns = Some(returns);
        self
    }

    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the ordered parameter types.
    #[must_use]
    pub fn parameters(&self) -> &[TypeRef] {
        &self.parameters
    }

    /// Returns the declared return type, if any.
    #[must_use]
    pub const fn returns(&self) -> Option<&TypeRef> {
        self.returns.as_ref()
    }

    /// Returns whether the method produces a value.
    #[must_use]
    pub const fn has_return(&self) -> bool {
        self.returns.is_some()
    }

    /// Returns whether both methods have the same name and erased
    /// parameter types, i.e. whether one overrides the other.
    #[must_use]
    pub fn overrides(&self, other: &Self) -> bool {
        self.name == other.name
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(left, right)| left.erased_name() == right.erased_name())
    }
}

/// An interface-like contract: a name and an ordered set of methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceContract {
    name: String,
    remote: bool,
    methods: Vec<MethodDescriptor>,
}

impl ServiceContract {
    /// Starts building a contract with the given declared name.
    pub fn builder(name: impl Into<String>) -> ContractBuilder {
        ContractBuilder {
            name: name.into(),
            remote: false,
            methods: Vec::new(),
        }
    }

    /// Returns the contract's declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns whether the contract is marked as remotely callable.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        self.remote
    }

    /// Returns the methods in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }
}

/// Builder for [`ServiceContract`].
#[derive(Debug, Clone)]
pub struct ContractBuilder {
    name: String,
    remote: bool,
    methods: Vec<MethodDescriptor>,
}

impl ContractBuilder {
    /// Marks the contract as remotely callable.
    #[must_use]
    pub const fn remote(mut self, remote: bool) -> Self {
        self.remote = remote;
        self
    }

    /// Appends a method.
    #[must_use]
    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// Appends several methods in order.
    #[must_use]
    pub fn methods(mut self, methods: impl IntoIterator<Item = MethodDescriptor>) -> Self {
        self.methods.extend(methods);
        self
    }

    /// Finishes the contract.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::EmptyName`] if the contract or any method
    /// has a blank name.
    pub fn build(self) -> Result<ServiceContract, GenerationError> {
        if self.name.trim().is_empty() {
            return Err(GenerationError::EmptyName { kind: "contract" });
        }
        if self.methods.iter().any(|m| m.name.trim().is_empty()) {
            return Err(GenerationError::EmptyName { kind: "method" });
        }
        Ok(ServiceContract {
            name: self.name,
            remote: self.remote,
            methods: self.methods,
        })
    }
}

#[cfg(test)]
mod tests;
