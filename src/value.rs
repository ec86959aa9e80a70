use std::fmt::Display;

use num::ToPrimitive;

/// The kind of a node. A node is either a [`ShorKind::Table`] of children or
/// one of the three scalar leaf kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShorKind {
    /// A numeric leaf, held as an `f64`.
    Number,
    /// A `true`/`false` leaf.
    Boolean,
    /// A double-quoted string leaf.
    String,
    /// An ordered container of child nodes, written within `{ }`.
    Table,
}

impl Display for ShorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShorKind::Number => write!(f, "number"),
            ShorKind::Boolean => write!(f, "boolean"),
            ShorKind::String => write!(f, "string"),
            ShorKind::Table => write!(f, "table"),
        }
    }
}

/// The value of a leaf node.
///
/// Every Rust integer and float type converts into [`ShorValue::Number`],
/// `bool` into [`ShorValue::Boolean`] and `&str`/`String` into
/// [`ShorValue::String`]. Nothing else does.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum ShorValue {
    /// A number, e.g. `42`, `-1.5`, `.5e3`.
    Number(f64),

    /// `true` or `false`.
    Boolean(bool),

    /// Unescaped string content.
    String(String),
}

impl ShorValue {
    /// Returns the [`ShorKind`] this value makes a node.
    pub fn kind(&self) -> ShorKind {
        match self {
            ShorValue::Number(_) => ShorKind::Number,
            ShorValue::Boolean(_) => ShorKind::Boolean,
            ShorValue::String(_) => ShorKind::String,
        }
    }

    /// Returns `true` if the value is a [`ShorValue::Number`].
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(..))
    }

    /// Returns `true` if the value is a [`ShorValue::Boolean`].
    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Boolean(..))
    }

    /// Returns `true` if the value is a [`ShorValue::String`].
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(..))
    }

    /// Returns `Some(f64)` if the value is a [`ShorValue::Number`].
    pub fn as_f64(&self) -> Option<f64> {
        if let Self::Number(v) = self {
            Some(*v)
        } else {
            None
        }
    }

    /// Returns `Some(bool)` if the value is a [`ShorValue::Boolean`].
    pub fn as_bool(&self) -> Option<bool> {
        if let Self::Boolean(v) = self {
            Some(*v)
        } else {
            None
        }
    }

    /// Returns `Some(&str)` if the value is a [`ShorValue::String`].
    pub fn as_string(&self) -> Option<&str> {
        if let Self::String(v) = self {
            Some(v)
        } else {
            None
        }
    }

    /// Whether the value can be written back as a literal. Only NaN and the
    /// infinities can't.
    pub(crate) fn is_representable(&self) -> bool {
        match self {
            ShorValue::Number(n) => n.is_finite(),
            _ => true,
        }
    }
}

/// Renders the value the way it is written in a document: numbers and
/// booleans verbatim, strings quoted and escaped.
impl Display for ShorValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{}", value),
            Self::Boolean(value) => write!(f, "{}", value),
            Self::String(value) => write_string(f, value),
        }
    }
}

pub(crate) fn write_string(f: &mut impl std::fmt::Write, string: &str) -> std::fmt::Result {
    write!(f, "\"")?;
    for char in string.chars() {
        match char {
            '\\' | '"' => write!(f, "\\{}", char)?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            '\u{08}' => write!(f, "\\b")?,
            '\u{0C}' => write!(f, "\\f")?,
            '\0' => write!(f, "\\0")?,
            c if c.is_control() => write!(f, "\\u{{{:x}}}", c as u32)?,
            _ => write!(f, "{}", char)?,
        }
    }
    write!(f, "\"")?;
    Ok(())
}

macro_rules! impl_from_number {
    ($($ty:ty)*) => {
        $(
            impl From<$ty> for ShorValue {
                fn from(value: $ty) -> Self {
                    // Primitive numbers always have an f64 approximation; NaN
                    // is only a fallback and is rejected on insertion.
                    ShorValue::Number(value.to_f64().unwrap_or(f64::NAN))
                }
            }
        )*
    };
}

impl_from_number!(i8 i16 i32 i64 i128 isize u8 u16 u32 u64 u128 usize f32 f64);

impl From<bool> for ShorValue {
    fn from(value: bool) -> Self {
        ShorValue::Boolean(value)
    }
}

impl From<&str> for ShorValue {
    fn from(value: &str) -> Self {
        ShorValue::String(value.to_string())
    }
}

impl From<String> for ShorValue {
    fn from(value: String) -> Self {
        ShorValue::String(value)
    }
}

impl From<&String> for ShorValue {
    fn from(value: &String) -> Self {
        ShorValue::String(value.clone())
    }
}

/// Types a leaf's value can be read into with
/// [`ShorTree::get`](crate::ShorTree::get).
///
/// Reading never converts between kinds: a Number leaf only reads as `f64`, a
/// Boolean leaf only as `bool`, and a String leaf only as `String`.
pub trait FromShorValue: Sized {
    /// Extracts `Self` from `value`, or `None` if the kinds don't match.
    fn from_shor_value(value: &ShorValue) -> Option<Self>;
}

impl FromShorValue for f64 {
    fn from_shor_value(value: &ShorValue) -> Option<Self> {
        value.as_f64()
    }
}

impl FromShorValue for bool {
    fn from_shor_value(value: &ShorValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromShorValue for String {
    fn from_shor_value(value: &ShorValue) -> Option<Self> {
        value.as_string().map(str::to_owned)
    }
}

impl FromShorValue for ShorValue {
    fn from_shor_value(value: &ShorValue) -> Option<Self> {
        Some(value.clone())
    }
}
