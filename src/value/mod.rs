//! Typed attribute values.
//!
//! Attribute values are stored as text. [`FromAttributeText`] converts that
//! text into a Rust value using XML Schema lexical rules (`true`/`1`,
//! `INF`, surrounding whitespace ignored).

use crate::error::DomError;

/// Parses attribute text into a typed value.
pub trait FromAttributeText: Sized {
    /// Name used in [`DomError::Parse`] and [`DomError::KeyDerivation`].
    const TYPE_NAME: &'static str;

    /// Converts `text`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Parse`] when the text is not a valid lexical form.
    fn from_attribute_text(text: &str) -> Result<Self, DomError>;
}

fn parse_failure<T: FromAttributeText>(text: &str) -> DomError {
    DomError::Parse {
        text: text.to_string(),
        target: T::TYPE_NAME,
    }
}

impl FromAttributeText for String {
    const TYPE_NAME: &'static str = "string";

    fn from_attribute_text(text: &str) -> Result<Self, DomError> {
        Ok(text.to_string())
    }
}

impl FromAttributeText for bool {
    const TYPE_NAME: &'static str = "boolean";

    fn from_attribute_text(text: &str) -> Result<Self, DomError> {
        match text.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(parse_failure::<Self>(text)),
        }
    }
}

macro_rules! integer_attribute {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl FromAttributeText for $ty {
                const TYPE_NAME: &'static str = $name;

                fn from_attribute_text(text: &str) -> Result<Self, DomError> {
                    let trimmed = text.trim();
                    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
                    digits.parse().map_err(|_| parse_failure::<Self>(text))
                }
            }
        )*
    };
}

integer_attribute! {
    i32 => "int",
    i64 => "long",
    u32 => "unsignedInt",
    u64 => "unsignedLong",
}

impl FromAttributeText for f64 {
    const TYPE_NAME: &'static str = "double";

    fn from_attribute_text(text: &str) -> Result<Self, DomError> {
        match text.trim() {
            "INF" | "+INF" => Ok(f64::INFINITY),
            "-INF" => Ok(f64::NEG_INFINITY),
            "NaN" => Ok(f64::NAN),
            // Only the spellings above are valid; reject Rust's "inf" and "nan".
            t if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => {
                Err(parse_failure::<Self>(text))
            }
            t => t.parse().map_err(|_| parse_failure::<Self>(text)),
        }
    }
}
