//! Element parse contracts and field shapes.
//!
//! Two traits split the work of binding a token to a field:
//!
//! - [`ArgValue`] is the parse contract of a single element type (`String`,
//!   `bool`, integers, floats, `char`, `PathBuf`, enumerations declared with
//!   [`enum_argument!`](crate::enum_argument)).
//! - [`FieldValue`] describes the *shape* of a declared field (scalar,
//!   optional scalar, collection, or unsupported) and performs the type-erased
//!   assignment the parser drives.
//!
//! # Examples
//!
//! ```
//! use ndk_core::{ArgValue, ElementKind, FieldShape, FieldValue};
//!
//! assert_eq!(i32::parse_arg("42"), Some(42));
//! assert_eq!(bool::parse_arg("TRUE"), Some(true));
//! assert_eq!(<String as ArgValue>::KIND, ElementKind::Text);
//!
//! let mut items: Vec<u8> = Vec::new();
//! assert_eq!(items.assign_all(&["1", "x", "3"]), vec![true, false, true]);
//! assert_eq!(items, vec![1, 0, 3]);
//! assert!(matches!(<Vec<u8>>::shape(), FieldShape::Collection { .. }));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::str::FromStr;

use strum::{Display, VariantNames};

/// Broad classification of an element type, used for flag validity and help
/// hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ElementKind {
    /// Free text; any token binds unchanged.
    Text,
    /// `true` / `false`, case-insensitive.
    Boolean,
    /// Any primitive integer.
    Integer,
    /// `f32` or `f64`.
    Float,
    /// A single character.
    Character,
    /// A filesystem path.
    Path,
    /// A named member of an enumeration.
    Enumerated,
}

/// Static description of an element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementType {
    /// Fully qualified Rust type name.
    pub name: &'static str,
    /// Classification of the type.
    pub kind: ElementKind,
    /// Accepted names for enumerations; empty otherwise.
    pub choices: &'static [&'static str],
}

impl ElementType {
    /// Describes the element type `T`.
    pub fn of<T: ArgValue>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            kind: T::KIND,
            choices: T::choices(),
        }
    }

    /// Short hint for help output (`<path>`, `<a|b|c>`).
    pub fn hint(&self) -> String {
        if self.choices.is_empty() {
            format!("<{}>", self.kind)
        } else {
            format!("<{}>", self.choices.join("|"))
        }
    }
}

/// Parse contract of a single element type.
///
/// `parse_arg` must not panic; a token that does not parse yields `None` and
/// the parser records it as unparsed.
pub trait ArgValue: Default + Sized + 'static {
    /// Classification of this type.
    const KIND: ElementKind;

    /// Parses one token.
    fn parse_arg(text: &str) -> Option<Self>;

    /// Renders the value as a token that [`parse_arg`](Self::parse_arg)
    /// accepts.
    fn to_arg(&self) -> String;

    /// Toggles the value in place when used as a flag. Returns `false` for
    /// types that cannot act as flags.
    fn toggle(&mut self) -> bool {
        false
    }

    /// Accepted names for enumerations.
    fn choices() -> &'static [&'static str] {
        &[]
    }
}

/// Shape of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// A single value; `optional` for `Option<T>`.
    Scalar {
        element: ElementType,
        optional: bool,
    },
    /// A `Vec<T>` of elements.
    Collection { element: ElementType },
    /// A type with no parse contract.
    Unsupported { type_name: &'static str },
}

impl FieldShape {
    /// Scalar shape for `T`.
    pub fn scalar<T: ArgValue>(optional: bool) -> Self {
        Self::Scalar {
            element: ElementType::of::<T>(),
            optional,
        }
    }

    /// Element type, if the shape has one.
    pub fn element(&self) -> Option<ElementType> {
        match self {
            Self::Scalar { element, .. } | Self::Collection { element } => Some(*element),
            Self::Unsupported { .. } => None,
        }
    }

    /// Name of the declared type for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar { element, .. } | Self::Collection { element } => element.name,
            Self::Unsupported { type_name } => type_name,
        }
    }
}

/// A declarable field type.
///
/// Implemented for every [`ArgValue`] type, for `Option<T>` and `Vec<T>` of
/// those, and (as unsupported) for map types so that they can be declared and
/// reported as invalid instead of failing to compile.
pub trait FieldValue: 'static {
    /// Shape of this field type.
    fn shape() -> FieldShape
    where
        Self: Sized;

    /// Binds one token. Leaves the value untouched on failure.
    fn assign(&mut self, _text: &str) -> bool {
        false
    }

    /// Replaces a collection with the parsed items; failed items become
    /// defaults. Returns per-item success.
    fn assign_all(&mut self, _items: &[&str]) -> Vec<bool> {
        Vec::new()
    }

    /// Flag toggle.
    fn toggle(&mut self) -> bool {
        false
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! scalar_field {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::FieldValue for $ty {
            fn shape() -> $crate::FieldShape {
                $crate::FieldShape::scalar::<$ty>(false)
            }

            fn assign(&mut self, text: &str) -> bool {
                match <$ty as $crate::ArgValue>::parse_arg(text) {
                    Some(value) => {
                        *self = value;
                        true
                    }
                    None => false,
                }
            }

            fn toggle(&mut self) -> bool {
                <$ty as $crate::ArgValue>::toggle(self)
            }
        }
    )+};
}

/// Implements [`ArgValue`] and [`FieldValue`] for `strum`-derived
/// enumerations. Names match case-insensitively.
///
/// The enum needs `Default`, `Display`, `EnumString` and `VariantNames`.
///
/// # Examples
///
/// ```
/// use ndk_core::{ArgValue, enum_argument};
/// use strum::{Display, EnumString, VariantNames};
///
/// #[derive(Debug, Default, PartialEq, Display, EnumString, VariantNames)]
/// enum Format {
///     #[default]
///     Table,
///     Json,
/// }
/// enum_argument!(Format);
///
/// assert_eq!(Format::parse_arg("json"), Some(Format::Json));
/// assert_eq!(Format::parse_arg("xml"), None);
/// assert_eq!(Format::choices(), &["Table", "Json"]);
/// ```
#[macro_export]
macro_rules! enum_argument {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::ArgValue for $ty {
            const KIND: $crate::ElementKind = $crate::ElementKind::Enumerated;

            fn parse_arg(text: &str) -> Option<Self> {
                $crate::parse_enumerated(text)
            }

            fn to_arg(&self) -> String {
                ::std::string::ToString::to_string(self)
            }

            fn choices() -> &'static [&'static str] {
                <$ty as $crate::__private::VariantNames>::VARIANTS
            }
        }
        $crate::scalar_field!($ty);
    )+};
}

/// Case-insensitive lookup of an enumeration member by name.
pub fn parse_enumerated<E>(text: &str) -> Option<E>
where
    E: VariantNames + FromStr,
{
    let text = text.trim();
    E::VARIANTS
        .iter()
        .find(|name| name.eq_ignore_ascii_case(text))
        .and_then(|name| name.parse().ok())
}

impl ArgValue for String {
    const KIND: ElementKind = ElementKind::Text;

    fn parse_arg(text: &str) -> Option<Self> {
        Some(text.to_string())
    }

    fn to_arg(&self) -> String {
        self.clone()
    }
}

impl ArgValue for bool {
    const KIND: ElementKind = ElementKind::Boolean;

    fn parse_arg(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("true") {
            Some(true)
        } else if text.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }

    fn to_arg(&self) -> String {
        self.to_string()
    }

    fn toggle(&mut self) -> bool {
        *self = !*self;
        true
    }
}

impl ArgValue for char {
    const KIND: ElementKind = ElementKind::Character;

    fn parse_arg(text: &str) -> Option<Self> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }

    fn to_arg(&self) -> String {
        self.to_string()
    }
}

impl ArgValue for PathBuf {
    const KIND: ElementKind = ElementKind::Path;

    fn parse_arg(text: &str) -> Option<Self> {
        if text.is_empty() {
            None
        } else {
            Some(PathBuf::from(text))
        }
    }

    fn to_arg(&self) -> String {
        self.display().to_string()
    }
}

macro_rules! integer_argument {
    ($($ty:ty),+) => {$(
        impl ArgValue for $ty {
            const KIND: ElementKind = ElementKind::Integer;

            fn parse_arg(text: &str) -> Option<Self> {
                text.trim().parse().ok()
            }

            fn to_arg(&self) -> String {
                self.to_string()
            }

            // Counter flags cycle between 0 and 1.
            fn toggle(&mut self) -> bool {
                *self = if *self > 0 { 0 } else { 1 };
                true
            }
        }
    )+};
}

macro_rules! float_argument {
    ($($ty:ty),+) => {$(
        impl ArgValue for $ty {
            const KIND: ElementKind = ElementKind::Float;

            fn parse_arg(text: &str) -> Option<Self> {
                text.trim().parse().ok()
            }

            fn to_arg(&self) -> String {
                self.to_string()
            }
        }
    )+};
}

integer_argument!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
float_argument!(f32, f64);

scalar_field!(
    String, bool, char, PathBuf, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize,
    f32, f64,
);

impl<T: ArgValue> FieldValue for Option<T> {
    fn shape() -> FieldShape {
        FieldShape::scalar::<T>(true)
    }

    fn assign(&mut self, text: &str) -> bool {
        match T::parse_arg(text) {
            Some(value) => {
                *self = Some(value);
                true
            }
            None => false,
        }
    }
}

impl<T: ArgValue> FieldValue for Vec<T> {
    fn shape() -> FieldShape {
        FieldShape::Collection {
            element: ElementType::of::<T>(),
        }
    }

    fn assign_all(&mut self, items: &[&str]) -> Vec<bool> {
        let parsed: Vec<Option<T>> = items.iter().map(|item| T::parse_arg(item)).collect();
        let outcome = parsed.iter().map(Option::is_some).collect();
        *self = parsed.into_iter().map(Option::unwrap_or_default).collect();
        outcome
    }
}

impl<K: 'static, V: 'static, S: 'static> FieldValue for HashMap<K, V, S> {
    fn shape() -> FieldShape {
        FieldShape::Unsupported {
            type_name: std::any::type_name::<Self>(),
        }
    }
}

impl<K: 'static, V: 'static> FieldValue for BTreeMap<K, V> {
    fn shape() -> FieldShape {
        FieldShape::Unsupported {
            type_name: std::any::type_name::<Self>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use strum::EnumString;

    #[derive(Debug, Default, Clone, Copy, PartialEq, Display, EnumString, VariantNames)]
    enum Shade {
        #[default]
        Light,
        Dark,
    }
    crate::enum_argument!(Shade);

    #[test]
    fn test_bool_parses_case_insensitively() {
        assert_eq!(bool::parse_arg("True"), Some(true));
        assert_eq!(bool::parse_arg("false"), Some(false));
        assert_eq!(bool::parse_arg("yes"), None);
    }

    #[test]
    fn test_integer_counter_cycles() {
        let mut count = 0u32;
        assert!(FieldValue::toggle(&mut count));
        assert_eq!(count, 1);
        assert!(FieldValue::toggle(&mut count));
        assert_eq!(count, 0);

        let mut negative = -4i64;
        FieldValue::toggle(&mut negative);
        assert_eq!(negative, 1);
    }

    #[test]
    fn test_text_cannot_toggle() {
        let mut text = String::new();
        assert!(!FieldValue::toggle(&mut text));
    }

    #[test]
    fn test_failed_scalar_leaves_value() {
        let mut value = 7i32;
        assert!(!value.assign("seven"));
        assert_eq!(value, 7);
    }

    #[test]
    fn test_enumerated_matches_any_case() {
        assert_eq!(Shade::parse_arg("DARK"), Some(Shade::Dark));
        assert_eq!(Shade::parse_arg(" light "), Some(Shade::Light));
        assert_eq!(Shade::parse_arg("dim"), None);
        assert_eq!(ElementType::of::<Shade>().hint(), "<Light|Dark>");
    }

    #[test]
    fn test_char_requires_single_character() {
        assert_eq!(char::parse_arg("x"), Some('x'));
        assert_eq!(char::parse_arg("xy"), None);
        assert_eq!(char::parse_arg(""), None);
    }

    #[test]
    fn test_optional_assign() {
        let mut value: Option<PathBuf> = None;
        assert!(value.assign("src/main.rs"));
        assert_eq!(value, Some(PathBuf::from("src/main.rs")));
        assert!(matches!(
            <Option<PathBuf>>::shape(),
            FieldShape::Scalar { optional: true, .. }
        ));
    }

    #[test]
    fn test_collection_replaces_contents() {
        let mut values = vec![Shade::Dark; 4];
        assert_eq!(values.assign_all(&["dark", "nope"]), vec![true, false]);
        assert_eq!(values, vec![Shade::Dark, Shade::Light]);
    }

    #[test]
    fn test_map_is_unsupported() {
        assert!(matches!(
            <HashMap<String, String>>::shape(),
            FieldShape::Unsupported { .. }
        ));
        assert_eq!(<BTreeMap<u8, u8>>::shape().element(), None);
    }

    proptest! {
        #[test]
        fn prop_integers_round_trip(value in any::<i64>()) {
            prop_assert_eq!(i64::parse_arg(&value.to_arg()), Some(value));
        }

        #[test]
        fn prop_floats_round_trip(value in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
            prop_assert_eq!(f64::parse_arg(&value.to_arg()), Some(value));
        }

        #[test]
        fn prop_bools_round_trip(value in any::<bool>()) {
            prop_assert_eq!(bool::parse_arg(&value.to_arg()), Some(value));
        }

        #[test]
        fn prop_enums_round_trip(value in prop_oneof![Just(Shade::Light), Just(Shade::Dark)]) {
            prop_assert_eq!(Shade::parse_arg(&value.to_arg()), Some(value));
        }

        #[test]
        fn prop_text_passes_through(value in ".*") {
            prop_assert_eq!(String::parse_arg(&value), Some(value.clone()));
        }
    }
}
