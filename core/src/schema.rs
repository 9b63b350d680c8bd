//! Argument declarations and schema extraction.
//!
//! A type opts into argument parsing by implementing [`Arguments`] and listing
//! its fields in [`Arguments::declare`]. Extraction folds those declarations
//! into an [`ArgumentSchema`]: the recognized arguments in declaration order,
//! plus the fields whose declarations cannot be honored.
//!
//! Categories are sticky: a field that names a category starts it, and every
//! following field inherits it until the next field names another one.
//!
//! # Examples
//!
//! ```
//! use ndk_core::{ArgumentKind, Arguments, FieldSet};
//!
//! #[derive(Default)]
//! struct Build {
//!     target: String,
//!     release: bool,
//!     jobs: u32,
//! }
//!
//! impl Arguments for Build {
//!     fn declare(fields: &mut FieldSet<Self>) {
//!         fields.field("target", |a| &mut a.target).positional(0).required();
//!         fields.field("release", |a| &mut a.release).flag().category("Options");
//!         fields.field("jobs", |a| &mut a.jobs).variable().named("-j");
//!     }
//! }
//!
//! let schema = Build::schema();
//! assert_eq!(schema.arguments().len(), 3);
//! assert_eq!(schema.by_name("--release").unwrap().category, "Options");
//! // sticky category
//! assert_eq!(schema.by_name("-j").unwrap().category, "Options");
//! assert_eq!(schema.positional(0).unwrap().kind, ArgumentKind::Positional(0));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use thiserror::Error;

use crate::parse::{ParseResult, Parser};
use crate::value::{ElementKind, ElementType, FieldShape, FieldValue};

/// A type whose fields are bound from command-line tokens.
pub trait Arguments: Default + Send + Sync + 'static {
    /// Lists the declared fields, in order.
    fn declare(fields: &mut FieldSet<Self>);

    /// Returns the cached schema for this type.
    fn schema() -> Arc<ArgumentSchema<Self>> {
        ArgumentSchema::shared()
    }

    /// Parses `tokens` into a fresh instance.
    fn parse<S: AsRef<str>>(tokens: &[S]) -> ParseResult<Self> {
        Self::schema().parse(tokens)
    }
}

/// Role of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentKind {
    /// Bound by position among non-flag, non-variable tokens.
    Positional(usize),
    /// Bound by name, value after `:` or in the next token.
    Variable,
    /// Bound by name alone.
    Flag,
}

impl fmt::Display for ArgumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positional(index) => write!(f, "positional {index}"),
            Self::Variable => f.write_str("variable"),
            Self::Flag => f.write_str("flag"),
        }
    }
}

/// Why a declared field was left out of the schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidReason {
    /// The field type has no parse contract.
    #[error("type {type_name} has no parse contract")]
    NoParseContract { type_name: &'static str },
    /// Flags must be `bool` or an integer counter.
    #[error("flag fields must be bool or an integer counter, found {type_name}")]
    FlagType { type_name: &'static str },
}

/// A declared field that could not become an argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidField {
    /// Field identifier.
    pub field: &'static str,
    /// Category in effect at the field.
    pub category: String,
    /// Cause.
    pub reason: InvalidReason,
}

impl fmt::Display for InvalidField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

pub(crate) trait Bind<A>: Send + Sync {
    fn slot<'a>(&self, args: &'a mut A) -> &'a mut dyn FieldValue;
}

struct Accessor<A, V> {
    access: fn(&mut A) -> &mut V,
}

impl<A: 'static, V: FieldValue> Bind<A> for Accessor<A, V> {
    fn slot<'a>(&self, args: &'a mut A) -> &'a mut dyn FieldValue {
        (self.access)(args)
    }
}

/// Declaration of one field, built by [`FieldSet::field`].
pub struct FieldDecl<A> {
    ident: &'static str,
    shape: FieldShape,
    binder: Box<dyn Bind<A>>,
    position: Option<usize>,
    variable: bool,
    flag: bool,
    name: Option<String>,
    description: String,
    category: Option<String>,
    required: bool,
    remainder: bool,
}

impl<A> FieldDecl<A> {
    /// Binds the field to the positional slot `index`.
    pub fn positional(&mut self, index: usize) -> &mut Self {
        self.position = Some(index);
        self
    }

    /// Binds the field to a named variable (`-name:value` / `-name value`).
    pub fn variable(&mut self) -> &mut Self {
        self.variable = true;
        self
    }

    /// Binds the field to a named flag.
    pub fn flag(&mut self) -> &mut Self {
        self.flag = true;
        self
    }

    /// Overrides the argument name.
    pub fn named(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the help text.
    pub fn describe(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = description.into();
        self
    }

    /// Starts a category at this field.
    pub fn category(&mut self, category: impl Into<String>) -> &mut Self {
        self.category = Some(category.into());
        self
    }

    /// Marks the argument as required.
    pub fn required(&mut self) -> &mut Self {
        self.required = true;
        self
    }

    /// Lets a collection consume every remaining token.
    pub fn remainder(&mut self) -> &mut Self {
        self.remainder = true;
        self
    }

    fn kind(&self) -> Option<ArgumentKind> {
        match (self.position, self.variable, self.flag) {
            (Some(index), _, _) => Some(ArgumentKind::Positional(index)),
            (None, true, _) => Some(ArgumentKind::Variable),
            (None, false, true) => Some(ArgumentKind::Flag),
            (None, false, false) => None,
        }
    }
}

/// Ordered field declarations of an [`Arguments`] type.
pub struct FieldSet<A> {
    fields: Vec<FieldDecl<A>>,
}

impl<A: 'static> FieldSet<A> {
    fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Declares the field reached through `access`.
    ///
    /// `ident` is the field identifier; it supplies the default argument
    /// name (`ident`, `-ident` or `--ident` by role).
    pub fn field<V: FieldValue>(
        &mut self,
        ident: &'static str,
        access: fn(&mut A) -> &mut V,
    ) -> &mut FieldDecl<A> {
        self.fields.push(FieldDecl {
            ident,
            shape: V::shape(),
            binder: Box::new(Accessor { access }),
            position: None,
            variable: false,
            flag: false,
            name: None,
            description: String::new(),
            category: None,
            required: false,
            remainder: false,
        });
        let last = self.fields.len() - 1;
        &mut self.fields[last]
    }
}

/// One recognized argument.
pub struct ArgumentInfo<A> {
    /// Role.
    pub kind: ArgumentKind,
    /// Token name (`language`, `-dir`, `--help`).
    pub name: String,
    /// Help text.
    pub description: String,
    /// Category in effect at the field; empty when none.
    pub category: String,
    /// Field identifier.
    pub field: &'static str,
    /// Element type.
    pub element: ElementType,
    /// `true` for `Vec<T>` fields.
    pub is_collection: bool,
    /// `true` when a collection consumes every remaining token.
    pub is_remainder: bool,
    /// `true` when absence is reported as missing.
    pub required: bool,
    pub(crate) binder: Box<dyn Bind<A>>,
}

impl<A> ArgumentInfo<A> {
    /// Usage fragment for help output.
    pub fn usage(&self) -> String {
        let body = match self.kind {
            ArgumentKind::Positional(_) => format!("<{}>", self.name),
            ArgumentKind::Variable => format!("{} {}", self.name, self.element.hint()),
            ArgumentKind::Flag => self.name.clone(),
        };
        let body = if self.is_collection {
            format!("{body}...")
        } else {
            body
        };
        if self.required {
            body
        } else {
            format!("[{body}]")
        }
    }
}

impl<A> fmt::Debug for ArgumentInfo<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentInfo")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("field", &self.field)
            .field("element", &self.element.name)
            .field("is_collection", &self.is_collection)
            .field("is_remainder", &self.is_remainder)
            .field("required", &self.required)
            .finish()
    }
}

/// Extracted schema of an [`Arguments`] type.
pub struct ArgumentSchema<A> {
    arguments: Vec<ArgumentInfo<A>>,
    invalid: Vec<InvalidField>,
}

struct Extraction<A> {
    category: String,
    arguments: Vec<ArgumentInfo<A>>,
    invalid: Vec<InvalidField>,
}

impl<A> Extraction<A> {
    fn absorb(mut self, decl: FieldDecl<A>) -> Self {
        if let Some(category) = &decl.category {
            self.category = category.clone();
        }
        let Some(kind) = decl.kind() else {
            return self;
        };

        let (element, is_collection) = match decl.shape {
            FieldShape::Scalar { element, .. } => (element, false),
            FieldShape::Collection { element } => (element, true),
            FieldShape::Unsupported { type_name } => {
                self.reject(decl.ident, InvalidReason::NoParseContract { type_name });
                return self;
            }
        };

        let toggles = matches!(
            decl.shape,
            FieldShape::Scalar {
                element: ElementType {
                    kind: ElementKind::Boolean | ElementKind::Integer,
                    ..
                },
                optional: false,
            }
        );
        if kind == ArgumentKind::Flag && !toggles {
            let type_name = decl.shape.type_name();
            self.reject(decl.ident, InvalidReason::FlagType { type_name });
            return self;
        }

        let name = decl.name.unwrap_or_else(|| match kind {
            ArgumentKind::Positional(_) => decl.ident.to_string(),
            ArgumentKind::Variable => format!("-{}", decl.ident),
            ArgumentKind::Flag => format!("--{}", decl.ident),
        });
        self.arguments.push(ArgumentInfo {
            kind,
            name,
            description: decl.description,
            category: self.category.clone(),
            field: decl.ident,
            element,
            is_collection,
            is_remainder: is_collection && decl.remainder,
            required: decl.required,
            binder: decl.binder,
        });
        self
    }

    fn reject(&mut self, field: &'static str, reason: InvalidReason) {
        self.invalid.push(InvalidField {
            field,
            category: self.category.clone(),
            reason,
        });
    }
}

static SCHEMAS: LazyLock<Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

impl<A: Arguments> ArgumentSchema<A> {
    /// Extracts a fresh schema from `A`'s declarations.
    pub fn extract() -> Self {
        let mut fields = FieldSet::new();
        A::declare(&mut fields);
        let extraction = fields.fields.into_iter().fold(
            Extraction {
                category: String::new(),
                arguments: Vec::new(),
                invalid: Vec::new(),
            },
            Extraction::absorb,
        );
        Self {
            arguments: extraction.arguments,
            invalid: extraction.invalid,
        }
    }

    /// Returns the schema for `A`, extracting it on first use.
    ///
    /// Concurrent first calls may both extract; one result wins and every
    /// caller observes it afterwards.
    pub fn shared() -> Arc<Self> {
        let key = TypeId::of::<A>();
        let cached = SCHEMAS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(schema) = cached.and_then(|any| any.downcast::<Self>().ok()) {
            return schema;
        }

        let fresh: Arc<dyn Any + Send + Sync> = Arc::new(Self::extract());
        let stored = SCHEMAS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(fresh)
            .clone();
        match stored.downcast::<Self>() {
            Ok(schema) => schema,
            Err(_) => Arc::new(Self::extract()),
        }
    }

    /// Parses `tokens` against this schema.
    pub fn parse<S: AsRef<str>>(&self, tokens: &[S]) -> ParseResult<A> {
        Parser::new(self, tokens).run()
    }
}

impl<A> ArgumentSchema<A> {
    /// All arguments in declaration order.
    pub fn arguments(&self) -> &[ArgumentInfo<A>] {
        &self.arguments
    }

    /// Fields that could not become arguments.
    pub fn invalid_fields(&self) -> &[InvalidField] {
        &self.invalid
    }

    /// Positional arguments, in declaration order.
    pub fn positionals(&self) -> impl Iterator<Item = &ArgumentInfo<A>> {
        self.arguments
            .iter()
            .filter(|a| matches!(a.kind, ArgumentKind::Positional(_)))
    }

    /// Variable arguments, in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = &ArgumentInfo<A>> {
        self.arguments
            .iter()
            .filter(|a| a.kind == ArgumentKind::Variable)
    }

    /// Flag arguments, in declaration order.
    pub fn flags(&self) -> impl Iterator<Item = &ArgumentInfo<A>> {
        self.arguments.iter().filter(|a| a.kind == ArgumentKind::Flag)
    }

    /// The first positional declared for `index`.
    pub fn positional(&self, index: usize) -> Option<&ArgumentInfo<A>> {
        self.arguments
            .iter()
            .find(|a| a.kind == ArgumentKind::Positional(index))
    }

    /// The first argument named `name`.
    pub fn by_name(&self, name: &str) -> Option<&ArgumentInfo<A>> {
        self.arguments.iter().find(|a| a.name == name)
    }

    pub(crate) fn variable(&self, name: &str) -> Option<&ArgumentInfo<A>> {
        self.variables().find(|a| a.name == name)
    }

    pub(crate) fn flag(&self, name: &str) -> Option<&ArgumentInfo<A>> {
        self.flags().find(|a| a.name == name)
    }

    /// Arguments in `category`; the empty string selects uncategorized ones.
    pub fn in_category<'s>(&'s self, category: &'s str) -> impl Iterator<Item = &'s ArgumentInfo<A>> {
        self.arguments.iter().filter(move |a| a.category == category)
    }

    /// Distinct categories in first-seen order, excluding the empty one.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for argument in &self.arguments {
            if !argument.category.is_empty() && !seen.contains(&argument.category.as_str()) {
                seen.push(&argument.category);
            }
        }
        seen
    }

    /// Names of required arguments.
    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.arguments
            .iter()
            .filter(|a| a.required)
            .map(|a| a.name.as_str())
    }
}

impl<A> fmt::Debug for ArgumentSchema<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentSchema")
            .field("arguments", &self.arguments)
            .field("invalid", &self.invalid)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    struct Mixed {
        first: String,
        second: Vec<String>,
        out: Option<String>,
        verbose: bool,
        level: u8,
        label: String,
        lookup: HashMap<String, String>,
        untouched: String,
        both: String,
        override_pos: String,
    }

    impl Arguments for Mixed {
        fn declare(fields: &mut FieldSet<Self>) {
            fields.field("first", |a| &mut a.first).positional(0).required();
            fields
                .field("second", |a| &mut a.second)
                .positional(1)
                .remainder()
                .category("Input");
            fields.field("out", |a| &mut a.out).variable().describe("Output file");
            fields.field("verbose", |a| &mut a.verbose).flag().category("Switches");
            fields.field("level", |a| &mut a.level).flag().named("-v");
            fields.field("label", |a| &mut a.label).flag();
            fields.field("lookup", |a| &mut a.lookup).variable().category("Broken");
            fields.field("untouched", |a| &mut a.untouched);
            fields.field("both", |a| &mut a.both).flag().variable();
            fields.field("override_pos", |a| &mut a.override_pos).positional(0);
        }
    }

    #[test]
    fn test_default_names_by_role() {
        let schema = ArgumentSchema::<Mixed>::extract();
        assert!(schema.by_name("first").is_some());
        assert!(schema.by_name("-out").is_some());
        assert!(schema.by_name("--verbose").is_some());
        assert!(schema.by_name("-v").is_some());
    }

    #[test]
    fn test_role_priority() {
        let schema = ArgumentSchema::<Mixed>::extract();
        let both = schema.by_name("-both").unwrap();
        assert_eq!(both.kind, ArgumentKind::Variable);
    }

    #[test]
    fn test_unmarked_field_is_skipped() {
        let schema = ArgumentSchema::<Mixed>::extract();
        assert!(schema.arguments().iter().all(|a| a.field != "untouched"));
        assert!(schema.invalid_fields().iter().all(|f| f.field != "untouched"));
    }

    #[test]
    fn test_invalid_fields_recorded() {
        let schema = ArgumentSchema::<Mixed>::extract();
        let invalid: Vec<&str> = schema.invalid_fields().iter().map(|f| f.field).collect();
        assert_eq!(invalid, vec!["label", "lookup"]);
        assert!(matches!(
            schema.invalid_fields()[0].reason,
            InvalidReason::FlagType { .. }
        ));
        assert_eq!(schema.invalid_fields()[1].category, "Broken");
    }

    #[test]
    fn test_sticky_categories() {
        let schema = ArgumentSchema::<Mixed>::extract();
        assert_eq!(schema.by_name("first").unwrap().category, "");
        assert_eq!(schema.by_name("second").unwrap().category, "Input");
        assert_eq!(schema.by_name("-out").unwrap().category, "Input");
        assert_eq!(schema.by_name("-v").unwrap().category, "Switches");
        assert_eq!(schema.by_name("-both").unwrap().category, "Broken");
        assert_eq!(schema.categories(), vec!["Input", "Switches", "Broken"]);
    }

    #[test]
    fn test_remainder_only_on_collections() {
        let schema = ArgumentSchema::<Mixed>::extract();
        let second = schema.by_name("second").unwrap();
        assert!(second.is_collection);
        assert!(second.is_remainder);
        assert!(!schema.by_name("first").unwrap().is_remainder);
    }

    #[test]
    fn test_positional_collision_first_wins() {
        let schema = ArgumentSchema::<Mixed>::extract();
        assert_eq!(schema.positional(0).unwrap().field, "first");
        assert_eq!(schema.positionals().count(), 3);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let a = ArgumentSchema::<Mixed>::extract();
        let b = ArgumentSchema::<Mixed>::extract();
        let names = |s: &ArgumentSchema<Mixed>| {
            s.arguments()
                .iter()
                .map(|a| (a.name.clone(), a.category.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&a), names(&b));
        assert_eq!(a.invalid_fields(), b.invalid_fields());
    }

    #[test]
    fn test_shared_schema_is_cached() {
        let a = Mixed::schema();
        let b = Mixed::schema();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_usage_fragments() {
        let schema = ArgumentSchema::<Mixed>::extract();
        assert_eq!(schema.by_name("first").unwrap().usage(), "<first>");
        assert_eq!(schema.by_name("second").unwrap().usage(), "[<second>...]");
        assert_eq!(schema.by_name("-out").unwrap().usage(), "[-out <text>]");
        assert_eq!(schema.by_name("--verbose").unwrap().usage(), "[--verbose]");
    }
}
