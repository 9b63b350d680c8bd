//! Declarative argument engine.
//!
//! Argument types describe their fields once and get parsing, diagnostics,
//! and help text from that description:
//!
//! - [`Arguments`] / [`FieldSet`]: declare positional arguments, named
//!   variables, and flags on the fields of a plain struct.
//! - [`ArgumentSchema`]: the extracted, cached description of a type,
//!   including [`InvalidField`]s whose declarations cannot be honored.
//! - [`ParseResult`] / [`ParseReport`]: the bound instance plus what was
//!   parsed, duplicated, missing, unknown, or unparsable.
//! - [`ArgValue`] / [`FieldValue`]: element parse contracts and field shapes.
//! - [`render_issues`], [`render_usage`], [`render_category`],
//!   [`render_arguments`], [`render_table`]: plain-text diagnostics and help.
//!
//! # Example
//!
//! ```
//! use ndk_core::*;
//! use strum::{Display, EnumString, VariantNames};
//!
//! #[derive(Debug, Default, PartialEq, Display, EnumString, VariantNames)]
//! enum Mode {
//!     #[default]
//!     Debug,
//!     Release,
//! }
//! enum_argument!(Mode);
//!
//! #[derive(Default)]
//! struct Build {
//!     project: String,
//!     mode: Mode,
//!     defines: Vec<String>,
//!     verbose: bool,
//! }
//!
//! impl Arguments for Build {
//!     fn declare(fields: &mut FieldSet<Self>) {
//!         fields.field("project", |a| &mut a.project).positional(0).required();
//!         fields.field("mode", |a| &mut a.mode).variable();
//!         fields.field("defines", |a| &mut a.defines).variable().named("-D");
//!         fields.field("verbose", |a| &mut a.verbose).flag();
//!     }
//! }
//!
//! let parsed = Build::parse(&["app", "-mode:release", "-D", "[A,B]", "--verbose"]);
//! assert_eq!(parsed.mode, Mode::Release);
//! assert_eq!(parsed.defines, vec!["A", "B"]);
//! assert!(parsed.verbose);
//! assert!(render_issues(&parsed.report).is_none());
//! ```

mod parse;
mod render;
mod schema;
mod value;

pub use parse::{ParseReport, ParseResult};
pub use render::{render_arguments, render_category, render_issues, render_table, render_usage};
pub use schema::{
    ArgumentInfo, ArgumentKind, ArgumentSchema, Arguments, FieldDecl, FieldSet, InvalidField,
    InvalidReason,
};
pub use value::{ArgValue, ElementKind, ElementType, FieldShape, FieldValue, parse_enumerated};

#[doc(hidden)]
pub mod __private {
    pub use strum::VariantNames;
}
