//! Token parser.
//!
//! Walks the token list once with a cursor. Each token is tried as a flag,
//! then as a variable (`-name:value` or `-name value`), and otherwise bound to
//! the next positional slot. Problems never abort the walk; they are
//! collected into a [`ParseReport`].
//!
//! # Examples
//!
//! ```
//! use ndk_core::{Arguments, FieldSet};
//!
//! #[derive(Default)]
//! struct Transfer {
//!     from: String,
//!     to: String,
//!     force: bool,
//! }
//!
//! impl Arguments for Transfer {
//!     fn declare(fields: &mut FieldSet<Self>) {
//!         fields.field("from", |a| &mut a.from).positional(0).required();
//!         fields.field("to", |a| &mut a.to).variable().required();
//!         fields.field("force", |a| &mut a.force).flag();
//!     }
//! }
//!
//! let parsed = Transfer::parse(&["a.txt", "-to:b.txt", "--force"]);
//! assert_eq!(parsed.from, "a.txt");
//! assert_eq!(parsed.to, "b.txt");
//! assert!(parsed.force);
//! assert!(!parsed.report.has_issues());
//!
//! let parsed = Transfer::parse(&["a.txt", "--force", "--force", "extra"]);
//! assert_eq!(parsed.report.duplicate, vec!["--force"]);
//! assert_eq!(parsed.report.unknown, vec!["extra"]);
//! assert_eq!(parsed.report.missing, vec!["-to"]);
//! ```

use std::ops::{Deref, DerefMut};

use crate::schema::{ArgumentInfo, ArgumentSchema};

/// Name sets collected while parsing one token list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// `true` when at least one argument was bound.
    pub any_arguments: bool,
    /// Arguments bound successfully, in binding order.
    pub parsed: Vec<String>,
    /// Arguments supplied again after a successful bind.
    pub duplicate: Vec<String>,
    /// Required arguments never bound.
    pub missing: Vec<String>,
    /// Tokens that matched no argument.
    pub unknown: Vec<String>,
    /// Arguments (or `name[i]` collection elements) whose value failed to parse.
    pub unparsed: Vec<String>,
}

impl ParseReport {
    /// `true` when any of unknown, duplicate, missing, or unparsed is
    /// non-empty.
    pub fn has_issues(&self) -> bool {
        !(self.unknown.is_empty()
            && self.duplicate.is_empty()
            && self.missing.is_empty()
            && self.unparsed.is_empty())
    }

    /// `true` when `name` was bound.
    pub fn is_parsed(&self, name: &str) -> bool {
        self.parsed.iter().any(|n| n == name)
    }
}

/// Bound arguments plus the report. Dereferences to the arguments.
#[derive(Debug, Clone, Default)]
pub struct ParseResult<A> {
    /// The populated instance.
    pub args: A,
    /// What happened while parsing.
    pub report: ParseReport,
}

impl<A> ParseResult<A> {
    /// Consumes the result, keeping the arguments.
    pub fn into_args(self) -> A {
        self.args
    }
}

impl<A> Deref for ParseResult<A> {
    type Target = A;

    fn deref(&self) -> &A {
        &self.args
    }
}

impl<A> DerefMut for ParseResult<A> {
    fn deref_mut(&mut self) -> &mut A {
        &mut self.args
    }
}

pub(crate) struct Parser<'s, A> {
    schema: &'s ArgumentSchema<A>,
    tokens: Vec<String>,
    cursor: usize,
    position: usize,
    args: A,
    report: ParseReport,
}

impl<'s, A: Default> Parser<'s, A> {
    pub(crate) fn new<S: AsRef<str>>(schema: &'s ArgumentSchema<A>, tokens: &[S]) -> Self {
        let tokens: Vec<String> = tokens.iter().map(|t| t.as_ref().to_string()).collect();
        let report = ParseReport {
            missing: schema.required_names().map(String::from).collect(),
            ..ParseReport::default()
        };
        Self {
            schema,
            tokens,
            cursor: 0,
            position: 0,
            args: A::default(),
            report,
        }
    }

    pub(crate) fn run(mut self) -> ParseResult<A> {
        while self.cursor < self.tokens.len() {
            self.step();
            self.cursor += 1;
        }
        self.report.any_arguments = !self.report.parsed.is_empty();
        ParseResult {
            args: self.args,
            report: self.report,
        }
    }

    fn step(&mut self) {
        let schema = self.schema;
        let token = self.tokens[self.cursor].clone();

        if let Some(flag) = schema.flag(&token) {
            if self.report.is_parsed(&flag.name) {
                self.report.duplicate.push(flag.name.clone());
            } else if flag.binder.slot(&mut self.args).toggle() {
                self.accept(flag);
            } else {
                self.report.unparsed.push(flag.name.clone());
            }
            return;
        }

        let (head, inline) = match token.split_once(':') {
            Some((head, value)) => (head, Some(value)),
            None => (token.as_str(), None),
        };
        if let Some(variable) = schema.variable(head) {
            if self.report.is_parsed(&variable.name) {
                self.report.duplicate.push(variable.name.clone());
                if inline.is_none() {
                    // the repeated value must not become a positional
                    self.cursor += 1;
                }
                return;
            }
            let value = match inline {
                Some(value) => value.to_string(),
                None if self.cursor + 1 < self.tokens.len() => {
                    self.cursor += 1;
                    self.tokens[self.cursor].clone()
                }
                None => {
                    self.report.unparsed.push(variable.name.clone());
                    return;
                }
            };
            self.bind(variable, &value);
            return;
        }

        match schema.positional(self.position) {
            Some(positional) => self.bind(positional, &token),
            None => self.report.unknown.push(token),
        }
        self.position += 1;
    }

    fn bind(&mut self, argument: &'s ArgumentInfo<A>, value: &str) {
        if !argument.is_collection {
            if argument.binder.slot(&mut self.args).assign(value) {
                self.accept(argument);
            } else {
                self.report.unparsed.push(argument.name.clone());
            }
            return;
        }

        let items: Vec<String> = if argument.is_remainder {
            let rest = self.tokens[self.cursor + 1..].iter().cloned();
            let items = std::iter::once(value.to_string()).chain(rest).collect();
            self.cursor = self.tokens.len();
            items
        } else {
            let value = value.trim();
            match value
                .strip_prefix('[')
                .and_then(|inner| inner.strip_suffix(']'))
            {
                Some(inner) => inner.split(',').map(|item| item.trim().to_string()).collect(),
                None => {
                    self.report.unparsed.push(argument.name.clone());
                    return;
                }
            }
        };

        let refs: Vec<&str> = items.iter().map(String::as_str).collect();
        let outcome = argument.binder.slot(&mut self.args).assign_all(&refs);
        for (index, ok) in outcome.iter().enumerate() {
            if !ok {
                self.report.unparsed.push(format!("{}[{index}]", argument.name));
            }
        }
        let all_failed = !outcome.is_empty() && outcome.iter().all(|ok| !ok);
        if !all_failed {
            self.accept(argument);
        }
    }

    fn accept(&mut self, argument: &ArgumentInfo<A>) {
        self.report.parsed.push(argument.name.clone());
        self.report.missing.retain(|name| name != &argument.name);
    }
}
