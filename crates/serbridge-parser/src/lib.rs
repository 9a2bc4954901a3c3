//! Type expression parser for serbridge.
//!
//! Turns the textual generics grammar used by class descriptors and member
//! declarations (`pkg.Outer.Inner<K, V>`, `? extends Foo & Bar`,
//! `const pkg.List<T>[]`) into [`BoundTemplate`](serbridge_core::BoundTemplate)
//! values.
//!
//! # Example
//!
//! ```
//! use serbridge_core::{ClassRef, QualifiedName, Substitution};
//! use serbridge_parser::parse_type;
//!
//! let mut resolve = |name: &QualifiedName| Some(ClassRef::simple(name.clone()));
//! let ty = parse_type("java.lang.String[]", &Substitution::default(), &mut resolve).unwrap();
//! assert_eq!(ty.to_string(), "java.lang.String[]");
//! ```

pub mod lexer;
mod parser;

pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{ClassResolver, TypeParser, parse_type};
