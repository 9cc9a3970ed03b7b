//! Procedural macros for the argos metrics library.
//!
//! `#[derive(Tags)]` implements `argos::TagValues` for a struct with named
//! fields, so one type can declare a vector's variable tags and look up its
//! entries:
//!
//! ```text
//! #[derive(Tags)]
//! struct Request {
//!     method: &'static str,
//!     #[tag(name = "status_code")]
//!     status: u16,
//! }
//! ```
//!
//! Field names (or their `#[tag(name = "...")]` overrides) become the tag
//! names, in declaration order. Every field type must implement `Display`.
//!
//! See the main `argos` crate documentation for usage examples.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod tags_derive;

#[proc_macro_derive(Tags, attributes(tag))]
pub fn derive_tags(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    tags_derive::expand_tags_derive(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
