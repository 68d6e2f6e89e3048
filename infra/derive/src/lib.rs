#![allow(unreachable_pub)]

//! # Macros
//!
//! Procedural macros for the typebus workspace.
//!
//! Only one macro lives here for now: [`macro@bus_error`], which turns a plain
//! enum into an error type with context support. Every crate in the workspace
//! declares its errors through it so they share one shape.

mod error;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for declaring error enums.
///
/// # Generated Items
///
/// * `#[derive(Debug, thiserror::Error)]` unless already derived.
/// * A `<Name>Ext` trait with `.context(...)` for `Result<T, Name>`, filling the
///   `context` field of whichever variant was returned.
/// * For every variant holding only a source (a field named `source` or marked
///   `#[source]`) and `context`: `From<Source> for Name` and `<Name>Ext` for
///   `Result<T, Source>`, so `?` and `.context(..)` both work on upstream errors.
/// * A private `format_context` helper for use inside `#[error(...)]` strings.
///
/// # Requirements
///
/// 1. Applied to an **enum** with named-field variants only.
/// 2. A `context` field, when present, must be `Option<Cow<'static, str>>`.
/// 3. Variants with a source must also carry a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[typebus_derive::bus_error]
/// pub enum StoreError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Corrupted record{}: {message}", format_context(.context))]
///     Corrupted { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn load() -> Result<Vec<u8>, StoreError> {
///     std::fs::read("store.bin").context("Reading store snapshot")
/// }
/// ```
#[proc_macro_attribute]
pub fn bus_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    error::expand(input).unwrap_or_else(syn::Error::into_compile_error).into()
}
