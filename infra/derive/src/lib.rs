#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the assetflow crates.
//!
//! * [`macro@main`] bootstraps an `async fn main` on a profile-based tokio runtime.
//! * [`macro@aflow_error`] turns a plain enum into a context-aware `thiserror` error.
//!
//! Examples are `ignore`d here because proc-macro crates cannot use their own
//! macros in doctests; the consuming crates exercise them in their tests.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, parse_macro_input};

/// Attribute macro to bootstrap the tokio runtime of a binary.
///
/// Transforms an `async fn main` returning a `Result` into a plain `fn main`
/// that builds an [`aflow_runtime`] runtime and blocks on the body.
///
/// # Arguments
///
/// * `current_thread` - Single-threaded, event-driven scheduler.
/// * `default` - Same as `current_thread`.
///
/// # Examples
///
/// ```rust,ignore
/// #[aflow_runtime::main(current_thread)]
/// async fn main() -> anyhow::Result<()> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Attribute macro for crate error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` when missing.
/// * **Context Support**: Generates a companion `<Name>Ext` trait that adds `.context()`
///   to `Result<T, Name>` and to `Result<T, Source>` for every wrapped source error.
/// * **Conversions**: Implements `From<Source>` for variants with a `source` field,
///   so `?` works on upstream errors.
/// * **Internal Fallback**: `From<&'static str>` and `From<String>` when an `Internal`
///   variant exists.
/// * **Kind**: `kind()` returns the variant name, handy for structured log fields.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants only.
/// 2. A `context` field must be typed `Option<Cow<'static, str>>`.
/// 3. Variants with a `source` (or `#[source]`/`#[from]`) field must also carry `context`.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[aflow_derive::aflow_error]
/// pub enum OutputError {
///     #[error("I/O failure{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read_manifest() -> Result<String, OutputError> {
///     std::fs::read_to_string("manifest.json").context("Reading manifest")
/// }
/// ```
#[proc_macro_attribute]
pub fn aflow_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
