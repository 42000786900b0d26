// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Test attribute macros that give every test its own log file.
//!
//! Both macros wrap the test body with a `codio_test_utils::TestLoggerGuard`
//! and bind a `logger` (`&mut TestLogger`) for the body to write into. The
//! guard records success when the body completes and failure on `Err` or
//! panic.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{ItemFn, ReturnType, Type, parse_macro_input, spanned::Spanned};

/// Wrap a synchronous `#[test]`.
///
/// ```rust,ignore
/// #[codio_test_utils::logged_test]
/// fn replays_initial_frame() {
///     logger.log("materializing at 0ms").unwrap();
/// }
/// ```
#[proc_macro_attribute]
pub fn logged_test(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            Span::call_site(),
            "#[logged_test] does not accept arguments",
        )
        .to_compile_error()
        .into();
    }

    let input = parse_macro_input!(item as ItemFn);
    if let Some(async_token) = &input.sig.asyncness {
        return syn::Error::new(
            async_token.span(),
            "#[logged_test] cannot wrap an async fn; use #[logged_tokio_test]",
        )
        .to_compile_error()
        .into();
    }

    expand(input, quote! { #[::core::prelude::v1::test] })
}

/// Wrap an async Tokio test.
///
/// Arguments are forwarded to `#[tokio::test]`, so paused-clock tests are
/// written as `#[logged_tokio_test(start_paused = true)]`.
#[proc_macro_attribute]
pub fn logged_tokio_test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = TokenStream2::from(attr);
    let input = parse_macro_input!(item as ItemFn);

    if input.sig.asyncness.is_none() {
        return syn::Error::new(
            input.sig.ident.span(),
            "#[logged_tokio_test] requires an async fn",
        )
        .to_compile_error()
        .into();
    }

    let harness = if args.is_empty() {
        quote! { #[::tokio::test] }
    } else {
        quote! { #[::tokio::test( #args )] }
    };
    expand(input, harness)
}

fn expand(mut input: ItemFn, harness: TokenStream2) -> TokenStream {
    input.attrs.retain(|attr| !is_logged_attr(attr));

    let fn_ident = &input.sig.ident;
    if !input.sig.inputs.is_empty() {
        return syn::Error::new(
            fn_ident.span(),
            "logged tests cannot take parameters",
        )
        .to_compile_error()
        .into();
    }

    let fn_name = fn_ident.to_string();
    let visibility = &input.vis;
    let asyncness = &input.sig.asyncness;
    let generics = &input.sig.generics;
    let (returns_result, return_tokens) = classify_return(&input.sig.output);
    let finish = finish_body(returns_result);
    let block = &input.block;
    let other_attrs = &input.attrs;

    let expanded = quote! {
        #harness
        #(#other_attrs)*
        #visibility #asyncness fn #fn_ident #generics () #return_tokens {
            let mut __guard = ::codio_test_utils::TestLoggerGuard::new(#fn_name)
                .expect("failed to create TestLogger");
            let mut logger = __guard.logger();
            let _ = &mut logger;

            let inner_result = { #block };
            drop(logger);
            #finish
        }
    };

    expanded.into()
}

fn classify_return(output: &ReturnType) -> (bool, TokenStream2) {
    match output {
        ReturnType::Default => (false, quote! {}),
        ReturnType::Type(arrow, ty) => (is_result_type(ty), quote! { #arrow #ty }),
    }
}

fn is_result_type(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Result"),
        _ => false,
    }
}

fn finish_body(returns_result: bool) -> TokenStream2 {
    if returns_result {
        quote! {
            match inner_result {
                ::std::result::Result::Ok(value) => {
                    if let Err(e) = __guard.finish_success() {
                        panic!("failed to finalize TestLogger: {}", e);
                    }
                    ::std::result::Result::Ok(value)
                }
                ::std::result::Result::Err(err) => {
                    let __message = format!("{}", err);
                    if let Err(e) = __guard.finish_failure(&__message) {
                        eprintln!("failed to finalize TestLogger after error: {}", e);
                    }
                    ::std::result::Result::Err(err)
                }
            }
        }
    } else {
        quote! {
            let value = inner_result;
            if let Err(e) = __guard.finish_success() {
                panic!("failed to finalize TestLogger: {}", e);
            }
            value
        }
    }
}

fn is_logged_attr(attr: &syn::Attribute) -> bool {
    attr.path()
        .get_ident()
        .is_some_and(|ident| ident == "logged_test" || ident == "logged_tokio_test")
}
