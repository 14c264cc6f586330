use crate::case::snake_case_ident;
use crate::variant::{LevelledEnum, LevelledVariant};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse_macro_input;

pub fn traceable_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as LevelledEnum);

    let source_arms = input.variants.iter().map(|variant| {
        let name = &variant.name;
        if variant.no_source {
            let pattern = variant.pattern(false);
            quote! { #pattern => None }
        } else {
            quote! { Self::#name { err, .. } => Some(err.as_str()) }
        }
    });
    let constructors = input.variants.iter().filter_map(constructor);

    let extra = quote! {
        /// Message of the underlying cause, when one was captured.
        pub fn source_message(&self) -> Option<&str> {
            match self {
                #(#source_arms,)*
            }
        }

        #(#constructors)*
    };
    input.expand(|variant| !variant.no_source, extra).into()
}

// `CopyFileFailed { src, dst }` gets `copy_file_failed(src, dst, source)`.
// A unit variant without a cause is built directly.
fn constructor(variant: &LevelledVariant) -> Option<TokenStream2> {
    if variant.no_source && variant.fields.is_empty() {
        return None;
    }
    let name = &variant.name;
    let constructor = snake_case_ident(name);
    let params = variant
        .fields
        .iter()
        .map(|(field, ty)| quote! { #field: impl Into<#ty> });
    let assignments = variant
        .fields
        .iter()
        .map(|(field, _)| quote! { #field: #field.into() });

    Some(if variant.no_source {
        quote! {
            pub fn #constructor(#(#params),*) -> Self {
                Self::#name { #(#assignments,)* }
            }
        }
    } else {
        quote! {
            pub fn #constructor(#(#params,)* source: impl std::fmt::Display) -> Self {
                Self::#name {
                    #(#assignments,)*
                    err: source.to_string()
                }
            }
        }
    })
}
