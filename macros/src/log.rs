use crate::emit;
use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Expr, Token};

// log!(entry) or log!(entry, context)
pub fn log_impl(input: TokenStream) -> TokenStream {
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: TokenStream) -> syn::Result<proc_macro2::TokenStream> {
    let arguments = Punctuated::<Expr, Token![,]>::parse_terminated.parse(input)?;
    let mut arguments = arguments.into_iter();
    let entry = arguments
        .next()
        .ok_or_else(|| syn::Error::new(Span::call_site(), "log! expects an entry"))?;
    let context = arguments.next().map(|context| quote! { &#context });
    if let Some(extra) = arguments.next() {
        return Err(syn::Error::new_spanned(
            extra,
            "log! takes an entry and at most one context",
        ));
    }

    let body = emit::at_level(quote! { log_entry.level() }, quote! { log_entry }, context);
    Ok(quote! {
        {
            let log_entry = &#entry;
            #body
        }
    })
}
