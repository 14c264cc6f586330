use proc_macro2::TokenStream;
use quote::quote;

/// Emits `message` through the `tracing` macro matching `level`, with
/// `context` attached as a debug field when given.
pub fn at_level(level: TokenStream, message: TokenStream, context: Option<TokenStream>) -> TokenStream {
    let fields = match context {
        Some(context) => quote! { message = %#message, context = ?#context },
        None => quote! { "{}", #message },
    };
    quote! {
        match #level {
            tracing::Level::ERROR => tracing::error!(#fields),
            tracing::Level::WARN => tracing::warn!(#fields),
            tracing::Level::INFO => tracing::info!(#fields),
            tracing::Level::DEBUG => tracing::debug!(#fields),
            _ => tracing::trace!(#fields),
        }
    }
}
