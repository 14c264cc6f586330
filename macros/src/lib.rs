mod case;
mod emit;
mod log;
mod loggable;
mod traceable;
mod variant;

use proc_macro::TokenStream;

/// Emits a `tracing` event at the level reported by the value's `level()`.
///
/// `log!(err)` logs the message alone, `log!(err, context)` attaches the
/// context as a `debug` field.
#[proc_macro]
pub fn log(input: TokenStream) -> TokenStream {
    log::log_impl(input)
}

/// Declares a log-entry enum whose variants carry a message and a level.
#[proc_macro]
pub fn loggable(input: TokenStream) -> TokenStream {
    loggable::loggable_impl(input)
}

/// Declares an error enum whose variants capture the message of their cause.
#[proc_macro]
pub fn traceable(input: TokenStream) -> TokenStream {
    traceable::traceable_impl(input)
}
