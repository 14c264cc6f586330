use crate::emit;
use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{Attribute, Expr, Ident, LitStr, Token, Type, braced};

/// Input shared by `loggable!` and `traceable!`:
///
/// ```text
/// Name {
///     #[error("message")]
///     Variant { field: Type } => tracing::Level::WARN,
/// }
/// ```
pub struct LevelledEnum {
    pub name: Ident,
    pub variants: Vec<LevelledVariant>,
}

pub struct LevelledVariant {
    pub name: Ident,
    pub message: LitStr,
    pub fields: Vec<(Ident, Type)>,
    pub level: Expr,
    pub no_source: bool,
}

impl Parse for LevelledEnum {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let name = input.parse()?;
        let body;
        braced!(body in input);

        let mut variants = Vec::new();
        while !body.is_empty() {
            variants.push(body.parse()?);
            if !body.is_empty() {
                body.parse::<Token![,]>()?;
            }
        }
        Ok(Self { name, variants })
    }
}

impl Parse for LevelledVariant {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attributes = input.call(Attribute::parse_outer)?;
        let message = attributes
            .iter()
            .find(|attr| attr.path().is_ident("error"))
            .ok_or_else(|| input.error("Expected #[error(...)] attribute"))?
            .parse_args::<LitStr>()?;
        let no_source = attributes
            .iter()
            .any(|attr| attr.path().is_ident("no_source"));
        let name = input.parse()?;

        let mut fields = Vec::new();
        if input.peek(syn::token::Brace) {
            let body;
            braced!(body in input);
            while !body.is_empty() {
                let field = body.parse::<Ident>()?;
                body.parse::<Token![:]>()?;
                fields.push((field, body.parse::<Type>()?));
                if !body.is_empty() {
                    body.parse::<Token![,]>()?;
                }
            }
        }

        input.parse::<Token![=>]>()?;
        let level = input.parse()?;
        Ok(Self {
            name,
            message,
            fields,
            level,
            no_source,
        })
    }
}

impl LevelledVariant {
    fn is_unit(&self, with_source: bool) -> bool {
        self.fields.is_empty() && !with_source
    }

    // `with_source` appends an `err: String` field holding the cause.
    fn declaration(&self, with_source: bool) -> TokenStream {
        let name = &self.name;
        let message = &self.message;
        if self.is_unit(with_source) {
            return quote! { #[error(#message)] #name };
        }
        let fields = self.fields.iter().map(|(field, ty)| quote! { #field: #ty });
        let source = with_source.then(|| quote! { err: String });
        quote! {
            #[error(#message)]
            #name { #(#fields,)* #source }
        }
    }

    pub fn pattern(&self, with_source: bool) -> TokenStream {
        let name = &self.name;
        if self.is_unit(with_source) {
            quote! { Self::#name }
        } else {
            quote! { Self::#name { .. } }
        }
    }
}

impl LevelledEnum {
    /// The enum with `level()` and `log()`. `extra` is appended to the same
    /// impl block.
    pub fn expand(
        &self,
        with_source: impl Fn(&LevelledVariant) -> bool,
        extra: TokenStream,
    ) -> TokenStream {
        let name = &self.name;
        let declarations = self
            .variants
            .iter()
            .map(|variant| variant.declaration(with_source(variant)));
        let level_arms = self.variants.iter().map(|variant| {
            let pattern = variant.pattern(with_source(variant));
            let level = &variant.level;
            quote! { #pattern => #level }
        });
        let log_body = emit::at_level(quote! { self.level() }, quote! { self }, None);

        quote! {
            #[allow(dead_code)]
            #[derive(Debug, Clone, thiserror::Error, serde::Serialize, serde::Deserialize)]
            pub enum #name {
                #(#declarations,)*
            }

            #[allow(dead_code)]
            impl #name {
                pub fn level(&self) -> tracing::Level {
                    match self {
                        #(#level_arms,)*
                    }
                }

                pub fn log(&self) {
                    #log_body
                }

                #extra
            }
        }
    }
}
