use proc_macro2::Span;
use syn::Ident;

/// `CopyFileFailed` -> `copy_file_failed`, `IOBusy` -> `io_busy`.
pub fn snake_case_ident(ident: &Ident) -> Ident {
    let name = ident.to_string();
    let chars: Vec<char> = name.chars().collect();
    let mut snake = String::with_capacity(name.len() + 4);

    for (index, current) in chars.iter().enumerate() {
        if current.is_uppercase() && index > 0 {
            let previous = chars[index - 1];
            let next_is_lower = chars.get(index + 1).is_some_and(|c| c.is_lowercase());
            if previous.is_lowercase()
                || previous.is_ascii_digit()
                || (previous.is_uppercase() && next_is_lower)
            {
                snake.push('_');
            }
        }
        snake.extend(current.to_lowercase());
    }

    Ident::new(&snake, Span::call_site())
}
