use proc_macro::TokenStream as TokenStream1;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Ident, Token};

/// This macro is added before a method of `BlackjackGame` in the impl block.
/// Use this macro to first check if current game phase is one of the phases in
/// the attribute.
///
/// For example, `#[allowed_phase(AwaitingDeal)]` will make a method first check
/// if current game phase is `AwaitingDeal`, and
/// `#[allowed_phase(PlayerActing, DealerActing)]` accepts either phase. If the
/// check fails, the method returns `Error::PhaseViolation`.
///
/// The annotated method must return `Result<_, crate::Error>`, and `GamePhase`
/// must be in scope.
#[proc_macro_attribute]
pub fn allowed_phase(attr: TokenStream1, item: TokenStream1) -> TokenStream1 {
    match expand_allowed_phase(attr, item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_allowed_phase(attr: TokenStream1, item: TokenStream1) -> syn::Result<TokenStream2> {
    let phases = Punctuated::<Ident, Token![,]>::parse_terminated.parse(attr)?;
    if phases.is_empty() {
        return Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            "allowed_phase needs at least one phase",
        ));
    }
    let mut ast: syn::ImplItemFn = syn::parse(item)?;

    let operation = ast.sig.ident.to_string();
    let allowed = phases
        .iter()
        .map(|phase| phase.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let patterns = phases.iter();

    let early_return: syn::Stmt = syn::parse2(quote! {
        if !matches!(self.current_game_phase, #(GamePhase::#patterns)|*) {
            return Err(crate::Error::PhaseViolation {
                operation: #operation,
                allowed: #allowed,
                current: self.current_game_phase,
            });
        }
    })?;
    ast.block.stmts.insert(0, early_return);
    Ok(ast.into_token_stream())
}
