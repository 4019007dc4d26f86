use darling::FromMeta;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::parse_quote;
use syn::Expr;
use syn::{spanned::Spanned, FnArg, GenericParam, ItemFn, Pat};

#[derive(FromMeta, Default)]
#[darling(default)]
struct WithIsaOpts {
    #[darling(default)]
    variant: Option<Expr>,
}

/// Turns a function generic over an ISA type parameter into a plain function
/// that dispatches to the best compiled variant at runtime. The first type
/// parameter must be the ISA parameter (`S: Isa`); it is erased from the
/// public signature. Pass `variant = ...` to dispatch on an explicit
/// `Variant` instead of the detected one.
#[proc_macro_attribute]
pub fn with_isa(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    match with_isa_impl(attr.into(), item.into()) {
        Ok(out) => out.into(),
        Err(e) => e.into_compile_error().into(),
    }
}

fn with_isa_impl(attr: TokenStream, item: TokenStream) -> Result<TokenStream, syn::Error> {
    let opts = match attr.is_empty() {
        true => WithIsaOpts::default(),
        false => {
            let meta = syn::parse2::<syn::Meta>(attr)?;
            WithIsaOpts::from_meta(&meta)?
        }
    };

    let variant = opts
        .variant
        .unwrap_or(parse_quote!(kernmill::Variant::new()));
    let func = syn::parse2::<syn::ItemFn>(item)?;

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = func.clone();

    let name = &sig.ident;

    let lifetimes = sig.generics.lifetimes();
    let type_params = sig.generics.type_params();
    let const_params = sig.generics.const_params();

    let mut outer_fn_sig = sig.clone();
    outer_fn_sig.generics.params = lifetimes
        .map(|l| GenericParam::Lifetime(l.clone()))
        .chain(type_params.skip(1).map(|t| GenericParam::Type(t.clone())))
        .chain(const_params.map(|c| GenericParam::Const(c.clone())))
        .collect();
    let mut inner_fn_sig = sig.clone();
    inner_fn_sig.ident = format_ident!("{}_impl", name);
    let struct_name = format_ident!("{}_struct", name);

    let fields = sig
        .inputs
        .iter()
        .map(|arg| match arg {
            FnArg::Receiver(_) => Err(syn::Error::new(arg.span(), "Can't use macro on methods")),
            FnArg::Typed(pat_type) => {
                let ident = match &*pat_type.pat {
                    Pat::Ident(pat_ident) => &pat_ident.ident,
                    _ => todo!(),
                };
                let ty = &*pat_type.ty;
                Ok((ident, ty))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let output_ty = match sig.output.clone() {
        syn::ReturnType::Default => quote! { () },
        syn::ReturnType::Type(_, ty) => quote! { #ty },
    };

    let inner_name = &inner_fn_sig.ident;
    let (impl_generics, type_generics, where_clause) = outer_fn_sig.generics.split_for_impl();
    let field_decl = fields.iter().map(|(ident, ty)| quote![#ident: #ty]);
    let field_names = fields.iter().map(|it| it.0).collect::<Vec<_>>();

    let isa_generic_name = sig.generics.type_params().next().unwrap().ident.clone();
    // Turbofish for the inner call must specify only the type and const
    // parameters; lifetime arguments are late bound and cannot be given
    // explicitly (see E0794), so they are elided here.
    let turbofish_args = inner_fn_sig
        .generics
        .type_params()
        .map(|t| {
            let ident = &t.ident;
            quote!(#ident)
        })
        .chain(inner_fn_sig.generics.const_params().map(|c| {
            let ident = &c.ident;
            quote!(#ident)
        }))
        .collect::<Vec<_>>();
    let turbofish = quote!(::<#(#turbofish_args),*>);
    let struct_turbofish = type_generics.as_turbofish();

    Ok(quote! {
        #(#attrs)*
        #vis #outer_fn_sig {
            #[allow(non_camel_case_types)]
            struct #struct_name #impl_generics #where_clause {
                #(#field_decl,)*
            };

            impl #impl_generics kernmill::WithIsa for #struct_name #type_generics #where_clause {
                type Output = #output_ty;

                #[inline(always)]
                fn with_isa<#isa_generic_name: kernmill::Isa>(self) -> <Self as kernmill::WithIsa>::Output {
                    let Self {
                        #(#field_names,)*
                    } = self;
                    #[allow(unused_unsafe)]
                    unsafe {
                        #inner_name #turbofish(#(#field_names,)*)
                    }
                }
            }

            (#variant).dispatch( #struct_name #struct_turbofish { #(#field_names,)* } )
        }

        #(#attrs)*
        #inner_fn_sig #block
    })
}
