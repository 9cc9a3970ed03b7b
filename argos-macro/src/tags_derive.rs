use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Error, Fields, LitStr, Result};

struct TagField<'a> {
    ident: &'a syn::Ident,
    ty: &'a syn::Type,
    name: String,
}

pub fn expand_tags_derive(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(Error::new_spanned(
                    input,
                    "Tags can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(Error::new_spanned(
                input,
                "Tags can only be derived for structs",
            ));
        }
    };

    if fields.is_empty() {
        return Err(Error::new_spanned(
            input,
            "Tags requires at least one field, since vectors need variable tags",
        ));
    }

    let fields = fields.iter().map(parse_field).collect::<Result<Vec<_>>>()?;

    let tag_names = fields.iter().map(|f| &f.name);
    let field_idents = fields.iter().map(|f| f.ident);

    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut where_clause = where_clause.cloned().unwrap_or_else(|| syn::WhereClause {
        where_token: Default::default(),
        predicates: Default::default(),
    });
    for field in &fields {
        let ty = field.ty;
        where_clause
            .predicates
            .push(syn::parse_quote!(#ty: ::std::fmt::Display));
    }

    Ok(quote! {
        impl #impl_generics ::argos::core::TagValues for #name #ty_generics #where_clause {
            const NAMES: &'static [&'static str] = &[#(#tag_names),*];

            fn values(&self) -> ::std::vec::Vec<::std::string::String> {
                ::std::vec![#(::std::string::ToString::to_string(&self.#field_idents)),*]
            }
        }
    })
}

fn parse_field(field: &syn::Field) -> Result<TagField<'_>> {
    let ident = field
        .ident
        .as_ref()
        .ok_or_else(|| Error::new_spanned(field, "expected a named field"))?;
    let mut name = None;

    for attr in &field.attrs {
        if attr.path().is_ident("tag") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let s: LitStr = meta.value()?.parse()?;
                    if s.value().is_empty() {
                        return Err(Error::new_spanned(s, "tag name must not be empty"));
                    }
                    name = Some(s.value());
                    Ok(())
                } else {
                    Err(meta.error("unknown tag attribute"))
                }
            })?;
        }
    }

    Ok(TagField {
        ident,
        ty: &field.ty,
        name: name.unwrap_or_else(|| ident.unraw().to_string()),
    })
}
