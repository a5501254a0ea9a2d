use crate::decode_field::{FieldKind, FieldMetadata, decode_field};
use proc_macro2::{Literal, TokenStream};
use quote::quote;
use syn::{Fields, ItemStruct};

pub(crate) fn record_trait(item: &ItemStruct) -> TokenStream {
    let name = &item.ident;
    if !item.generics.params.is_empty() {
        panic!("Record cannot be derived for the generic type `{name}`");
    }
    let Fields::Named(fields) = &item.fields else {
        panic!("Record can only be derived for structs with named fields, `{name}` is not");
    };
    let fields: Vec<FieldMetadata> = fields.named.iter().filter_map(decode_field).collect();
    let defs = fields.iter().map(field_def);
    let reads = fields.iter().enumerate().map(|(i, f)| {
        let index = Literal::usize_unsuffixed(i);
        let ident = &f.ident;
        let read = match f.kind {
            FieldKind::Scalar => quote! {
                ::stow::FieldRef::Value(::stow::AsValue::as_value(
                    ::std::clone::Clone::clone(&self.#ident),
                ))
            },
            FieldKind::Foreign { optional: true } => quote! {
                ::stow::FieldRef::Foreign(
                    self.#ident.as_ref().map(|v| ::stow::ForeignEntity::foreign_key(v)),
                )
            },
            FieldKind::Foreign { optional: false } => quote! {
                ::stow::FieldRef::Foreign(Some(::stow::ForeignEntity::foreign_key(&self.#ident)))
            },
            FieldKind::Embed => quote! {
                ::stow::FieldRef::Record(::stow::Embedded::embedded(&self.#ident))
            },
            FieldKind::Excluded => quote!(::stow::FieldRef::Missing),
        };
        quote!(#index => #read,)
    });
    let writes = fields.iter().enumerate().map(|(i, f)| {
        let index = Literal::usize_unsuffixed(i);
        let ident = &f.ident;
        let write = match f.kind {
            FieldKind::Scalar => quote!(::stow::FieldMut::Value(&mut self.#ident)),
            FieldKind::Foreign { .. } => quote!(::stow::FieldMut::Foreign),
            FieldKind::Embed => quote! {
                ::stow::FieldMut::Record(::stow::Embedded::embedded_mut(&mut self.#ident))
            },
            FieldKind::Excluded => quote!(::stow::FieldMut::Missing),
        };
        quote!(#index => #write,)
    });
    quote! {
        impl ::stow::Record for #name {
            fn record_type() -> ::stow::RecordType {
                static FIELDS: &[::stow::FieldDef] = &[#(#defs),*];
                ::stow::RecordType::new::<Self>(FIELDS)
            }

            fn type_info(&self) -> ::stow::RecordType {
                <Self as ::stow::Record>::record_type()
            }

            fn field(&self, index: usize) -> ::stow::FieldRef<'_> {
                match index {
                    #(#reads)*
                    _ => ::stow::FieldRef::Missing,
                }
            }

            fn field_mut(&mut self, index: usize) -> ::stow::FieldMut<'_> {
                match index {
                    #(#writes)*
                    _ => ::stow::FieldMut::Missing,
                }
            }
        }

        impl ::stow::Embedded for #name {
            type Target = Self;
            fn embedded(&self) -> ::std::option::Option<&dyn ::stow::Record> {
                Some(self)
            }
            fn embedded_mut(&mut self) -> &mut dyn ::stow::Record {
                self
            }
        }
    }
}

fn field_def(field: &FieldMetadata) -> TokenStream {
    let ident = field.ident.to_string();
    let ty = &field.ty;
    let tag = match &field.tag {
        Some(v) => quote!(Some(#v)),
        None => quote!(None),
    };
    let embed = match field.kind {
        FieldKind::Embed => quote! {
            Some(<<#ty as ::stow::Embedded>::Target as ::stow::Record>::record_type)
        },
        _ => quote!(None),
    };
    let generate = match field.kind {
        FieldKind::Scalar => quote! {
            Some(|| {
                use ::stow::IdentFallback as _;
                ::stow::IdentProbe::<#ty>::new().generate()
            })
        },
        _ => quote!(None),
    };
    quote! {
        ::stow::FieldDef {
            ident: #ident,
            tag: #tag,
            embed: #embed,
            generate: #generate,
        }
    }
}
