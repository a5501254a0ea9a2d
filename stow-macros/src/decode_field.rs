use quote::ToTokens;
use syn::{Field, Ident, LitStr, Type, parse::ParseBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Scalar,
    Foreign { optional: bool },
    Embed,
    Excluded,
}

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    /// Annotation string, `None` for anonymous embeds.
    pub(crate) tag: Option<String>,
    pub(crate) kind: FieldKind,
}

/// Returns `None` when the field carries no `stow` attribute.
pub(crate) fn decode_field(field: &Field) -> Option<FieldMetadata> {
    let ident = field
        .ident
        .clone()
        .expect("Field is expected to have a name");
    let mut found = false;
    let mut column: Option<String> = None;
    let mut embed = false;
    for attr in &field.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("stow") {
            continue;
        }
        found = true;
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `stow`, use it like: `#[stow(column = \"name,pk\")]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("column") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!(
                        "Error while parsing `column`, use it like: `#[stow(column = \"name[,pk][,ro][,fk][,inline]\")]`"
                    );
                };
                column = Some(v.value());
            } else if arg.path.is_ident("embed") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `embed`, use it like: `#[stow(embed)]`");
                };
                embed = true;
            } else {
                panic!(
                    "Unknown attribute `{}` inside stow macro",
                    arg.path.to_token_stream().to_string()
                );
            }
            Ok(())
        });
    }
    if !found {
        return None;
    }
    if column.is_none() && !embed {
        panic!(
            "Field `{ident}` needs a column, use it like: `#[stow(column = \"name\")]` or `#[stow(embed)]`"
        );
    }
    let kind = match &column {
        Some(tag) => {
            let mut parts = tag.split(',').map(str::trim);
            let name = parts.next().unwrap_or_default();
            let flags: Vec<String> = parts.map(str::to_ascii_lowercase).collect();
            if name == "-" {
                FieldKind::Excluded
            } else if embed || flags.iter().any(|v| v == "inline") {
                FieldKind::Embed
            } else if flags.iter().any(|v| v == "fk") {
                FieldKind::Foreign {
                    optional: is_option(&field.ty),
                }
            } else {
                FieldKind::Scalar
            }
        }
        None => FieldKind::Embed,
    };
    Some(FieldMetadata {
        ident,
        ty: field.ty.clone(),
        tag: column,
        kind,
    })
}

fn is_option(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.path
        .segments
        .last()
        .is_some_and(|v| v.ident == "Option")
}
