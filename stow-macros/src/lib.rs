mod decode_field;
mod record_trait;

use proc_macro::TokenStream;
use record_trait::record_trait;
use syn::{ItemStruct, parse_macro_input};

/// Derives `stow::Record`.
///
/// Fields are mapped only when annotated:
/// - `#[stow(column = "name[,pk][,ro][,fk]")]` a column, `"-"` excludes the field.
/// - `#[stow(column = "prefix_,inline")]` an embedded record whose columns are
///   prefixed.
/// - `#[stow(embed)]` an embedded record flattened without prefix.
#[proc_macro_derive(Record, attributes(stow))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemStruct);
    record_trait(&item).into()
}
