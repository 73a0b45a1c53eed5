use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{Field, Index};

pub(crate) struct FieldMetadata {
    /// `self.<member>` access, either a name or a tuple index.
    pub(crate) member: TokenStream,
    pub(crate) skip: bool,
}

pub(crate) fn decode_field(index: usize, field: &Field) -> FieldMetadata {
    let member = match &field.ident {
        Some(ident) => ident.to_token_stream(),
        None => {
            let index = Index::from(index);
            quote!(#index)
        }
    };
    let mut metadata = FieldMetadata {
        member,
        skip: false,
    };
    for attr in &field.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("record") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `record`, use it like: `#[record(skip)]`");
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("skip") {
                    let Err(..) = arg.value() else {
                        // value() is Err for Meta::Path
                        panic!("Error while parsing `skip`, use it like: `#[record(skip)]`");
                    };
                    metadata.skip = true;
                } else {
                    panic!(
                        "Unknown attribute `{}` inside record macro",
                        arg.path.to_token_stream()
                    );
                }
                Ok(())
            });
        }
    }
    metadata
}
