mod decode_field;

use decode_field::decode_field;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

/// Implements `dbops::ScanRow` for a struct.
///
/// Columns are scanned into the fields in declaration order, so the query
/// must select them in that same order. Fields marked `#[record(skip)]` are
/// left untouched and keep their `Default` value.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let name = &item.ident;
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();
    let columns = item
        .fields
        .iter()
        .enumerate()
        .map(|(i, f)| decode_field(i, f))
        .filter(|f| !f.skip)
        .map(|f| {
            let member = f.member;
            quote!(&mut self.#member as &mut dyn ::dbops::Scan)
        });
    quote! {
        impl #impl_generics ::dbops::ScanRow for #name #ty_generics #where_clause {
            fn scan_columns(&mut self) -> ::std::vec::Vec<&mut dyn ::dbops::Scan> {
                ::std::vec![#(#columns),*]
            }
        }
    }
    .into()
}
