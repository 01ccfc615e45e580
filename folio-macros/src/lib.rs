use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, Ident, ItemFn, Token};

struct AttributeInput {
    identifiers: Punctuated<Ident, Token![,]>,
}

impl Parse for AttributeInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        Ok(AttributeInput {
            identifiers: input.parse_terminated(Ident::parse, Token![,])?,
        })
    }
}

enum SnapshotMode {
    /// The function receives a `&mut Document` and returns the root reference.
    Document,
    /// The function receives a `&mut ObjectGraph` and returns the root reference.
    Graph,
}

const SKIP_SNAPSHOT: Option<&str> = option_env!("SKIP_SNAPSHOT");

/// Turn a document-building function into a snapshot test.
///
/// The generated test serializes the result with the chosen settings
/// (`settings_1` by default) and compares it against
/// `assets/snapshots/<name>.txt`.
#[proc_macro_attribute]
pub fn snapshot(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attrs = parse_macro_input!(attr as AttributeInput);
    let mut serialize_settings = format_ident!("settings_1");
    let mut mode = SnapshotMode::Document;

    for attr in attrs.identifiers {
        let st = attr.to_string();

        if st.starts_with("settings") {
            serialize_settings = attr.clone();
        } else if st == "document" {
            mode = SnapshotMode::Document
        } else if st == "graph" {
            mode = SnapshotMode::Graph
        } else {
            panic!("unknown setting {}", st);
        }
    }

    let mut input_fn = parse_macro_input!(item as ItemFn);
    let mut fn_name = input_fn.sig.ident.clone();
    let snapshot_name = fn_name.to_string();

    let impl_ident = Ident::new(&format!("{}_snapshot_impl", fn_name), fn_name.span());
    input_fn.sig.ident = impl_ident.clone();

    fn_name = Ident::new(&format!("{}_snapshot", fn_name), fn_name.span());

    let common = quote! {
        use crate::serialize::SerializeSettings;
        use crate::tests::check_snapshot;
    };

    let fn_content: proc_macro2::TokenStream = match mode {
        SnapshotMode::Document => {
            quote! {
                #common
                let settings = SerializeSettings::#serialize_settings();
                let mut d = crate::document::Document::new_with(settings);
                let root = #impl_ident(&mut d);
                check_snapshot(#snapshot_name, &d.finish(root).unwrap());
            }
        }
        SnapshotMode::Graph => {
            quote! {
                #common
                let settings = SerializeSettings::#serialize_settings();
                let mut graph = crate::graph::ObjectGraph::new();
                let root = #impl_ident(&mut graph);
                let mut writer = crate::writer::OutputWriter::new(Vec::new());
                graph
                    .flush(
                        &crate::xref::Trailer::new(root),
                        &mut writer,
                        &settings,
                        &crate::stream::Deflate::default(),
                    )
                    .unwrap();
                check_snapshot(#snapshot_name, &writer.into_inner());
            }
        }
    };

    let ignore_snippet = if SKIP_SNAPSHOT.is_some() {
        quote! { #[ignore] }
    } else {
        quote! {}
    };

    let expanded = quote! {
        #input_fn

        #ignore_snippet
        #[test]
        fn #fn_name() {
            #fn_content
        }
    };

    expanded.into()
}
