use crate::derive_utils::{apply_derives, aspect_derives};
use crate::utils::{duplicate, expect_bool, expect_str, has_serde_rename_all, parse_kv_args};
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, LitStr, Result, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[aspect] 宏实现
/// - 支持结构体与枚举
/// - 结构体在 `camel_case = true`（默认）时追加 `#[serde(rename_all = "camelCase")]`
/// - 生成 `impl ::metastore_domain::aspect::Aspect`，`NAME` 取自 `name` 参数
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as AspectAttrConfig);
    let mut input = parse_macro_input!(item as Item);

    let Some(name) = cfg.name else {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[aspect] requires `name = \"...\"`",
        )
        .to_compile_error()
        .into();
    };

    let (ident, generics) = match &mut input {
        Item::Struct(st) => {
            apply_derives(&mut st.attrs, aspect_derives());
            if cfg.camel_case.unwrap_or(true) && !has_serde_rename_all(&st.attrs) {
                st.attrs.push(syn::parse_quote!(#[serde(rename_all = "camelCase")]));
            }
            (st.ident.clone(), st.generics.clone())
        }
        Item::Enum(en) => {
            apply_derives(&mut en.attrs, aspect_derives());
            (en.ident.clone(), en.generics.clone())
        }
        other => {
            return syn::Error::new(other.span(), "#[aspect] only supports struct or enum")
                .to_compile_error()
                .into();
        }
    };

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let out = quote! {
        #input

        impl #impl_generics ::metastore_domain::aspect::Aspect for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;
        }
    };

    TokenStream::from(out)
}

// -------- parsing --------

struct AspectAttrConfig {
    name: Option<LitStr>,
    camel_case: Option<bool>,
}

impl Parse for AspectAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut name: Option<LitStr> = None;
        let mut camel_case: Option<bool> = None;

        for kv in parse_kv_args(input)? {
            match kv.key.to_string().as_str() {
                "name" => {
                    if name.is_some() {
                        return Err(duplicate(&kv.key));
                    }
                    name = Some(expect_str(&kv)?);
                }
                "camel_case" => {
                    if camel_case.is_some() {
                        return Err(duplicate(&kv.key));
                    }
                    camel_case = Some(expect_bool(&kv)?);
                }
                _ => {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        "unknown key in attribute; expected 'name' | 'camel_case'",
                    ));
                }
            }
        }

        Ok(Self { name, camel_case })
    }
}
