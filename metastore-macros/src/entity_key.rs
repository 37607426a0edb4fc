use crate::derive_utils::{apply_derives, aspect_derives};
use crate::utils::{
    apply_rename_rule, duplicate, expect_bool, expect_str, parse_kv_args, serde_rename,
    serde_rename_all, to_camel_case,
};
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, LitStr, Result, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[entity_key] 宏实现
/// - 仅支持具名字段结构体，且至少包含一个字段
/// - `FIELDS` 为字段的序列化名称，顺序即声明顺序
/// - 命名优先级：字段级 rename > 结构体上已有的 `rename_all` > `camel_case`
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EntityKeyAttrConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[entity_key] only on struct")
                .to_compile_error()
                .into();
        }
    };

    let Some(entity_type) = cfg.entity_type else {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[entity_key] requires `entity_type = \"...\"`",
        )
        .to_compile_error()
        .into();
    };

    let camel_case = cfg.camel_case.unwrap_or(true);

    let fields_named = match &st.fields {
        syn::Fields::Named(f) if !f.named.is_empty() => f,
        _ => {
            return syn::Error::new(
                st.span(),
                "#[entity_key] supports only non-empty named-field struct",
            )
            .to_compile_error()
            .into();
        }
    };

    let declared_rule = match serde_rename_all(&st.attrs) {
        Ok(rule) => rule,
        Err(err) => return err.to_compile_error().into(),
    };
    if let Some(rule) = &declared_rule {
        if apply_rename_rule(&rule.value(), "key_field").is_none() {
            return syn::Error::new(
                rule.span(),
                format!("unsupported serde rename_all rule '{}'", rule.value()),
            )
            .to_compile_error()
            .into();
        }
    }

    let key_fields: Vec<String> = fields_named
        .named
        .iter()
        .filter_map(|f| {
            let ident = f.ident.as_ref()?.to_string();
            let ident = ident.trim_start_matches("r#").to_string();
            Some(serde_rename(&f.attrs).unwrap_or_else(|| match &declared_rule {
                Some(rule) => apply_rename_rule(&rule.value(), &ident).unwrap_or(ident),
                None if camel_case => to_camel_case(&ident),
                None => ident,
            }))
        })
        .collect();

    let aspect_name = cfg.name.unwrap_or_else(|| {
        LitStr::new(&format!("{}Key", entity_type.value()), entity_type.span())
    });

    apply_derives(&mut st.attrs, aspect_derives());
    if camel_case && declared_rule.is_none() {
        st.attrs.push(syn::parse_quote!(#[serde(rename_all = "camelCase")]));
    }

    let ident = &st.ident;
    let generics = st.generics.clone();
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let out = quote! {
        #st

        impl #impl_generics ::metastore_domain::aspect::Aspect for #ident #ty_generics #where_clause {
            const NAME: &'static str = #aspect_name;
        }

        impl #impl_generics ::metastore_domain::aspect::EntityKey for #ident #ty_generics #where_clause {
            const ENTITY_TYPE: &'static str = #entity_type;
            const FIELDS: &'static [&'static str] = &[#(#key_fields),*];
        }
    };

    TokenStream::from(out)
}

// -------- parsing --------

struct EntityKeyAttrConfig {
    entity_type: Option<LitStr>,
    name: Option<LitStr>,
    camel_case: Option<bool>,
}

impl Parse for EntityKeyAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut entity_type: Option<LitStr> = None;
        let mut name: Option<LitStr> = None;
        let mut camel_case: Option<bool> = None;

        for kv in parse_kv_args(input)? {
            match kv.key.to_string().as_str() {
                "entity_type" => {
                    if entity_type.is_some() {
                        return Err(duplicate(&kv.key));
                    }
                    entity_type = Some(expect_str(&kv)?);
                }
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
                        "unknown key; expected 'entity_type' | 'name' | 'camel_case'",
                    ));
                }
            }
        }

        Ok(Self {
            entity_type,
            name,
            camel_case,
        })
    }
}
