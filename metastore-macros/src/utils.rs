use syn::punctuated::Punctuated;
use syn::{Attribute, Ident, Lit, LitStr, Result, Token, parse::Parse, parse::ParseStream};

/// 形如 `key = <literal>` 的宏参数
pub(crate) struct KvLit {
    pub key: Ident,
    #[allow(dead_code)]
    pub eq: Token![=],
    pub value: Lit,
}

impl Parse for KvLit {
    fn parse(input: ParseStream) -> Result<Self> {
        Ok(Self {
            key: input.parse()?,
            eq: input.parse()?,
            value: input.parse()?,
        })
    }
}

pub(crate) fn parse_kv_args(input: ParseStream) -> Result<Vec<KvLit>> {
    if input.is_empty() {
        return Ok(Vec::new());
    }
    let pairs: Punctuated<KvLit, Token![,]> = Punctuated::parse_terminated(input)?;
    Ok(pairs.into_iter().collect())
}

pub(crate) fn expect_str(kv: &KvLit) -> Result<LitStr> {
    match &kv.value {
        Lit::Str(s) if !s.value().is_empty() => Ok(s.clone()),
        Lit::Str(s) => Err(syn::Error::new(
            s.span(),
            format!("'{}' must not be empty", kv.key),
        )),
        other => Err(syn::Error::new(
            other.span(),
            format!("expected string literal for '{}'", kv.key),
        )),
    }
}

pub(crate) fn expect_bool(kv: &KvLit) -> Result<bool> {
    match &kv.value {
        Lit::Bool(b) => Ok(b.value()),
        other => Err(syn::Error::new(
            other.span(),
            format!("expected boolean literal for '{}'", kv.key),
        )),
    }
}

pub(crate) fn duplicate(key: &Ident) -> syn::Error {
    syn::Error::new(key.span(), format!("duplicate key '{key}' in attribute"))
}

/// snake_case → camelCase（与 serde 的 `rename_all = "camelCase"` 保持一致）
pub(crate) fn to_camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper_next = false;
    for ch in snake.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// 是否已存在 `#[serde(rename_all = ...)]`
pub(crate) fn has_serde_rename_all(attrs: &[Attribute]) -> bool {
    attrs
        .iter()
        .filter(|a| a.path().is_ident("serde"))
        .any(|a| {
            let mut found = false;
            let _ = a.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename_all") {
                    found = true;
                }
                if meta.input.peek(Token![=]) {
                    let _: syn::Expr = meta.value()?.parse()?;
                }
                Ok(())
            });
            found
        })
}

/// 容器级 `#[serde(rename_all = "...")]` 的取值
/// - 仅接受字符串形式；`rename_all(serialize = ..., deserialize = ...)` 视为错误
pub(crate) fn serde_rename_all(attrs: &[Attribute]) -> Result<Option<LitStr>> {
    let mut rule = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                if !meta.input.peek(Token![=]) {
                    return Err(meta.error("expected `rename_all = \"...\"`"));
                }
                rule = Some(meta.value()?.parse::<LitStr>()?);
            } else if meta.input.peek(Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            } else if meta.input.peek(syn::token::Paren) {
                let _ = meta.parse_nested_meta(|inner| {
                    if inner.input.peek(Token![=]) {
                        let _: syn::Expr = inner.value()?.parse()?;
                    }
                    Ok(())
                });
            }
            Ok(())
        })?;
    }
    Ok(rule)
}

/// 按 serde 的 `rename_all` 规则改写 snake_case 字段名；未知规则返回 `None`
pub(crate) fn apply_rename_rule(rule: &str, field: &str) -> Option<String> {
    let renamed = match rule {
        "lowercase" | "snake_case" => field.to_string(),
        "UPPERCASE" | "SCREAMING_SNAKE_CASE" => field.to_ascii_uppercase(),
        "camelCase" => to_camel_case(field),
        "PascalCase" => {
            let camel = to_camel_case(field);
            let mut chars = camel.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => camel,
            }
        }
        "kebab-case" => field.replace('_', "-"),
        "SCREAMING-KEBAB-CASE" => field.to_ascii_uppercase().replace('_', "-"),
        _ => return None,
    };
    Some(renamed)
}

/// 字段级 `#[serde(rename = "...")]`
pub(crate) fn serde_rename(attrs: &[Attribute]) -> Option<String> {
    let mut renamed = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
                let lit: LitStr = meta.value()?.parse()?;
                renamed = Some(lit.value());
            } else if meta.input.peek(Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            }
            Ok(())
        });
    }
    renamed
}
