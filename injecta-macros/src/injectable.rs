//! `#[derive(Injectable)]` implementation.

use darling::util::PathList;
use darling::{FromDeriveInput, FromField, FromMeta, ast};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    DeriveInput, Expr, ExprLit, GenericArgument, Lit, Path, PathArguments, Type, TypeParamBound,
};

#[derive(FromDeriveInput)]
#[darling(attributes(injectable), supports(struct_named, struct_unit))]
struct InjectableInput {
    ident: syn::Ident,
    generics: syn::Generics,
    data: ast::Data<(), InjectField>,
    #[darling(default)]
    name: Option<String>,
    #[darling(default)]
    implements: PathList,
    #[darling(default)]
    extend: Option<ExtendFn>,
}

#[derive(FromField)]
#[darling(attributes(inject))]
struct InjectField {
    ident: Option<syn::Ident>,
    ty: Type,
    #[darling(default)]
    name: Option<String>,
    #[darling(default)]
    class: Option<String>,
    #[darling(default)]
    interface: Option<String>,
    #[darling(default)]
    callable: bool,
    #[darling(default)]
    default: Option<DefaultValue>,
}

/// `default` alone means `Null`.
enum DefaultValue {
    Null,
    Expr(Expr),
}

impl FromMeta for DefaultValue {
    fn from_word() -> darling::Result<Self> {
        Ok(Self::Null)
    }

    fn from_expr(expr: &Expr) -> darling::Result<Self> {
        Ok(Self::Expr(expr.clone()))
    }
}

/// Accepts `extend = path::to_fn` and `extend = "path::to_fn"`.
struct ExtendFn(Path);

impl FromMeta for ExtendFn {
    fn from_expr(expr: &Expr) -> darling::Result<Self> {
        match expr {
            Expr::Path(path) => Ok(Self(path.path.clone())),
            Expr::Lit(ExprLit {
                lit: Lit::Str(lit), ..
            }) => lit.parse::<Path>().map(Self).map_err(darling::Error::from),
            _ => Err(darling::Error::custom("expected a function path").with_span(expr)),
        }
    }
}

/// What a field's type says about its parameter.
#[derive(Default)]
struct Inferred {
    class: Option<String>,
    interface: bool,
    callable: bool,
    optional: bool,
}

pub(crate) fn expand(input: &DeriveInput) -> darling::Result<TokenStream> {
    let args = InjectableInput::from_derive_input(input)?;

    if !args.generics.params.is_empty() {
        return Err(
            darling::Error::custom("Injectable cannot be derived for generic structs")
                .with_span(&args.generics),
        );
    }

    let ident = &args.ident;
    let type_name = args.name.clone().unwrap_or_else(|| ident.to_string());
    let fields = args
        .data
        .take_struct()
        .ok_or_else(|| darling::Error::unsupported_shape("enum"))?;

    let base = if fields.style == ast::Style::Unit {
        quote! {
            ::injecta::reflect::ClassDescriptor::without_constructor(#type_name, || #ident)
        }
    } else {
        constructor(ident, &type_name, &fields.fields)?
    };

    let upcasts: Vec<TokenStream> = args
        .implements
        .iter()
        .map(|interface| {
            let interface_name = last_segment(interface);
            quote! {
                .implements(
                    #interface_name,
                    |this: ::std::sync::Arc<#ident>| this as ::std::sync::Arc<dyn #interface>,
                )
            }
        })
        .collect();

    let body = match &args.extend {
        Some(ExtendFn(extend)) => quote! { #extend(#base #(#upcasts)*) },
        None => quote! { #base #(#upcasts)* },
    };

    Ok(quote! {
        impl ::injecta::reflect::Injectable for #ident {
            const TYPE_NAME: &'static str = #type_name;

            fn descriptor() -> ::injecta::reflect::ClassDescriptor {
                #body
            }
        }

        ::injecta::inventory::submit! {
            ::injecta::reflect::ClassRegistration::new(
                <#ident as ::injecta::reflect::Injectable>::descriptor
            )
        }
    })
}

fn constructor(ident: &syn::Ident, type_name: &str, fields: &[InjectField]) -> darling::Result<TokenStream> {
    let mut specs = Vec::with_capacity(fields.len());
    let mut initializers = Vec::with_capacity(fields.len());

    for field in fields {
        let field_ident = field
            .ident
            .as_ref()
            .ok_or_else(|| darling::Error::unsupported_shape("tuple struct").with_span(&field.ty))?;
        let param = field
            .name
            .clone()
            .unwrap_or_else(|| field_ident.to_string());
        let inferred = infer(&field.ty);

        let explicit = field.class.is_some() || field.interface.is_some();
        let mut spec = if field.callable || (!explicit && inferred.callable) {
            quote! { ::injecta::reflect::ParamSpec::callable(#param) }
        } else if let Some(interface) = &field.interface {
            quote! { ::injecta::reflect::ParamSpec::interface(#param, #interface) }
        } else if let Some(class) = &field.class {
            quote! { ::injecta::reflect::ParamSpec::class(#param, #class) }
        } else {
            match inferred.class {
                Some(class) if inferred.interface => {
                    quote! { ::injecta::reflect::ParamSpec::interface(#param, #class) }
                }
                Some(class) => quote! { ::injecta::reflect::ParamSpec::class(#param, #class) },
                None => quote! { ::injecta::reflect::ParamSpec::new(#param) },
            }
        };

        match &field.default {
            Some(DefaultValue::Expr(expr)) => spec.extend(quote! { .with_default(#expr) }),
            Some(DefaultValue::Null) => spec.extend(quote! { .optional() }),
            None if inferred.optional => spec.extend(quote! { .optional() }),
            None => {}
        }

        specs.push(spec);
        initializers.push(quote! { #field_ident: args.take(#param)? });
    }

    Ok(quote! {
        ::injecta::reflect::ClassDescriptor::with_constructor(
            #type_name,
            [#(#specs),*],
            |args: &mut ::injecta::value::Args| {
                ::core::result::Result::Ok(#ident { #(#initializers),* })
            },
        )
    })
}

/// `Arc<X>` and `Option<Arc<X>>` name class `X`; `Arc<dyn Trait>` names
/// interface `Trait`. `Callable` takes closures; `Option<_>` defaults to
/// `Null`.
fn infer(ty: &Type) -> Inferred {
    let Some((ident, inner)) = outer_type(ty) else {
        return Inferred::default();
    };

    match ident.as_str() {
        "Option" => {
            let mut inferred = inner.map(infer).unwrap_or_default();
            inferred.optional = true;
            inferred
        }
        "Arc" => Inferred {
            class: inner.and_then(class_name),
            interface: inner.is_some_and(is_trait_object),
            ..Inferred::default()
        },
        "Callable" => Inferred {
            callable: true,
            ..Inferred::default()
        },
        _ => Inferred::default(),
    }
}

/// Last path segment of a type and its first generic argument.
fn outer_type(ty: &Type) -> Option<(String, Option<&Type>)> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    let inner = match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        }),
        _ => None,
    };
    Some((segment.ident.to_string(), inner))
}

fn class_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(type_path) => Some(last_segment(&type_path.path)),
        Type::TraitObject(object) => object.bounds.iter().find_map(|bound| match bound {
            TypeParamBound::Trait(bound) => Some(last_segment(&bound.path)),
            _ => None,
        }),
        Type::Paren(paren) => class_name(&paren.elem),
        _ => None,
    }
}

fn is_trait_object(ty: &Type) -> bool {
    match ty {
        Type::TraitObject(_) => true,
        Type::Paren(paren) => is_trait_object(&paren.elem),
        _ => false,
    }
}

fn last_segment(path: &Path) -> String {
    path.segments
        .last()
        .map(|segment| segment.ident.to_string())
        .unwrap_or_default()
}
