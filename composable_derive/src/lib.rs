use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, Ident};

/// Hook methods named in `#[component(...)]`
#[derive(Default)]
struct ComponentAttrs {
    name: Option<String>,
    update: Option<Ident>,
    on_attach: Option<Ident>,
    on_detach: Option<Ident>,
}

fn parse_attrs(input: &DeriveInput) -> syn::Result<ComponentAttrs> {
    let mut attrs = ComponentAttrs::default();
    for attr in &input.attrs {
        if !attr.path().is_ident("component") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let value: syn::LitStr = meta.value()?.parse()?;
            if meta.path.is_ident("name") {
                attrs.name = Some(value.value());
            } else if meta.path.is_ident("update") {
                attrs.update = Some(value.parse()?);
            } else if meta.path.is_ident("on_attach") {
                attrs.on_attach = Some(value.parse()?);
            } else if meta.path.is_ident("on_detach") {
                attrs.on_detach = Some(value.parse()?);
            } else {
                return Err(meta.error("unsupported component attribute"));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

/// Trait methods forwarding to the inherent hooks named in the attribute
fn expand_hooks(attrs: &ComponentAttrs) -> proc_macro2::TokenStream {
    let update = attrs.update.as_ref().map(|method| {
        quote! {
            fn update(&mut self, dt: f64) {
                self.#method(dt)
            }
        }
    });
    let on_attach = attrs.on_attach.as_ref().map(|method| {
        quote! {
            fn on_attach(&mut self, owner: ::composable::core::entity::NodeId) {
                self.#method(owner)
            }
        }
    });
    let on_detach = attrs.on_detach.as_ref().map(|method| {
        quote! {
            fn on_detach(&mut self) {
                self.#method()
            }
        }
    });

    quote! {
        #on_attach
        #on_detach
        #update
    }
}

/// Derive macro for the `Component` and `ComponentType` traits
///
/// The type must implement `Serialize`, `Deserialize` and `Default`. The
/// serialized name defaults to the struct name and can be overridden with
/// `#[component(name = "...")]`. Lifecycle hooks are forwarded to inherent
/// methods named by `update`, `on_attach` and `on_detach`.
#[proc_macro_derive(Component, attributes(component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let attrs = match parse_attrs(&input) {
        Ok(attrs) => attrs,
        Err(err) => return err.to_compile_error().into(),
    };

    let name = &input.ident;
    let component_name = attrs.name.clone().unwrap_or_else(|| name.to_string());
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let hooks = expand_hooks(&attrs);

    let expanded = quote! {
        impl #impl_generics ::composable::component_system::Component for #name #ty_generics #where_clause {
            fn type_name(&self) -> &'static str {
                #component_name
            }

            #hooks

            fn serialize(
                &self,
            ) -> ::composable::component_system::ComponentResult<::composable::__private::serde_json::Value> {
                Ok(::composable::__private::serde_json::to_value(self)?)
            }

            fn deserialize(
                &mut self,
                data: &::composable::__private::serde_json::Value,
            ) -> ::composable::component_system::ComponentResult<()> {
                *self = ::composable::__private::serde_json::from_value(data.clone())?;
                Ok(())
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }

        impl #impl_generics ::composable::component_system::ComponentType for #name #ty_generics #where_clause {
            fn component_name() -> &'static str {
                #component_name
            }
        }
    };

    TokenStream::from(expanded)
}
