//! Derive macros for event tracker action enums
//!
//! # Available Macros
//!
//! - `#[derive(Action)]` - Generates helpers for action enums (commands/events)
//!
//! # Example
//!
//! ```ignore
//! use event_tracker_macros::Action;
//! use uuid::Uuid;
//!
//! #[derive(Action, Clone, Debug)]
//! enum RegistryAction {
//!     #[command]
//!     CreateAttendee { request_id: Uuid, draft: AttendeeDraft },
//!
//!     #[event]
//!     AttendeeCreated { request_id: Uuid, attendee: Attendee },
//! }
//!
//! // Generated methods:
//! assert!(action.is_command());
//! assert_eq!(action.request_id(), Some(&id));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident, Variant};

/// Derive macro for action enums.
///
/// Variants are tagged with `#[command]` (a request to change state) or
/// `#[event]` (the outcome of a command). The macro generates:
///
/// - `is_command()` / `is_event()`
/// - `event_type()`: `"<Variant>.v1"` for events, `"unknown"` otherwise
/// - `request_id()`: the `request_id` field of named variants that carry one
///   (expected to be a `uuid::Uuid`), `None` for every other variant
#[proc_macro_derive(Action, attributes(command, event))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(Action)] can only be used on enums")
            .to_compile_error()
            .into();
    };

    let mut command_arms = Vec::new();
    let mut event_arms = Vec::new();
    let mut event_type_arms = Vec::new();
    let mut request_id_arms = Vec::new();

    for variant in &data_enum.variants {
        let is_command = has_attribute(&variant.attrs, "command");
        let is_event = has_attribute(&variant.attrs, "event");

        if is_command && is_event {
            return syn::Error::new_spanned(variant, "Variant cannot be both #[command] and #[event]")
                .to_compile_error()
                .into();
        }

        let pattern = wildcard_pattern(variant);

        if is_command {
            command_arms.push(quote! { #pattern => true, });
        }

        if is_event {
            let type_name = format!("{}.v1", variant.ident);
            event_arms.push(quote! { #pattern => true, });
            event_type_arms.push(quote! { #pattern => #type_name, });
        }

        if carries_request_id(variant) {
            let variant_name = &variant.ident;
            request_id_arms.push(quote! {
                Self::#variant_name { request_id, .. } => ::std::option::Option::Some(request_id),
            });
        }
    }

    let expanded = quote! {
        impl #name {
            /// Whether this action is a command
            #[must_use]
            pub const fn is_command(&self) -> bool {
                match self {
                    #(#command_arms)*
                    _ => false,
                }
            }

            /// Whether this action is an event
            #[must_use]
            pub const fn is_event(&self) -> bool {
                match self {
                    #(#event_arms)*
                    _ => false,
                }
            }

            /// Versioned event type name, `"unknown"` for commands
            #[must_use]
            pub const fn event_type(&self) -> &'static str {
                match self {
                    #(#event_type_arms)*
                    _ => "unknown",
                }
            }

            /// Request correlation id carried by this action, if any
            #[must_use]
            pub const fn request_id(&self) -> ::std::option::Option<&::uuid::Uuid> {
                match self {
                    #(#request_id_arms)*
                    _ => ::std::option::Option::None,
                }
            }
        }
    };

    TokenStream::from(expanded)
}

fn wildcard_pattern(variant: &Variant) -> proc_macro2::TokenStream {
    let variant_name = &variant.ident;
    match &variant.fields {
        Fields::Named(_) => quote! { Self::#variant_name { .. } },
        Fields::Unnamed(_) => quote! { Self::#variant_name(..) },
        Fields::Unit => quote! { Self::#variant_name },
    }
}

fn carries_request_id(variant: &Variant) -> bool {
    let Fields::Named(fields) = &variant.fields else {
        return false;
    };
    fields
        .named
        .iter()
        .filter_map(|field| field.ident.as_ref())
        .any(|ident: &Ident| ident == "request_id")
}

/// Check if a list of attributes contains a specific attribute name
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
