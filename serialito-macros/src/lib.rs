use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

// Import shared utilities
use serialito_macro_utils::{generate_registered_impl, parse_registered_attributes};

/// Derives `serialito_core::Registered` for a struct or enum.
///
/// The derived implementation gives the type a stable **type descriptor**: the
/// name a `TypeRegistry` maps to a small integer identifier and that a
/// `RegistryStateStore` writes to disk. Encoded records carry the identifier,
/// never the name, so the descriptor is what must stay stable across restarts.
///
/// # Macro Parameters
///
/// - `name` (optional): Custom type descriptor, given as
///   `#[registered(name = "...")]`. Default: the type's identifier.
///   Set it explicitly before renaming a type whose records are already
///   persisted, so the new Rust name keeps decoding the old records.
///
/// # Examples
///
/// ```ignore
/// use serde::{Deserialize, Serialize};
/// use serialito::Registered;
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Registered)]
/// struct Description {
///     alias: String,
///     code: u32,
/// }
///
/// // Keep the descriptor used by records written before the rename
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Registered)]
/// #[registered(name = "Employee")]
/// struct StaffMember {
///     id: u64,
///     name: String,
/// }
///
/// assert_eq!(<Description as serialito_core::Registered>::TYPE_NAME, "Description");
/// assert_eq!(<StaffMember as serialito_core::Registered>::TYPE_NAME, "Employee");
/// ```
#[proc_macro_derive(Registered, attributes(registered))]
pub fn derive_registered(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    let attrs = match parse_registered_attributes(&input.attrs) {
        Ok(attrs) => attrs,
        Err(err) => return TokenStream::from(err),
    };

    // Use custom name if provided, otherwise use the type name
    let type_name = attrs
        .custom_name
        .unwrap_or_else(|| input.ident.to_string());

    TokenStream::from(generate_registered_impl(
        &input.ident,
        &input.generics,
        &type_name,
    ))
}
