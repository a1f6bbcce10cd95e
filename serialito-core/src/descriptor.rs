use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Small integer standing in for a value type inside encoded records.
///
/// Identifiers are allocated by a [`TypeRegistry`](crate::TypeRegistry) starting at
/// [`TypeIdentifier::BASE`], one per distinct type, in registration order.
///
/// # Examples
///
/// ```
/// use serialito_core::TypeIdentifier;
///
/// let id = TypeIdentifier::new(3);
/// assert_eq!(id.get(), 3);
/// assert_eq!(TypeIdentifier::BASE.get(), 0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeIdentifier(u32);

impl TypeIdentifier {
    /// First identifier handed out by an empty registry.
    pub const BASE: TypeIdentifier = TypeIdentifier(0);

    pub const fn new(raw: u32) -> Self {
        TypeIdentifier(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// The identifier allocated after this one, or `None` on overflow.
    pub fn next(self) -> Option<TypeIdentifier> {
        self.0.checked_add(1).map(TypeIdentifier)
    }
}

impl fmt::Display for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TypeIdentifier {
    fn from(raw: u32) -> Self {
        TypeIdentifier(raw)
    }
}

/// Stable name of a value type, the key a registry maps to a [`TypeIdentifier`].
///
/// Descriptors are what gets persisted, so they must not change when a Rust
/// type is renamed. `#[derive(Registered)]` uses the type identifier by default
/// and accepts `#[registered(name = "...")]` to pin it.
///
/// # Examples
///
/// ```
/// use serialito_core::{Registered, TypeDescriptor};
///
/// let text = TypeDescriptor::of::<String>();
/// assert_eq!(text.name(), "String");
/// assert_eq!(text, TypeDescriptor::new("String"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeDescriptor(String);

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        TypeDescriptor(name.into())
    }

    /// Descriptor of a registered Rust type.
    pub fn of<T: Registered + ?Sized>() -> Self {
        T::type_descriptor()
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TypeDescriptor {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeDescriptor {
    fn from(name: &str) -> Self {
        TypeDescriptor::new(name)
    }
}

impl From<String> for TypeDescriptor {
    fn from(name: String) -> Self {
        TypeDescriptor(name)
    }
}

/// Trait for value types that can be registered with a [`TypeRegistry`](crate::TypeRegistry).
///
/// Usually derived with `#[derive(Registered)]` from the `serialito` crate.
/// Manual implementations only need the descriptor name:
///
/// ```
/// use serialito_core::{Registered, TypeDescriptor};
///
/// struct Fruit(String);
///
/// impl Registered for Fruit {
///     const TYPE_NAME: &'static str = "demo.Fruit";
/// }
///
/// assert_eq!(Fruit::type_descriptor(), TypeDescriptor::new("demo.Fruit"));
/// ```
pub trait Registered {
    /// Stable descriptor name persisted in registry state.
    const TYPE_NAME: &'static str;

    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::new(Self::TYPE_NAME)
    }
}

macro_rules! impl_registered {
    ($($ty:ty => $name:expr),* $(,)?) => {
        $(
            impl Registered for $ty {
                const TYPE_NAME: &'static str = $name;
            }
        )*
    };
}

impl_registered! {
    String => "String",
    Vec<u8> => "Bytes",
    bool => "bool",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    u128 => "u128",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    i128 => "i128",
    f32 => "f32",
    f64 => "f64",
}
