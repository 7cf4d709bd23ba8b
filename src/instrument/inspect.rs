//! How an arbitrary argument or return value presents itself to the logger.
//!
//! Scalars and strings expose their literal value. Everything else exposes
//! only its simple type name unless it opts into structured rendering.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::error::InstrumentError;

/// Introspection surface used by the sanitizer and the result renderer.
///
/// Every method has a conservative default, so an empty `impl Inspect for T {}`
/// yields a type that is logged by name only and cannot be serialized.
/// Containers and tuples implement it whenever their elements do; for types
/// outside your crate that do not, wrap them in [`Opaque`].
pub trait Inspect {
    /// Simple type name with module paths stripped.
    fn type_tag(&self) -> String {
        simple_type_name(std::any::type_name::<Self>())
    }

    /// Literal printable value, only for strings and primitive-like scalars.
    fn literal(&self) -> Option<String> {
        None
    }

    /// True for absent values (`None`, unit).
    fn is_null(&self) -> bool {
        false
    }

    /// Structured form as a JSON tree. Containers build theirs from their elements.
    fn to_json(&self) -> Result<Value, InstrumentError> {
        Err(InstrumentError::ResultSerialization {
            type_tag: self.type_tag(),
            reason: "type has no structured representation".to_string(),
        })
    }

    /// Pretty-printed structured form of the value.
    fn structured(&self) -> Result<String, InstrumentError> {
        let tree = self.to_json()?;
        serde_json::to_string_pretty(&tree).map_err(|e| InstrumentError::ResultSerialization {
            type_tag: self.type_tag(),
            reason: e.to_string(),
        })
    }
}

/// Strip module paths from a fully qualified type name.
///
/// `alloc::vec::Vec<app::model::Account>` becomes `Vec<Account>`.
pub fn simple_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();

    for c in full.chars() {
        match c {
            '<' | '>' | ',' | '(' | ')' | '[' | ']' | '&' | ';' | ' ' | '*' => {
                out.push_str(last_path_segment(&segment));
                segment.clear();
                out.push(c);
            }
            _ => segment.push(c),
        }
    }
    out.push_str(last_path_segment(&segment));
    out
}

fn last_path_segment(segment: &str) -> &str {
    segment.rsplit("::").next().unwrap_or(segment)
}

/// Any value, seen by its type name only.
///
/// Lets values whose type has no [`Inspect`] impl (and cannot get one because
/// of coherence) be passed as arguments or logged as results.
///
/// ```
/// use calltrace::instrument::{Inspect, Opaque};
///
/// struct Handle;
/// let handle = Handle;
/// assert_eq!(Opaque(&handle).type_tag(), "Handle");
/// assert!(Opaque(&handle).literal().is_none());
/// ```
pub struct Opaque<'a, T: ?Sized>(pub &'a T);

impl<T: ?Sized> Inspect for Opaque<'_, T> {
    fn type_tag(&self) -> String {
        simple_type_name(std::any::type_name::<T>())
    }
}

impl<T: ?Sized> fmt::Debug for Opaque<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_tag())
    }
}

/// JSON tree of a serde-serializable value.
pub fn serialize_to_json<T>(value: &T, type_tag: impl FnOnce() -> String) -> Result<Value, InstrumentError>
where
    T: Serialize + ?Sized,
{
    serde_json::to_value(value).map_err(|e| InstrumentError::ResultSerialization {
        type_tag: type_tag(),
        reason: e.to_string(),
    })
}

fn elements_to_json<'a, T, I>(items: I) -> Result<Value, InstrumentError>
where
    T: Inspect + 'a + ?Sized,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .map(Inspect::to_json)
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn map_key<K: Inspect + ?Sized>(key: &K) -> Result<String, InstrumentError> {
    key.literal().ok_or_else(|| InstrumentError::ResultSerialization {
        type_tag: key.type_tag(),
        reason: "map key has no literal form".to_string(),
    })
}

fn entries_to_json<'a, K, V, I>(entries: I) -> Result<Value, InstrumentError>
where
    K: Inspect + 'a,
    V: Inspect + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    // serde_json::Map is ordered by key, so the output is stable for hash maps too.
    let mut object = serde_json::Map::new();
    for (key, value) in entries {
        object.insert(map_key(key)?, value.to_json()?);
    }
    Ok(Value::Object(object))
}

macro_rules! inspect_integer {
    ($($t:ty),* $(,)?) => {
        $(
            impl Inspect for $t {
                fn literal(&self) -> Option<String> {
                    Some(self.to_string())
                }

                fn to_json(&self) -> Result<Value, InstrumentError> {
                    serialize_to_json(self, || self.type_tag())
                }
            }
        )*
    };
}

inspect_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! inspect_float {
    ($($t:ty),* $(,)?) => {
        $(
            impl Inspect for $t {
                fn literal(&self) -> Option<String> {
                    Some(self.to_string())
                }

                // serde_json silently writes non-finite floats as `null`.
                fn to_json(&self) -> Result<Value, InstrumentError> {
                    if !self.is_finite() {
                        return Err(InstrumentError::ResultSerialization {
                            type_tag: self.type_tag(),
                            reason: format!("non-finite value {}", self),
                        });
                    }
                    serialize_to_json(self, || self.type_tag())
                }
            }
        )*
    };
}

inspect_float!(f32, f64);

macro_rules! inspect_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl Inspect for $t {
                fn literal(&self) -> Option<String> {
                    Some(self.to_string())
                }

                fn to_json(&self) -> Result<Value, InstrumentError> {
                    serialize_to_json(self, || self.type_tag())
                }
            }
        )*
    };
}

inspect_scalar!(bool, char, str, String);

impl Inspect for Cow<'_, str> {
    fn type_tag(&self) -> String {
        "String".to_string()
    }

    fn literal(&self) -> Option<String> {
        Some(self.to_string())
    }

    fn to_json(&self) -> Result<Value, InstrumentError> {
        Ok(Value::String(self.to_string()))
    }
}

impl Inspect for () {
    fn is_null(&self) -> bool {
        true
    }

    fn to_json(&self) -> Result<Value, InstrumentError> {
        Ok(Value::Null)
    }
}

impl<T: Inspect> Inspect for Option<T> {
    fn type_tag(&self) -> String {
        match self {
            Some(inner) => inner.type_tag(),
            None => "null".to_string(),
        }
    }

    fn literal(&self) -> Option<String> {
        self.as_ref().and_then(Inspect::literal)
    }

    fn is_null(&self) -> bool {
        match self {
            Some(inner) => inner.is_null(),
            None => true,
        }
    }

    fn to_json(&self) -> Result<Value, InstrumentError> {
        match self {
            Some(inner) => inner.to_json(),
            None => Ok(Value::Null),
        }
    }

    fn structured(&self) -> Result<String, InstrumentError> {
        match self {
            Some(inner) => inner.structured(),
            None => Ok("null".to_string()),
        }
    }
}

impl<T: Inspect + ?Sized> Inspect for &T {
    fn type_tag(&self) -> String {
        (**self).type_tag()
    }

    fn literal(&self) -> Option<String> {
        (**self).literal()
    }

    fn is_null(&self) -> bool {
        (**self).is_null()
    }

    fn to_json(&self) -> Result<Value, InstrumentError> {
        (**self).to_json()
    }

    fn structured(&self) -> Result<String, InstrumentError> {
        (**self).structured()
    }
}

macro_rules! inspect_smart_pointer {
    ($($ptr:ident),* $(,)?) => {
        $(
            impl<T: Inspect + ?Sized> Inspect for $ptr<T> {
                fn type_tag(&self) -> String {
                    (**self).type_tag()
                }

                fn literal(&self) -> Option<String> {
                    (**self).literal()
                }

                fn is_null(&self) -> bool {
                    (**self).is_null()
                }

                fn to_json(&self) -> Result<Value, InstrumentError> {
                    (**self).to_json()
                }

                fn structured(&self) -> Result<String, InstrumentError> {
                    (**self).structured()
                }
            }
        )*
    };
}

inspect_smart_pointer!(Box, Arc, Rc);

impl<T: Inspect> Inspect for [T] {
    fn to_json(&self) -> Result<Value, InstrumentError> {
        elements_to_json(self)
    }
}

impl<T: Inspect, const N: usize> Inspect for [T; N] {
    fn to_json(&self) -> Result<Value, InstrumentError> {
        elements_to_json(self)
    }
}

impl<T: Inspect> Inspect for Vec<T> {
    fn to_json(&self) -> Result<Value, InstrumentError> {
        elements_to_json(self)
    }
}

impl<T: Inspect> Inspect for VecDeque<T> {
    fn to_json(&self) -> Result<Value, InstrumentError> {
        elements_to_json(self)
    }
}

impl<T: Inspect> Inspect for BTreeSet<T> {
    fn to_json(&self) -> Result<Value, InstrumentError> {
        elements_to_json(self)
    }
}

impl<T: Inspect, S> Inspect for HashSet<T, S> {
    fn to_json(&self) -> Result<Value, InstrumentError> {
        // Sorted so the rendered form is stable across runs.
        let mut items = self
            .iter()
            .map(Inspect::to_json)
            .collect::<Result<Vec<_>, _>>()?;
        items.sort_by_cached_key(Value::to_string);
        Ok(Value::Array(items))
    }
}

impl<K: Inspect, V: Inspect, S> Inspect for HashMap<K, V, S> {
    fn to_json(&self) -> Result<Value, InstrumentError> {
        entries_to_json(self.iter())
    }
}

impl<K: Inspect, V: Inspect> Inspect for BTreeMap<K, V> {
    fn to_json(&self) -> Result<Value, InstrumentError> {
        entries_to_json(self.iter())
    }
}

macro_rules! inspect_tuple {
    ($($name:ident),+) => {
        impl<$($name: Inspect),+> Inspect for ($($name,)+) {
            #[allow(non_snake_case)]
            fn to_json(&self) -> Result<Value, InstrumentError> {
                let ($($name,)+) = self;
                Ok(Value::Array(vec![$($name.to_json()?),+]))
            }
        }
    };
}

inspect_tuple!(A);
inspect_tuple!(A, B);
inspect_tuple!(A, B, C);
inspect_tuple!(A, B, C, D);
inspect_tuple!(A, B, C, D, E);
inspect_tuple!(A, B, C, D, E, F);
inspect_tuple!(A, B, C, D, E, F, G);
inspect_tuple!(A, B, C, D, E, F, G, H);

impl Inspect for Value {
    fn is_null(&self) -> bool {
        self.is_null()
    }

    fn to_json(&self) -> Result<Value, InstrumentError> {
        Ok(self.clone())
    }
}

/// Implement [`Inspect`] for types that derive `serde::Serialize`.
///
/// The value is still logged by type name as an argument; only the
/// `Serialized` result mode uses the structured form.
///
/// ```
/// use calltrace::impl_inspect_serialize;
///
/// #[derive(serde::Serialize)]
/// struct Receipt {
///     id: u64,
/// }
///
/// impl_inspect_serialize!(Receipt);
/// ```
#[macro_export]
macro_rules! impl_inspect_serialize {
    ($($t:ty),+ $(,)?) => {
        $(
            impl $crate::instrument::Inspect for $t {
                fn to_json(
                    &self,
                ) -> ::std::result::Result<$crate::__private::serde_json::Value, $crate::instrument::InstrumentError> {
                    $crate::instrument::serialize_to_json(self, || $crate::instrument::Inspect::type_tag(self))
                }
            }
        )+
    };
}
