//! Value Conversion Module
//!
//! Best-effort coercion between scalar types when a cached value is read back
//! as a different type than it was stored with.

use std::any::{Any, TypeId};

// == Scalar ==
/// Intermediate form every supported scalar is lifted into.
#[derive(Debug, Clone, PartialEq)]
enum Scalar {
    Int(i128),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    fn from_any(value: &dyn Any) -> Option<Self> {
        macro_rules! lift_int {
            ($($ty:ty),*) => {
                $(
                    if let Some(v) = value.downcast_ref::<$ty>() {
                        return Some(Scalar::Int(*v as i128));
                    }
                )*
            };
        }
        lift_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

        if let Some(v) = value.downcast_ref::<f64>() {
            return Some(Scalar::Float(*v));
        }
        if let Some(v) = value.downcast_ref::<f32>() {
            return Some(Scalar::Float(f64::from(*v)));
        }
        if let Some(v) = value.downcast_ref::<bool>() {
            return Some(Scalar::Bool(*v));
        }
        if let Some(v) = value.downcast_ref::<String>() {
            return Some(Scalar::Text(v.clone()));
        }
        if let Some(v) = value.downcast_ref::<&'static str>() {
            return Some(Scalar::Text((*v).to_string()));
        }
        None
    }

    fn to_int(&self) -> Option<i128> {
        match self {
            Scalar::Int(v) => Some(*v),
            Scalar::Float(v) if v.is_finite() => {
                let rounded = v.round_ties_even();
                if rounded >= i128::MIN as f64 && rounded <= i128::MAX as f64 {
                    Some(rounded as i128)
                } else {
                    None
                }
            }
            Scalar::Float(_) => None,
            Scalar::Bool(v) => Some(i128::from(*v)),
            Scalar::Text(v) => v.trim().parse().ok(),
        }
    }

    fn to_float(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            Scalar::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Scalar::Text(v) => v.trim().parse().ok(),
        }
    }

    fn to_bool(&self) -> Option<bool> {
        match self {
            Scalar::Int(v) => Some(*v != 0),
            Scalar::Float(v) => Some(*v != 0.0),
            Scalar::Bool(v) => Some(*v),
            Scalar::Text(v) => {
                let v = v.trim();
                if v.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if v.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }
        }
    }

    fn into_text(self) -> String {
        match self {
            Scalar::Int(v) => v.to_string(),
            Scalar::Float(v) => v.to_string(),
            Scalar::Bool(v) => v.to_string(),
            Scalar::Text(v) => v,
        }
    }
}

fn cast<U: Any, T: Any>(value: U) -> Option<T> {
    let boxed: Box<dyn Any> = Box::new(value);
    boxed.downcast::<T>().ok().map(|value| *value)
}

// == Coerce ==
/// Converts a stored scalar into `T`.
///
/// Returns None when either side is not a supported scalar or the value does
/// not fit (out of range integer, unparseable string, non-finite float into
/// an integer).
pub fn coerce<T: Any>(value: &dyn Any) -> Option<T> {
    let scalar = Scalar::from_any(value)?;
    let target = TypeId::of::<T>();

    macro_rules! to_int_target {
        ($($ty:ty),*) => {
            $(
                if target == TypeId::of::<$ty>() {
                    let v = <$ty>::try_from(scalar.to_int()?).ok()?;
                    return cast::<$ty, T>(v);
                }
            )*
        };
    }
    to_int_target!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

    if target == TypeId::of::<f64>() {
        return cast::<f64, T>(scalar.to_float()?);
    }
    if target == TypeId::of::<f32>() {
        return cast::<f32, T>(scalar.to_float()? as f32);
    }
    if target == TypeId::of::<bool>() {
        return cast::<bool, T>(scalar.to_bool()?);
    }
    if target == TypeId::of::<String>() {
        return cast::<String, T>(scalar.into_text());
    }
    None
}
