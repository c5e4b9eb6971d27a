use std::fmt::Debug;

use wasmwright_encoder::ValType;

use crate::HostError;

/// A runtime value passed to or returned from a function.
///
/// See <https://webassembly.github.io/spec/core/exec/runtime.html#values>
#[derive(Clone, Copy, PartialEq)]
pub enum Value {
    /// A 32-bit integer.
    I32(i32),
    /// A 64-bit integer.
    I64(i64),
    /// A 32-bit float.
    F32(f32),
    /// A 64-bit float.
    F64(f64),
}

impl Value {
    /// Get the type of a [`Value`]
    pub fn val_type(&self) -> ValType {
        match self {
            Self::I32(_) => ValType::I32,
            Self::I64(_) => ValType::I64,
            Self::F32(_) => ValType::F32,
            Self::F64(_) => ValType::F64,
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::I32(i) => write!(f, "i32({i})"),
            Value::I64(i) => write!(f, "i64({i})"),
            Value::F32(i) => write!(f, "f32({i})"),
            Value::F64(i) => write!(f, "f64({i})"),
        }
    }
}

macro_rules! impl_conversion {
    ($($ty:ty => $variant:ident),*) => {$(
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        }

        impl TryFrom<Value> for $ty {
            type Error = ();

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    Value::$variant(v) => Ok(v),
                    _ => Err(()),
                }
            }
        }

        impl ValTypes for $ty {
            fn val_types() -> Box<[ValType]> {
                Box::new([ValType::$variant])
            }
        }

        impl IntoValues for $ty {
            fn into_values(self) -> Vec<Value> {
                vec![self.into()]
            }
        }

        impl FromValues for $ty {
            fn from_values(values: &[Value]) -> Result<Self, HostError> {
                let [value] = values else {
                    return Err(HostError::new(format!("expected 1 value, got {}", values.len())));
                };
                <$ty>::try_from(*value)
                    .map_err(|_| HostError::new(format!("expected {}, got {value:?}", stringify!($ty))))
            }
        }
    )*};
}

/// Value types of a Rust type or tuple, used to derive host function signatures
pub trait ValTypes {
    fn val_types() -> Box<[ValType]>;
}

/// Conversion of a Rust value or tuple into positional [`Value`]s
pub trait IntoValues {
    fn into_values(self) -> Vec<Value>;
}

/// Conversion of positional [`Value`]s into a Rust value or tuple
pub trait FromValues: Sized {
    fn from_values(values: &[Value]) -> Result<Self, HostError>;
}

impl_conversion!(i32 => I32, i64 => I64, f32 => F32, f64 => F64);

macro_rules! impl_tuple {
    ($($T:ident),*) => {
        impl<$($T),*> ValTypes for ($($T,)*)
        where
            $($T: ValTypes),*
        {
            fn val_types() -> Box<[ValType]> {
                #[allow(unused_mut)]
                let mut types = Vec::new();
                $(types.extend_from_slice(&$T::val_types());)*
                types.into_boxed_slice()
            }
        }

        impl<$($T),*> IntoValues for ($($T,)*)
        where
            $($T: Into<Value>),*
        {
            #[allow(non_snake_case)]
            fn into_values(self) -> Vec<Value> {
                let ($($T,)*) = self;
                vec![$($T.into(),)*]
            }
        }

        impl<$($T),*> FromValues for ($($T,)*)
        where
            $($T: TryFrom<Value, Error = ()>),*
        {
            fn from_values(values: &[Value]) -> Result<Self, HostError> {
                const COUNT: usize = 0 $(+ { let _ = stringify!($T); 1 })*;
                if values.len() != COUNT {
                    return Err(HostError::new(format!("expected {} values, got {}", COUNT, values.len())));
                }

                #[allow(unused_variables, unused_mut)]
                let mut iter = values.iter().copied();
                Ok((
                    $(
                        $T::try_from(iter.next().ok_or_else(|| HostError::new("not enough values"))?)
                            .map_err(|_| HostError::new("could not convert value to expected type"))?,
                    )*
                ))
            }
        }
    }
}

impl_tuple!();
impl_tuple!(T1, T2);
impl_tuple!(T1, T2, T3);
impl_tuple!(T1, T2, T3, T4);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_types() {
        assert_eq!(<(i32, f64)>::val_types().to_vec(), vec![ValType::I32, ValType::F64]);
        assert_eq!(<()>::val_types().len(), 0);
        assert_eq!(i64::val_types().to_vec(), vec![ValType::I64]);
    }

    #[test]
    fn conversions() {
        assert_eq!((1i32, 2i64).into_values(), vec![Value::I32(1), Value::I64(2)]);
        assert_eq!(<(i32, i64)>::from_values(&[Value::I32(1), Value::I64(2)]).unwrap(), (1, 2));
        assert_eq!(i32::from_values(&[Value::I32(7)]).unwrap(), 7);

        assert!(i32::from_values(&[Value::I64(7)]).is_err());
        assert!(<(i32, i32)>::from_values(&[Value::I32(1)]).is_err());
        assert!(<()>::from_values(&[Value::I32(1)]).is_err());
    }
}
