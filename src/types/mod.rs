//! Positional parameters for prepared statements.
//!
//! Parameters are forwarded to the bindings surface as a slice of [`Param`].
//! Tuples, slices and vectors implement [`ToParams`], so callers write
//! `stmt.query((42, "x"))` instead of building the slice by hand.

#[cfg(feature = "with-chrono")]
mod chrono;
#[cfg(feature = "with-uuid")]
mod uuid;

/// A single positional parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// Trait for converting a Rust value into a [`Param`].
pub trait ToParam {
    fn to_param(&self) -> Param;
}

/// Trait for encoding multiple parameters.
pub trait ToParams {
    /// Number of parameters.
    fn param_count(&self) -> usize;

    /// Append all parameters to `out`, in position order.
    fn write_params(&self, out: &mut Vec<Param>);

    /// Collect the parameters into a new vector.
    fn to_params(&self) -> Vec<Param> {
        let mut out = Vec::with_capacity(self.param_count());
        self.write_params(&mut out);
        out
    }
}

impl ToParam for Param {
    fn to_param(&self) -> Param {
        self.clone()
    }
}

macro_rules! impl_to_param {
    ($variant:ident as $target:ty: $($t:ty),+) => {
        $(
            impl ToParam for $t {
                fn to_param(&self) -> Param {
                    Param::$variant(<$target>::from(*self))
                }
            }
        )+
    };
}

impl_to_param!(Bool as bool: bool);
impl_to_param!(Int as i64: i8, i16, i32, i64);
impl_to_param!(UInt as u64: u8, u16, u32, u64);
impl_to_param!(Double as f64: f32, f64);

impl ToParam for str {
    fn to_param(&self) -> Param {
        Param::Text(self.to_owned())
    }
}

impl ToParam for String {
    fn to_param(&self) -> Param {
        Param::Text(self.clone())
    }
}

impl ToParam for [u8] {
    fn to_param(&self) -> Param {
        Param::Blob(self.to_vec())
    }
}

impl ToParam for Vec<u8> {
    fn to_param(&self) -> Param {
        Param::Blob(self.clone())
    }
}

// === Option<T> - NULL handling ===

impl<T: ToParam> ToParam for Option<T> {
    fn to_param(&self) -> Param {
        match self {
            Some(v) => v.to_param(),
            None => Param::Null,
        }
    }
}

// === Reference support ===

impl<T: ToParam + ?Sized> ToParam for &T {
    fn to_param(&self) -> Param {
        (*self).to_param()
    }
}

// === ToParams implementations ===

impl ToParams for () {
    fn param_count(&self) -> usize {
        0
    }

    fn write_params(&self, _out: &mut Vec<Param>) {}
}

impl<T: ToParam> ToParams for [T] {
    fn param_count(&self) -> usize {
        self.len()
    }

    fn write_params(&self, out: &mut Vec<Param>) {
        out.extend(self.iter().map(ToParam::to_param));
    }
}

impl<T: ToParam> ToParams for Vec<T> {
    fn param_count(&self) -> usize {
        self.len()
    }

    fn write_params(&self, out: &mut Vec<Param>) {
        self.as_slice().write_params(out);
    }
}

impl<T: ToParams + ?Sized> ToParams for &T {
    fn param_count(&self) -> usize {
        (*self).param_count()
    }

    fn write_params(&self, out: &mut Vec<Param>) {
        (*self).write_params(out);
    }
}

// Tuple implementations via macro
macro_rules! impl_to_params {
    ($count:expr, $($idx:tt: $T:ident),+) => {
        impl<$($T: ToParam),+> ToParams for ($($T,)+) {
            fn param_count(&self) -> usize {
                $count
            }

            fn write_params(&self, out: &mut Vec<Param>) {
                $(out.push(self.$idx.to_param());)+
            }
        }
    };
}

impl_to_params!(1, 0: T0);
impl_to_params!(2, 0: T0, 1: T1);
impl_to_params!(3, 0: T0, 1: T1, 2: T2);
impl_to_params!(4, 0: T0, 1: T1, 2: T2, 3: T3);
impl_to_params!(5, 0: T0, 1: T1, 2: T2, 3: T3, 4: T4);
impl_to_params!(6, 0: T0, 1: T1, 2: T2, 3: T3, 4: T4, 5: T5);
impl_to_params!(7, 0: T0, 1: T1, 2: T2, 3: T3, 4: T4, 5: T5, 6: T6);
impl_to_params!(8, 0: T0, 1: T1, 2: T2, 3: T3, 4: T4, 5: T5, 6: T6, 7: T7);
impl_to_params!(9, 0: T0, 1: T1, 2: T2, 3: T3, 4: T4, 5: T5, 6: T6, 7: T7, 8: T8);
impl_to_params!(10, 0: T0, 1: T1, 2: T2, 3: T3, 4: T4, 5: T5, 6: T6, 7: T7, 8: T8, 9: T9);
impl_to_params!(11, 0: T0, 1: T1, 2: T2, 3: T3, 4: T4, 5: T5, 6: T6, 7: T7, 8: T8, 9: T9, 10: T10);
impl_to_params!(12, 0: T0, 1: T1, 2: T2, 3: T3, 4: T4, 5: T5, 6: T6, 7: T7, 8: T8, 9: T9, 10: T10, 11: T11);
