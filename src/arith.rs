//! Checked division.
//!
//! Integer and float division both raise `DivideByZero` on a zero
//! denominator. Integer overflow (`MIN / -1`) wraps.

use crate::error::RuntimeError;
use crate::panic::Unwind;

pub trait Divide: Sized {
    fn try_div(self, rhs: Self) -> Result<Self, RuntimeError>;
    fn try_rem(self, rhs: Self) -> Result<Self, RuntimeError>;
}

macro_rules! divide_int {
    ($($t:ty),+ $(,)?) => {
        $(
            impl Divide for $t {
                #[inline]
                fn try_div(self, rhs: $t) -> Result<$t, RuntimeError> {
                    if rhs == 0 {
                        return Err(RuntimeError::DivideByZero);
                    }
                    Ok(self.wrapping_div(rhs))
                }

                #[inline]
                fn try_rem(self, rhs: $t) -> Result<$t, RuntimeError> {
                    if rhs == 0 {
                        return Err(RuntimeError::DivideByZero);
                    }
                    Ok(self.wrapping_rem(rhs))
                }
            }
        )+
    };
}

macro_rules! divide_float {
    ($($t:ty),+ $(,)?) => {
        $(
            impl Divide for $t {
                #[inline]
                fn try_div(self, rhs: $t) -> Result<$t, RuntimeError> {
                    if rhs == 0.0 {
                        return Err(RuntimeError::DivideByZero);
                    }
                    Ok(self / rhs)
                }

                #[inline]
                fn try_rem(self, rhs: $t) -> Result<$t, RuntimeError> {
                    if rhs == 0.0 {
                        return Err(RuntimeError::DivideByZero);
                    }
                    Ok(self % rhs)
                }
            }
        )+
    };
}

divide_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
divide_float!(f32, f64);

/// `x / y`, raising `DivideByZero` when `y` is zero.
pub fn div<T: Divide>(x: T, y: T) -> T {
    x.try_div(y).or_throw()
}

/// `x % y`, raising `DivideByZero` when `y` is zero.
pub fn rem<T: Divide>(x: T, y: T) -> T {
    x.try_rem(y).or_throw()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panic::recover;

    #[test]
    fn divides_and_wraps() {
        assert_eq!(div(7, 2), 3);
        assert_eq!(rem(7, 2), 1);
        assert_eq!(div(i32::MIN, -1), i32::MIN);
        assert_eq!(div(1.0, 4.0), 0.25);
    }

    #[test]
    fn zero_denominator_raises() {
        assert_eq!(recover(|| div(1u8, 0)), Err(RuntimeError::DivideByZero));
        assert_eq!(5i64.try_rem(0), Err(RuntimeError::DivideByZero));
        assert_eq!(1.0f64.try_div(0.0), Err(RuntimeError::DivideByZero));
    }
}
