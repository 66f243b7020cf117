use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign,
};

use crate::context::ContextThreadLocal;
use crate::float::Float;
use crate::var::{binary, unary, Var};

// ──────────────────────────────────────────────
//  Var<F> operators
// ──────────────────────────────────────────────

impl<F: ContextThreadLocal> Add for Var<F> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        binary(self, rhs, self.value + rhs.value, F::one(), F::one())
    }
}

impl<F: ContextThreadLocal> Sub for Var<F> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        binary(self, rhs, self.value - rhs.value, F::one(), -F::one())
    }
}

impl<F: ContextThreadLocal> Mul for Var<F> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        binary(self, rhs, self.value * rhs.value, rhs.value, self.value)
    }
}

// Plain IEEE arithmetic, including at b == 0: the partials are 1/b and
// -a/b², whatever those evaluate to.
impl<F: ContextThreadLocal> Div for Var<F> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        let (a, b) = (self.value, rhs.value);
        binary(self, rhs, a / b, F::one() / b, -a / (b * b))
    }
}

impl<F: ContextThreadLocal> Neg for Var<F> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        unary(self, -self.value, -F::one())
    }
}

// a % b = a - trunc(a / b) * b
impl<F: ContextThreadLocal> Rem for Var<F> {
    type Output = Self;
    #[inline]
    fn rem(self, rhs: Self) -> Self {
        let (a, b) = (self.value, rhs.value);
        binary(self, rhs, a % b, F::one(), -(a / b).trunc())
    }
}

impl<F: ContextThreadLocal> AddAssign for Var<F> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<F: ContextThreadLocal> SubAssign for Var<F> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<F: ContextThreadLocal> MulAssign for Var<F> {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<F: ContextThreadLocal> DivAssign for Var<F> {
    #[inline]
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl<F: ContextThreadLocal> RemAssign for Var<F> {
    #[inline]
    fn rem_assign(&mut self, rhs: Self) {
        *self = *self % rhs;
    }
}

// Mixed ops: Var<F> with primitive floats. The primitive side gets no node;
// the result is a unary node over the variable.
macro_rules! impl_var_scalar_ops {
    ($f:ty) => {
        impl Add<$f> for Var<$f> {
            type Output = Var<$f>;
            #[inline]
            fn add(self, rhs: $f) -> Var<$f> {
                unary(self, self.value + rhs, 1.0)
            }
        }

        impl Add<Var<$f>> for $f {
            type Output = Var<$f>;
            #[inline]
            fn add(self, rhs: Var<$f>) -> Var<$f> {
                unary(rhs, self + rhs.value, 1.0)
            }
        }

        impl Sub<$f> for Var<$f> {
            type Output = Var<$f>;
            #[inline]
            fn sub(self, rhs: $f) -> Var<$f> {
                unary(self, self.value - rhs, 1.0)
            }
        }

        impl Sub<Var<$f>> for $f {
            type Output = Var<$f>;
            #[inline]
            fn sub(self, rhs: Var<$f>) -> Var<$f> {
                unary(rhs, self - rhs.value, -1.0)
            }
        }

        impl Mul<$f> for Var<$f> {
            type Output = Var<$f>;
            #[inline]
            fn mul(self, rhs: $f) -> Var<$f> {
                unary(self, self.value * rhs, rhs)
            }
        }

        impl Mul<Var<$f>> for $f {
            type Output = Var<$f>;
            #[inline]
            fn mul(self, rhs: Var<$f>) -> Var<$f> {
                unary(rhs, self * rhs.value, self)
            }
        }

        impl Div<$f> for Var<$f> {
            type Output = Var<$f>;
            #[inline]
            fn div(self, rhs: $f) -> Var<$f> {
                unary(self, self.value / rhs, 1.0 / rhs)
            }
        }

        impl Div<Var<$f>> for $f {
            type Output = Var<$f>;
            #[inline]
            fn div(self, rhs: Var<$f>) -> Var<$f> {
                let b = rhs.value;
                unary(rhs, self / b, -self / (b * b))
            }
        }

        impl Rem<$f> for Var<$f> {
            type Output = Var<$f>;
            #[inline]
            fn rem(self, rhs: $f) -> Var<$f> {
                unary(self, self.value % rhs, 1.0)
            }
        }

        impl Rem<Var<$f>> for $f {
            type Output = Var<$f>;
            #[inline]
            fn rem(self, rhs: Var<$f>) -> Var<$f> {
                let b = rhs.value;
                unary(rhs, self % b, -(self / b).trunc())
            }
        }

        impl AddAssign<$f> for Var<$f> {
            #[inline]
            fn add_assign(&mut self, rhs: $f) {
                *self = *self + rhs;
            }
        }

        impl SubAssign<$f> for Var<$f> {
            #[inline]
            fn sub_assign(&mut self, rhs: $f) {
                *self = *self - rhs;
            }
        }

        impl MulAssign<$f> for Var<$f> {
            #[inline]
            fn mul_assign(&mut self, rhs: $f) {
                *self = *self * rhs;
            }
        }

        impl DivAssign<$f> for Var<$f> {
            #[inline]
            fn div_assign(&mut self, rhs: $f) {
                *self = *self / rhs;
            }
        }
    };
}

impl_var_scalar_ops!(f32);
impl_var_scalar_ops!(f64);

impl<F: Float> PartialEq for Var<F> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<F: Float> PartialOrd for Var<F> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.value.partial_cmp(&other.value)
    }
}
