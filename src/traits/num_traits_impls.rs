use std::num::FpCategory;

use num_traits::{
    Float as NumFloat, FloatConst, FromPrimitive, Num, NumCast, One, Signed, ToPrimitive, Zero,
};

use crate::context::{with_context, ContextThreadLocal};
use crate::float::{lit, Float};
use crate::var::{binary, unary, Var};

// Rounding and sign functions are piecewise constant: their results are new
// leaves with zero derivative.

impl<F: ContextThreadLocal> Zero for Var<F> {
    #[inline]
    fn zero() -> Self {
        Var::new(F::zero())
    }
    #[inline]
    fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}

impl<F: ContextThreadLocal> One for Var<F> {
    #[inline]
    fn one() -> Self {
        Var::new(F::one())
    }
}

impl<F: ContextThreadLocal> Num for Var<F> {
    type FromStrRadixErr = F::FromStrRadixErr;
    fn from_str_radix(str: &str, radix: u32) -> Result<Self, Self::FromStrRadixErr> {
        F::from_str_radix(str, radix).map(Var::new)
    }
}

impl<F: ContextThreadLocal> FromPrimitive for Var<F> {
    #[inline]
    fn from_i64(n: i64) -> Option<Self> {
        F::from_i64(n).map(Var::new)
    }
    #[inline]
    fn from_u64(n: u64) -> Option<Self> {
        F::from_u64(n).map(Var::new)
    }
    #[inline]
    fn from_f32(n: f32) -> Option<Self> {
        F::from_f32(n).map(Var::new)
    }
    #[inline]
    fn from_f64(n: f64) -> Option<Self> {
        F::from_f64(n).map(Var::new)
    }
}

impl<F: Float> ToPrimitive for Var<F> {
    #[inline]
    fn to_i64(&self) -> Option<i64> {
        self.value.to_i64()
    }
    #[inline]
    fn to_u64(&self) -> Option<u64> {
        self.value.to_u64()
    }
    #[inline]
    fn to_f32(&self) -> Option<f32> {
        self.value.to_f32()
    }
    #[inline]
    fn to_f64(&self) -> Option<f64> {
        self.value.to_f64()
    }
}

impl<F: ContextThreadLocal> NumCast for Var<F> {
    #[inline]
    fn from<T: ToPrimitive>(n: T) -> Option<Self> {
        F::from(n).map(Var::new)
    }
}

impl<F: ContextThreadLocal> Signed for Var<F> {
    #[inline]
    fn abs(&self) -> Self {
        NumFloat::abs(*self)
    }
    #[inline]
    fn abs_sub(&self, other: &Self) -> Self {
        if self.value > other.value {
            *self - *other
        } else {
            Self::zero()
        }
    }
    #[inline]
    fn signum(&self) -> Self {
        Var::new(self.value.signum())
    }
    #[inline]
    fn is_positive(&self) -> bool {
        self.value.is_sign_positive()
    }
    #[inline]
    fn is_negative(&self) -> bool {
        self.value.is_sign_negative()
    }
}

impl<F: ContextThreadLocal> FloatConst for Var<F> {
    fn E() -> Self { Var::new(F::E()) }
    fn FRAC_1_PI() -> Self { Var::new(F::FRAC_1_PI()) }
    fn FRAC_1_SQRT_2() -> Self { Var::new(F::FRAC_1_SQRT_2()) }
    fn FRAC_2_PI() -> Self { Var::new(F::FRAC_2_PI()) }
    fn FRAC_2_SQRT_PI() -> Self { Var::new(F::FRAC_2_SQRT_PI()) }
    fn FRAC_PI_2() -> Self { Var::new(F::FRAC_PI_2()) }
    fn FRAC_PI_3() -> Self { Var::new(F::FRAC_PI_3()) }
    fn FRAC_PI_4() -> Self { Var::new(F::FRAC_PI_4()) }
    fn FRAC_PI_6() -> Self { Var::new(F::FRAC_PI_6()) }
    fn FRAC_PI_8() -> Self { Var::new(F::FRAC_PI_8()) }
    fn LN_10() -> Self { Var::new(F::LN_10()) }
    fn LN_2() -> Self { Var::new(F::LN_2()) }
    fn LOG10_E() -> Self { Var::new(F::LOG10_E()) }
    fn LOG2_E() -> Self { Var::new(F::LOG2_E()) }
    fn PI() -> Self { Var::new(F::PI()) }
    fn SQRT_2() -> Self { Var::new(F::SQRT_2()) }
    fn TAU() -> Self { Var::new(F::TAU()) }
    fn LOG10_2() -> Self { Var::new(F::LOG10_2()) }
    fn LOG2_10() -> Self { Var::new(F::LOG2_10()) }
}

impl<F: ContextThreadLocal> NumFloat for Var<F> {
    fn nan() -> Self { Var::new(F::nan()) }
    fn infinity() -> Self { Var::new(F::infinity()) }
    fn neg_infinity() -> Self { Var::new(F::neg_infinity()) }
    fn neg_zero() -> Self { Var::new(F::neg_zero()) }

    fn min_value() -> Self { Var::new(F::min_value()) }
    fn min_positive_value() -> Self { Var::new(F::min_positive_value()) }
    fn max_value() -> Self { Var::new(F::max_value()) }
    fn epsilon() -> Self { Var::new(F::epsilon()) }

    fn is_nan(self) -> bool { self.value.is_nan() }
    fn is_infinite(self) -> bool { self.value.is_infinite() }
    fn is_finite(self) -> bool { self.value.is_finite() }
    fn is_normal(self) -> bool { self.value.is_normal() }
    fn is_sign_positive(self) -> bool { self.value.is_sign_positive() }
    fn is_sign_negative(self) -> bool { self.value.is_sign_negative() }
    fn classify(self) -> FpCategory { self.value.classify() }

    fn floor(self) -> Self { Var::new(self.value.floor()) }
    fn ceil(self) -> Self { Var::new(self.value.ceil()) }
    fn round(self) -> Self { Var::new(self.value.round()) }
    fn trunc(self) -> Self { Var::new(self.value.trunc()) }
    fn fract(self) -> Self {
        unary(self, self.value.fract(), F::one())
    }
    fn abs(self) -> Self {
        unary(self, self.value.abs(), abs_partial(self.value))
    }
    fn signum(self) -> Self {
        Var::new(self.value.signum())
    }

    fn mul_add(self, a: Self, b: Self) -> Self {
        let value = self.value.mul_add(a.value, b.value);
        with_context(|c| c.push_nary(value, [self, a, b], [a.value, self.value, F::one()]))
    }

    fn recip(self) -> Self {
        let inv = F::one() / self.value;
        unary(self, inv, -inv * inv)
    }

    fn powi(self, n: i32) -> Self {
        let val = self.value.powi(n);
        let lower = match n.checked_sub(1) {
            Some(m) => self.value.powi(m),
            None => self.value.powf(lit::<F>(i32::MIN as f64 - 1.0)),
        };
        let deriv = lit::<F>(n as f64) * lower;
        unary(self, val, deriv)
    }

    fn powf(self, n: Self) -> Self {
        let val = self.value.powf(n.value);
        let dx = n.value * self.value.powf(n.value - F::one());
        let dy = val * self.value.ln();
        binary(self, n, val, dx, dy)
    }

    fn sqrt(self) -> Self {
        let s = self.value.sqrt();
        let two = F::one() + F::one();
        unary(self, s, F::one() / (two * s))
    }

    fn cbrt(self) -> Self {
        let c = self.value.cbrt();
        let three = lit::<F>(3.0);
        unary(self, c, F::one() / (three * c * c))
    }

    fn exp(self) -> Self {
        let e = self.value.exp();
        unary(self, e, e)
    }

    fn exp2(self) -> Self {
        let e = self.value.exp2();
        unary(self, e, e * F::LN_2())
    }

    fn exp_m1(self) -> Self {
        unary(self, self.value.exp_m1(), self.value.exp())
    }

    fn ln(self) -> Self {
        unary(self, self.value.ln(), F::one() / self.value)
    }

    fn log2(self) -> Self {
        unary(self, self.value.log2(), F::one() / (self.value * F::LN_2()))
    }

    fn log10(self) -> Self {
        unary(self, self.value.log10(), F::one() / (self.value * F::LN_10()))
    }

    fn ln_1p(self) -> Self {
        unary(self, self.value.ln_1p(), F::one() / (F::one() + self.value))
    }

    fn log(self, base: Self) -> Self {
        self.ln() / base.ln()
    }

    fn sin(self) -> Self {
        unary(self, self.value.sin(), self.value.cos())
    }

    fn cos(self) -> Self {
        unary(self, self.value.cos(), -self.value.sin())
    }

    fn tan(self) -> Self {
        let c = self.value.cos();
        unary(self, self.value.tan(), F::one() / (c * c))
    }

    fn sin_cos(self) -> (Self, Self) {
        let (s, c) = self.value.sin_cos();
        (unary(self, s, c), unary(self, c, -s))
    }

    fn asin(self) -> Self {
        unary(
            self,
            self.value.asin(),
            F::one() / (F::one() - self.value * self.value).sqrt(),
        )
    }

    fn acos(self) -> Self {
        unary(
            self,
            self.value.acos(),
            -F::one() / (F::one() - self.value * self.value).sqrt(),
        )
    }

    fn atan(self) -> Self {
        unary(
            self,
            self.value.atan(),
            F::one() / (F::one() + self.value * self.value),
        )
    }

    fn atan2(self, other: Self) -> Self {
        let denom = self.value * self.value + other.value * other.value;
        let dx = other.value / denom;
        let dy = -self.value / denom;
        binary(self, other, self.value.atan2(other.value), dx, dy)
    }

    fn sinh(self) -> Self {
        unary(self, self.value.sinh(), self.value.cosh())
    }

    fn cosh(self) -> Self {
        unary(self, self.value.cosh(), self.value.sinh())
    }

    fn tanh(self) -> Self {
        let c = self.value.cosh();
        unary(self, self.value.tanh(), F::one() / (c * c))
    }

    fn asinh(self) -> Self {
        unary(
            self,
            self.value.asinh(),
            F::one() / (self.value * self.value + F::one()).sqrt(),
        )
    }

    fn acosh(self) -> Self {
        unary(
            self,
            self.value.acosh(),
            F::one() / (self.value * self.value - F::one()).sqrt(),
        )
    }

    fn atanh(self) -> Self {
        unary(
            self,
            self.value.atanh(),
            F::one() / (F::one() - self.value * self.value),
        )
    }

    fn hypot(self, other: Self) -> Self {
        let h = self.value.hypot(other.value);
        let dx = self.value / h;
        let dy = other.value / h;
        binary(self, other, h, dx, dy)
    }

    fn max(self, other: Self) -> Self {
        if self.value >= other.value {
            // Propagate self's derivative.
            unary(self, self.value, F::one())
        } else {
            unary(other, other.value, F::one())
        }
    }

    fn min(self, other: Self) -> Self {
        if self.value <= other.value {
            unary(self, self.value, F::one())
        } else {
            unary(other, other.value, F::one())
        }
    }

    fn abs_sub(self, other: Self) -> Self {
        if self.value > other.value {
            self - other
        } else {
            Self::zero()
        }
    }

    fn integer_decode(self) -> (u64, i16, i8) {
        self.value.integer_decode()
    }

    fn to_degrees(self) -> Self {
        let factor = lit::<F>(180.0) / F::PI();
        unary(self, self.value.to_degrees(), factor)
    }

    fn to_radians(self) -> Self {
        let factor = F::PI() / lit::<F>(180.0);
        unary(self, self.value.to_radians(), factor)
    }
}

/// Derivative of `|x|`: the sign away from zero, 0 at zero, `NaN` for `NaN`.
#[inline]
fn abs_partial<F: Float>(x: F) -> F {
    if x > F::zero() {
        F::one()
    } else if x < F::zero() {
        -F::one()
    } else if x == F::zero() {
        F::zero()
    } else {
        F::nan()
    }
}
