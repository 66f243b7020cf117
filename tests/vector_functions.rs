use approx::assert_relative_eq;
use wombat::{
    distance, dot_product, dot_product_vd, dot_self, grad, inv_logit, log1p_exp, log_mix,
    log_sum_exp, mean, sd, squared_distance, squared_distance_vd, sum, variance, AdError, Var,
};

fn vars(xs: &[f64]) -> Vec<Var<f64>> {
    xs.iter().map(|&x| Var::new(x)).collect()
}

fn finite_diff_grad(f: impl Fn(&[f64]) -> f64, x: &[f64]) -> Vec<f64> {
    let h = 1e-7;
    (0..x.len())
        .map(|i| {
            let mut xp = x.to_vec();
            let mut xm = x.to_vec();
            xp[i] += h;
            xm[i] -= h;
            (f(&xp) - f(&xm)) / (2.0 * h)
        })
        .collect()
}

#[test]
fn squared_distance_scenario() {
    let a = vars(&[1.0, 3.0, -5.0]);
    let b = vars(&[4.0, -2.0, -1.0]);
    let d = squared_distance(&a, &b).unwrap();
    assert_eq!(d.value(), 50.0);
    assert_eq!(grad(d, &a).unwrap(), vec![-6.0, 10.0, -8.0]);
    assert_eq!(grad(d, &b).unwrap(), vec![6.0, -10.0, 8.0]);

    let d = squared_distance_vd(&a, &[4.0, -2.0, -1.0]).unwrap();
    assert_eq!(d.value(), 50.0);
    assert_eq!(grad(d, &a).unwrap(), vec![-6.0, 10.0, -8.0]);
}

#[test]
fn variance_scenario() {
    let v = vars(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let s = variance(&v).unwrap();
    assert_relative_eq!(s.value(), 3.5, max_relative = 1e-12);
    let g = grad(s, &v).unwrap();
    let expected = [-1.0, -0.6, -0.2, 0.2, 0.6, 1.0];
    for (gi, ei) in g.iter().zip(expected.iter()) {
        assert_relative_eq!(*gi, *ei, epsilon = 1e-12);
    }
}

#[test]
fn variance_edge_cases() {
    let err = variance::<f64>(&[]).unwrap_err();
    assert!(err.is_domain_error());
    assert!(matches!(err, AdError::ZeroSize { op: "variance", .. }));

    let one = vars(&[7.0]);
    let s = variance(&one).unwrap();
    assert_eq!(s.value(), 0.0);
    assert_eq!(sd(&one).unwrap().value(), 0.0);
    assert!(sd::<f64>(&[]).is_err());
}

#[test]
fn sd_of_constant_slice_has_zero_gradient() {
    let v = vars(&[1.0, 1.0, 1.0]);
    let s = sd(&v).unwrap();
    assert_eq!(s.value(), 0.0);
    assert_eq!(grad(s, &v).unwrap(), vec![0.0, 0.0, 0.0]);
}

#[test]
fn sd_matches_finite_differences() {
    let x = [0.3, -1.2, 2.5, 0.9];
    let v = vars(&x);
    let s = sd(&v).unwrap();
    let f = |x: &[f64]| {
        let n = x.len() as f64;
        let m = x.iter().sum::<f64>() / n;
        (x.iter().map(|xi| (xi - m) * (xi - m)).sum::<f64>() / (n - 1.0)).sqrt()
    };
    assert_relative_eq!(s.value(), f(&x), max_relative = 1e-12);
    let g = grad(s, &v).unwrap();
    for (gi, fi) in g.iter().zip(finite_diff_grad(f, &x)) {
        assert_relative_eq!(*gi, fi, max_relative = 1e-6);
    }
}

#[test]
fn distance_with_nan_propagates() {
    let a = vars(&[1.0, f64::NAN]);
    let b = vars(&[0.0, 0.0]);
    let d = distance(&a, &b).unwrap();
    assert!(d.value().is_nan());
    assert!(grad(d, &a).unwrap()[0].is_nan());
}

#[test]
fn distance_is_sqrt_of_squared_distance() {
    let a = vars(&[1.0, 2.0]);
    let b = vars(&[4.0, 6.0]);
    let d = distance(&a, &b).unwrap();
    assert_eq!(d.value(), 5.0);
    let g = grad(d, &a).unwrap();
    assert_relative_eq!(g[0], -0.6, max_relative = 1e-12);
    assert_relative_eq!(g[1], -0.8, max_relative = 1e-12);
}

#[test]
fn size_mismatch_records_nothing() {
    let a = vars(&[1.0, 2.0]);
    let b = vars(&[1.0]);
    let before = wombat::tape_len::<f64>();
    assert_eq!(
        dot_product(&a, &b).unwrap_err(),
        AdError::SizeMismatch {
            op: "dot_product",
            left: 2,
            right: 1
        }
    );
    assert!(squared_distance(&a, &b).is_err());
    assert!(distance(&a, &b).is_err());
    assert!(dot_product_vd(&a, &[1.0]).is_err());
    assert_eq!(wombat::tape_len::<f64>(), before);
}

#[test]
fn dot_products() {
    let a = vars(&[1.0, 2.0, 3.0]);
    let b = vars(&[4.0, 5.0, 6.0]);
    let d = dot_product(&a, &b).unwrap();
    assert_eq!(d.value(), 32.0);
    assert_eq!(grad(d, &a).unwrap(), vec![4.0, 5.0, 6.0]);
    assert_eq!(grad(d, &b).unwrap(), vec![1.0, 2.0, 3.0]);

    let d = dot_product_vd(&a, &[2.0, 0.0, -1.0]).unwrap();
    assert_eq!(d.value(), -1.0);
    assert_eq!(grad(d, &a).unwrap(), vec![2.0, 0.0, -1.0]);

    let s = dot_self(&a);
    assert_eq!(s.value(), 14.0);
    assert_eq!(grad(s, &a).unwrap(), vec![2.0, 4.0, 6.0]);
}

#[test]
fn sum_and_mean() {
    let v = vars(&[1.0, 2.0, 3.0, 6.0]);
    let s = sum(&v);
    assert_eq!(s.value(), 12.0);
    let m = mean(&v).unwrap();
    assert_eq!(m.value(), 3.0);
    assert_eq!(grad(m, &v).unwrap(), vec![0.25; 4]);
    assert!(mean::<f64>(&[]).is_err());
}

#[test]
fn log_sum_exp_is_stable() {
    let x = [1000.0, 1000.0];
    let v = vars(&x);
    let l = log_sum_exp(&v);
    assert_relative_eq!(l.value(), 1000.0 + 2.0_f64.ln(), max_relative = 1e-12);
    for gi in grad(l, &v).unwrap() {
        assert_relative_eq!(gi, 0.5, max_relative = 1e-12);
    }
}

#[test]
fn log_sum_exp_gradient_is_softmax() {
    let x = [0.5, -1.0, 2.0];
    let v = vars(&x);
    let l = log_sum_exp(&v);
    let z: f64 = x.iter().map(|xi| xi.exp()).sum();
    let g = grad(l, &v).unwrap();
    for (gi, xi) in g.iter().zip(x.iter()) {
        assert_relative_eq!(*gi, xi.exp() / z, max_relative = 1e-12);
    }
}

// ── Special functions ──

fn log_mix_f64(x: &[f64]) -> f64 {
    (x[0] * x[1].exp() + (1.0 - x[0]) * x[2].exp()).ln()
}

#[test]
fn log_mix_matches_finite_differences() {
    for x in [[0.3, -1.0, -2.0], [0.8, -3.0, 0.5], [0.5, 1.0, 1.0]] {
        let v = vars(&x);
        let m = log_mix(v[0], v[1], v[2]).unwrap();
        assert_relative_eq!(m.value(), log_mix_f64(&x), max_relative = 1e-12);
        let g = grad(m, &v).unwrap();
        for (gi, fi) in g.iter().zip(finite_diff_grad(log_mix_f64, &x)) {
            assert_relative_eq!(*gi, fi, epsilon = 1e-6, max_relative = 1e-6);
        }
    }
}

#[test]
fn log_mix_validates_arguments() {
    let l = Var::new(-1.0_f64);
    let err = log_mix(Var::new(1.5), l, l).unwrap_err();
    assert!(matches!(err, AdError::OutOfDomain { what: "theta", .. }));
    let err = log_mix(Var::new(0.5), Var::new(f64::NAN), l).unwrap_err();
    assert_eq!(
        err,
        AdError::NotANumber {
            op: "log_mix",
            what: "lambda1"
        }
    );
    assert!(log_mix(Var::new(0.5), l, Var::new(f64::NAN)).is_err());
    assert!(log_mix(Var::new(f64::NAN), l, l).is_err());
}

#[test]
fn logistic_functions() {
    let x = Var::new(0.4_f64);
    let s = inv_logit(x);
    let expected = 1.0 / (1.0 + (-0.4_f64).exp());
    assert_relative_eq!(s.value(), expected, max_relative = 1e-12);
    assert_relative_eq!(
        grad(s, &[x]).unwrap()[0],
        expected * (1.0 - expected),
        max_relative = 1e-12
    );

    let big = Var::new(800.0_f64);
    let l = log1p_exp(big);
    assert_relative_eq!(l.value(), 800.0, max_relative = 1e-12);
    assert_relative_eq!(grad(l, &[big]).unwrap()[0], 1.0, max_relative = 1e-12);
    assert_relative_eq!(log1p_exp(Var::new(0.0_f64)).value(), 2.0_f64.ln());
}
