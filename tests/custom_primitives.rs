use approx::assert_relative_eq;
use num_traits::Float;
use wombat::{
    custom_op, grad, jacobian, nested, precomputed_gradients, tape_len, AdError, CustomPartials,
    NodeKind, Var,
};

/// Smooth max: f(a, b) = ln(e^a + e^b), partials from the operand values.
struct SmoothMax;

impl CustomPartials<f64> for SmoothMax {
    fn partials(&self, operands: &[f64], result: f64, out: &mut [f64]) {
        for (o, &x) in out.iter_mut().zip(operands) {
            *o = (x - result).exp();
        }
    }
}

fn smooth_max(a: Var<f64>, b: Var<f64>) -> Var<f64> {
    let (x, y) = (a.value(), b.value());
    let m = x.max(y);
    let value = m + ((x - m).exp() + (y - m).exp()).ln();
    custom_op(value, &[a, b], SmoothMax)
}

#[test]
fn precomputed_splice() {
    let x = Var::new(3.0_f64);
    let y = Var::new(4.0);
    let z = precomputed_gradients(12.0, &[x, y], &[4.0, 3.0]).unwrap();
    assert_eq!(z.value(), 12.0);
    let w = z * z;
    assert_eq!(grad(w, &[x, y]).unwrap(), vec![96.0, 72.0]);
}

#[test]
fn precomputed_size_mismatch() {
    let x = Var::new(1.0_f64);
    let before = tape_len::<f64>();
    let err = precomputed_gradients(1.0, &[x], &[1.0, 2.0]).unwrap_err();
    assert_eq!(
        err,
        AdError::SizeMismatch {
            op: "precomputed_gradients",
            left: 1,
            right: 2
        }
    );
    assert_eq!(tape_len::<f64>(), before);
}

#[test]
fn precomputed_with_no_operands_is_a_constant() {
    let c = precomputed_gradients::<f64>(2.5, &[], &[]).unwrap();
    let x = Var::new(1.0);
    let y = c * x;
    assert_eq!(grad(y, &[x]).unwrap(), vec![2.5]);
}

#[test]
fn custom_op_struct() {
    let a = Var::new(1.0_f64);
    let b = Var::new(2.0);
    let s = smooth_max(a, b);
    let expected = (1.0_f64.exp() + 2.0_f64.exp()).ln();
    assert_relative_eq!(s.value(), expected, max_relative = 1e-12);
    let g = grad(s, &[a, b]).unwrap();
    let z = 1.0_f64.exp() + 2.0_f64.exp();
    assert_relative_eq!(g[0], 1.0_f64.exp() / z, max_relative = 1e-12);
    assert_relative_eq!(g[1], 2.0_f64.exp() / z, max_relative = 1e-12);
}

#[test]
fn custom_op_closure_composes() {
    let x = Var::new(0.5_f64);
    // y = x³ through a callback, then sin(y)
    let y = custom_op(0.125, &[x], |v: &[f64], _: f64, out: &mut [f64]| {
        out[0] = 3.0 * v[0] * v[0];
    });
    let z = y.sin();
    let g = grad(z, &[x]).unwrap()[0];
    assert_relative_eq!(g, 0.125_f64.cos() * 0.75, max_relative = 1e-12);
}

#[test]
fn node_kinds() {
    let x = Var::new(1.0_f64);
    let y = Var::new(2.0);
    let kinds = wombat::with_context(|c: &mut wombat::Context<f64>| {
        let u = c.push_unary(1.0, x, 1.0);
        let b = c.push_binary(3.0, x, 1.0, y, 1.0);
        [x, u, b].map(|v| c.node(v).unwrap().kind())
    });
    assert_eq!(kinds, [NodeKind::Leaf, NodeKind::Unary, NodeKind::Binary]);

    let p = precomputed_gradients(0.0, &[x, y], &[1.0, 1.0]).unwrap();
    let s = smooth_max(x, y);
    let nodes = wombat::with_context(|c: &mut wombat::Context<f64>| {
        (c.node(p).unwrap(), c.node(s).unwrap())
    });
    assert_eq!(nodes.0.kind(), NodeKind::Nary);
    assert_eq!(nodes.0.arity(), 2);
    assert_eq!(nodes.1.kind(), NodeKind::Custom);
    assert_eq!(nodes.1.value(), s.value());
}

/// Explicit Euler for dy/dt = -k y over `steps` steps. Returns y(T).
fn euler<T: wombat::Scalar>(y0: T, k: T, steps: usize, dt: f64) -> T {
    let h = T::from_f(<T::Float as num_traits::FromPrimitive>::from_f64(dt).unwrap());
    let mut y = y0;
    for _ in 0..steps {
        y = y - h * k * y;
    }
    y
}

#[test]
fn nested_solver_spliced_into_outer_graph() {
    let y0 = Var::new(2.0_f64);
    let k = Var::new(0.7);
    let before = tape_len::<f64>();

    // The solver records its own graph in a nested scope, extracts the
    // sensitivities and throws the graph away.
    let (value, sens) = nested::<f64, _>(|| {
        let (a, b) = (Var::new(y0.value()), Var::new(k.value()));
        let out = euler(a, b, 50, 0.02);
        (out.value(), grad(out, &[a, b]).unwrap())
    });
    assert_eq!(tape_len::<f64>(), before);

    let yt = precomputed_gradients(value, &[y0, k], &sens).unwrap();
    let loss = yt * yt;
    let g = grad(loss, &[y0, k]).unwrap();

    // Same thing recorded directly on the outer tape.
    let direct = euler(y0, k, 50, 0.02);
    let loss_direct = direct * direct;
    let g_direct = grad(loss_direct, &[y0, k]).unwrap();
    assert_relative_eq!(g[0], g_direct[0], max_relative = 1e-12);
    assert_relative_eq!(g[1], g_direct[1], max_relative = 1e-12);
}

#[test]
fn jacobian_splice_of_vector_function() {
    let (values, jac) = jacobian(
        |x| vec![x[0] * x[1], x[0].sin(), x[1] / x[0]],
        &[2.0_f64, 3.0],
    )
    .unwrap();

    let a = Var::new(2.0_f64);
    let b = Var::new(3.0);
    let outs: Vec<Var<f64>> = values
        .iter()
        .zip(&jac)
        .map(|(&v, row)| precomputed_gradients(v, &[a, b], row).unwrap())
        .collect();
    let total = outs[0] + outs[1] + outs[2];
    let g = grad(total, &[a, b]).unwrap();
    assert_relative_eq!(g[0], 3.0 + 2.0_f64.cos() - 3.0 / 4.0, max_relative = 1e-12);
    assert_relative_eq!(g[1], 2.0 + 0.5, max_relative = 1e-12);
}
