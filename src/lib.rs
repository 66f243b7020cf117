pub mod api;
pub mod arena;
pub mod check;
pub mod config;
pub mod context;
pub mod custom;
pub mod error;
pub mod float;
pub mod grad;
pub mod matrix;
pub mod nested;
pub mod node;
pub mod scalar;
pub mod special;
pub mod tape;
mod traits;
pub mod var;
pub mod vector;

#[cfg(feature = "parallel")]
pub use api::gradient_par;
pub use api::{gradient, jacobian, try_gradient, vjp};
pub use config::ContextConfig;
pub use context::{
    configure, free_memory, memory_usage, recover_memory, tape_len, with_context, Context,
    ContextGuard, ContextThreadLocal, MemoryUsage,
};
pub use custom::{custom_op, precomputed_gradients};
pub use error::{AdError, Result};
pub use float::Float;
pub use grad::{
    backward, grad, grad_seeded, jacobian_of, set_zero_all_adjoints,
    set_zero_all_adjoints_nested,
};
pub use matrix::{columns_dot_product, multiply, multiply_vec, rows_dot_product, Matrix};
pub use nested::{nested, nested_depth, recover_memory_nested, start_nested, NestedScope};
pub use node::{CustomPartials, Node, NodeKind};
pub use scalar::Scalar;
pub use special::{inv_logit, log1p_exp, log_mix};
pub use var::Var;
pub use vector::{
    distance, dot_product, dot_product_vd, dot_self, log_sum_exp, mean, sd, squared_distance,
    squared_distance_vd, sum, variance,
};

/// Type alias for reverse-mode variables over `f64`.
pub type Var64 = Var<f64>;
/// Type alias for reverse-mode variables over `f32`.
pub type Var32 = Var<f32>;
