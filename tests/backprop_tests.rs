use softreg::backprop::{bias_add, cross_entropy_loss, matmul, sgd, softmax};
use softreg::tensor;
use softreg::tensors::{Tensor, WithGrad};

#[test]
fn test_tensor_shape_mismatch_panics() {
    let result = std::panic::catch_unwind(|| {
        Tensor::new(vec![2, 2], vec![1.0, 2.0, 3.0]);
    });
    assert!(result.is_err());
}

#[test]
fn test_tensor_macro() {
    let t = tensor!([[1.0, 2.0], [3.0, 4.0]]);
    assert_eq!(t.shape, vec![2, 2]);
    assert_eq!(t.data, vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_matmul_forward_and_backprop() {
    let a = WithGrad::new(tensor!([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]));
    let b = WithGrad::new(tensor!([[7.0, 8.0], [9.0, 10.0], [11.0, 12.0]]));

    let (out, back) = matmul(&a, &b);
    assert_eq!(out.shape, vec![2, 2]);
    assert_eq!(out.data, vec![58.0, 64.0, 139.0, 154.0]);

    let grad_output = tensor!([[1.0, 1.0], [1.0, 1.0]]);
    let (grad_a, grad_b) = back(&grad_output);
    assert_eq!(grad_a.shape, vec![2, 3]);
    assert_eq!(grad_b.shape, vec![3, 2]);
    // dA = grad · Bᵀ, first entry = 7 + 8.
    assert_eq!(grad_a.data[0], 15.0);
    // dB = Aᵀ · grad, first entry = 1 + 4.
    assert_eq!(grad_b.data[0], 5.0);
}

#[test]
fn test_bias_add_broadcast_and_column_sum() {
    let x = WithGrad::new(tensor!([[1.0, 2.0], [3.0, 4.0]]));
    let b = WithGrad::new(tensor!([10.0, 20.0]));

    let (out, back) = bias_add(&x, &b);
    assert_eq!(out.data, vec![11.0, 22.0, 13.0, 24.0]);

    let grad_output = tensor!([[1.0, 2.0], [3.0, 4.0]]);
    let (grad_x, grad_b) = back(&grad_output);
    assert_eq!(grad_x.data, grad_output.data);
    assert_eq!(grad_b.data, vec![4.0, 6.0]);
}

#[test]
fn test_softmax_rows_are_distributions() {
    let input = WithGrad::new(tensor!([[0.0, 0.0, 0.0], [1.0, 2.0, 3.0], [-5.0, 0.0, 5.0]]));
    let (out, _back) = softmax(&input);

    for row in out.data.chunks_exact(3) {
        assert!(row.iter().all(|&p| p >= 0.0));
        let sum: f64 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "row sums to {sum}");
    }
    // Uniform logits give a uniform distribution.
    assert!((out.data[0] - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_softmax_survives_large_logits() {
    let input = WithGrad::new(tensor!([[1000.0, 1001.0, 999.0]]));
    let (out, _back) = softmax(&input);

    assert!(out.data.iter().all(|p| p.is_finite()));
    let sum: f64 = out.data.iter().sum();
    assert!((sum - 1.0).abs() < 1e-6);
}

#[test]
fn test_softmax_backward_jacobian() {
    let input = WithGrad::new(tensor!([[1.0, 2.0, 3.0]]));
    let (out, back) = softmax(&input);

    // Upstream gradient picking out the first class only.
    let grad = back(&tensor!([[1.0, 0.0, 0.0]]));
    let y0 = out.data[0];
    assert!((grad.data[0] - y0 * (1.0 - y0)).abs() < 1e-12);
    assert!((grad.data[1] - (-out.data[1] * y0)).abs() < 1e-12);
    // Softmax gradients sum to zero across a row.
    let total: f64 = grad.data.iter().sum();
    assert!(total.abs() < 1e-12);
}

#[test]
fn test_cross_entropy_loss_non_negative() {
    let logits = WithGrad::new(tensor!([[0.3, -1.2, 0.9], [2.0, 0.0, -2.0]]));
    let target = tensor!([[0.0, 1.0, 0.0], [1.0, 0.0, 0.0]]);
    let (loss, _back) = cross_entropy_loss(&logits, &target);
    assert!(loss > 0.0);
}

#[test]
fn test_cross_entropy_loss_uniform_prediction() {
    // Zero logits over 10 classes: loss must be exactly ln(10) per sample.
    let logits = WithGrad::new(Tensor::new(vec![2, 10], vec![0.0; 20]));
    let mut target_data = vec![0.0; 20];
    target_data[3] = 1.0;
    target_data[17] = 1.0;
    let target = Tensor::new(vec![2, 10], target_data);

    let (loss, _back) = cross_entropy_loss(&logits, &target);
    assert!((loss - 10.0f64.ln()).abs() < 1e-12);
}

#[test]
fn test_cross_entropy_loss_vanishes_when_confident() {
    // Logit gap of 50 puts essentially all mass on the true class.
    let logits = WithGrad::new(tensor!([[50.0, 0.0, 0.0]]));
    let target = tensor!([[1.0, 0.0, 0.0]]);
    let (loss, _back) = cross_entropy_loss(&logits, &target);
    assert!(loss >= 0.0);
    assert!(loss < 1e-12);
}

#[test]
fn test_cross_entropy_backward_is_softmax_minus_target() {
    let logits = WithGrad::new(tensor!([[0.0, 0.0]]));
    let target = tensor!([[1.0, 0.0]]);
    let (_loss, back) = cross_entropy_loss(&logits, &target);

    let grad = back(1.0);
    assert!((grad.data[0] - (0.5 - 1.0)).abs() < 1e-12);
    assert!((grad.data[1] - 0.5).abs() < 1e-12);
}

#[test]
fn test_sgd_updates_and_resets_gradient() {
    let mut w = WithGrad {
        value: tensor!([1.0, 2.0]),
        grad: tensor!([0.1, 0.2]),
    };
    sgd(&mut w, 0.5);
    assert_eq!(w.value.data, vec![0.95, 1.9]);
    assert_eq!(w.grad.data, vec![0.0, 0.0]);
}
