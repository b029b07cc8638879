use approx::assert_relative_eq;
use avocado_forecast::error::ForecastError;
use avocado_forecast::models::{Kernel, ModelAdapter, ModelSpec, Persistence, SupportVectorRegressor};
use rstest::rstest;

fn build(json: &str) -> ModelAdapter {
    let spec: ModelSpec = serde_json::from_str(json).unwrap();
    ModelAdapter::new(spec.build().unwrap())
}

#[test]
fn test_linear_model_from_json() {
    let adapter = build(r#"{"kind": "linear", "coefficients": [1.0, -2.0, 0.5], "intercept": 3.0}"#);

    assert!(adapter.is_loaded());
    assert_relative_eq!(adapter.predict(&[1.0, 1.0, 2.0]).unwrap(), 3.0);
    assert_eq!(adapter.model().unwrap().n_features(), 3);
}

#[test]
fn test_svr_model_from_json() {
    let adapter = build(
        r#"{
            "kind": "svr",
            "kernel": {"type": "rbf", "gamma": 1.0},
            "support_vectors": [[0.0], [1.0]],
            "dual_coef": [0.5, 0.5],
            "intercept": 0.0,
            "c": 100.0,
            "epsilon": 0.1
        }"#,
    );

    // symmetric support vectors around x = 0.5
    let expected = (-0.25f64).exp();
    assert_relative_eq!(adapter.predict(&[0.5]).unwrap(), expected, epsilon = 1e-12);

    let params = adapter.model().unwrap().parameters();
    assert_eq!(params.get("kernel").map(String::as_str), Some("rbf"));
    assert_eq!(params.get("epsilon").map(String::as_str), Some("0.1"));
}

#[rstest]
#[case(Kernel::Linear, 2.0 * 3.0 + 1.0)]
#[case(Kernel::Poly { degree: 2, gamma: 1.0, coef0: 1.0 }, 2.0 * 16.0 + 1.0)]
#[case(Kernel::Sigmoid { gamma: 0.5, coef0: 0.0 }, 2.0 * 1.5f64.tanh() + 1.0)]
fn test_svr_kernels(#[case] kernel: Kernel, #[case] expected: f64) {
    let model = SupportVectorRegressor {
        kernel,
        support_vectors: vec![vec![1.0, 1.0]],
        dual_coef: vec![2.0],
        intercept: 1.0,
        c: None,
        epsilon: None,
    };
    let adapter = ModelAdapter::new(ModelSpec::Svr(model).build().unwrap());

    // dot([1, 1], [1, 2]) = 3
    assert_relative_eq!(adapter.predict(&[1.0, 2.0]).unwrap(), expected, epsilon = 1e-12);
}

#[test]
fn test_persistence_model() {
    let adapter = ModelAdapter::new(ModelSpec::Persistence(Persistence::new(2)).build().unwrap());
    assert_eq!(adapter.predict(&[0.1, 0.2, 0.3]).unwrap(), 0.3);
    assert!(matches!(
        adapter.predict(&[0.1]),
        Err(ForecastError::Inference(_))
    ));
}

#[test]
fn test_prediction_is_deterministic() {
    let adapter = build(r#"{"kind": "linear", "coefficients": [0.3, 0.7]}"#);
    let first = adapter.predict(&[1.5, 2.5]).unwrap();
    for _ in 0..10 {
        assert_eq!(adapter.predict(&[1.5, 2.5]).unwrap(), first);
    }
}

#[test]
fn test_shape_mismatch_and_non_finite_outputs() {
    let adapter = build(r#"{"kind": "linear", "coefficients": [1.0, 1.0]}"#);
    assert!(matches!(
        adapter.predict(&[1.0, 2.0, 3.0]),
        Err(ForecastError::Inference(_))
    ));
    assert!(matches!(
        adapter.predict(&[f64::INFINITY, 1.0]),
        Err(ForecastError::Inference(_))
    ));
}

#[test]
fn test_invalid_specs_are_rejected() {
    let empty: ModelSpec = serde_json::from_str(r#"{"kind": "linear", "coefficients": []}"#).unwrap();
    assert!(matches!(
        empty.build(),
        Err(ForecastError::InvalidParameter(_))
    ));

    let unknown = serde_json::from_str::<ModelSpec>(r#"{"kind": "random_forest"}"#);
    assert!(unknown.is_err());
}

#[test]
fn test_unloaded_adapter() {
    assert!(matches!(
        ModelAdapter::default().predict(&[1.0]),
        Err(ForecastError::ModelNotLoaded)
    ));
}
