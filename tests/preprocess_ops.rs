//! Integration tests for the preprocessing transforms
//!
//! Tests verify:
//! - Each transform's shape inference agrees with its execution
//! - Center crop, channel reordering, and batch insertion are zero-copy
//! - Normalize/rescale numerics and their validation-before-mutation rule
//! - Dtype casting under the round-and-clamp policy
//! - Loading transform parameters from JSON (`serde` feature)

mod common;

use common::{arange, assert_allclose_f64};
use pixr::error::Error;
use pixr::ops::{
    center_crop_output_shape, permute_output_shape, reshape_output_shape, resize_output_shape,
    shortest_edge_size, IMAGENET_MEAN, IMAGENET_STD,
};
use pixr::prelude::*;

/// Run a transform and check it against its own shape inference
fn apply_checked(transform: &dyn Transform, input: &Tensor) -> Tensor {
    let predicted = transform.output_shape(input.shape()).unwrap();
    let out = transform.apply(input).unwrap();
    assert_eq!(out.shape(), predicted.as_slice(), "{}", transform.name());
    out
}

// ============================================================================
// Shape Inference
// ============================================================================

#[test]
fn test_pipeline_shape_inference_without_data() {
    let steps: Vec<Box<dyn Transform>> = vec![
        Box::new(ToChannelsFirst),
        Box::new(ShortestEdge::new(256).unwrap()),
        Box::new(CenterCrop::square(224).unwrap()),
        Box::new(Rescale::default()),
        Box::new(Normalize::default()),
        Box::new(AddBatchDim),
    ];

    let mut shape = Shape::from([480, 640, 3]);
    for step in &steps {
        shape = step.output_shape(&shape).unwrap();
    }
    assert_eq!(shape, [1, 3, 224, 224]);
}

#[test]
fn test_shape_inference_reports_failures() {
    assert!(matches!(
        CenterCrop::square(300).unwrap().output_shape(&[3, 256, 341]),
        Err(Error::InvalidParameter { name: "height", .. })
    ));
    assert_eq!(
        Normalize::default().output_shape(&[224, 224]).unwrap_err(),
        Error::bad_rank(&[224, 224])
    );
    assert!(matches!(
        Normalize::default().output_shape(&[4, 8, 8]),
        Err(Error::InvalidParameter { name: "mean", .. })
    ));
}

#[test]
fn test_free_shape_functions() {
    assert_eq!(resize_output_shape(&[3, 10, 10], 4, 6).unwrap(), [3, 4, 6]);
    assert_eq!(shortest_edge_size(300, 200, 100, None).unwrap(), (150, 100));
    assert_eq!(center_crop_output_shape(&[1, 3, 9, 9], 4, 5).unwrap(), [1, 3, 4, 5]);
    assert_eq!(permute_output_shape(&[2, 3, 4], &[2, 0, 1]).unwrap(), [4, 2, 3]);
    assert!(matches!(
        permute_output_shape(&[2, 3, 4], &[0, 0, 1]),
        Err(Error::InvalidArgument { .. })
    ));
    assert_eq!(reshape_output_shape(&[2, 3, 4], &[4, -1]).unwrap(), [4, 6]);
    assert!(matches!(
        reshape_output_shape(&[2, 3, 4], &[-1, -1]),
        Err(Error::InvalidParameter { name: "shape", .. })
    ));
}

// ============================================================================
// Center Crop
// ============================================================================

#[test]
fn test_center_crop_window() {
    let t = arange::<u8>(&[2, 5, 6]);
    let crop = apply_checked(&CenterCrop::new(3, 2).unwrap(), &t);

    assert!(crop.shares_storage(&t));
    // top = (5 - 3) / 2 = 1, left = (6 - 2) / 2 = 2
    assert_eq!(
        crop.to_vec::<u8>().unwrap(),
        vec![8, 9, 14, 15, 20, 21, 38, 39, 44, 45, 50, 51]
    );
}

#[test]
fn test_center_crop_rejects_oversize_and_zero() {
    let t = arange::<u8>(&[1, 4, 4]);
    assert!(matches!(
        t.center_crop(&CenterCrop { height: 2, width: 5 }),
        Err(Error::InvalidParameter { name: "width", .. })
    ));
    assert!(matches!(
        CenterCrop::new(0, 2),
        Err(Error::InvalidParameter { name: "height", .. })
    ));
}

// ============================================================================
// Normalize / Rescale
// ============================================================================

#[test]
fn test_normalize_per_channel() {
    let t = Tensor::from_slice(&[0.5f32, 0.5, 0.25, 0.25, 1.0, 0.0], &[3, 1, 2]).unwrap();
    let out = apply_checked(&Normalize::default(), &t);

    let mut expected = Vec::new();
    for (c, pair) in [[0.5, 0.5], [0.25, 0.25], [1.0, 0.0]].iter().enumerate() {
        for v in pair {
            expected.push((v - IMAGENET_MEAN[c]) / IMAGENET_STD[c]);
        }
    }
    assert_allclose_f64(&out.to_f64_vec(), &expected, 1e-6, 1e-6, "imagenet normalize");
    assert_eq!(t.to_vec::<f32>().unwrap(), vec![0.5, 0.5, 0.25, 0.25, 1.0, 0.0]);
}

#[test]
fn test_normalize_batched_strided_view() {
    // NHWC storage viewed as NCHW
    let data: Vec<f64> = (0..2 * 2 * 2 * 3).map(|v| v as f64).collect();
    let nhwc = Tensor::from_vec(data, &[2, 2, 2, 3]).unwrap();
    let nchw = ToChannelsFirst.apply(&nhwc).unwrap();
    assert!(!nchw.is_contiguous());

    let normalize = Normalize::new([1.0, 2.0, 3.0], [2.0, 4.0, 8.0]).unwrap();
    let out = nchw.normalize(&normalize).unwrap();
    for n in 0..2 {
        for c in 0..3 {
            for h in 0..2 {
                for w in 0..2 {
                    let x = nhwc.get(&[n, h, w, c]).unwrap();
                    let got = out.get(&[n, c, h, w]).unwrap();
                    assert_eq!(got, (x - normalize.mean[c]) / normalize.std[c]);
                }
            }
        }
    }
}

#[test]
fn test_normalize_in_place_copy_on_write() {
    let original = Tensor::from_slice(&[2.0f64, 4.0], &[1, 1, 2]).unwrap();
    let mut view = original.clone();
    view.normalize_(&Normalize::new([2.0], [2.0]).unwrap()).unwrap();

    assert_eq!(view.to_vec::<f64>().unwrap(), vec![0.0, 1.0]);
    assert_eq!(original.to_vec::<f64>().unwrap(), vec![2.0, 4.0]);
    assert!(!view.shares_storage(&original));
}

#[test]
fn test_normalize_validation_precedes_mutation() {
    let mut t = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[2, 1, 2]).unwrap();
    let bad = Normalize {
        mean: vec![0.0, 0.0],
        std: vec![1.0, 0.0],
    };
    assert!(matches!(
        t.normalize_(&bad),
        Err(Error::InvalidParameter { name: "std", .. })
    ));
    assert_eq!(t.to_vec::<f32>().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);

    let wrong_len = Normalize::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]).unwrap();
    assert!(t.normalize_(&wrong_len).is_err());
    assert_eq!(t.to_vec::<f32>().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_normalize_rejects_integers() {
    let t = Tensor::zeros(&[3, 2, 2], DType::U8).unwrap();
    assert_eq!(
        t.normalize(&Normalize::default()).unwrap_err(),
        Error::UnsupportedDType {
            dtype: DType::U8,
            op: "normalize"
        }
    );
}

#[test]
fn test_rescale() {
    let t = Tensor::from_slice(&[1.0f64, -2.0, 0.5], &[1, 1, 3]).unwrap();
    let out = apply_checked(&Rescale::new(4.0).unwrap(), &t);
    assert_eq!(out.dtype(), DType::F64);
    assert_eq!(out.to_vec::<f64>().unwrap(), vec![4.0, -8.0, 2.0]);

    let mut in_place = t.clone();
    in_place.rescale_(0.5).unwrap();
    assert_eq!(in_place.to_vec::<f64>().unwrap(), vec![0.5, -1.0, 0.25]);
    assert_eq!(t.to_vec::<f64>().unwrap(), vec![1.0, -2.0, 0.5]);

    let mut ints = Tensor::from_slice(&[1u8], &[1]).unwrap();
    assert!(matches!(
        ints.rescale_(2.0),
        Err(Error::UnsupportedDType { .. })
    ));
    assert!(matches!(
        Rescale::new(f64::NAN),
        Err(Error::InvalidParameter { name: "factor", .. })
    ));
}

// ============================================================================
// Cast / Reformat
// ============================================================================

#[test]
fn test_cast_policy() {
    let t = Tensor::from_slice(&[-1.5f64, 0.49, 127.5, 1e9], &[4]).unwrap();
    let out = apply_checked(&Cast { dtype: DType::I8 }, &t);
    assert_eq!(out.to_vec::<i8>().unwrap(), vec![-2, 0, 127, 127]);

    let same = Cast { dtype: DType::F64 }.apply(&t).unwrap();
    assert!(same.shares_storage(&t));
}

#[test]
fn test_channel_reformat_rank4() {
    let nhwc = arange::<f32>(&[2, 4, 5, 3]);
    let nchw = apply_checked(&ToChannelsFirst, &nhwc);
    assert_eq!(nchw.shape(), &[2, 3, 4, 5]);
    assert!(nchw.shares_storage(&nhwc));
    assert_eq!(nchw.get(&[1, 2, 3, 4]).unwrap(), nhwc.get(&[1, 3, 4, 2]).unwrap());

    let back = apply_checked(&ToChannelsLast, &nchw);
    assert_eq!(back.strides(), nhwc.strides());
    assert!(back.is_contiguous());

    assert_eq!(
        ToChannelsFirst.apply(&arange::<f32>(&[4, 4])).unwrap_err(),
        Error::bad_rank(&[4, 4])
    );
}

#[test]
fn test_add_batch_dim_and_reshape() {
    let t = arange::<f32>(&[3, 2, 2]);
    let batched = apply_checked(&AddBatchDim, &t);
    assert_eq!(batched.shape(), &[1, 3, 2, 2]);
    assert!(batched.is_contiguous());

    let flat = apply_checked(&Reshape { shape: vec![1, -1] }, &batched);
    assert_eq!(flat.shape(), &[1, 12]);
    assert!(flat.shares_storage(&t));
}

// ============================================================================
// End-to-End
// ============================================================================

#[test]
fn test_full_pipeline() {
    let pixels: Vec<u8> = (0..12 * 16 * 3).map(|v| (v % 256) as u8).collect();
    let image = Tensor::from_vec(pixels, &[12, 16, 3]).unwrap();

    let steps: Vec<Box<dyn Transform>> = vec![
        Box::new(ToChannelsFirst),
        Box::new(Reshape { shape: vec![3, 12, 16] }),
    ];
    // the permuted view cannot be reshaped without a copy
    let chw = steps[0].apply(&image).unwrap();
    assert_eq!(steps[1].apply(&chw).unwrap_err(), Error::NotContiguous);

    let chw = chw.contiguous();
    let resized = apply_checked(&ShortestEdge::new(8).unwrap(), &chw);
    assert_eq!(resized.shape(), &[3, 8, 11]);
    let cropped = apply_checked(&CenterCrop::square(8).unwrap(), &resized);
    let scaled = apply_checked(&Rescale::default(), &cropped);
    assert_eq!(scaled.dtype(), DType::F32);
    assert!(scaled.to_f64_vec().iter().all(|&v| (0.0..=1.0).contains(&v)));

    let input = apply_checked(&AddBatchDim, &apply_checked(&Normalize::default(), &scaled));
    assert_eq!(input.shape(), &[1, 3, 8, 8]);
    assert_eq!(input.to_le_bytes().unwrap().len(), 3 * 8 * 8 * 4);
}

// ============================================================================
// Serde
// ============================================================================

#[cfg(feature = "serde")]
#[test]
fn test_transform_params_from_json() {
    let resize: ResizeOptions =
        serde_json::from_str(r#"{"height": 32, "width": 48, "mode": "bicubic"}"#).unwrap();
    assert_eq!(resize.height, 32);
    assert_eq!(resize.mode, InterpolationMode::Bicubic);
    assert!(!resize.align_corners);

    let edge: ShortestEdge = serde_json::from_str(r#"{"size": 256, "max_size": 512}"#).unwrap();
    assert_eq!(edge.max_size, Some(512));

    let normalize: Normalize = serde_json::from_str(r#"{"mean": [0.5], "std": [0.5]}"#).unwrap();
    assert!(normalize.validate().is_ok());

    let cast: Cast = serde_json::from_str(r#"{"dtype": "u8"}"#).unwrap();
    assert_eq!(cast.dtype, DType::U8);

    let json = serde_json::to_string(&CenterCrop::square(224).unwrap()).unwrap();
    assert_eq!(json, r#"{"height":224,"width":224}"#);
}
