//! Integration tests for typed storage
//!
//! Tests verify:
//! - Zero-filled allocation and buffer wrapping for every dtype
//! - Round-and-clamp narrowing on integer writes
//! - Copy-on-write when storage is shared between views
//! - Exact 64-bit integer access and the little-endian byte boundary

use pixr::dtype::DType;
use pixr::error::Error;
use pixr::tensor::{Buffer, Storage, Tensor};

// ============================================================================
// Allocation / Wrapping
// ============================================================================

#[test]
fn test_zeros_every_dtype() {
    for dtype in DType::ALL {
        let storage = Storage::zeros(dtype, 5);
        assert_eq!(storage.dtype(), dtype);
        assert_eq!(storage.len(), 5);
        assert_eq!(storage.size_in_bytes(), 5 * dtype.size_in_bytes());
        for i in 0..5 {
            assert_eq!(storage.get(i).unwrap(), 0.0, "{dtype}");
        }
    }
}

#[test]
fn test_wrap_type_checked() {
    let storage = Storage::wrap(Buffer::I16(vec![1, -2, 3]), DType::I16).unwrap();
    assert_eq!(storage.get(1).unwrap(), -2.0);

    let err = Storage::wrap(Buffer::I16(vec![1, -2, 3]), DType::U16).unwrap_err();
    assert_eq!(
        err,
        Error::TypeMismatch {
            expected: DType::U16,
            got: DType::I16
        }
    );
}

#[test]
fn test_get_out_of_range() {
    let storage = Storage::from_slice(&[1.0f32, 2.0]);
    assert_eq!(
        storage.get(2).unwrap_err(),
        Error::IndexOutOfRange { index: 2, size: 2 }
    );
}

// ============================================================================
// Narrowing Policy
// ============================================================================

#[test]
fn test_u8_clamps_instead_of_failing() {
    let mut storage = Storage::zeros(DType::U8, 4);
    storage.set(0, 300.0).unwrap();
    storage.set(1, -12.0).unwrap();
    storage.set(2, 41.5).unwrap();
    storage.set(3, 41.4).unwrap();
    assert_eq!(storage.as_slice::<u8>().unwrap(), &[255, 0, 42, 41]);
}

#[test]
fn test_signed_clamps() {
    let mut storage = Storage::zeros(DType::I8, 3);
    storage.set(0, 1000.0).unwrap();
    storage.set(1, -1000.0).unwrap();
    storage.set(2, -2.5).unwrap();
    assert_eq!(storage.as_slice::<i8>().unwrap(), &[127, -128, -3]);
}

#[test]
fn test_float_stores_as_is() {
    let mut storage = Storage::zeros(DType::F64, 1);
    storage.set(0, 0.1).unwrap();
    assert_eq!(storage.get(0).unwrap(), 0.1);

    let mut storage = Storage::zeros(DType::F32, 1);
    storage.set(0, 0.1).unwrap();
    assert_eq!(storage.get(0).unwrap(), 0.1f32 as f64);
}

// ============================================================================
// Sharing / Copy-on-Write
// ============================================================================

#[test]
fn test_clone_is_shallow_deep_clone_is_not() {
    let storage = Storage::from_slice(&[1u32, 2, 3]);
    let shallow = storage.clone();
    assert!(shallow.ptr_eq(&storage));
    assert_eq!(storage.ref_count(), 2);

    let deep = storage.deep_clone();
    assert!(!deep.ptr_eq(&storage));
    assert!(deep.is_unique());
    assert_eq!(deep.as_slice::<u32>().unwrap(), &[1, 2, 3]);
}

#[test]
fn test_write_detaches_shared_storage() {
    let original = Storage::from_slice(&[1u32, 2, 3]);
    let mut copy = original.clone();
    copy.set(0, 9.0).unwrap();

    assert_eq!(original.get(0).unwrap(), 1.0);
    assert_eq!(copy.get(0).unwrap(), 9.0);
    assert!(!copy.ptr_eq(&original));
    assert!(original.is_unique());
}

#[test]
fn test_failed_write_leaves_sharing_intact() {
    let original = Storage::from_slice(&[1u32, 2, 3]);
    let mut copy = original.clone();
    assert!(copy.set(3, 9.0).is_err());
    assert!(copy.ptr_eq(&original));
}

// ============================================================================
// 64-bit Precision / Bytes
// ============================================================================

#[test]
fn test_exact_i64_beyond_f64_mantissa() {
    let big = (1i64 << 53) + 1;
    let mut storage = Storage::zeros(DType::I64, 1);
    storage.set_exact(0, big).unwrap();
    assert_eq!(storage.get_exact::<i64>(0).unwrap(), big);
    assert_ne!(storage.get(0).unwrap() as i64, big);

    assert!(matches!(
        storage.set_exact(0, 1u64),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn test_le_bytes_round_trip() {
    let storage = Storage::from_slice(&[1.5f32, -2.0]);
    let bytes = storage.to_le_bytes();
    assert_eq!(bytes.len(), storage.size_in_bytes());

    let back = Storage::from_le_bytes(&bytes, DType::F32).unwrap();
    assert_eq!(back.as_slice::<f32>().unwrap(), &[1.5, -2.0]);

    assert!(matches!(
        Storage::from_le_bytes(&bytes[..7], DType::F32),
        Err(Error::InvalidArgument { .. })
    ));
}

#[test]
fn test_type_codes_survive_transport() {
    let t = Tensor::from_slice(&[7u64, 8, 9, 10, 11, 12], &[2, 3]).unwrap();
    let code = t.dtype().type_code();
    assert_eq!(code, 13);

    let back = Tensor::from_le_bytes(&t.to_le_bytes().unwrap(), code, t.shape()).unwrap();
    assert_eq!(back.dtype(), DType::U64);
    assert_eq!(back.shape(), &[2, 3]);
    assert_eq!(back.to_vec::<u64>().unwrap(), vec![7, 8, 9, 10, 11, 12]);

    assert!(Tensor::from_le_bytes(&[], 99, &[1]).is_err());
}
