use std::error::Error;

use crate::base::f32_abs_diff_eq;

/// Compares float slices with an absolute tolerance.
pub fn f32_slice_diff_eq(a: &[f32], b: &[f32], diff: f32) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| f32_abs_diff_eq(*x, *y, diff))
}

/// Archives `data` in memory and reads it back.
#[cfg(feature = "rkyv")]
pub fn rkyv_round_trip<T>(data: &T) -> Result<T, Box<dyn Error>>
where
    T: rkyv::Serialize<rkyv::ser::serializers::AllocSerializer<4096>>,
    T::Archived: rkyv::Deserialize<T, rkyv::Infallible>,
{
    use rkyv::ser::Serializer;
    use rkyv::Deserialize;

    let mut serializer = rkyv::ser::serializers::AllocSerializer::<4096>::default();
    serializer.serialize_value(data)?;
    let buf = serializer.into_serializer().into_inner();

    let archived = unsafe { rkyv::archived_root::<T>(&buf) };
    let mut deserializer = rkyv::Infallible;
    let restored = archived.deserialize(&mut deserializer)?;
    Ok(restored)
}

/// Compares `data` with its archived copy.
#[cfg(feature = "rkyv")]
pub fn compare_with_rkyv<T>(data: &T) -> Result<(), Box<dyn Error>>
where
    T: PartialEq + rkyv::Serialize<rkyv::ser::serializers::AllocSerializer<4096>>,
    T::Archived: rkyv::Deserialize<T, rkyv::Infallible>,
{
    let restored = rkyv_round_trip(data)?;
    if data != &restored {
        return Err("compare_with_rkyv() mismatch".into());
    }
    Ok(())
}

#[cfg(not(feature = "rkyv"))]
pub fn compare_with_rkyv<T>(_data: &T) -> Result<(), Box<dyn Error>> {
    Ok(())
}
