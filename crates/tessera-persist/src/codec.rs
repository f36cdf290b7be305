//! Binary encode/decode for [`PersistedGroups`].
//!
//! All integers and payload values are little-endian. Complex values are
//! written as `(re, im)` pairs of `f64`. There is no compression and no
//! padding.

use std::io::{Read, Write};

use num_complex::Complex64;
use tessera_core::{DType, HostArray, HostData, Shape};

use crate::error::CodecError;
use crate::persist::PersistedGroups;
use crate::{FORMAT_VERSION, MAGIC};

/// Upper bound on elements preallocated from an untrusted header.
const PREALLOC_LIMIT: usize = 1 << 20;

// ── Primitive writers ───────────────────────────────────────────

fn write_bytes(w: &mut dyn Write, bytes: &[u8]) -> Result<(), CodecError> {
    w.write_all(bytes)?;
    Ok(())
}

fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), CodecError> {
    write_bytes(w, &[v])
}

fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), CodecError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), CodecError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

fn read_array<const N: usize>(r: &mut dyn Read) -> Result<[u8; N], CodecError> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_u8(r: &mut dyn Read) -> Result<u8, CodecError> {
    Ok(read_array::<1>(r)?[0])
}

fn read_u32_le(r: &mut dyn Read) -> Result<u32, CodecError> {
    Ok(u32::from_le_bytes(read_array(r)?))
}

fn read_u64_le(r: &mut dyn Read) -> Result<u64, CodecError> {
    Ok(u64::from_le_bytes(read_array(r)?))
}

fn read_vec<T>(
    r: &mut dyn Read,
    len: usize,
    mut read_one: impl FnMut(&mut dyn Read) -> Result<T, CodecError>,
) -> Result<Vec<T>, CodecError> {
    let mut out = Vec::with_capacity(len.min(PREALLOC_LIMIT));
    for _ in 0..len {
        out.push(read_one(r)?);
    }
    Ok(out)
}

// ── DType tags ──────────────────────────────────────────────────

fn dtype_tag(dtype: DType) -> u8 {
    match dtype {
        DType::F32 => 0,
        DType::F64 => 1,
        DType::I64 => 2,
        DType::C128 => 3,
    }
}

fn dtype_from_tag(tag: u8) -> Result<DType, CodecError> {
    match tag {
        0 => Ok(DType::F32),
        1 => Ok(DType::F64),
        2 => Ok(DType::I64),
        3 => Ok(DType::C128),
        _ => Err(CodecError::UnknownDtype { tag }),
    }
}

// ── Groups ──────────────────────────────────────────────────────

fn write_group(w: &mut dyn Write, group: usize, host: &HostArray) -> Result<(), CodecError> {
    let rank = u32::try_from(host.shape().len()).map_err(|_| CodecError::MalformedGroup {
        group,
        detail: "rank exceeds u32".to_string(),
    })?;
    write_u8(w, dtype_tag(host.dtype()))?;
    write_u32_le(w, rank)?;
    for &dim in host.shape() {
        write_u64_le(w, dim as u64)?;
    }
    match host.data() {
        HostData::F32(v) => v.iter().try_for_each(|x| write_bytes(w, &x.to_le_bytes())),
        HostData::F64(v) => v.iter().try_for_each(|x| write_bytes(w, &x.to_le_bytes())),
        HostData::I64(v) => v.iter().try_for_each(|x| write_bytes(w, &x.to_le_bytes())),
        HostData::C128(v) => v.iter().try_for_each(|z| {
            write_bytes(w, &z.re.to_le_bytes())?;
            write_bytes(w, &z.im.to_le_bytes())
        }),
    }
}

fn read_group(r: &mut dyn Read, group: usize) -> Result<HostArray, CodecError> {
    let malformed = |detail: String| CodecError::MalformedGroup { group, detail };

    let dtype = dtype_from_tag(read_u8(r)?)?;
    let rank = read_u32_le(r)? as usize;
    let shape: Shape = read_vec(r, rank, |r| {
        let dim = read_u64_le(r)?;
        usize::try_from(dim).map_err(|_| malformed(format!("dimension {dim} exceeds usize")))
    })?
    .into_iter()
    .collect();
    let len = shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| malformed(format!("shape {:?} overflows usize", shape.as_slice())))?;

    let data = match dtype {
        DType::F32 => HostData::F32(read_vec(r, len, |r| Ok(f32::from_le_bytes(read_array(r)?)))?),
        DType::F64 => HostData::F64(read_vec(r, len, |r| Ok(f64::from_le_bytes(read_array(r)?)))?),
        DType::I64 => HostData::I64(read_vec(r, len, |r| Ok(i64::from_le_bytes(read_array(r)?)))?),
        DType::C128 => HostData::C128(read_vec(r, len, |r| {
            let re = f64::from_le_bytes(read_array(r)?);
            let im = f64::from_le_bytes(read_array(r)?);
            Ok(Complex64::new(re, im))
        })?),
    };
    HostArray::new(shape, data).map_err(|e| malformed(e.to_string()))
}

// ── Public API ──────────────────────────────────────────────────

/// Write `persisted` to `w`.
#[tracing::instrument(level = "debug", skip_all, fields(groups = persisted.len()))]
pub fn encode(w: &mut dyn Write, persisted: &PersistedGroups) -> Result<(), CodecError> {
    let ngroups = u32::try_from(persisted.len()).map_err(|_| CodecError::MalformedGroup {
        group: persisted.len(),
        detail: "group count exceeds u32".to_string(),
    })?;
    write_bytes(w, &MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;
    write_u32_le(w, ngroups)?;
    for (group, host) in persisted.groups().iter().enumerate() {
        write_group(w, group, host)?;
    }
    Ok(())
}

/// Read a value written by [`encode`].
#[tracing::instrument(level = "debug", skip_all, err)]
pub fn decode(r: &mut dyn Read) -> Result<PersistedGroups, CodecError> {
    if read_array::<4>(r)? != MAGIC {
        return Err(CodecError::InvalidMagic);
    }
    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion { found: version });
    }
    let ngroups = read_u32_le(r)? as usize;
    let mut groups = Vec::with_capacity(ngroups.min(PREALLOC_LIMIT));
    for group in 0..ngroups {
        groups.push(read_group(r, group)?);
    }
    Ok(PersistedGroups::new(groups))
}

/// Encode into a fresh byte vector.
pub fn to_bytes(persisted: &PersistedGroups) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    encode(&mut out, persisted)?;
    Ok(out)
}

/// Decode from a byte slice.
pub fn from_bytes(mut bytes: &[u8]) -> Result<PersistedGroups, CodecError> {
    decode(&mut bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PersistedGroups {
        PersistedGroups::new(vec![
            HostArray::new(Shape::from_slice(&[2, 2]), HostData::F64(vec![1.0, -2.5, 3.0, 0.0]))
                .unwrap(),
            HostArray::new(Shape::from_slice(&[1, 3]), HostData::I64(vec![7, -8, 9])).unwrap(),
            HostArray::new(
                Shape::from_slice(&[1, 1]),
                HostData::C128(vec![Complex64::new(0.5, -1.5)]),
            )
            .unwrap(),
        ])
    }

    #[test]
    fn header_layout() {
        let bytes = to_bytes(&PersistedGroups::new(vec![])).unwrap();
        assert_eq!(&bytes[..4], b"TSRA");
        assert_eq!(bytes[4], FORMAT_VERSION);
        assert_eq!(&bytes[5..9], &0u32.to_le_bytes());
        assert_eq!(bytes.len(), 9);
    }

    #[test]
    fn group_layout() {
        let one = PersistedGroups::new(vec![HostArray::new(
            Shape::from_slice(&[1, 2]),
            HostData::F32(vec![1.0, 2.0]),
        )
        .unwrap()]);
        let bytes = to_bytes(&one).unwrap();
        let group = &bytes[9..];
        assert_eq!(group[0], 0);
        assert_eq!(&group[1..5], &2u32.to_le_bytes());
        assert_eq!(&group[5..13], &1u64.to_le_bytes());
        assert_eq!(&group[13..21], &2u64.to_le_bytes());
        assert_eq!(&group[21..25], &1.0f32.to_le_bytes());
        assert_eq!(group.len(), 29);
    }

    #[test]
    fn mixed_dtypes_round_trip() {
        let value = sample();
        let back = from_bytes(&to_bytes(&value).unwrap()).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn bad_magic() {
        let mut bytes = to_bytes(&sample()).unwrap();
        bytes[0] = b'X';
        assert!(matches!(from_bytes(&bytes), Err(CodecError::InvalidMagic)));
    }

    #[test]
    fn bad_version() {
        let mut bytes = to_bytes(&sample()).unwrap();
        bytes[4] = 99;
        assert!(matches!(
            from_bytes(&bytes),
            Err(CodecError::UnsupportedVersion { found: 99 })
        ));
    }

    #[test]
    fn unknown_dtype() {
        let mut bytes = to_bytes(&sample()).unwrap();
        bytes[9] = 42;
        assert!(matches!(
            from_bytes(&bytes),
            Err(CodecError::UnknownDtype { tag: 42 })
        ));
    }

    #[test]
    fn truncated_input() {
        let bytes = to_bytes(&sample()).unwrap();
        let err = from_bytes(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, CodecError::Io(_)));
    }

    #[test]
    fn huge_header_does_not_preallocate() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC);
        bytes.push(FORMAT_VERSION);
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(from_bytes(&bytes), Err(CodecError::Io(_))));
    }
}
