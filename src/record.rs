//! Typed access to a fetched payload through its computed layout

use std::sync::Arc;

use tracing::trace;

use crate::personality::{LaidKind, RecordLayout, Scalar};

/// Bytes of one record copied out of the tracee, plus the layout used to
/// interpret them. Fields are little-endian.
#[derive(Debug, Clone)]
pub struct Record {
    layout: Arc<RecordLayout>,
    bytes: Vec<u8>,
}

fn load(bytes: &[u8], offset: usize, size: usize) -> u64 {
    let mut buf = [0u8; 8];
    if let Some(src) = bytes.get(offset..offset + size) {
        buf[..size.min(8)].copy_from_slice(&src[..size.min(8)]);
    }
    u64::from_le_bytes(buf)
}

fn sign_extend(raw: u64, size: usize) -> i64 {
    match size {
        1 => raw as u8 as i8 as i64,
        2 => raw as u16 as i16 as i64,
        4 => raw as u32 as i32 as i64,
        _ => raw as i64,
    }
}

impl Record {
    /// Interpret `bytes` under `layout`, zero-filling a short buffer.
    pub fn new(layout: Arc<RecordLayout>, mut bytes: Vec<u8>) -> Self {
        if bytes.len() < layout.size {
            bytes.resize(layout.size, 0);
        }
        Self { layout, bytes }
    }

    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn scalar_at(&self, path: &str) -> Option<(usize, usize, Scalar)> {
        let found = self
            .layout
            .locate(path)
            .and_then(|(offset, field)| match field.kind {
                LaidKind::Scalar(ty) => Some((offset, field.size, ty)),
                _ => None,
            });
        if found.is_none() {
            trace!(path, "no scalar field at path");
        }
        found
    }

    /// Unsigned value of a scalar field; unknown paths read as zero.
    pub fn get(&self, path: &str) -> u64 {
        self.scalar_at(path)
            .map(|(offset, size, _)| load(&self.bytes, offset, size))
            .unwrap_or(0)
    }

    /// Value of a signed field, sign-extended from its width.
    pub fn get_signed(&self, path: &str) -> i64 {
        self.scalar_at(path)
            .map(|(offset, size, _)| sign_extend(load(&self.bytes, offset, size), size))
            .unwrap_or(0)
    }

    /// Value widened according to the field's C signedness, as stored in
    /// symbol tables.
    pub fn get_symbolic(&self, path: &str) -> u64 {
        match self.scalar_at(path) {
            Some((_, _, ty)) if ty.is_signed() => self.get_signed(path) as u64,
            Some(_) => self.get(path),
            None => 0,
        }
    }

    /// Element `index` of an inline scalar array.
    pub fn elem(&self, path: &str, index: usize) -> u64 {
        match self.layout.locate(path) {
            Some((offset, field)) => match field.kind {
                LaidKind::Array { len, stride, .. } if index < len => {
                    load(&self.bytes, offset + index * stride, stride)
                }
                _ => 0,
            },
            None => 0,
        }
    }

    /// Declared length of an inline scalar array.
    pub fn array_len(&self, path: &str) -> usize {
        match self.layout.locate(path).map(|(_, field)| &field.kind) {
            Some(LaidKind::Array { len, .. }) => *len,
            _ => 0,
        }
    }

    /// Raw bytes of any field.
    pub fn raw(&self, path: &str) -> &[u8] {
        self.layout
            .locate(path)
            .and_then(|(offset, field)| self.bytes.get(offset..offset + field.size))
            .unwrap_or(&[])
    }

    /// Nested record field as its own [`Record`].
    pub fn sub(&self, path: &str) -> Option<Record> {
        let (offset, field) = self.layout.locate(path)?;
        match &field.kind {
            LaidKind::Record(inner) => Some(Record::new(
                Arc::new((**inner).clone()),
                self.bytes.get(offset..offset + field.size)?.to_vec(),
            )),
            _ => None,
        }
    }

    /// Element `index` of an inline record array.
    pub fn sub_at(&self, path: &str, index: usize) -> Option<Record> {
        let (offset, field) = self.layout.locate(path)?;
        match &field.kind {
            LaidKind::Records { elem, len } if index < *len => {
                let start = offset + index * elem.size;
                Some(Record::new(
                    Arc::new((**elem).clone()),
                    self.bytes.get(start..start + elem.size)?.to_vec(),
                ))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personality::{Field, Personality, RecordDesc};

    static POINT: RecordDesc = RecordDesc::structure("point", &[Field::i32("x"), Field::i32("y")]);

    static SHAPE: RecordDesc = RecordDesc::structure(
        "shape",
        &[
            Field::u32("id"),
            Field::record("origin", &POINT),
            Field::array("ids", Scalar::U16, 2),
            Field::records("corners", &POINT, 2),
            Field::u64("size"),
        ],
    );

    fn shape_record(bytes: Vec<u8>) -> Record {
        Record::new(Arc::new(RecordLayout::compute(&SHAPE, Personality::LP64)), bytes)
    }

    fn shape_bytes() -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(&7u32.to_le_bytes());
        b.extend_from_slice(&(-3i32).to_le_bytes());
        b.extend_from_slice(&5i32.to_le_bytes());
        b.extend_from_slice(&11u16.to_le_bytes());
        b.extend_from_slice(&12u16.to_le_bytes());
        for v in [1i32, 2, 3, 4] {
            b.extend_from_slice(&v.to_le_bytes());
        }
        b.extend_from_slice(&0x1_0000_0000u64.to_le_bytes());
        b
    }

    #[test]
    fn test_scalar_fields() {
        let r = shape_record(shape_bytes());
        assert_eq!(r.get("id"), 7);
        assert_eq!(r.get_signed("origin.x"), -3);
        assert_eq!(r.get("origin.x"), 0xffff_fffd);
        assert_eq!(r.get_symbolic("origin.x"), (-3i64) as u64);
        assert_eq!(r.get("size"), 0x1_0000_0000);
    }

    #[test]
    fn test_arrays_and_nested() {
        let r = shape_record(shape_bytes());
        assert_eq!(r.elem("ids", 1), 12);
        assert_eq!(r.elem("ids", 2), 0);
        let corner = r.sub_at("corners", 1).unwrap();
        assert_eq!(corner.get_signed("y"), 4);
        assert!(r.sub_at("corners", 2).is_none());
        assert_eq!(r.sub("origin").unwrap().get_signed("y"), 5);
        assert!(r.sub("id").is_none());
    }

    #[test]
    fn test_short_buffer_zero_filled() {
        let r = shape_record(vec![1, 0, 0, 0]);
        assert_eq!(r.bytes().len(), r.layout().size);
        assert_eq!(r.get("id"), 1);
        assert_eq!(r.get("size"), 0);
    }

    #[test]
    fn test_non_scalar_paths_read_as_zero() {
        let r = shape_record(shape_bytes());
        assert_eq!(r.get("ids"), 0);
        assert_eq!(r.get("origin"), 0);
        assert_eq!(r.get("no_such_field"), 0);
        assert_eq!(r.get_signed("no_such_field"), 0);
        assert_eq!(r.get_symbolic("corners"), 0);
    }

    #[test]
    fn test_raw_field_bytes() {
        let r = shape_record(shape_bytes());
        assert_eq!(r.raw("ids"), &[11, 0, 12, 0]);
        assert!(r.raw("missing").is_empty());
    }
}
