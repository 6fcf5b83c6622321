//! TrueType/OpenType collections
//!
//! Members are taken from already-built standalone fonts. Byte-identical
//! tables are stored once and referenced by every member that has them.

use crate::build::sfnt::{write_offset_table, zeroed_adjustment, SfntTables, HEAD};
use crate::build::writer::{checksum, padded_len, ByteWriter};
use crate::core::errors::FontError;
use tracing::debug;

const TTC_TAG: &[u8; 4] = b"ttcf";
const TTC_VERSION_1: u32 = 0x0001_0000;

/// Bundle standalone fonts into one collection, in the given order
pub fn build_collection(members: &[Vec<u8>]) -> Result<Vec<u8>, FontError> {
    if members.is_empty() {
        return Err(FontError::EmptyCollection);
    }
    let fonts = members
        .iter()
        .map(|bytes| SfntTables::parse(bytes))
        .collect::<Result<Vec<_>, _>>()?;

    // Distinct table blobs in first-use order, and each member's references
    let mut blobs: Vec<&[u8]> = Vec::new();
    let mut references: Vec<Vec<usize>> = Vec::with_capacity(fonts.len());
    for font in &fonts {
        let mut refs = Vec::with_capacity(font.tables.len());
        for data in font.tables.values() {
            let index = match blobs.iter().position(|blob| *blob == data.as_slice()) {
                Some(index) => index,
                None => {
                    blobs.push(data.as_slice());
                    blobs.len() - 1
                }
            };
            refs.push(index);
        }
        references.push(refs);
    }

    let header_len = 12 + 4 * fonts.len();
    let directories_len: usize = fonts.iter().map(|f| 12 + 16 * f.tables.len()).sum();
    let mut blob_offsets = Vec::with_capacity(blobs.len());
    let mut offset = header_len + directories_len;
    for blob in &blobs {
        blob_offsets.push(offset);
        offset += padded_len(blob.len());
    }
    let total_len = offset;
    let table_count: usize = fonts.iter().map(|f| f.tables.len()).sum();
    debug!(
        "Collection of {} fonts stores {} of {} tables",
        fonts.len(),
        blobs.len(),
        table_count
    );

    let mut out = ByteWriter::with_capacity(total_len);
    out.bytes(TTC_TAG).u32(TTC_VERSION_1).u32(fonts.len() as u32);
    let mut directory_offset = header_len;
    for font in &fonts {
        out.u32(directory_offset as u32);
        directory_offset += 12 + 16 * font.tables.len();
    }
    for (font, refs) in fonts.iter().zip(&references) {
        write_offset_table(&mut out, font.flavor, font.tables.len() as u16);
        for ((tag, data), &blob) in font.tables.iter().zip(refs) {
            let table_checksum = if *tag == HEAD {
                checksum(&zeroed_adjustment(data))
            } else {
                checksum(data)
            };
            out.tag(*tag)
                .u32(table_checksum)
                .u32(blob_offsets[blob] as u32)
                .u32(data.len() as u32);
        }
    }
    for blob in &blobs {
        out.bytes(blob).pad4();
    }
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::sfnt::CFF_FLAVOR;
    use crate::build::writer::read_u32;
    use skrifa::raw::types::Tag;

    fn member(name: &[u8]) -> Vec<u8> {
        let mut font = SfntTables::new(CFF_FLAVOR);
        font.insert(HEAD, vec![1; 54])
            .insert(Tag::new(b"cmap"), vec![2; 10])
            .insert(Tag::new(b"name"), name.to_vec());
        font.build()
    }

    #[test]
    fn test_empty_collection_is_an_error() {
        assert!(matches!(build_collection(&[]), Err(FontError::EmptyCollection)));
    }

    #[test]
    fn test_identical_tables_are_shared() {
        let a = member(b"first");
        let b = member(b"second");
        let collection = build_collection(&[a, b]).unwrap();
        assert_eq!(&collection[0..4], b"ttcf");
        assert_eq!(read_u32(&collection, 8), Some(2));

        let first_dir = read_u32(&collection, 12).unwrap() as usize;
        let second_dir = read_u32(&collection, 16).unwrap() as usize;
        // cmap is the first record in both directories
        let cmap_a = read_u32(&collection, first_dir + 12 + 8);
        let cmap_b = read_u32(&collection, second_dir + 12 + 8);
        assert_eq!(cmap_a, cmap_b);
        // name is the third and differs
        let name_a = read_u32(&collection, first_dir + 12 + 32 + 8);
        let name_b = read_u32(&collection, second_dir + 12 + 32 + 8);
        assert_ne!(name_a, name_b);
        assert_eq!(collection.len() % 4, 0);
    }

    #[test]
    fn test_head_checksum_ignores_adjustment() {
        let a = member(b"a");
        let standalone_head_checksum = read_u32(&a, 12 + 16 + 4);
        let collection = build_collection(&[a]).unwrap();
        let directory = read_u32(&collection, 12).unwrap() as usize;
        // head is the second record: cmap, head, name
        let record = directory + 12 + 16;
        assert_eq!(&collection[record..record + 4], b"head");
        assert_eq!(read_u32(&collection, record + 4), standalone_head_checksum);

        let offset = read_u32(&collection, record + 8).unwrap() as usize;
        let head = &collection[offset..offset + 54];
        assert_ne!(read_u32(head, 8), Some(0));
        assert_eq!(read_u32(&collection, record + 4), Some(checksum(&zeroed_adjustment(head))));
    }

    #[test]
    fn test_member_order_is_preserved() {
        let a = member(b"a");
        let b = member(b"bb");
        let ab = build_collection(&[a.clone(), b.clone()]).unwrap();
        let ba = build_collection(&[b, a]).unwrap();
        assert_ne!(ab, ba);
        assert_eq!(ab, build_collection(&[member(b"a"), member(b"bb")]).unwrap());
    }
}
