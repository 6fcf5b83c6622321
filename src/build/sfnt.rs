//! SFNT container assembly and parsing
//!
//! Tables are written in tag order with 4-byte alignment. The `head`
//! checksum adjustment is computed over the finished font, so output depends
//! on nothing but the table contents.

use crate::build::writer::{checksum, padded_len, read_u16, read_u32, search_params, ByteWriter};
use crate::core::errors::FontError;
use skrifa::raw::types::Tag;
use std::collections::BTreeMap;

pub const TRUETYPE_FLAVOR: u32 = 0x0001_0000;
pub const CFF_FLAVOR: u32 = 0x4F54_544F; // 'OTTO'
pub const HEAD: Tag = Tag::new(b"head");
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;
const HEAD_ADJUSTMENT_OFFSET: usize = 8;

/// A set of tables plus the sfnt version tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfntTables {
    pub flavor: u32,
    pub tables: BTreeMap<Tag, Vec<u8>>,
}

impl SfntTables {
    pub fn new(flavor: u32) -> Self {
        Self {
            flavor,
            tables: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, tag: Tag, data: Vec<u8>) -> &mut Self {
        self.tables.insert(tag, data);
        self
    }

    pub fn get(&self, tag: Tag) -> Option<&[u8]> {
        self.tables.get(&tag).map(Vec::as_slice)
    }

    /// Size of the assembled font without building it
    pub fn total_size(&self) -> usize {
        12 + 16 * self.tables.len() + self.tables.values().map(|t| padded_len(t.len())).sum::<usize>()
    }

    /// Assemble a standalone font file
    pub fn build(&self) -> Vec<u8> {
        let num_tables = self.tables.len() as u16;
        let mut out = ByteWriter::with_capacity(self.total_size());
        write_offset_table(&mut out, self.flavor, num_tables);

        let mut offset = 12 + 16 * self.tables.len();
        let mut head_offset = None;
        for (tag, data) in &self.tables {
            let data = if *tag == HEAD {
                head_offset = Some(offset);
                zeroed_adjustment(data)
            } else {
                data.clone()
            };
            out.tag(*tag)
                .u32(checksum(&data))
                .u32(offset as u32)
                .u32(data.len() as u32);
            offset += padded_len(data.len());
        }
        for (tag, data) in &self.tables {
            if *tag == HEAD {
                out.bytes(&zeroed_adjustment(data));
            } else {
                out.bytes(data);
            }
            out.pad4();
        }

        if let Some(head_offset) = head_offset {
            let adjustment = CHECKSUM_MAGIC.wrapping_sub(checksum(out.as_slice()));
            out.patch_u32(head_offset + HEAD_ADJUSTMENT_OFFSET, adjustment);
        }
        out.into_inner()
    }

    /// Read the table directory of a standalone font
    pub fn parse(data: &[u8]) -> Result<Self, FontError> {
        let malformed = |what: &str| FontError::MalformedFont(what.to_string());
        let flavor = read_u32(data, 0).ok_or_else(|| malformed("truncated sfnt header"))?;
        if flavor != TRUETYPE_FLAVOR && flavor != CFF_FLAVOR {
            return Err(malformed("unknown sfnt version"));
        }
        let num_tables = read_u16(data, 4).ok_or_else(|| malformed("truncated sfnt header"))?;
        let mut font = Self::new(flavor);
        for index in 0..num_tables as usize {
            let record = 12 + 16 * index;
            let tag = data
                .get(record..record + 4)
                .map(|b| Tag::new(&[b[0], b[1], b[2], b[3]]))
                .ok_or_else(|| malformed("truncated table directory"))?;
            let offset = read_u32(data, record + 8).ok_or_else(|| malformed("truncated table record"))?;
            let length = read_u32(data, record + 12).ok_or_else(|| malformed("truncated table record"))?;
            let table = data
                .get(offset as usize..offset as usize + length as usize)
                .ok_or_else(|| malformed("table extends past end of file"))?;
            font.insert(tag, table.to_vec());
        }
        Ok(font)
    }
}

pub(crate) fn write_offset_table(out: &mut ByteWriter, flavor: u32, num_tables: u16) {
    let (search_range, entry_selector, range_shift) = search_params(num_tables, 16);
    out.u32(flavor)
        .u16(num_tables)
        .u16(search_range)
        .u16(entry_selector)
        .u16(range_shift);
}

/// `head` with its checksum adjustment cleared
pub(crate) fn zeroed_adjustment(head: &[u8]) -> Vec<u8> {
    let mut head = head.to_vec();
    if head.len() >= HEAD_ADJUSTMENT_OFFSET + 4 {
        head[HEAD_ADJUSTMENT_OFFSET..HEAD_ADJUSTMENT_OFFSET + 4].fill(0);
    }
    head
}
