//! WOFF2 encoding and decoding
//!
//! Tables are stored with null transforms, so the compressed stream is the
//! plain concatenation of the sfnt tables. The decoder only accepts files of
//! that shape; transformed `glyf`/`loca`/`hmtx` are reported as unsupported.

use crate::build::sfnt::SfntTables;
use crate::build::writer::{padded_len, read_u16, read_u32, ByteWriter};
use crate::core::errors::FontError;
use skrifa::raw::types::Tag;
use std::io::{Read, Write};

const SIGNATURE: u32 = 0x774F_4632; // 'wOF2'
const HEADER_LEN: usize = 48;
const ARBITRARY_TAG: u8 = 63;
const BROTLI_QUALITY: u32 = 11;
const BROTLI_WINDOW: u32 = 22;
const BROTLI_BUFFER: usize = 4096;

const GLYF: Tag = Tag::new(b"glyf");
const LOCA: Tag = Tag::new(b"loca");

/// Tags with a one-byte code in the table directory
const KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post", b"cvt ", b"fpgm",
    b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT", b"EBLC", b"gasp", b"hdmx", b"kern",
    b"LTSH", b"PCLT", b"VDMX", b"vhea", b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC",
    b"JSTF", b"MATH", b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar", b"gvar", b"hsty",
    b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop", b"trak", b"Zapf", b"Silf", b"Glat",
    b"Gloc", b"Feat", b"Sill",
];

fn known_tag_index(tag: Tag) -> Option<u8> {
    KNOWN_TAGS
        .iter()
        .position(|known| Tag::new(known) == tag)
        .map(|index| index as u8)
}

/// Transform version meaning "stored as is" for a table
fn null_transform(tag: Tag) -> u8 {
    if tag == GLYF || tag == LOCA {
        3
    } else {
        0
    }
}

/// Directory order: ascending tags, `loca` right after `glyf`
fn table_order(font: &SfntTables) -> Vec<Tag> {
    let mut order = Vec::with_capacity(font.tables.len());
    for &tag in font.tables.keys() {
        if tag == LOCA && font.tables.contains_key(&GLYF) {
            continue;
        }
        order.push(tag);
        if tag == GLYF && font.tables.contains_key(&LOCA) {
            order.push(LOCA);
        }
    }
    order
}

/// Wrap an assembled sfnt as WOFF2
pub fn encode(sfnt: &[u8]) -> Result<Vec<u8>, FontError> {
    let font = SfntTables::parse(sfnt)?;
    let order = table_order(&font);

    let mut directory = ByteWriter::new();
    let mut stream = Vec::new();
    for &tag in &order {
        let data = &font.tables[&tag];
        let transform = null_transform(tag) << 6;
        match known_tag_index(tag) {
            Some(index) => {
                directory.u8(transform | index);
            }
            None => {
                directory.u8(transform | ARBITRARY_TAG).tag(tag);
            }
        }
        write_base128(&mut directory, data.len() as u32);
        stream.extend_from_slice(data);
    }

    let mut compressor = brotli::CompressorWriter::new(
        Vec::new(),
        BROTLI_BUFFER,
        BROTLI_QUALITY,
        BROTLI_WINDOW,
    );
    compressor
        .write_all(&stream)
        .map_err(|e| FontError::MalformedFont(format!("brotli compression failed: {e}")))?;
    let compressed = compressor.into_inner();

    let total_sfnt_size = font.total_size();
    let length = padded_len(HEADER_LEN + directory.len() + compressed.len());

    let mut out = ByteWriter::with_capacity(length);
    out.u32(SIGNATURE)
        .u32(font.flavor)
        .u32(length as u32)
        .u16(order.len() as u16)
        .u16(0)
        .u32(total_sfnt_size as u32)
        .u32(compressed.len() as u32)
        .u16(1) // majorVersion
        .u16(0)
        .u32(0) // metaOffset
        .u32(0)
        .u32(0)
        .u32(0) // privOffset
        .u32(0);
    out.bytes(directory.as_slice()).bytes(&compressed).pad4();
    Ok(out.into_inner())
}

/// Unpack a WOFF2 file whose tables all use null transforms
pub fn decode(data: &[u8]) -> Result<SfntTables, FontError> {
    let truncated = || FontError::MalformedFont("truncated WOFF2 header".to_string());
    if read_u32(data, 0) != Some(SIGNATURE) {
        return Err(FontError::MalformedFont("not a WOFF2 file".to_string()));
    }
    let flavor = read_u32(data, 4).ok_or_else(truncated)?;
    let num_tables = read_u16(data, 12).ok_or_else(truncated)?;
    let compressed_len = read_u32(data, 20).ok_or_else(truncated)? as usize;

    let mut cursor = HEADER_LEN;
    let mut entries = Vec::with_capacity(num_tables as usize);
    for _ in 0..num_tables {
        let flags = *data.get(cursor).ok_or_else(truncated)?;
        cursor += 1;
        let tag = match flags & 0x3F {
            ARBITRARY_TAG => {
                let bytes = data.get(cursor..cursor + 4).ok_or_else(truncated)?;
                cursor += 4;
                Tag::new(&[bytes[0], bytes[1], bytes[2], bytes[3]])
            }
            index => Tag::new(KNOWN_TAGS[index as usize]),
        };
        let orig_length = read_base128(data, &mut cursor)?;
        if flags >> 6 != null_transform(tag) {
            return Err(FontError::UnsupportedWoff2(format!(
                "transformed '{tag}' table"
            )));
        }
        entries.push((tag, orig_length as usize));
    }

    let compressed = data
        .get(cursor..cursor + compressed_len)
        .ok_or_else(|| FontError::MalformedFont("truncated WOFF2 data".to_string()))?;
    let mut stream = Vec::new();
    brotli::Decompressor::new(compressed, BROTLI_BUFFER)
        .read_to_end(&mut stream)
        .map_err(|e| FontError::MalformedFont(format!("brotli decompression failed: {e}")))?;

    let mut font = SfntTables::new(flavor);
    let mut offset = 0usize;
    for (tag, length) in entries {
        let table = stream
            .get(offset..offset + length)
            .ok_or_else(|| FontError::MalformedFont(format!("'{tag}' past end of stream")))?;
        font.insert(tag, table.to_vec());
        offset += length;
    }
    Ok(font)
}

fn write_base128(out: &mut ByteWriter, value: u32) {
    let mut groups = vec![(value & 0x7F) as u8];
    let mut rest = value >> 7;
    while rest > 0 {
        groups.push((rest & 0x7F) as u8 | 0x80);
        rest >>= 7;
    }
    for byte in groups.into_iter().rev() {
        out.u8(byte);
    }
}

fn read_base128(data: &[u8], cursor: &mut usize) -> Result<u32, FontError> {
    let invalid = || FontError::MalformedFont("invalid UIntBase128".to_string());
    let mut value = 0u32;
    for i in 0..5 {
        let byte = *data.get(*cursor).ok_or_else(invalid)?;
        *cursor += 1;
        if i == 0 && byte == 0x80 {
            return Err(invalid());
        }
        if value & 0xFE00_0000 != 0 {
            return Err(invalid());
        }
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::sfnt::{HEAD, TRUETYPE_FLAVOR};

    fn sample() -> Vec<u8> {
        let mut font = SfntTables::new(TRUETYPE_FLAVOR);
        font.insert(HEAD, vec![7; 54])
            .insert(GLYF, vec![1, 2, 3, 4, 5])
            .insert(LOCA, vec![0; 8])
            .insert(Tag::new(b"abcd"), vec![9; 3]);
        font.build()
    }

    #[test]
    fn test_known_tags() {
        assert_eq!(known_tag_index(Tag::new(b"cmap")), Some(0));
        assert_eq!(known_tag_index(Tag::new(b"CFF ")), Some(13));
        assert_eq!(known_tag_index(Tag::new(b"Sill")), Some(62));
        assert_eq!(known_tag_index(Tag::new(b"abcd")), None);
    }

    #[test]
    fn test_base128() {
        let mut out = ByteWriter::new();
        write_base128(&mut out, 63);
        write_base128(&mut out, 200);
        assert_eq!(out.as_slice(), &[63, 0x81, 0x48]);
        let mut cursor = 0;
        assert_eq!(read_base128(out.as_slice(), &mut cursor).unwrap(), 63);
        assert_eq!(read_base128(out.as_slice(), &mut cursor).unwrap(), 200);
        assert!(read_base128(&[0x80, 0x01], &mut 0).is_err());
    }

    #[test]
    fn test_loca_follows_glyf() {
        let font = SfntTables::parse(&sample()).unwrap();
        let order = table_order(&font);
        let glyf = order.iter().position(|t| *t == GLYF).unwrap();
        assert_eq!(order[glyf + 1], LOCA);
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn test_header_fields() {
        let sfnt = sample();
        let woff2 = encode(&sfnt).unwrap();
        assert_eq!(&woff2[0..4], b"wOF2");
        assert_eq!(read_u32(&woff2, 8), Some(woff2.len() as u32));
        assert_eq!(read_u32(&woff2, 16), Some(sfnt.len() as u32));
        assert_eq!(woff2.len() % 4, 0);
    }

    #[test]
    fn test_decode_restores_tables() {
        let sfnt = sample();
        let decoded = decode(&encode(&sfnt).unwrap()).unwrap();
        assert_eq!(decoded, SfntTables::parse(&sfnt).unwrap());
        assert_eq!(decoded.build(), sfnt);
    }

    #[test]
    fn test_transformed_glyf_is_rejected() {
        let mut woff2 = encode(&sample()).unwrap();
        let mut cursor = HEADER_LEN;
        // walk the directory to the glyf entry and mark it transformed
        loop {
            let flags = woff2[cursor];
            if flags & 0x3F == 10 {
                woff2[cursor] = 10;
                break;
            }
            cursor += 1;
            if flags & 0x3F == ARBITRARY_TAG {
                cursor += 4;
            }
            read_base128(&woff2, &mut cursor).unwrap();
        }
        assert!(matches!(decode(&woff2), Err(FontError::UnsupportedWoff2(_))));
    }
}
