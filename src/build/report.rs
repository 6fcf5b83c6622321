//! Markdown coverage report written next to each font

use crate::build::layout::FontLayout;
use crate::core::config::FamilyConfig;
use crate::data::{is_printable, CodepointBlock};
use crate::design::DesignContext;
use std::collections::BTreeMap;
use std::fmt::{self, Write};

/// Characters per glyph source and per Unicode block
pub fn coverage_report(
    design: &DesignContext,
    layout: &FontLayout,
    family: &FamilyConfig,
) -> Result<String, fmt::Error> {
    let mut sources: BTreeMap<&str, usize> = BTreeMap::new();
    let mut blocks: BTreeMap<u32, (CodepointBlock, usize)> = BTreeMap::new();
    let mut unblocked = 0;
    for (codepoint, glyph) in design.glyphs() {
        *sources.entry(glyph.source.as_str()).or_default() += 1;
        match CodepointBlock::of(codepoint) {
            Some(block) => blocks.entry(block.start).or_insert((block, 0)).1 += 1,
            None => unblocked += 1,
        }
    }

    let mut out = String::new();
    writeln!(out, "# {}", layout.family_name(&family.family_name))?;
    writeln!(out)?;
    writeln!(out, "- Version: {}", family.version)?;
    writeln!(out, "- Size: {}px", layout.font_config.size)?;
    writeln!(out, "- Width mode: {}", layout.width_mode)?;
    writeln!(out, "- Characters: {}", design.len())?;
    writeln!(out)?;

    writeln!(out, "## Sources")?;
    writeln!(out)?;
    writeln!(out, "| Source | Characters |")?;
    writeln!(out, "|---|---:|")?;
    for (source, count) in &sources {
        writeln!(out, "| {source} | {count} |")?;
    }
    writeln!(out)?;

    writeln!(out, "## Unicode blocks")?;
    writeln!(out)?;
    writeln!(out, "| Range | Name | Characters | Coverage |")?;
    writeln!(out, "|---|---|---:|---:|")?;
    for (block, count) in blocks.values() {
        let printable = (block.start..=block.end).filter(|&cp| is_printable(cp)).count();
        writeln!(
            out,
            "| {:04X}-{:04X} | {} | {} / {} | {} |",
            block.start,
            block.end,
            block.name,
            count,
            printable,
            percent(*count, printable)
        )?;
    }
    if unblocked > 0 {
        writeln!(out, "| - | No Block | {unblocked} | - |")?;
    }
    Ok(out)
}

fn percent(count: usize, total: usize) -> String {
    if total == 0 {
        return "-".to_string();
    }
    format!("{:.2}%", count as f64 * 100.0 / total as f64)
}
