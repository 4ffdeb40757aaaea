//! Service-registration descriptor for javac plugins.

use crate::archive::ArchiveHandle;
use crate::config::DescriptorMode;
use crate::error::Result;

/// Where a jar registers its `com.sun.source.util.Plugin` implementations.
pub const PLUGIN_DESCRIPTOR: &str = "META-INF/services/com.sun.source.util.Plugin";

pub fn find_descriptor(handle: &ArchiveHandle) -> Option<&'static str> {
    handle
        .exists(PLUGIN_DESCRIPTOR)
        .then_some(PLUGIN_DESCRIPTOR)
}

/// Reads the class names listed in `descriptor`, in file order.
pub fn parse_candidates(
    handle: &mut ArchiveHandle,
    descriptor: &str,
    mode: DescriptorMode,
) -> Result<Vec<String>> {
    let lines = handle.read_lines(descriptor)?;
    Ok(match mode {
        DescriptorMode::Verbatim => lines,
        DescriptorMode::Lenient => lines.iter().filter_map(|l| lenient_line(l)).collect(),
    })
}

fn lenient_line(line: &str) -> Option<String> {
    let content = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    };
    let trimmed = content.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
