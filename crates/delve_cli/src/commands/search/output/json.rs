//! JSON output: the finding tree, pretty-printed.

use std::io::Write;

use super::OutputContext;

/// Serialises the finding tree as a pretty-printed JSON document.
pub fn write(ctx: &OutputContext, writer: &mut dyn Write) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, ctx.tree)?;
    writeln!(writer)?;
    Ok(())
}
