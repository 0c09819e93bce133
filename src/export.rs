use std::{
  fs::File,
  io::{BufWriter, Write},
  path::Path,
};

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};

use crate::{engine::CoreError, models::ExportResult};

/// Pretty-prints `value` with `indent` spaces per level.
pub(crate) fn render_pretty(value: &Value, indent: usize) -> Result<String, CoreError> {
  let indent_bytes = vec![b' '; indent];
  let mut buf = Vec::new();
  let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(&indent_bytes));
  value.serialize(&mut ser)?;
  Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub(crate) fn export(
  value: &Value,
  output_dir: &Path,
  file_name: &str,
  indent: usize,
) -> Result<ExportResult, CoreError> {
  if file_name.is_empty() {
    return Err(CoreError::InvalidArg("export file name is empty".into()));
  }
  std::fs::create_dir_all(output_dir)?;
  let output_path = output_dir.join(file_name);

  let text = render_pretty(value, indent)?;
  let out_file = File::create(&output_path)?;
  let mut writer = BufWriter::new(out_file);
  writer.write_all(text.as_bytes())?;
  writer.flush()?;

  Ok(ExportResult {
    output_path: output_path.to_string_lossy().to_string(),
    bytes_written: text.len() as u64,
  })
}
