//! Recorded redraw sessions
//!
//! A replay file is TOML with a `batches` array. Each batch has the shape of
//! a redraw notification's parameters: a list of `[name, args...]` groups.
//!
//! ```toml
//! batches = [
//!     [["grid_resize", [1, 10, 2]], ["grid_line", [1, 0, 0, [["h"], ["i"]]]], ["flush", []]],
//! ]
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use super::Value;

#[derive(Debug, Deserialize)]
struct ReplayFile {
    batches: Vec<toml::Value>,
}

/// Parse replay text into notification parameter lists
pub fn parse_replay(content: &str) -> Result<Vec<Vec<Value>>> {
    let file: ReplayFile = toml::from_str(content)?;
    let mut batches = Vec::with_capacity(file.batches.len());
    for (index, batch) in file.batches.into_iter().enumerate() {
        match Value::from(batch) {
            Value::Array(groups) => batches.push(groups),
            other => bail!("batch {} is not an array: {:?}", index, other),
        }
    }
    Ok(batches)
}

/// Load a replay file
pub fn load_replay(path: &Path) -> Result<Vec<Vec<Value>>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay file: {}", path.display()))?;
    parse_replay(&content).with_context(|| format!("Failed to parse replay file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{decode_redraw, RedrawEvent};

    #[test]
    fn test_parse_and_decode() {
        let batches = parse_replay(
            r#"
            batches = [
                [["grid_resize", [1, 10, 2]], ["flush", []]],
                [["grid_clear", [1]]],
            ]
            "#,
        )
        .unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(
            decode_redraw(&batches[0]),
            vec![
                RedrawEvent::GridResize {
                    grid: 1,
                    cols: 10,
                    rows: 2
                },
                RedrawEvent::Flush
            ]
        );
        assert_eq!(decode_redraw(&batches[1]), vec![RedrawEvent::GridClear { grid: 1 }]);
    }

    #[test]
    fn test_non_array_batch_rejected() {
        assert!(parse_replay("batches = [1]").is_err());
        assert!(parse_replay("other = 1").is_err());
    }
}
