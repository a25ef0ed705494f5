use accuflow_common::error::{AccuFlowError, AccuFlowResult};
use accuflow_common::types::{EdgeRecord, VertexRecord};
use accuflow_common::value::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Reads vertex documents from a JSON-lines file; each line is an object
/// with an `_id` and arbitrary further attributes.
pub fn read_vertices_jsonl(path: impl AsRef<Path>) -> AccuFlowResult<Vec<VertexRecord>> {
    let data = std::fs::read_to_string(path)?;
    let mut out = Vec::new();
    for (line_no, line) in data.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: VertexRecord = serde_json::from_str(line).map_err(|e| {
            AccuFlowError::InvalidArgument(format!("vertex line {}: {e}", line_no + 1))
        })?;
        out.push(record);
    }
    Ok(out)
}

/// Reads edge documents from a JSON-lines file; each line is an object with
/// `_from`, `_to` and arbitrary further attributes.
pub fn read_edges_jsonl(path: impl AsRef<Path>) -> AccuFlowResult<Vec<EdgeRecord>> {
    let data = std::fs::read_to_string(path)?;
    let mut out = Vec::new();
    for (line_no, line) in data.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: EdgeRecord = serde_json::from_str(line).map_err(|e| {
            AccuFlowError::InvalidArgument(format!("edge line {}: {e}", line_no + 1))
        })?;
        out.push(record);
    }
    Ok(out)
}

/// Reads a headerless `from,to,weight` CSV edge list, storing the weight
/// under `weight_attribute` on each edge document. The weight column may be
/// omitted; it defaults to 1.
pub fn read_edges_csv(
    path: impl AsRef<Path>,
    weight_attribute: &str,
) -> AccuFlowResult<Vec<EdgeRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| AccuFlowError::Internal(format!("csv open: {e}")))?;

    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec.map_err(|e| AccuFlowError::Internal(format!("csv read: {e}")))?;
        let from = rec
            .get(0)
            .ok_or_else(|| AccuFlowError::InvalidArgument("edge source missing".to_string()))?
            .trim()
            .to_string();
        let to = rec
            .get(1)
            .ok_or_else(|| AccuFlowError::InvalidArgument("edge target missing".to_string()))?
            .trim()
            .to_string();
        let weight: f64 = rec
            .get(2)
            .map(|s| s.trim().parse())
            .transpose()
            .map_err(|e| AccuFlowError::InvalidArgument(format!("edge weight parse: {e}")))?
            .unwrap_or(1.0);

        let mut document = BTreeMap::new();
        document.insert(weight_attribute.to_string(), Value::Double(weight));
        out.push(EdgeRecord::new(from, to, document));
    }
    Ok(out)
}
