//! Frame payload decoder.
//!
//! Frames are flat comma-separated text. A particle frame is `x,y,z` repeated
//! once per particle; a mesh topology frame starts with two integer counts
//! `V,T` followed by V vertex triples and T triangle triples. The decoder is a
//! pure function of the text and the expected shape.

use crate::error::DecodeError;
use nalgebra::Vector3;

/// Separator between fields.
pub const FIELD_DELIMITER: char = ',';

/// Scalars per record.
pub const RECORD_ARITY: usize = 3;

/// Decoded mesh topology frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshTopology {
    /// Vertex positions in file order
    pub vertices: Vec<Vector3<f32>>,

    /// Triangle vertex indices in file order
    pub triangles: Vec<[u32; 3]>,
}

impl MeshTopology {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Flattens the triangles to a 3T index buffer (x, y, z per triangle).
    pub fn index_buffer(&self) -> Vec<u32> {
        self.triangles.iter().flat_map(|t| t.iter().copied()).collect()
    }
}

/// Splits a payload into fields.
///
/// Surrounding whitespace is trimmed and one trailing delimiter is dropped,
/// since the producer terminates every record with `,`. Whitespace between
/// fields is not tolerated.
fn split_fields(text: &str) -> Result<Vec<&str>, DecodeError> {
    let body = text.trim();
    let body = body.strip_suffix(FIELD_DELIMITER).unwrap_or(body);
    if body.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(body.split(FIELD_DELIMITER).collect())
}

/// Parses fields as finite `f32` values. `offset` is the position of the
/// first field in the full payload, used for diagnostics.
fn parse_scalars(fields: &[&str], offset: usize) -> Result<Vec<f32>, DecodeError> {
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| match field.parse::<f32>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(DecodeError::InvalidNumber {
                position: offset + i,
                field: field.to_string(),
            }),
        })
        .collect()
}

fn group(scalars: &[f32]) -> Vec<Vector3<f32>> {
    scalars
        .chunks_exact(RECORD_ARITY)
        .map(|c| Vector3::new(c[0], c[1], c[2]))
        .collect()
}

fn parse_count(fields: &[&str], position: usize) -> Result<usize, DecodeError> {
    let field = fields.get(position).copied().unwrap_or("");
    field.parse::<usize>().map_err(|_| DecodeError::InvalidHeader {
        position,
        field: field.to_string(),
    })
}

/// Decodes a headerless frame of 3-vectors.
///
/// With `expected = Some(n)` the frame must hold exactly `n` vectors. An
/// empty payload is only valid when zero vectors are expected.
pub fn decode_positions(text: &str, expected: Option<usize>) -> Result<Vec<Vector3<f32>>, DecodeError> {
    let fields = match split_fields(text) {
        Err(DecodeError::Empty) if expected == Some(0) => return Ok(Vec::new()),
        other => other?,
    };
    if fields.len() % RECORD_ARITY != 0 {
        return Err(DecodeError::RaggedFields { fields: fields.len() });
    }

    let scalars = parse_scalars(&fields, 0)?;
    let vectors = group(&scalars);

    if let Some(expected) = expected {
        if vectors.len() != expected {
            return Err(DecodeError::CountMismatch {
                expected,
                found: vectors.len(),
            });
        }
    }
    Ok(vectors)
}

/// Decodes a mesh topology frame (`V,T,` + 3V vertex fields + 3T index fields).
///
/// Triangle components are stored as float text; each must be a
/// non-negative whole number below V.
pub fn decode_topology(text: &str) -> Result<MeshTopology, DecodeError> {
    let fields = split_fields(text)?;
    let vertex_count = parse_count(&fields, 0)?;
    let triangle_count = parse_count(&fields, 1)?;

    let body = &fields[2..];
    let expected = vertex_count
        .checked_add(triangle_count)
        .and_then(|n| n.checked_mul(RECORD_ARITY))
        .unwrap_or(usize::MAX);
    if body.len() != expected {
        return Err(DecodeError::HeaderMismatch {
            vertices: vertex_count,
            triangles: triangle_count,
            expected,
            found: body.len(),
        });
    }

    let scalars = parse_scalars(body, 2)?;
    let (vertex_block, triangle_block) = scalars.split_at(vertex_count * RECORD_ARITY);
    let vertices = group(vertex_block);

    let mut triangles = Vec::with_capacity(triangle_count);
    for (triangle, chunk) in triangle_block.chunks_exact(RECORD_ARITY).enumerate() {
        let mut tri = [0u32; 3];
        for (slot, &value) in tri.iter_mut().zip(chunk) {
            if value < 0.0 || value.fract() != 0.0 || value >= u32::MAX as f32 {
                return Err(DecodeError::NonIntegralIndex { triangle, value });
            }
            let index = value as u32;
            if index as usize >= vertex_count {
                return Err(DecodeError::IndexOutOfRange {
                    triangle,
                    index,
                    vertex_count,
                });
            }
            *slot = index;
        }
        triangles.push(tri);
    }

    Ok(MeshTopology { vertices, triangles })
}
