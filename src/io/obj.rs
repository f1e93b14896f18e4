use std::path::Path;

use nalgebra::Vector3;

use super::text::open_text;
use super::{Geometry, GeometryBuilder};
use crate::error::Result;

/// Reads the `v` and `f` records of a Wavefront `.obj` file.
///
/// Face entries may use the `v/vt/vn` forms and negative (relative) indices.
/// Texture coordinates, normals and groups are ignored.
pub fn read_obj<P: AsRef<Path>>(filepath: P) -> Result<Geometry> {
    let mut parser_context = open_text(filepath)?;
    let mut builder = GeometryBuilder::default();

    while let Some(line) = parser_context.read_content_line()? {
        let mut values = line.split_whitespace();
        match values.next() {
            Some("v") => {
                let coords = values
                    .take(3)
                    .map(|v| parser_context.parse::<f32>(v, "coordinate"))
                    .collect::<Result<Vec<_>>>()?;
                if coords.len() != 3 {
                    return Err(parser_context.gen_error(format!("Invalid vertex. Got `{line}`")));
                }
                builder.add_point(Vector3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let num_vertices = builder.len_vertices();
                let polygon = values
                    .map(|entry| {
                        let index = entry.split('/').next().unwrap_or(entry);
                        let index = parser_context.parse::<i64>(index, "vertex index")?;
                        resolve_index(index, num_vertices).ok_or_else(|| {
                            parser_context.gen_error(format!("vertex index {index} out of range"))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                builder.add_polygon(&polygon);
            }
            _ => (),
        }
    }

    builder.build()
}

/// OBJ indices start at 1, negative ones count back from the last vertex read.
fn resolve_index(index: i64, num_vertices: usize) -> Option<usize> {
    let resolved = if index > 0 {
        index - 1
    } else {
        num_vertices as i64 + index
    };
    if index != 0 && (0..num_vertices as i64).contains(&resolved) {
        Some(resolved as usize)
    } else {
        None
    }
}
