use std::path::Path;

use nalgebra::Vector3;

use super::text::open_text;
use super::{Geometry, GeometryBuilder};
use crate::error::Result;

/// Reads an ASCII Object File Format (`.off`) mesh. Polygons with more
/// than 3 vertices are triangulated.
pub fn read_off<P: AsRef<Path>>(filepath: P) -> Result<Geometry> {
    let mut parser_context = open_text(filepath)?;

    let header = parser_context.expect_content_line("the OFF header")?;
    if header != "OFF" {
        return Err(parser_context.gen_error(format!(
            "file header does not start with 'OFF', got '{header}' instead"
        )));
    }

    let dims = parser_context.expect_content_line("element counts")?;
    let (num_verts, num_faces) = match dims.split_whitespace().collect::<Vec<_>>()[..] {
        [v, f, _] | [v, f] => (
            parser_context.parse::<usize>(v, "vertex count")?,
            parser_context.parse::<usize>(f, "face count")?,
        ),
        _ => {
            return Err(parser_context.gen_error(format!("Invalid size formats. Got `{dims}`")));
        }
    };

    let mut builder = GeometryBuilder::default();
    for _ in 0..num_verts {
        let line = parser_context.expect_content_line("a vertex")?;
        if let [x, y, z] = line.split_whitespace().take(3).collect::<Vec<_>>()[..] {
            builder.add_point(Vector3::new(
                parser_context.parse(x, "coordinate")?,
                parser_context.parse(y, "coordinate")?,
                parser_context.parse(z, "coordinate")?,
            ));
        } else {
            return Err(parser_context.gen_error(format!("Invalid vertex. Got `{line}`")));
        }
    }

    for _ in 0..num_faces {
        let line = parser_context.expect_content_line("a face")?;
        let mut values = line.split_whitespace();
        let count = match values.next() {
            Some(count) => parser_context.parse::<usize>(count, "polygon size")?,
            None => return Err(parser_context.gen_error("empty face")),
        };
        let polygon = values
            .take(count)
            .map(|index| parser_context.parse::<usize>(index, "vertex index"))
            .collect::<Result<Vec<_>>>()?;
        if polygon.len() != count {
            return Err(parser_context.gen_error(format!("Invalid face. Got `{line}`")));
        }
        builder.add_polygon(&polygon);
    }

    builder.build()
}
