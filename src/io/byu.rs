use std::path::Path;

use nalgebra::Vector3;

use super::text::{open_text, Tokenizer};
use super::{Geometry, GeometryBuilder};
use crate::error::Result;

/// Reads a Movie.BYU geometry file (`.g`).
///
/// The header holds the part, vertex, polygon and edge counts followed by
/// one index range per part. Vertices follow as free-form coordinates and
/// polygons as 1-based indices, the last index of each polygon negated.
pub fn read_byu<P: AsRef<Path>>(filepath: P) -> Result<Geometry> {
    let mut tokens = Tokenizer::new(open_text(filepath)?);

    let num_parts = tokens.parse_next::<usize>("part count")?;
    let num_vertices = tokens.parse_next::<usize>("vertex count")?;
    let num_polygons = tokens.parse_next::<usize>("polygon count")?;
    let _num_edges = tokens.parse_next::<usize>("edge count")?;
    for _ in 0..num_parts {
        tokens.parse_next::<usize>("part start")?;
        tokens.parse_next::<usize>("part end")?;
    }

    let mut builder = GeometryBuilder::default();
    for _ in 0..num_vertices {
        builder.add_point(Vector3::new(
            tokens.parse_next("coordinate")?,
            tokens.parse_next("coordinate")?,
            tokens.parse_next("coordinate")?,
        ));
    }

    let mut polygon = Vec::new();
    let mut polygons_read = 0;
    while polygons_read < num_polygons {
        let index = tokens.parse_next::<i64>("vertex index")?;
        if index == 0 {
            return Err(tokens.gen_error("vertex indices start at 1"));
        }
        // Out of range values are caught by the builder.
        polygon.push(usize::try_from(index.abs() - 1).unwrap_or(usize::MAX));
        if index < 0 {
            builder.add_polygon(&polygon);
            polygon.clear();
            polygons_read += 1;
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::read_byu;
    use std::io::Write;

    #[test]
    fn test_read_byu() {
        let mut file = tempfile::Builder::new().suffix(".g").tempfile().unwrap();
        write!(
            file,
            "       1       5       2       7\n       1       2\n\
             0.0 0.0 0.0 1.0 0.0 0.0\n1.0 1.0 0.0 0.0 1.0 0.0\n0.5 0.5 1.0\n\
             1 2 3 -4\n1 2 -5\n"
        )
        .unwrap();

        let geom = read_byu(file.path()).unwrap();
        assert_eq!(geom.len_vertices(), 5);
        assert_eq!(geom.len_faces(), 3);
        assert_eq!(geom.points[4][2], 1.0);
        assert_eq!(geom.faces.unwrap().row(2).to_vec(), vec![0, 1, 4]);
    }

    #[test]
    fn test_truncated_file() {
        let mut file = tempfile::Builder::new().suffix(".g").tempfile().unwrap();
        write!(file, "1 3 1 3\n1 1\n0 0 0 1 0 0\n").unwrap();
        assert!(read_byu(file.path()).is_err());
    }
}
