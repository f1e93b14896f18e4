use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

use nalgebra::Vector3;

use super::text::{TextParserContext, Tokenizer};
use super::{Geometry, GeometryBuilder};
use crate::error::{Error, Result};

const HEADER_SIZE: usize = 80;
const TRIANGLE_SIZE: usize = 50;

/// Merges the repeated corners of STL triangles into shared vertices.
#[derive(Default)]
struct VertexMerger {
    builder: GeometryBuilder,
    lookup: HashMap<[u32; 3], usize>,
}

impl VertexMerger {
    fn add(&mut self, point: Vector3<f32>) -> usize {
        let key = [point[0].to_bits(), point[1].to_bits(), point[2].to_bits()];
        let builder = &mut self.builder;
        *self.lookup.entry(key).or_insert_with(|| {
            builder.add_point(point);
            builder.len_vertices() - 1
        })
    }

    fn add_triangle(&mut self, corners: [Vector3<f32>; 3]) {
        let triangle = corners.map(|corner| self.add(corner));
        self.builder.add_polygon(&triangle);
    }
}

/// Reads a stereolithography `.stl` file, either binary or ASCII.
/// Duplicated triangle corners are merged.
pub fn read_stl<P: AsRef<Path>>(filepath: P) -> Result<Geometry> {
    let filepath = filepath.as_ref();
    let mut content = Vec::new();
    BufReader::new(File::open(filepath)?).read_to_end(&mut content)?;

    if is_binary(&content) {
        read_binary(&content)
    } else {
        read_ascii(TextParserContext::new(Cursor::new(content), filepath))
    }
}

/// Binary files are recognized by their triangle count matching the file size.
fn is_binary(content: &[u8]) -> bool {
    if content.len() < HEADER_SIZE + 4 {
        return false;
    }
    let mut count = [0u8; 4];
    count.copy_from_slice(&content[HEADER_SIZE..HEADER_SIZE + 4]);
    let num_triangles = u32::from_le_bytes(count) as usize;
    content.len() == HEADER_SIZE + 4 + num_triangles * TRIANGLE_SIZE
}

fn read_binary(content: &[u8]) -> Result<Geometry> {
    let mut merger = VertexMerger::default();
    for record in content[HEADER_SIZE + 4..].chunks_exact(TRIANGLE_SIZE) {
        // 12 bytes of facet normal, 3 corners, 2 bytes of attributes.
        let value = |offset: usize| {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(&record[offset..offset + 4]);
            f32::from_le_bytes(bytes)
        };
        let corner = |k: usize| {
            let base = 12 + k * 12;
            Vector3::new(value(base), value(base + 4), value(base + 8))
        };
        merger.add_triangle([corner(0), corner(1), corner(2)]);
    }
    merger.builder.build()
}

fn read_ascii<R: std::io::BufRead>(context: TextParserContext<R>) -> Result<Geometry> {
    let mut tokens = Tokenizer::new(context);
    if tokens.next_token()?.as_deref() != Some("solid") {
        return Err(tokens.gen_error("ASCII stl must start with `solid`"));
    }
    tokens.skip_line();

    let mut merger = VertexMerger::default();
    let mut corners = Vec::with_capacity(3);
    while let Some(token) = tokens.next_token()? {
        match token.as_str() {
            "vertex" => {
                corners.push(Vector3::new(
                    tokens.parse_next("coordinate")?,
                    tokens.parse_next("coordinate")?,
                    tokens.parse_next("coordinate")?,
                ));
            }
            "endloop" => {
                if let [a, b, c] = corners[..] {
                    merger.add_triangle([a, b, c]);
                } else {
                    return Err(tokens.gen_error(format!(
                        "facet with {} vertices, expected 3",
                        corners.len()
                    )));
                }
                corners.clear();
            }
            "endsolid" => break,
            _ => (),
        }
    }

    if merger.builder.len_vertices() == 0 {
        return Err(Error::parser("stl file has no facets"));
    }
    merger.builder.build()
}

#[cfg(test)]
mod tests {
    use super::read_stl;
    use std::io::Write;

    const TETRAHEDRON: [[f32; 3]; 4] = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
    ];
    const FACES: [[usize; 3]; 4] = [[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];

    #[test]
    fn test_read_ascii_stl() {
        let mut file = tempfile::Builder::new().suffix(".stl").tempfile().unwrap();
        writeln!(file, "solid tetra").unwrap();
        for face in FACES {
            writeln!(file, "  facet normal 0 0 0\n    outer loop").unwrap();
            for idx in face {
                let p = TETRAHEDRON[idx];
                writeln!(file, "      vertex {} {} {}", p[0], p[1], p[2]).unwrap();
            }
            writeln!(file, "    endloop\n  endfacet").unwrap();
        }
        writeln!(file, "endsolid tetra").unwrap();

        let geom = read_stl(file.path()).unwrap();
        assert_eq!(geom.len_vertices(), 4);
        assert_eq!(geom.len_faces(), 4);
    }

    #[test]
    fn test_read_binary_stl() {
        let mut file = tempfile::Builder::new().suffix(".stl").tempfile().unwrap();
        // Header that looks like ASCII on purpose.
        let mut header = [b' '; 80];
        header[..5].copy_from_slice(b"solid");
        file.write_all(&header).unwrap();
        file.write_all(&(FACES.len() as u32).to_le_bytes()).unwrap();
        for face in FACES {
            file.write_all(&[0u8; 12]).unwrap();
            for idx in face {
                for value in TETRAHEDRON[idx] {
                    file.write_all(&value.to_le_bytes()).unwrap();
                }
            }
            file.write_all(&[0u8; 2]).unwrap();
        }
        file.flush().unwrap();

        let geom = read_stl(file.path()).unwrap();
        assert_eq!(geom.len_vertices(), 4);
        assert_eq!(geom.len_faces(), 4);
        assert_eq!(geom.points[3][2], 1.0);
    }
}
