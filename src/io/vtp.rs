use std::path::Path;
use std::str::FromStr;

use nalgebra::Vector3;

use super::{Geometry, GeometryBuilder};
use crate::error::{Error, Result};

/// One `<DataArray>` element: its attribute text and its content.
struct DataArray<'a> {
    attributes: &'a str,
    body: &'a str,
}

impl<'a> DataArray<'a> {
    fn name(&self) -> Option<&'a str> {
        attribute(self.attributes, "Name")
    }

    fn values<T: FromStr>(&self) -> Result<Vec<T>> {
        let format = attribute(self.attributes, "format").unwrap_or("ascii");
        if format != "ascii" {
            return Err(Error::parser(format!(
                "DataArray {} uses the {format} format, only ascii is supported",
                self.name().unwrap_or("<unnamed>")
            )));
        }
        self.body
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<T>()
                    .map_err(|_| Error::parser(format!("invalid DataArray value `{token}`")))
            })
            .collect()
    }

    fn vectors(&self) -> Result<Vec<Vector3<f32>>> {
        let components = attribute(self.attributes, "NumberOfComponents").unwrap_or("1");
        if components != "3" {
            return Err(Error::parser(format!(
                "expected 3 components, got {components}"
            )));
        }
        let values = self.values::<f32>()?;
        if values.len() % 3 != 0 {
            return Err(Error::parser("vector array size is not a multiple of 3"));
        }
        Ok(values
            .chunks_exact(3)
            .map(|v| Vector3::new(v[0], v[1], v[2]))
            .collect())
    }
}

/// Value of `name="..."` (or `name='...'`) inside an element's attribute text.
fn attribute<'a>(attributes: &'a str, name: &str) -> Option<&'a str> {
    attributes
        .match_indices(name)
        .filter(|(pos, _)| {
            attributes[..*pos]
                .chars()
                .last()
                .map_or(true, char::is_whitespace)
        })
        .find_map(|(pos, _)| {
            let rest = attributes[pos + name.len()..].trim_start();
            let rest = rest.strip_prefix('=')?.trim_start();
            let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
            let value = &rest[1..];
            value.find(quote).map(|end| &value[..end])
        })
}

/// An element found by `element`.
struct Element<'a> {
    attributes: &'a str,
    content: &'a str,
    /// Offset just past the element in the searched text.
    end: usize,
}

/// Finds the first `<tag ...>content</tag>` element in `xml`. Self closing
/// elements have empty content.
fn element<'a>(xml: &'a str, tag: &str) -> Option<Element<'a>> {
    let opening = format!("<{tag}");
    let mut search_from = 0;
    while let Some(found) = xml[search_from..].find(&opening) {
        let start = search_from + found + opening.len();
        search_from = start;
        let rest = &xml[start..];
        if !rest.starts_with(|c: char| c.is_whitespace() || c == '>' || c == '/') {
            continue;
        }
        let tag_end = rest.find('>')?;
        let content_start = start + tag_end + 1;
        let attributes = &rest[..tag_end];
        if let Some(attributes) = attributes.strip_suffix('/') {
            return Some(Element {
                attributes,
                content: "",
                end: content_start,
            });
        }
        let closing_tag = format!("</{tag}>");
        let closing = xml[content_start..].find(&closing_tag)?;
        return Some(Element {
            attributes,
            content: &xml[content_start..content_start + closing],
            end: content_start + closing + closing_tag.len(),
        });
    }
    None
}

/// Removes `<!-- ... -->` comments, an unterminated comment runs to the end.
fn strip_comments(xml: &str) -> String {
    let mut stripped = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(start) = rest.find("<!--") {
        stripped.push_str(&rest[..start]);
        rest = match rest[start + 4..].find("-->") {
            Some(end) => &rest[start + 4 + end + 3..],
            None => "",
        };
    }
    stripped.push_str(rest);
    stripped
}

fn data_arrays(xml: &str) -> Vec<DataArray> {
    let mut arrays = Vec::new();
    let mut rest = xml;
    while let Some(found) = element(rest, "DataArray") {
        arrays.push(DataArray {
            attributes: found.attributes,
            body: found.content,
        });
        rest = &rest[found.end..];
    }
    arrays
}

fn named_array<'a>(arrays: &'a [DataArray<'a>], name: &str) -> Result<&'a DataArray<'a>> {
    arrays
        .iter()
        .find(|array| array.name() == Some(name))
        .ok_or_else(|| Error::parser(format!("missing `{name}` DataArray")))
}

/// Cells stored as `connectivity` and end `offsets` arrays.
fn read_cells(xml: &str, tag: &str) -> Result<Vec<Vec<usize>>> {
    let content = match element(xml, tag) {
        Some(found) => found.content,
        None => return Ok(Vec::new()),
    };
    let arrays = data_arrays(content);
    if arrays.is_empty() {
        return Ok(Vec::new());
    }
    let connectivity = named_array(&arrays, "connectivity")?.values::<usize>()?;
    let offsets = named_array(&arrays, "offsets")?.values::<usize>()?;

    let mut cells = Vec::with_capacity(offsets.len());
    let mut start = 0;
    for end in offsets {
        let cell = connectivity
            .get(start..end)
            .ok_or_else(|| Error::parser(format!("{tag} offsets are out of range")))?;
        cells.push(cell.to_vec());
        start = end;
    }
    Ok(cells)
}

/// Reads a VTK XML PolyData (`.vtp`) file whose arrays are stored as ascii.
pub fn read_vtp<P: AsRef<Path>>(filepath: P) -> Result<Geometry> {
    let filepath = filepath.as_ref();
    let xml = std::fs::read_to_string(filepath)?;
    let with_path = |err: Error| match err {
        Error::Parser(msg) => Error::parser(format!("{}: {msg}", filepath.display())),
        other => other,
    };
    parse_vtp(&strip_comments(&xml)).map_err(with_path)
}

fn parse_vtp(xml: &str) -> Result<Geometry> {
    let root = element(xml, "VTKFile").ok_or_else(|| Error::parser("missing VTKFile element"))?;
    if attribute(root.attributes, "type") != Some("PolyData") {
        return Err(Error::parser("VTKFile is not of type PolyData"));
    }
    let piece = element(root.content, "Piece")
        .ok_or_else(|| Error::parser("missing Piece element"))?
        .content;

    let mut builder = GeometryBuilder::default();
    let points = element(piece, "Points")
        .ok_or_else(|| Error::parser("missing Points element"))?
        .content;
    let point_arrays = data_arrays(points);
    let point_array = point_arrays
        .first()
        .ok_or_else(|| Error::parser("Points has no DataArray"))?;
    for point in point_array.vectors()? {
        builder.add_point(point);
    }

    if let Some(point_data) = element(piece, "PointData") {
        let arrays = data_arrays(point_data.content);
        if let Ok(normals) = named_array(&arrays, "Normals") {
            for normal in normals.vectors()? {
                builder.add_normal(normal);
            }
        }
    }

    for polygon in read_cells(piece, "Polys")? {
        builder.add_polygon(&polygon);
    }
    for strip in read_cells(piece, "Strips")? {
        builder.add_strip(&strip);
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::{attribute, read_vtp, strip_comments};
    use std::io::Write;

    const SQUARE: &str = r#"<?xml version="1.0"?>
<VTKFile type="PolyData" version="0.1" byte_order="LittleEndian">
  <PolyData>
    <Piece NumberOfPoints="4" NumberOfPolys="1">
      <PointData Normals="Normals">
        <DataArray type="Float32" Name="Normals" NumberOfComponents="3" format="ascii">
          0 0 1 0 0 1 0 0 1 0 0 1
        </DataArray>
      </PointData>
      <Points>
        <DataArray type="Float32" Name="Points" NumberOfComponents="3" format="ascii">
          0 0 0 1 0 0 1 1 0 0 1 0
        </DataArray>
      </Points>
      <Verts/>
      <Polys>
        <DataArray type="Int64" Name="connectivity" format="ascii">0 1 2 3</DataArray>
        <DataArray type="Int64" Name="offsets" format="ascii">4</DataArray>
      </Polys>
    </Piece>
  </PolyData>
</VTKFile>
"#;

    fn write_vtp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".vtp").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_vtp() {
        let file = write_vtp(SQUARE);
        let geom = read_vtp(file.path()).unwrap();
        assert_eq!(geom.len_vertices(), 4);
        assert_eq!(geom.len_faces(), 2);
        assert_eq!(geom.points[2][1], 1.0);
        assert!(geom.normals.is_some());
    }

    #[test]
    fn test_rejects_binary_arrays() {
        let file = write_vtp(&SQUARE.replace(
            r#"Name="Points" NumberOfComponents="3" format="ascii""#,
            r#"Name="Points" NumberOfComponents="3" format="binary""#,
        ));
        let err = read_vtp(file.path()).unwrap_err();
        assert!(err.to_string().contains("only ascii"));
    }

    #[test]
    fn test_attribute_lookup() {
        let attributes = r#" type="Int64" Name="offsets" format="ascii""#;
        assert_eq!(attribute(attributes, "Name"), Some("offsets"));
        assert_eq!(attribute(attributes, "ame"), None);
        assert_eq!(attribute(attributes, "missing"), None);

        let spaced = r#" format = 'ascii'  NumberOfComponents="3" Name='Points'"#;
        assert_eq!(attribute(spaced, "format"), Some("ascii"));
        assert_eq!(attribute(spaced, "Name"), Some("Points"));
        assert_eq!(attribute(spaced, "NumberOfComponents"), Some("3"));
    }

    #[test]
    fn test_comments_and_attribute_order() {
        let content = SQUARE
            .replace(
                r#"<DataArray type="Float32" Name="Points" NumberOfComponents="3" format="ascii">"#,
                r#"<!-- <DataArray Name="Points">9 9 9</DataArray> -->
        <DataArray format='ascii' NumberOfComponents='3' Name='Points' type='Float32'>"#,
            )
            .replace("<Polys>", "<Polys><!-- <DataArray Name=\"offsets\">1</DataArray> -->");
        let file = write_vtp(&content);
        let geom = read_vtp(file.path()).unwrap();
        assert_eq!(geom.len_vertices(), 4);
        assert_eq!(geom.len_faces(), 2);
        assert_eq!(geom.points[1][0], 1.0);
    }

    #[test]
    fn test_strip_comments() {
        assert_eq!(strip_comments("a<!-- b -->c<!-- d"), "ac");
        assert_eq!(strip_comments("plain"), "plain");
    }
}
