use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::debug;
use nalgebra::Vector3;
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;
use ply_rs::{parser, ply};

use super::{Geometry, GeometryBuilder};
use crate::error::{Error, Result};

struct Vertex {
    point: [f32; 3],
    normal: [f32; 3],
}

#[derive(Default)]
struct Face {
    vertex_index: Vec<usize>,
}

fn property_as_f32(property: &ply::Property) -> Option<f32> {
    match *property {
        ply::Property::Float(v) => Some(v),
        ply::Property::Double(v) => Some(v as f32),
        ply::Property::Int(v) => Some(v as f32),
        ply::Property::UInt(v) => Some(v as f32),
        ply::Property::Short(v) => Some(v as f32),
        ply::Property::UShort(v) => Some(v as f32),
        ply::Property::Char(v) => Some(v as f32),
        ply::Property::UChar(v) => Some(v as f32),
        _ => None,
    }
}

// The structs need to implement the PropertyAccess trait, otherwise the parser doesn't know how to write to them.
impl ply::PropertyAccess for Vertex {
    fn new() -> Self {
        Vertex {
            point: [0f32; 3],
            normal: [0f32; 3],
        }
    }
    fn set_property(&mut self, key: String, property: ply::Property) {
        let slot = match key.as_str() {
            "x" => &mut self.point[0],
            "y" => &mut self.point[1],
            "z" => &mut self.point[2],
            "nx" => &mut self.normal[0],
            "ny" => &mut self.normal[1],
            "nz" => &mut self.normal[2],
            _ => return,
        };
        if let Some(value) = property_as_f32(&property) {
            *slot = value;
        }
    }
}

impl ply::PropertyAccess for Face {
    fn new() -> Self {
        Face::default()
    }
    fn set_property(&mut self, key: String, property: ply::Property) {
        if !matches!(key.as_str(), "vertex_index" | "vertex_indices") {
            return;
        }
        // Negative indices become out of range and are rejected by the builder.
        self.vertex_index = match property {
            ply::Property::ListInt(vec) => vec
                .into_iter()
                .map(|i| usize::try_from(i).unwrap_or(usize::MAX))
                .collect(),
            ply::Property::ListUInt(vec) => vec.into_iter().map(|i| i as usize).collect(),
            ply::Property::ListShort(vec) => vec
                .into_iter()
                .map(|i| usize::try_from(i).unwrap_or(usize::MAX))
                .collect(),
            ply::Property::ListUShort(vec) => vec.into_iter().map(|i| i as usize).collect(),
            ply::Property::ListUChar(vec) => vec.into_iter().map(|i| i as usize).collect(),
            _ => Vec::new(),
        };
    }
}

/// Reads the vertices, normals and faces of a `.ply` file, ASCII or binary.
pub fn read_ply<P>(filepath: P) -> Result<Geometry>
where
    P: AsRef<Path>,
{
    let fptr = File::open(filepath)?;
    let mut f = BufReader::new(fptr);

    let vertex_parser = parser::Parser::<Vertex>::new();
    let header = vertex_parser.read_header(&mut f)?;

    let mut builder = GeometryBuilder::default();
    let mut has_vertices = false;
    // Elements are stored in order, the ones we don't use still have to be consumed.
    for (_ignore_key, element) in &header.elements {
        match element.name.as_ref() {
            "vertex" => {
                let vertex_vec = vertex_parser.read_payload_for_element(&mut f, element, &header)?;
                let with_normals = ["nx", "ny", "nz"]
                    .iter()
                    .all(|k| element.properties.contains_key(*k));
                for vertex in vertex_vec {
                    builder.add_point(Vector3::from(vertex.point));
                    if with_normals {
                        builder.add_normal(Vector3::from(vertex.normal));
                    }
                }
                has_vertices = true;
            }
            "face" => {
                let face_parser = parser::Parser::<Face>::new();
                let face_vec = face_parser.read_payload_for_element(&mut f, element, &header)?;
                for face in face_vec {
                    builder.add_polygon(&face.vertex_index);
                }
            }
            other => {
                debug!("Skipping ply element {other}");
                let skip_parser = parser::Parser::<DefaultElement>::new();
                skip_parser.read_payload_for_element(&mut f, element, &header)?;
            }
        }
    }

    if !has_vertices {
        return Err(Error::parser("ply file has no vertex element"));
    }
    builder.build()
}

/// Writes the geometry as an ASCII `.ply` file.
pub fn write_ply<P>(filepath: P, geom: &Geometry) -> Result<()>
where
    P: AsRef<Path>,
{
    let mut ply = {
        let mut ply = Ply::<DefaultElement>::new();
        let mut vertex_element = ElementDef::new("vertex".to_string());
        ["x", "y", "z"].iter().for_each(|key| {
            vertex_element.properties.add(PropertyDef::new(
                key.to_string(),
                PropertyType::Scalar(ScalarType::Float),
            ));
        });

        let mut vertex_array: Vec<DefaultElement> = geom
            .points
            .iter()
            .map(|point| {
                let mut elem = DefaultElement::new();
                elem.insert("x".to_string(), Property::Float(point[0]));
                elem.insert("y".to_string(), Property::Float(point[1]));
                elem.insert("z".to_string(), Property::Float(point[2]));
                elem
            })
            .collect();

        if let Some(normals) = &geom.normals {
            ["nx", "ny", "nz"].iter().for_each(|key| {
                vertex_element.properties.add(PropertyDef::new(
                    key.to_string(),
                    PropertyType::Scalar(ScalarType::Float),
                ));
            });

            for (elem, normal) in vertex_array.iter_mut().zip(normals.iter()) {
                elem.insert("nx".to_string(), Property::Float(normal[0]));
                elem.insert("ny".to_string(), Property::Float(normal[1]));
                elem.insert("nz".to_string(), Property::Float(normal[2]));
            }
        }

        ply.header.elements.add(vertex_element);
        ply.payload.insert("vertex".to_string(), vertex_array);

        if let Some(faces) = &geom.faces {
            let mut face_element = ElementDef::new("face".to_string());

            face_element.properties.add(PropertyDef::new(
                "vertex_indices".to_string(),
                PropertyType::List(ScalarType::UChar, ScalarType::Int),
            ));
            let face_array: Vec<DefaultElement> = faces
                .rows()
                .into_iter()
                .map(|face| {
                    let mut elem = DefaultElement::new();
                    elem.insert(
                        "vertex_indices".to_string(),
                        Property::ListInt(face.iter().map(|f| *f as i32).collect()),
                    );
                    elem
                })
                .collect();

            ply.header.elements.add(face_element);
            ply.payload.insert("face".to_string(), face_array);
        }

        ply.make_consistent()
            .map_err(|err| Error::parser(format!("inconsistent ply: {err:?}")))?;
        ply
    };

    ply.header.encoding = Encoding::Ascii;

    let mut buf = BufWriter::new(File::create(filepath)?);
    Writer::new().write_ply(&mut buf, &mut ply)?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::{read_ply, write_ply};
    use crate::shapes::SphereSource;
    use std::io::Write;

    #[test]
    fn should_write_the_same_as_read() {
        let sphere = SphereSource::default().generate();
        let file = tempfile::Builder::new().suffix(".ply").tempfile().unwrap();
        write_ply(file.path(), &sphere).unwrap();

        let geom = read_ply(file.path()).unwrap();
        assert_eq!(geom.len_vertices(), sphere.len_vertices());
        assert_eq!(geom.len_faces(), sphere.len_faces());
        assert!(geom.normals.is_some());
        for (read, written) in geom.points.iter().zip(sphere.points.iter()) {
            assert!((read - written).norm() < 1e-5);
        }
    }

    #[test]
    fn should_read_double_vertices_and_quads() {
        let mut file = tempfile::Builder::new().suffix(".ply").tempfile().unwrap();
        write!(
            file,
            "ply\nformat ascii 1.0\nelement vertex 4\nproperty double x\nproperty double y\n\
             property double z\nelement face 1\nproperty list uchar int vertex_indices\n\
             end_header\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n4 0 1 2 3\n"
        )
        .unwrap();

        let geom = read_ply(file.path()).unwrap();
        assert_eq!(geom.len_vertices(), 4);
        assert_eq!(geom.len_faces(), 2);
        assert!(geom.normals.is_none());
        assert_eq!(geom.points[2][1], 1.0);
    }
}
