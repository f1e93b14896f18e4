mod geometry;
pub use geometry::{Geometry, GeometryBuilder};
mod text;

mod byu;
pub use byu::read_byu;
mod obj;
pub use obj::read_obj;
mod off;
pub use off::read_off;
mod ply;
pub use ply::{read_ply, write_ply};
mod stl;
pub use stl::read_stl;
mod vtk;
pub use vtk::read_vtk;
mod vtp;
pub use vtp::read_vtp;

use std::path::Path;

use log::{info, warn};

use crate::error::{Error, Result};
use crate::shapes::SphereSource;

/// The mesh file formats with a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Ply,
    Vtp,
    Obj,
    Stl,
    Vtk,
    Byu,
    Off,
}

/// Extension (lowercase) to format table.
const FORMATS: [(&str, MeshFormat); 7] = [
    ("ply", MeshFormat::Ply),
    ("vtp", MeshFormat::Vtp),
    ("obj", MeshFormat::Obj),
    ("stl", MeshFormat::Stl),
    ("vtk", MeshFormat::Vtk),
    ("g", MeshFormat::Byu),
    ("off", MeshFormat::Off),
];

impl MeshFormat {
    /// Looks up the format by the file extension, case insensitive.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?.to_lowercase();
        FORMATS
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, format)| *format)
    }

    pub fn extension(self) -> &'static str {
        FORMATS
            .iter()
            .find(|(_, format)| *format == self)
            .map_or("", |(ext, _)| *ext)
    }

    pub fn read<P: AsRef<Path>>(self, path: P) -> Result<Geometry> {
        let path = path.as_ref();
        match self {
            MeshFormat::Ply => read_ply(path),
            MeshFormat::Vtp => read_vtp(path),
            MeshFormat::Obj => read_obj(path),
            MeshFormat::Stl => read_stl(path),
            MeshFormat::Vtk => read_vtk(path),
            MeshFormat::Byu => read_byu(path),
            MeshFormat::Off => read_off(path),
        }
    }
}

/// Reads a mesh, choosing the reader by the file extension.
///
/// Fails with `UnsupportedFormat` when no reader handles the extension and
/// with `InvalidInput` when the file does not exist.
pub fn read_geometry<P: AsRef<Path>>(path: P) -> Result<(Geometry, MeshFormat)> {
    let path = path.as_ref();
    let format = MeshFormat::from_path(path).ok_or_else(|| {
        Error::UnsupportedFormat(format!(
            "{}: no reader for the extension `{}`",
            path.display(),
            path.extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_default()
        ))
    })?;
    if !path.is_file() {
        return Err(Error::invalid_input(format!(
            "{}: file not found",
            path.display()
        )));
    }

    let geometry = format.read(path)?;
    Ok((geometry, format))
}

/// Where a loaded point set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    File(MeshFormat),
    /// The extension had no reader and the default shape was generated.
    DefaultShape,
}

/// Reads `path`, substituting `default` when its extension is unsupported.
///
/// Every other failure is returned, including files without points.
pub fn load_or_default<P: AsRef<Path>>(
    path: P,
    default: &SphereSource,
) -> Result<(Geometry, LoadOutcome)> {
    let path = path.as_ref();
    match read_geometry(path) {
        Ok((geometry, format)) => {
            if geometry.len_vertices() == 0 {
                return Err(Error::invalid_input(format!(
                    "{}: file has no points",
                    path.display()
                )));
            }
            info!(
                "Loaded {} with {} points and {} faces",
                path.display(),
                geometry.len_vertices(),
                geometry.len_faces()
            );
            Ok((geometry, LoadOutcome::File(format)))
        }
        Err(Error::UnsupportedFormat(msg)) => {
            warn!("{msg}, using a sphere instead");
            Ok((default.generate(), LoadOutcome::DefaultShape))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("mesh.ply", Some(MeshFormat::Ply))]
    #[case("mesh.VTP", Some(MeshFormat::Vtp))]
    #[case("dir.v2/mesh.Obj", Some(MeshFormat::Obj))]
    #[case("mesh.stl", Some(MeshFormat::Stl))]
    #[case("mesh.vtk", Some(MeshFormat::Vtk))]
    #[case("mesh.g", Some(MeshFormat::Byu))]
    #[case("mesh.off", Some(MeshFormat::Off))]
    #[case("mesh.xyz", None)]
    #[case("mesh", None)]
    fn test_format_lookup(#[case] path: &str, #[case] expected: Option<MeshFormat>) {
        assert_eq!(MeshFormat::from_path(path), expected);
        if let Some(format) = expected {
            assert_eq!(
                MeshFormat::from_path(format!("x.{}", format.extension())),
                expected
            );
        }
    }

    #[test]
    fn test_unsupported_extension_gives_sphere() {
        let sphere = SphereSource::default();
        let (geometry, outcome) = load_or_default("no/such/file.xyz", &sphere).unwrap();
        assert_eq!(outcome, LoadOutcome::DefaultShape);
        assert_eq!(geometry.len_vertices(), 50);

        assert!(matches!(
            read_geometry("no/such/file.xyz"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_is_invalid_input() {
        let result = load_or_default("no/such/file.ply", &SphereSource::default());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_empty_file_is_invalid_input() {
        let file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        let result = load_or_default(file.path(), &SphereSource::default());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_loads_by_extension() {
        let file = tempfile::Builder::new().suffix(".PLY").tempfile().unwrap();
        write_ply(file.path(), &SphereSource::default().radius(2.0).generate()).unwrap();

        let (geometry, outcome) = load_or_default(file.path(), &SphereSource::default()).unwrap();
        assert_eq!(outcome, LoadOutcome::File(MeshFormat::Ply));
        assert!((geometry.points[0].norm() - 2.0).abs() < 1e-5);
    }
}
