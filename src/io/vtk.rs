use std::io::BufRead;
use std::path::Path;

use log::debug;
use nalgebra::Vector3;

use super::text::{open_text, Tokenizer};
use super::{Geometry, GeometryBuilder};
use crate::error::Result;

/// Reads a legacy ASCII `.vtk` file holding a `POLYDATA` dataset.
///
/// Both the classic cell layout (`n i0 .. in`) and the `OFFSETS`/`CONNECTIVITY`
/// layout of version 5 files are understood. Point normals are read from the
/// `POINT_DATA` section when present; every other attribute is ignored.
pub fn read_vtk<P: AsRef<Path>>(filepath: P) -> Result<Geometry> {
    let mut context = open_text(filepath)?;

    let version = context.read_line()?.unwrap_or_default();
    if !version.starts_with("# vtk DataFile") {
        return Err(context.gen_error(format!("not a legacy vtk file, got `{version}`")));
    }
    let _title = context.read_line()?;
    match context.expect_content_line("the file encoding")?.as_str() {
        "ASCII" => (),
        "BINARY" => return Err(context.gen_error("binary vtk files are not supported")),
        other => return Err(context.gen_error(format!("unknown encoding `{other}`"))),
    }

    let mut tokens = Tokenizer::new(context);
    if tokens.require("DATASET")? != "DATASET" {
        return Err(tokens.gen_error("expected the DATASET keyword"));
    }
    let dataset = tokens.require("dataset type")?;
    if dataset != "POLYDATA" {
        return Err(tokens.gen_error(format!("only POLYDATA is supported, got {dataset}")));
    }

    let mut builder = GeometryBuilder::default();
    while let Some(keyword) = tokens.next_token()? {
        match keyword.as_str() {
            "POINTS" => {
                let count = tokens.parse_next::<usize>("point count")?;
                let _data_type = tokens.require("point data type")?;
                for _ in 0..count {
                    builder.add_point(read_vector(&mut tokens, "coordinate")?);
                }
            }
            "POLYGONS" | "TRIANGLE_STRIPS" => {
                let cells = read_cells(&mut tokens)?;
                for cell in cells {
                    if keyword == "POLYGONS" {
                        builder.add_polygon(&cell);
                    } else {
                        builder.add_strip(&cell);
                    }
                }
            }
            "VERTICES" | "LINES" => {
                read_cells(&mut tokens)?;
            }
            "POINT_DATA" => {
                let count = tokens.parse_next::<usize>("point data count")?;
                read_point_normals(&mut tokens, &mut builder, count)?;
                break;
            }
            "CELL_DATA" | "METADATA" | "FIELD" => {
                debug!("Stopping at vtk section {keyword}");
                break;
            }
            other => {
                return Err(tokens.gen_error(format!("unexpected vtk keyword `{other}`")));
            }
        }
    }

    builder.build()
}

fn read_vector<R: BufRead>(tokens: &mut Tokenizer<R>, what: &str) -> Result<Vector3<f32>> {
    Ok(Vector3::new(
        tokens.parse_next(what)?,
        tokens.parse_next(what)?,
        tokens.parse_next(what)?,
    ))
}

fn read_cells<R: BufRead>(tokens: &mut Tokenizer<R>) -> Result<Vec<Vec<usize>>> {
    let num_cells = tokens.parse_next::<usize>("cell count")?;
    let size = tokens.parse_next::<usize>("cell list size")?;

    if tokens.peek()? == Some("OFFSETS") {
        // In this layout the first number counts offsets, one more than the cells.
        tokens.skip_line();
        let offsets = (0..num_cells)
            .map(|_| tokens.parse_next::<usize>("offset"))
            .collect::<Result<Vec<_>>>()?;
        if tokens.require("CONNECTIVITY")? != "CONNECTIVITY" {
            return Err(tokens.gen_error("expected the CONNECTIVITY keyword"));
        }
        tokens.skip_line();
        let connectivity = (0..size)
            .map(|_| tokens.parse_next::<usize>("vertex index"))
            .collect::<Result<Vec<_>>>()?;

        return offsets
            .windows(2)
            .map(|range| {
                connectivity
                    .get(range[0]..range[1])
                    .map(<[usize]>::to_vec)
                    .ok_or_else(|| tokens.gen_error("cell offsets are out of range"))
            })
            .collect();
    }

    let mut cells = Vec::with_capacity(num_cells);
    for _ in 0..num_cells {
        let count = tokens.parse_next::<usize>("cell size")?;
        let cell = (0..count)
            .map(|_| tokens.parse_next::<usize>("vertex index"))
            .collect::<Result<Vec<_>>>()?;
        cells.push(cell);
    }
    Ok(cells)
}

fn read_point_normals<R: BufRead>(
    tokens: &mut Tokenizer<R>,
    builder: &mut GeometryBuilder,
    count: usize,
) -> Result<()> {
    while let Some(keyword) = tokens.next_token()? {
        if keyword == "NORMALS" {
            let _name = tokens.require("normals name")?;
            let _data_type = tokens.require("normals data type")?;
            for _ in 0..count {
                builder.add_normal(read_vector(tokens, "normal component")?);
            }
            break;
        }
    }
    Ok(())
}
