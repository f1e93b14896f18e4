use std::path::PathBuf;

use clap::Parser;
use polyalign::{
    io::{load_or_default, write_ply},
    metrics::TransformMetrics,
    pointcloud::PointCloud,
    registration::{Registration, RegistrationParams},
    shapes::SphereSource,
};

#[derive(Parser)]
#[clap(version, about)]
struct Args {
    /// Mesh to move: .ply, .vtp, .obj, .stl, .vtk, .g or .off. Other extensions use a sphere
    source: PathBuf,
    /// Fixed mesh, same formats as the source
    target: PathBuf,
    /// JSON file with registration parameters
    #[clap(long)]
    params: Option<PathBuf>,
    /// Writes the aligned source as a .ply file
    #[clap(long, short)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let args = Args::parse();

    let params = match &args.params {
        Some(path) => RegistrationParams::from_json_file(path)?,
        None => RegistrationParams::default(),
    };

    let default_shape = SphereSource::default();
    let (source, _) = load_or_default(&args.source, &default_shape)?;
    let (target, _) = load_or_default(&args.target, &default_shape)?;
    let source = PointCloud::from_geometry(source);
    let target = PointCloud::from_geometry(target);

    let report = Registration::new(params).run(source, &target)?;

    for candidate in &report.box_alignment.candidates {
        println!("{candidate}");
    }
    println!("{}", report.distances_line());
    println!("{}", report.strategy);
    println!(
        "Transform: {}",
        TransformMetrics::magnitude(&report.transform)
    );

    if let Some(output) = args.output {
        write_ply(output, &report.aligned.into())?;
    }

    Ok(())
}
