use super::module::{GeometryBody, ModuleId, PenelopeGeometry, SurfaceId};
use super::surface::Surface;
use crate::domain::{ExportResult, Geometry, GeometryKind, Layer, Material, PenelopeError, PenelopeResult};
use crate::format::write_lines;
use std::path::{Path, PathBuf};

/// Radius and depth of the bounding cylinder of semi-infinite bodies.
const SUBSTRATE_EXTENT_M: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryInfo {
    pub title: String,
    pub geo_path: PathBuf,
    /// Bodies sorted by PENGEOM module index.
    pub bodies: Vec<GeometryBody>,
}

/// Material file planned for a geometry material, numbered from 1.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialFile {
    pub index: usize,
    pub material: Material,
    pub path: PathBuf,
}

impl MaterialFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub fn build_geometry(geometry: &Geometry) -> PenelopeResult<PenelopeGeometry> {
    let mut pengeom = PenelopeGeometry::new(geometry.title())?;
    pengeom.tilt_rad = geometry.tilt_rad;
    pengeom.rotation_rad = geometry.rotation_rad;

    match &geometry.kind {
        GeometryKind::Substrate { material } => build_substrate(&mut pengeom, material)?,
        GeometryKind::Inclusion {
            substrate,
            inclusion,
            inclusion_diameter_m,
        } => build_inclusion(&mut pengeom, substrate, inclusion, *inclusion_diameter_m)?,
        GeometryKind::HorizontalLayers { layers, substrate } => {
            build_horizontal_layers(&mut pengeom, layers, substrate.as_ref())?
        }
        GeometryKind::VerticalLayers {
            left_substrate,
            layers,
            right_substrate,
        } => build_vertical_layers(&mut pengeom, left_substrate, layers, right_substrate)?,
        GeometryKind::Sphere {
            material,
            diameter_m,
        } => build_sphere(&mut pengeom, material, *diameter_m)?,
    }

    Ok(pengeom)
}

/// Writes `<title>.geo` into `output_dir` and plans one `mat<i>.mat` file per
/// non-vacuum material.
pub fn export_geometry(
    geometry: &Geometry,
    output_dir: &Path,
) -> ExportResult<(GeometryInfo, Vec<MaterialFile>)> {
    let pengeom = build_geometry(geometry)?;
    let lines = pengeom.to_geo()?;

    let geo_path = output_dir.join(format!("{}.geo", pengeom.title()));
    write_lines(&geo_path, &lines, "\n").map_err(|error| {
        PenelopeError::io_system(
            "IO.GEOMETRY_WRITE",
            format!("failed to write '{}': {error}", geo_path.display()),
        )
    })?;
    tracing::info!(path = %geo_path.display(), "wrote geometry file");

    let material_files = pengeom
        .materials()
        .into_iter()
        .enumerate()
        .map(|(position, material)| MaterialFile {
            index: position + 1,
            path: output_dir.join(format!("mat{}.mat", position + 1)),
            material,
        })
        .collect();

    let info = GeometryInfo {
        title: pengeom.title().to_string(),
        geo_path,
        bodies: pengeom.bodies(),
    };
    Ok((info, material_files))
}

fn bounded_module(
    pengeom: &mut PenelopeGeometry,
    material: &Material,
    description: &str,
    bounds: &[(SurfaceId, i8)],
) -> PenelopeResult<ModuleId> {
    let module = pengeom.add_module(material.clone(), description);
    for (surface, pointer) in bounds {
        pengeom.attach_surface(module, *surface, *pointer)?;
    }
    Ok(module)
}

fn build_substrate(pengeom: &mut PenelopeGeometry, material: &Material) -> PenelopeResult<()> {
    let cylinder = pengeom.add_surface(Surface::cylinder(SUBSTRATE_EXTENT_M));
    let top = pengeom.add_surface(Surface::zplane(0.0));
    let bottom = pengeom.add_surface(Surface::zplane(-SUBSTRATE_EXTENT_M));

    bounded_module(
        pengeom,
        material,
        "Substrate",
        &[(cylinder, -1), (top, -1), (bottom, 1)],
    )?;
    Ok(())
}

fn build_inclusion(
    pengeom: &mut PenelopeGeometry,
    substrate: &Material,
    inclusion: &Material,
    diameter_m: f64,
) -> PenelopeResult<()> {
    let cylinder = pengeom.add_surface(Surface::cylinder(SUBSTRATE_EXTENT_M));
    let top = pengeom.add_surface(Surface::zplane(0.0));
    let bottom = pengeom.add_surface(Surface::zplane(-SUBSTRATE_EXTENT_M));
    let sphere = pengeom.add_surface(Surface::sphere(diameter_m / 2.0));

    let substrate_module = bounded_module(
        pengeom,
        substrate,
        "Substrate",
        &[(cylinder, -1), (top, -1), (bottom, 1)],
    )?;
    let inclusion_module =
        bounded_module(pengeom, inclusion, "Inclusion", &[(top, -1), (sphere, -1)])?;
    pengeom.attach_module(substrate_module, inclusion_module)
}

fn build_horizontal_layers(
    pengeom: &mut PenelopeGeometry,
    layers: &[Layer],
    substrate: Option<&Material>,
) -> PenelopeResult<()> {
    let cylinder = pengeom.add_surface(Surface::cylinder(SUBSTRATE_EXTENT_M));

    let mut planes = vec![pengeom.add_surface(Surface::zplane(0.0))];
    let mut zmin_m = 0.0;
    for layer in layers {
        zmin_m -= layer.thickness_m;
        planes.push(pengeom.add_surface(Surface::zplane(zmin_m)));
    }

    let mut stack: Vec<(ModuleId, SurfaceId)> = Vec::new();
    for (position, (layer, bounds)) in layers.iter().zip(planes.windows(2)).enumerate() {
        let module = bounded_module(
            pengeom,
            &layer.material,
            &format!("Layer {}", position + 1),
            &[(cylinder, -1), (bounds[0], -1), (bounds[1], 1)],
        )?;
        stack.push((module, bounds[1]));
    }

    if let Some(material) = substrate {
        let top = planes[planes.len() - 1];
        let bottom_z = pengeom.surface(top).shift.z_m - SUBSTRATE_EXTENT_M;
        let bottom = pengeom.add_surface(Surface::zplane(bottom_z));
        let module = bounded_module(
            pengeom,
            material,
            "Substrate",
            &[(cylinder, -1), (top, -1), (bottom, 1)],
        )?;
        stack.push((module, bottom));
    }

    if stack.len() <= 2 {
        return Ok(());
    }

    // Nest the stack so that each group holds one more body:
    // g0 = {m0, m1}, g1 = {m2, g0}, g2 = {m3, g1}, ...
    let top = planes[0];
    let (second, second_bottom) = stack[1];
    let mut group = bounded_module(
        pengeom,
        &Material::vacuum(),
        "grouping",
        &[(cylinder, -1), (top, -1), (second_bottom, 1)],
    )?;
    pengeom.attach_module(group, stack[0].0)?;
    pengeom.attach_module(group, second)?;

    for (module, bottom) in stack.iter().skip(2).copied() {
        let previous = group;
        group = bounded_module(
            pengeom,
            &Material::vacuum(),
            "grouping",
            &[(cylinder, -1), (top, -1), (bottom, 1)],
        )?;
        pengeom.attach_module(group, module)?;
        pengeom.attach_module(group, previous)?;
    }

    Ok(())
}

fn build_vertical_layers(
    pengeom: &mut PenelopeGeometry,
    left_substrate: &Material,
    layers: &[Layer],
    right_substrate: &Material,
) -> PenelopeResult<()> {
    let top = pengeom.add_surface(Surface::zplane(0.0));
    let bottom = pengeom.add_surface(Surface::zplane(-SUBSTRATE_EXTENT_M));

    let total_thickness_m: f64 = layers.iter().map(|layer| layer.thickness_m).sum();
    let mut x_m = -total_thickness_m / 2.0;
    let mut planes = vec![pengeom.add_surface(Surface::xplane(x_m))];
    for layer in layers {
        x_m += layer.thickness_m;
        planes.push(pengeom.add_surface(Surface::xplane(x_m)));
    }

    let cylinder = pengeom.add_surface(Surface::cylinder(
        SUBSTRATE_EXTENT_M + 3.0 * total_thickness_m,
    ));

    bounded_module(
        pengeom,
        left_substrate,
        "Left substrate",
        &[(cylinder, -1), (top, -1), (bottom, 1), (planes[0], -1)],
    )?;

    for (position, (layer, bounds)) in layers.iter().zip(planes.windows(2)).enumerate() {
        bounded_module(
            pengeom,
            &layer.material,
            &format!("Layer {}", position + 1),
            &[
                (cylinder, -1),
                (top, -1),
                (bottom, 1),
                (bounds[0], 1),
                (bounds[1], -1),
            ],
        )?;
    }

    bounded_module(
        pengeom,
        right_substrate,
        "Right substrate",
        &[
            (cylinder, -1),
            (top, -1),
            (bottom, 1),
            (planes[planes.len() - 1], 1),
        ],
    )?;
    Ok(())
}

fn build_sphere(
    pengeom: &mut PenelopeGeometry,
    material: &Material,
    diameter_m: f64,
) -> PenelopeResult<()> {
    let radius_m = diameter_m / 2.0;
    let sphere = pengeom.add_surface(Surface::sphere(radius_m));
    let module = bounded_module(pengeom, material, "Sphere", &[(sphere, -1)])?;
    pengeom.module_mut(module).shift.z_m = -radius_m;
    Ok(())
}
