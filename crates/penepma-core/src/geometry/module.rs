//! PENGEOM modules and the `.geo` document assembled from them.

use super::surface::{LINE_SIZE, Rotation, Shift, Surface, create_line};
use crate::domain::{Material, PenelopeError, PenelopeResult};
use std::f64::consts::{FRAC_PI_2, TAU};

const LINE_START: &str =
    "XXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX";
const LINE_SEPARATOR: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";
const LINE_EXTRA: &str =
    "1111111111111111111111111111111111111111111111111111111111111111";
const LINE_END: &str =
    "END      0000000000000000000000000000000000000000000000000000000";

const EXTRA_MODULE_DESCRIPTION: &str = "Extra module for rotation and tilt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub description: String,
    pub material: Material,
    surfaces: Vec<(SurfaceId, i8)>,
    children: Vec<ModuleId>,
    pub rotation: Rotation,
    pub shift: Shift,
}

impl Module {
    fn new(material: Material, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            material,
            surfaces: Vec::new(),
            children: Vec::new(),
            rotation: Rotation::default(),
            shift: Shift::default(),
        }
    }
}

/// Body of an exported geometry with its zero-based PENGEOM module index.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryBody {
    pub index: usize,
    pub material: Material,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PenelopeGeometry {
    title: String,
    pub tilt_rad: f64,
    pub rotation_rad: f64,
    surfaces: Vec<Surface>,
    modules: Vec<Module>,
}

/// File indices resolved before writing.
struct GeometryIndex {
    surface_index: Vec<Option<usize>>,
    module_order: Vec<ModuleId>,
    module_index: Vec<usize>,
    materials: Vec<Material>,
}

impl GeometryIndex {
    fn material_index(&self, material: &Material) -> usize {
        if material.is_vacuum() {
            return 0;
        }
        self.materials
            .iter()
            .position(|candidate| candidate == material)
            .map_or(0, |position| position + 1)
    }
}

impl PenelopeGeometry {
    pub fn new(title: impl Into<String>) -> PenelopeResult<Self> {
        let title = title.into();
        if title.len() > LINE_SIZE - 3 {
            return Err(PenelopeError::internal(
                "FORMAT.GEOMETRY_TITLE",
                format!(
                    "the length of the title ({}) must be less than {}",
                    title.len(),
                    LINE_SIZE - 3
                ),
            ));
        }
        Ok(Self {
            title,
            tilt_rad: 0.0,
            rotation_rad: 0.0,
            surfaces: Vec::new(),
            modules: Vec::new(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn add_surface(&mut self, surface: Surface) -> SurfaceId {
        self.surfaces.push(surface);
        SurfaceId(self.surfaces.len() - 1)
    }

    pub fn surface(&self, id: SurfaceId) -> &Surface {
        &self.surfaces[id.0]
    }

    pub fn add_module(&mut self, material: Material, description: impl Into<String>) -> ModuleId {
        self.modules.push(Module::new(material, description));
        ModuleId(self.modules.len() - 1)
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0]
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Bounds `module` by `surface`; `pointer` selects the side (`-1` or `1`).
    pub fn attach_surface(
        &mut self,
        module: ModuleId,
        surface: SurfaceId,
        pointer: i8,
    ) -> PenelopeResult<()> {
        if pointer != -1 && pointer != 1 {
            return Err(PenelopeError::internal(
                "GEOMETRY.SIDE_POINTER",
                format!("side pointer ({pointer}) must be either -1 or 1"),
            ));
        }
        let entry = &mut self.modules[module.0];
        if entry.surfaces.iter().any(|(existing, _)| *existing == surface) {
            return Err(PenelopeError::internal(
                "GEOMETRY.DUPLICATE_SURFACE",
                format!("module '{}' already contains this surface", entry.description),
            ));
        }
        entry.surfaces.push((surface, pointer));
        Ok(())
    }

    pub fn attach_module(&mut self, parent: ModuleId, child: ModuleId) -> PenelopeResult<()> {
        if parent == child {
            return Err(PenelopeError::internal(
                "GEOMETRY.SELF_MODULE",
                "cannot add a module to itself",
            ));
        }
        let entry = &mut self.modules[parent.0];
        if !entry.children.contains(&child) {
            entry.children.push(child);
        }
        Ok(())
    }

    /// Distinct non-vacuum materials, numbered from 1 in order of first use.
    pub fn materials(&self) -> Vec<Material> {
        let mut materials: Vec<Material> = Vec::new();
        for module in &self.modules {
            if !module.material.is_vacuum() && !materials.contains(&module.material) {
                materials.push(module.material.clone());
            }
        }
        materials
    }

    pub fn bodies(&self) -> Vec<GeometryBody> {
        let index = self.index();
        let mut bodies: Vec<GeometryBody> = self
            .modules
            .iter()
            .enumerate()
            .map(|(position, module)| GeometryBody {
                index: index.module_index[position],
                material: module.material.clone(),
                description: module.description.clone(),
            })
            .collect();
        bodies.sort_by_key(|body| body.index);
        bodies
    }

    fn index(&self) -> GeometryIndex {
        let mut surface_index = vec![None; self.surfaces.len()];
        let mut next_surface = 0;
        for (position, slot) in surface_index.iter_mut().enumerate() {
            let used = self.modules.iter().any(|module| {
                module
                    .surfaces
                    .iter()
                    .any(|(surface, _)| surface.0 == position)
            });
            if used {
                *slot = Some(next_surface);
                next_surface += 1;
            }
        }

        let mut module_order: Vec<ModuleId> = Vec::with_capacity(self.modules.len());
        for position in 0..self.modules.len() {
            self.visit_children_first(ModuleId(position), &mut module_order);
        }
        let mut module_index = vec![0; self.modules.len()];
        for (index, id) in module_order.iter().enumerate() {
            module_index[id.0] = index;
        }

        GeometryIndex {
            surface_index,
            module_order,
            module_index,
            materials: self.materials(),
        }
    }

    fn visit_children_first(&self, id: ModuleId, order: &mut Vec<ModuleId>) {
        if order.contains(&id) {
            return;
        }
        for child in &self.modules[id.0].children {
            self.visit_children_first(*child, order);
        }
        if !order.contains(&id) {
            order.push(id);
        }
    }

    fn module_lines(
        &self,
        module: &Module,
        index: usize,
        geometry_index: &GeometryIndex,
    ) -> PenelopeResult<Vec<String>> {
        let mut lines = vec![
            create_line(
                "MODULE",
                &format!("{:4}", index + 1),
                &format!(" {}", module.description),
            )?,
            create_line(
                "MATERIAL",
                &format!("{:4}", geometry_index.material_index(&module.material)),
                "",
            )?,
        ];

        let mut surfaces: Vec<(usize, i8)> = module
            .surfaces
            .iter()
            .filter_map(|(surface, pointer)| {
                geometry_index.surface_index[surface.0].map(|index| (index, *pointer))
            })
            .collect();
        surfaces.sort_unstable();
        for (surface_index, pointer) in surfaces {
            lines.push(create_line(
                "SURFACE",
                &format!("{:4}", surface_index + 1),
                &format!(", SIDE POINTER=({pointer:2})"),
            )?);
        }

        let mut children: Vec<usize> = module
            .children
            .iter()
            .map(|child| geometry_index.module_index[child.0])
            .collect();
        children.sort_unstable();
        for child_index in children {
            lines.push(create_line("MODULE", &format!("{:4}", child_index + 1), "")?);
        }

        lines.push(LINE_EXTRA.to_string());
        lines.extend(module.rotation.to_geo()?);
        lines.extend(module.shift.to_geo()?);
        Ok(lines)
    }

    /// Module holding every top-level module and carrying the sample tilt
    /// and rotation (ZXZ angles converted to PENGEOM's ZYZ).
    fn extra_module(&self) -> Module {
        let mut extra = Module::new(Material::vacuum(), EXTRA_MODULE_DESCRIPTION);
        for position in 0..self.modules.len() {
            let id = ModuleId(position);
            let linked = self
                .modules
                .iter()
                .any(|module| module.children.contains(&id));
            if !linked {
                extra.children.push(id);
            }
        }

        let mut tilt_rad = self.tilt_rad;
        while tilt_rad < 0.0 {
            tilt_rad += TAU;
        }
        extra.rotation = Rotation {
            omega_rad: (self.rotation_rad - FRAC_PI_2).rem_euclid(TAU),
            theta_rad: tilt_rad,
            phi_rad: FRAC_PI_2,
        };
        extra
    }

    pub fn to_geo(&self) -> PenelopeResult<Vec<String>> {
        let geometry_index = self.index();

        let mut lines = vec![
            LINE_START.to_string(),
            format!("       {}", self.title),
            LINE_SEPARATOR.to_string(),
        ];

        let mut surfaces: Vec<(usize, &Surface)> = self
            .surfaces
            .iter()
            .enumerate()
            .filter_map(|(position, surface)| {
                geometry_index.surface_index[position].map(|index| (index, surface))
            })
            .collect();
        surfaces.sort_by_key(|(index, _)| *index);
        for (index, surface) in surfaces {
            lines.extend(surface.to_geo(index)?);
            lines.push(LINE_SEPARATOR.to_string());
        }

        for (index, id) in geometry_index.module_order.iter().enumerate() {
            lines.extend(self.module_lines(&self.modules[id.0], index, &geometry_index)?);
            lines.push(LINE_SEPARATOR.to_string());
        }

        let extra = self.extra_module();
        lines.extend(self.module_lines(&extra, self.modules.len(), &geometry_index)?);
        lines.push(LINE_SEPARATOR.to_string());

        lines.push(LINE_END.to_string());
        Ok(lines)
    }
}
