use crate::common::config::ProgramSettings;
use crate::common::constants::{
    DUMP_FILENAME, MAX_DEPTH_CHANNELS, MAX_PHOTON_DETECTOR_CHANNEL, MAX_SPATIAL_DISTRIBUTION,
    MIN_DEPTH_RANGE_M, UNLIMITED,
};
use crate::common::units::m_to_cm;
use crate::domain::{
    AngularWindow, Detector, ExportResult, Material, Options, PenelopeError, PenelopeResult,
    SimulationProgram, Transition,
};
use crate::format::format_exponent_c;
use crate::format::keyword::{self, KeywordValue};
use crate::geometry::{GeometryInfo, MaterialFile};
use crate::indexing::DetectorIndexMap;
use crate::material::{
    MaterialFileWriter, MaterialPropertySource, PendbaseMaterialTool, TabulatedPropertySource,
    correct_forcer,
};
use crate::modules::sections::{
    ExportReport, InputFileBuilder, append_electron_beam, append_geometry, append_material_data,
    append_title,
};
use crate::modules::traits::ProgramExporter;
use crate::transitions::{EmptyTransitionCatalog, TransitionCatalog, photon_range_m};
use std::collections::BTreeSet;
use std::path::Path;

/// Safety factor applied to the x-ray range when sizing the depth grid.
const DEPTH_RANGE_FACTOR: f64 = 3.0;

/// Writes PENEPMA `.in` files.
///
/// Material files are created through `materials`, material properties for
/// forcer correction are read through `properties`, and depth-distribution lines are discovered through `catalog` when the
/// photon-depth detector lists none.
pub struct PenepmaExporter {
    settings: ProgramSettings,
    catalog: Box<dyn TransitionCatalog>,
    properties: Box<dyn MaterialPropertySource>,
    materials: Box<dyn MaterialFileWriter>,
}

impl PenepmaExporter {
    pub fn new(settings: ProgramSettings) -> Self {
        let materials = Box::new(PendbaseMaterialTool::new(settings.pendbase_dir.clone()));
        Self {
            settings,
            catalog: Box::new(EmptyTransitionCatalog),
            properties: Box::new(TabulatedPropertySource),
            materials,
        }
    }

    pub fn with_material_writer(mut self, materials: impl MaterialFileWriter + 'static) -> Self {
        self.materials = Box::new(materials);
        self
    }

    pub fn with_catalog(mut self, catalog: impl TransitionCatalog + 'static) -> Self {
        self.catalog = Box::new(catalog);
        self
    }

    pub fn with_property_source(mut self, properties: impl MaterialPropertySource + 'static) -> Self {
        self.properties = Box::new(properties);
        self
    }

    pub fn settings(&self) -> &ProgramSettings {
        &self.settings
    }

    fn append_interaction_forcing(
        &self,
        builder: &mut InputFileBuilder,
        options: &Options,
        geometry: &GeometryInfo,
        material_files: &[MaterialFile],
    ) -> PenelopeResult<()> {
        builder.comment(keyword::INTERACTION_FORCING)?;

        for body in &geometry.bodies {
            if body.material.is_vacuum() {
                continue;
            }

            for forcing in &body.material.interaction_forcings {
                let forcer = if forcing.forcer < 0.0 {
                    let material_path = material_file_for(material_files, &body.material)?;
                    let properties = self.properties.properties_for(material_path)?;
                    correct_forcer(forcing, options.beam.energy_ev, properties.as_ref())?
                } else {
                    forcing.forcer
                };

                builder.keyword(
                    keyword::IFORCE,
                    &[
                        (body.index + 1).into(),
                        forcing.particle.kpar().into(),
                        forcing.icol()?.into(),
                        forcer.into(),
                        forcing.weight.0.into(),
                        forcing.weight.1.into(),
                    ],
                )?;
            }
        }

        builder.skip()
    }

    fn append_spatial_distribution(
        &self,
        builder: &mut InputFileBuilder,
        options: &Options,
        index_map: &DetectorIndexMap,
    ) -> PenelopeResult<()> {
        builder.comment(keyword::SPATIAL_DISTRIBUTION)?;

        let Some((key, channels, explicit)) = single_depth_detector(options)? else {
            return builder.skip();
        };

        let materials = options.geometry.materials();
        let mut transitions = if explicit.is_empty() {
            self.discover_transitions(options, &materials)
        } else {
            explicit.to_vec()
        };

        if transitions.is_empty() {
            builder.warn(
                "EXPORT.NO_TRANSITIONS",
                "No transition found for PRZ distribution with high enough probability",
            );
            return builder.skip();
        }

        let max_transitions = MAX_SPATIAL_DISTRIBUTION / 2;
        if transitions.len() > max_transitions {
            builder.warn(
                "EXPORT.TRANSITIONS_TRUNCATED",
                format!(
                    "Too many transitions ({}). Only the most probable are kept.",
                    transitions.len()
                ),
            );
            transitions.truncate(max_transitions);
        }

        tracing::debug!(
            transitions = %transitions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            "depth distribution transitions"
        );

        let zmax_m = self.depth_extent_m(options.beam.energy_ev, &materials, &transitions);
        let file_index = index_map.file_index_of(key).ok_or_else(|| {
            PenelopeError::internal(
                "EXPORT.DEPTH_DETECTOR_INDEX",
                format!("photon depth detector '{key}' has no detector index"),
            )
        })?;

        builder.keyword(keyword::GRIDX, &[(-3).into(), 3.into(), 1.into()])?;
        builder.keyword(keyword::GRIDY, &[(-3).into(), 3.into(), 1.into()])?;
        builder.keyword(
            keyword::GRIDZ,
            &[
                (-m_to_cm(zmax_m)).into(),
                0.into(),
                channels.min(MAX_DEPTH_CHANNELS).into(),
            ],
        )?;

        for transition in &transitions {
            builder.keyword(keyword::XRLINE, &[transition.code().into(), 0.into()])?;
            builder.keyword(
                keyword::XRLINE,
                &[transition.code().into(), file_index.into()],
            )?;
        }

        builder.skip()
    }

    /// Catalog transitions of every element between the lowest electron
    /// absorption energy and the beam energy, most probable first.
    fn discover_transitions(&self, options: &Options, materials: &[&Material]) -> Vec<Transition> {
        let elements: BTreeSet<u8> = materials
            .iter()
            .flat_map(|material| material.elements())
            .collect();
        let energy_low_ev = materials
            .iter()
            .map(|material| material.absorption_energy_ev.electron)
            .fold(f64::INFINITY, f64::min);
        let energy_high_ev = options.beam.energy_ev;

        let mut candidates: Vec<_> = elements
            .into_iter()
            .flat_map(|z| self.catalog.transitions_for(z, energy_low_ev, energy_high_ev))
            .collect();
        candidates.sort_by(|a, b| b.probability.total_cmp(&a.probability));

        candidates
            .iter()
            .filter_map(|candidate| candidate.transition())
            .collect()
    }

    fn depth_extent_m(
        &self,
        beam_energy_ev: f64,
        materials: &[&Material],
        transitions: &[Transition],
    ) -> f64 {
        let mut zmax_m = MIN_DEPTH_RANGE_M;
        for material in materials {
            for transition in transitions {
                let edge_energy_ev = self.catalog.edge_energy_ev(transition).unwrap_or(0.0);
                let range_m = photon_range_m(beam_energy_ev, material, edge_energy_ev);
                zmax_m = zmax_m.max(range_m * DEPTH_RANGE_FACTOR);
            }
        }
        zmax_m
    }

    fn append_job_properties(
        &self,
        builder: &mut InputFileBuilder,
        options: &Options,
        index_map: &DetectorIndexMap,
    ) -> PenelopeResult<()> {
        builder.comment(keyword::JOB_PROPERTIES)?;
        builder.keyword(keyword::RESUME, &[DUMP_FILENAME.into()])?;
        builder.keyword(keyword::DUMPTO, &[DUMP_FILENAME.into()])?;
        builder.keyword(keyword::DUMPP, &[self.settings.dump_period_s.into()])?;
        builder.skip()?;

        if let Some((transition, file_index, uncertainty)) = reference_line(options, index_map)? {
            builder.keyword(
                keyword::REFLIN,
                &[
                    transition.code().into(),
                    file_index.into(),
                    uncertainty.into(),
                ],
            )?;
        }

        let showers = options
            .showers_limit()
            .map_or(UNLIMITED, |showers| showers as f64);
        builder.keyword(keyword::NSIMSH, &[format_exponent_c(showers).into()])?;

        let time_s = options.time_limit_s().unwrap_or(UNLIMITED);
        builder.keyword(keyword::TIME, &[format_exponent_c(time_s).into()])?;

        builder.skip()
    }
}

impl ProgramExporter for PenepmaExporter {
    fn program(&self) -> SimulationProgram {
        SimulationProgram::Penepma
    }

    fn validate(&self, options: &Options) -> ExportResult<()> {
        options.validate()?;

        if let Some((key, detector)) = options
            .detectors
            .iter()
            .find(|(_, detector)| matches!(detector, Detector::Trajectory { .. }))
        {
            return Err(PenelopeError::input_validation(
                "INPUT.UNSUPPORTED_DETECTOR",
                format!(
                    "PENEPMA does not support {} detector '{key}'",
                    detector.kind_name()
                ),
            ));
        }

        let index_map = DetectorIndexMap::resolve(&options.detectors);
        index_map.ensure_within_limit()?;
        single_depth_detector(options)?;
        reference_line(options, &index_map)?;
        Ok(())
    }

    fn material_writer(&self) -> &dyn MaterialFileWriter {
        self.materials.as_ref()
    }

    fn export_input_file(
        &self,
        options: &Options,
        output_dir: &Path,
        geometry: &GeometryInfo,
        material_files: &[MaterialFile],
    ) -> ExportResult<ExportReport> {
        // The importer resolves the same map from the same options, so file
        // indices agree without being stored.
        let index_map = DetectorIndexMap::resolve(&options.detectors);

        let mut builder = InputFileBuilder::new();
        append_title(&mut builder, options)?;
        append_electron_beam(&mut builder, options, false)?;
        append_material_data(&mut builder, material_files)?;
        append_geometry(&mut builder, geometry)?;
        self.append_interaction_forcing(&mut builder, options, geometry, material_files)?;
        append_emerging_particles_distribution(&mut builder, options)?;
        append_photon_detectors(&mut builder, options, &index_map)?;
        self.append_spatial_distribution(&mut builder, options, &index_map)?;
        self.append_job_properties(&mut builder, options, &index_map)?;
        builder.keyword(keyword::END, &[])?;

        let input_path = output_dir.join(format!("{}.in", options.name));
        let warnings = builder.write(&input_path)?;

        Ok(ExportReport {
            input_path,
            geometry_path: geometry.geo_path.clone(),
            material_files: material_files.to_vec(),
            warnings,
        })
    }
}

fn material_file_for<'a>(
    material_files: &'a [MaterialFile],
    material: &Material,
) -> PenelopeResult<&'a Path> {
    material_files
        .iter()
        .find(|file| &file.material == material)
        .map(|file| file.path.as_path())
        .ok_or_else(|| {
            PenelopeError::internal(
                "EXPORT.MATERIAL_FILE",
                format!("no material file planned for material '{}'", material.name),
            )
        })
}

/// The photon-depth detector, if any: key, channels and explicit transitions.
fn single_depth_detector(options: &Options) -> PenelopeResult<Option<(&str, usize, &[Transition])>> {
    let mut depth_detectors = options
        .detectors
        .iter()
        .filter_map(|(key, detector)| match detector {
            Detector::PhotonDepth {
                channels,
                transitions,
                ..
            } => Some((key, *channels, transitions.as_slice())),
            _ => None,
        });

    let first = depth_detectors.next();
    if depth_detectors.next().is_some() {
        return Err(PenelopeError::format_limit(
            "FORMAT.PHOTON_DEPTH_DETECTORS",
            "PENEPMA can only have one photon depth detector",
        ));
    }
    Ok(first)
}

/// Transition, one-based detector index and tolerance of the `REFLIN` line.
fn reference_line(
    options: &Options,
    index_map: &DetectorIndexMap,
) -> PenelopeResult<Option<(Transition, usize, f64)>> {
    let Some((transition, detector_key, uncertainty)) = options.uncertainty_limit() else {
        return Ok(None);
    };

    let file_index = index_map.file_index_of(detector_key).ok_or_else(|| {
        PenelopeError::input_validation(
            "INPUT.LIMIT_DETECTOR",
            format!(
                "uncertainty limit refers to '{detector_key}', which is not a photon detector"
            ),
        )
    })?;
    Ok(Some((*transition, file_index, uncertainty)))
}

fn append_emerging_particles_distribution(
    builder: &mut InputFileBuilder,
    options: &Options,
) -> PenelopeResult<()> {
    builder.comment(keyword::EMERGING_DISTRIBUTION)?;

    let energy_detectors: Vec<(usize, (f64, f64))> = options
        .detectors
        .iter()
        .filter_map(|(_, detector)| match detector {
            Detector::BackscatteredElectronEnergy {
                channels,
                limits_ev,
            }
            | Detector::TransmittedElectronEnergy {
                channels,
                limits_ev,
            } => Some((*channels, *limits_ev)),
            _ => None,
        })
        .collect();

    if !energy_detectors.is_empty() {
        let low_ev = energy_detectors
            .iter()
            .map(|(_, limits)| limits.0)
            .fold(f64::INFINITY, f64::min);
        let high_ev = energy_detectors
            .iter()
            .map(|(_, limits)| limits.1)
            .fold(f64::NEG_INFINITY, f64::max);
        let channels = energy_detectors
            .iter()
            .map(|(channels, _)| *channels)
            .max()
            .unwrap_or(1);

        builder.keyword(
            keyword::NBE,
            &[low_ev.into(), high_ev.into(), channels.into()],
        )?;
    }

    builder.skip()
}

/// Spectrum settings of one PENEPMA photon detector.
struct PhotonDetectorSetup<'a> {
    window: &'a AngularWindow,
    channels: usize,
    limits_ev: (f64, f64),
}

fn append_photon_detectors(
    builder: &mut InputFileBuilder,
    options: &Options,
    index_map: &DetectorIndexMap,
) -> PenelopeResult<()> {
    builder.comment(keyword::PHOTON_DETECTORS)?;
    index_map.ensure_within_limit()?;

    for (index, keys) in index_map.iter() {
        let detectors: Vec<&Detector> = keys
            .iter()
            .filter_map(|key| options.detectors.get(key))
            .collect();

        let setup = detectors
            .iter()
            .find_map(|detector| match detector {
                Detector::PhotonSpectrum {
                    window,
                    channels,
                    limits_ev,
                } => Some(PhotonDetectorSetup {
                    window,
                    channels: *channels,
                    limits_ev: *limits_ev,
                }),
                _ => None,
            })
            .or_else(|| {
                detectors
                    .iter()
                    .find_map(|detector| detector.window())
                    .map(|window| PhotonDetectorSetup {
                        window,
                        channels: MAX_PHOTON_DETECTOR_CHANNEL,
                        limits_ev: (0.0, options.beam.energy_ev),
                    })
            })
            .ok_or_else(|| {
                PenelopeError::internal(
                    "EXPORT.PHOTON_DETECTOR",
                    format!("detector index {} has no delimited detector", index + 1),
                )
            })?;

        tracing::debug!(
            index = index + 1,
            channels = setup.channels,
            "photon detector settings"
        );

        // PENELOPE measures polar angles from the +z axis.
        let elevation_deg = setup.window.elevation_deg();
        let theta_low = 90.0 - elevation_deg.0;
        let theta_high = 90.0 - elevation_deg.1;
        let azimuth_deg = setup.window.azimuth_deg();

        let mut channels = setup.channels;
        if channels > MAX_PHOTON_DETECTOR_CHANNEL {
            builder.warn(
                "EXPORT.PHOTON_DETECTOR_CHANNELS",
                format!(
                    "Number of channel of photon detector ({channels}) exceeds PENEPMA limit \
                     ({MAX_PHOTON_DETECTOR_CHANNEL}). The limit is enforced."
                ),
            );
            channels = MAX_PHOTON_DETECTOR_CHANNEL;
        }

        builder.note(&format!("Detector {} used by {}", index + 1, keys.join(", ")));
        builder.keyword(
            keyword::PDANGL,
            &[
                theta_low.min(theta_high).into(),
                theta_low.max(theta_high).into(),
                azimuth_deg.0.into(),
                azimuth_deg.1.into(),
                KeywordValue::Int(0),
            ],
        )?;
        builder.keyword(
            keyword::PDENER,
            &[
                setup.limits_ev.0.into(),
                setup.limits_ev.1.into(),
                channels.into(),
            ],
        )?;
        builder.skip()?;
    }

    Ok(())
}
