use slotmap::SlotMap;
use tracing::{info, warn};

use super::section::{Section, SectionId, SectionState};
use crate::error::{InputError, Result};
use crate::geometry::{PointCloud, Polyline};
use crate::math::VerticalAxis;
use crate::operations::extract::{
    BatchReport, CancelToken, ExtractSections, ExtractionParams, ProgressSink,
};
use crate::operations::sections::{GenerateOrthoSections, OrthoSectionParams};

/// Result of [`SectionPool::generate_ortho_sections`].
#[derive(Debug)]
pub struct OrthoGeneration {
    /// The path, when it was persisted and removed from the pool.
    pub generatrix: Option<Section>,
    /// The new provisional sections, in abscissa order.
    pub sections: Vec<SectionId>,
}

/// Result of [`SectionPool::extract`].
#[derive(Debug)]
pub struct PoolExtraction {
    pub report: BatchReport,
    /// Section id of each batch position (`SliceOutput::section`).
    pub section_ids: Vec<SectionId>,
}

/// Working set of sections and clouds for an extraction session.
///
/// Sections are stored in an arena and referenced by [`SectionId`]. Clouds
/// are only ever added.
#[derive(Debug, Default)]
pub struct SectionPool {
    sections: SlotMap<SectionId, Section>,
    clouds: Vec<PointCloud>,
    axis: VerticalAxis,
    selected: Option<SectionId>,
}

impl SectionPool {
    /// Creates a new, empty pool with Z as the vertical axis.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn vertical_axis(&self) -> VerticalAxis {
        self.axis
    }

    pub fn set_vertical_axis(&mut self, axis: VerticalAxis) {
        self.axis = axis;
    }

    // --- Cloud operations ---

    /// Adds a cloud and returns its position.
    pub fn add_cloud(&mut self, cloud: PointCloud) -> usize {
        self.clouds.push(cloud);
        self.clouds.len() - 1
    }

    #[must_use]
    pub fn clouds(&self) -> &[PointCloud] {
        &self.clouds
    }

    // --- Section operations ---

    /// Adds a section polyline.
    ///
    /// A polyline in 2D mode is lifted to 3D first: every vertex gets, as its
    /// vertical coordinate, the highest vertical bound of the pool's clouds
    /// (0 without clouds).
    ///
    /// # Errors
    ///
    /// Returns `InputError::TooFewVertices` if the polyline has fewer than 2 vertices.
    pub fn add_polyline(&mut self, mut polyline: Polyline, state: SectionState) -> Result<SectionId> {
        polyline.validate()?;
        if polyline.mode_2d {
            let v = self.axis.index();
            let height = self
                .clouds
                .iter()
                .filter_map(PointCloud::bounding_box)
                .map(|bb| bb.max[v])
                .reduce(f64::max)
                .unwrap_or(0.0);
            for p in &mut polyline.vertices {
                p[v] = height;
            }
            polyline.mode_2d = false;
        }
        Ok(self.sections.insert(Section::new(polyline, state)))
    }

    /// Returns a reference to the section, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns `InputError::UnknownSection` if the id is not in the pool.
    pub fn section(&self, id: SectionId) -> Result<&Section, InputError> {
        self.sections.get(id).ok_or(InputError::UnknownSection)
    }

    /// Removes a section and returns it. Clears the selection if it pointed to it.
    ///
    /// # Errors
    ///
    /// Returns `InputError::UnknownSection` if the id is not in the pool.
    pub fn remove(&mut self, id: SectionId) -> Result<Section, InputError> {
        let section = self.sections.remove(id).ok_or(InputError::UnknownSection)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Ok(section)
    }

    /// Selects a section.
    ///
    /// # Errors
    ///
    /// Returns `InputError::UnknownSection` if the id is not in the pool.
    pub fn select(&mut self, id: SectionId) -> Result<(), InputError> {
        if !self.sections.contains_key(id) {
            return Err(InputError::UnknownSection);
        }
        self.selected = Some(id);
        Ok(())
    }

    #[must_use]
    pub fn selected(&self) -> Option<SectionId> {
        self.selected
    }

    pub fn iter(&self) -> impl Iterator<Item = (SectionId, &Section)> {
        self.sections.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Marks every provisional section as persisted. Returns how many changed.
    pub fn export_sections(&mut self) -> usize {
        let mut exported = 0;
        for section in self.sections.values_mut() {
            if section.state == SectionState::Provisional {
                section.state = SectionState::Persisted;
                exported += 1;
            }
        }
        if exported == 0 {
            warn!("all sections are already persisted");
        } else {
            info!(exported, "sections exported");
        }
        exported
    }

    /// Generates orthogonal sections along section `id` and adds them as
    /// provisional sections.
    ///
    /// With `persist_and_remove`, the path is marked persisted, removed from
    /// the pool and handed back in [`OrthoGeneration::generatrix`].
    ///
    /// # Errors
    ///
    /// - `InputError::UnknownSection` if the id is not in the pool
    /// - errors of [`GenerateOrthoSections::execute`]
    pub fn generate_ortho_sections(
        &mut self,
        id: SectionId,
        params: OrthoSectionParams,
        persist_and_remove: bool,
    ) -> Result<OrthoGeneration> {
        let path = &self.section(id)?.polyline;
        let generated = GenerateOrthoSections::new(path, self.axis, params).execute()?;

        let generatrix = if persist_and_remove {
            let mut section = self.remove(id)?;
            section.state = SectionState::Persisted;
            Some(section)
        } else {
            None
        };

        let sections = generated
            .into_iter()
            .map(|poly| self.sections.insert(Section::new(poly, SectionState::Provisional)))
            .collect();
        Ok(OrthoGeneration {
            generatrix,
            sections,
        })
    }

    /// Extracts every section of the pool from every cloud.
    ///
    /// The pool's vertical axis overrides `params.axis`.
    ///
    /// # Errors
    ///
    /// Returns the batch-level errors of [`ExtractSections::execute`].
    pub fn extract(
        &self,
        params: ExtractionParams,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<PoolExtraction> {
        let params = ExtractionParams {
            axis: self.axis,
            ..params
        };
        let section_ids: Vec<SectionId> = self.sections.keys().collect();
        let report = ExtractSections::new(
            self.sections.values().map(|s| &s.polyline),
            &self.clouds,
            params,
        )
        .execute(progress, cancel)?;
        Ok(PoolExtraction {
            report,
            section_ids,
        })
    }
}
