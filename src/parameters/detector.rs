/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Detector geometry
//!
//! Panels are written to and read from CrystFEL `.geom` text, the format
//! consumed by `pattern_sim`.

use super::errors::{ParametersError, Result};
use crate::s2e::{Dataset, Group};
use crate::utils::{check_positive, Length};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// File name used when a geometry given as panels is written out
pub const GEOMETRY_FILE_NAME: &str = "detector.geom";

/// A rectangular detector panel with axes along the lab x and y directions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorPanel {
    pub fast_scan_min: u32,
    pub fast_scan_max: u32,
    pub slow_scan_min: u32,
    pub slow_scan_max: u32,
    pub pixel_size: Length,
    /// ADU per detected photon
    pub photon_response: f64,
    pub distance_from_interaction_plane: Length,
    /// Position of the first pixel's corner, in pixels
    pub corners: [f64; 2],
    #[serde(default)]
    pub saturation_adu: Option<f64>,
}

impl DetectorPanel {
    /// Square panel of `pixels` x `pixels` centered on the beam
    pub fn square(pixels: u32, pixel_size: Length, distance: Length) -> Result<Self> {
        if pixels == 0 {
            return Err(ParametersError::invalid("pixels", "must be at least 1"));
        }
        let half = pixels as f64 / 2.0;
        let panel = Self {
            fast_scan_min: 0,
            fast_scan_max: pixels - 1,
            slow_scan_min: 0,
            slow_scan_max: pixels - 1,
            pixel_size,
            photon_response: 1.0,
            distance_from_interaction_plane: distance,
            corners: [-half, -half],
            saturation_adu: None,
        };
        panel.validate()?;
        Ok(panel)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fast_scan_max < self.fast_scan_min {
            return Err(ParametersError::invalid(
                "fast_scan_max",
                "must not be smaller than fast_scan_min",
            ));
        }
        if self.slow_scan_max < self.slow_scan_min {
            return Err(ParametersError::invalid(
                "slow_scan_max",
                "must not be smaller than slow_scan_min",
            ));
        }
        check_positive("pixel_size", self.pixel_size.meters())?;
        check_positive("photon_response", self.photon_response)?;
        check_positive(
            "distance_from_interaction_plane",
            self.distance_from_interaction_plane.meters(),
        )?;
        if self.corners.iter().any(|c| !c.is_finite()) {
            return Err(ParametersError::invalid("corners", "must be finite"));
        }
        if let Some(saturation) = self.saturation_adu {
            check_positive("saturation_adu", saturation)?;
        }
        Ok(())
    }

    /// Zero for an inverted range
    pub fn fast_scan_pixels(&self) -> u64 {
        pixel_count(self.fast_scan_min, self.fast_scan_max)
    }

    pub fn slow_scan_pixels(&self) -> u64 {
        pixel_count(self.slow_scan_min, self.slow_scan_max)
    }
}

fn pixel_count(min: u32, max: u32) -> u64 {
    (u64::from(max) + 1).saturating_sub(u64::from(min))
}

/// A detector made of one or more panels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorGeometry {
    pub panels: Vec<DetectorPanel>,
}

impl DetectorGeometry {
    pub fn new(panels: Vec<DetectorPanel>) -> Result<Self> {
        let geometry = Self { panels };
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn validate(&self) -> Result<()> {
        if self.panels.is_empty() {
            return Err(ParametersError::invalid("panels", "at least one panel is required"));
        }
        self.panels.iter().try_for_each(DetectorPanel::validate)
    }

    /// CrystFEL geometry text; panels are named `p0`, `p1`, ...
    pub fn to_geom_string(&self) -> String {
        let mut text = String::from("; CrystFEL geometry file written by simex-rs\n");
        // writing to a String cannot fail
        for (index, panel) in self.panels.iter().enumerate() {
            let name = format!("p{}", index);
            let _ = writeln!(text);
            let _ = writeln!(text, "{}/min_fs = {}", name, panel.fast_scan_min);
            let _ = writeln!(text, "{}/max_fs = {}", name, panel.fast_scan_max);
            let _ = writeln!(text, "{}/min_ss = {}", name, panel.slow_scan_min);
            let _ = writeln!(text, "{}/max_ss = {}", name, panel.slow_scan_max);
            let _ = writeln!(text, "{}/corner_x = {}", name, panel.corners[0]);
            let _ = writeln!(text, "{}/corner_y = {}", name, panel.corners[1]);
            let _ = writeln!(text, "{}/fs = +1.0x", name);
            let _ = writeln!(text, "{}/ss = +1.0y", name);
            let _ = writeln!(text, "{}/res = {}", name, 1.0 / panel.pixel_size.meters());
            let _ = writeln!(
                text,
                "{}/clen = {}",
                name,
                panel.distance_from_interaction_plane.meters()
            );
            let _ = writeln!(text, "{}/adu_per_photon = {}", name, panel.photon_response);
            if let Some(saturation) = panel.saturation_adu {
                let _ = writeln!(text, "{}/max_adu = {}", name, saturation);
            }
        }
        text
    }

    pub fn write_geom(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_geom_string()).map_err(|source| ParametersError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse CrystFEL geometry text.
    ///
    /// Keys without a panel prefix set defaults for the panels that follow.
    /// Keys irrelevant to panel placement are ignored.
    pub fn from_geom_str(text: &str) -> Result<Self> {
        let mut defaults: BTreeMap<String, (usize, String)> = BTreeMap::new();
        let mut panels: Vec<(String, BTreeMap<String, (usize, String)>)> = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line_number = index + 1;
            let line = raw.split(';').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| ParametersError::GeometryParse {
                line: line_number,
                message: format!("expected 'key = value', got '{}'", line),
            })?;
            let (key, value) = (key.trim(), value.trim().to_string());

            match key.split_once('/') {
                Some((panel_name, panel_key)) => {
                    let position = match panels.iter().position(|(name, _)| name == panel_name) {
                        Some(position) => position,
                        None => {
                            panels.push((panel_name.to_string(), defaults.clone()));
                            panels.len() - 1
                        }
                    };
                    panels[position]
                        .1
                        .insert(panel_key.trim().to_string(), (line_number, value));
                }
                None => {
                    defaults.insert(key.to_string(), (line_number, value));
                }
            }
        }

        let panels = panels
            .iter()
            .map(|(name, entries)| panel_from_entries(name, entries))
            .collect::<Result<Vec<_>>>()?;
        Self::new(panels)
    }

    pub fn from_geom_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ParametersError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_geom_str(&text)
    }

    /// Write a summary of the first panel into `group` (typically `params/geom`)
    pub fn write_s2e(&self, group: &mut Group) -> Result<()> {
        if let Some(panel) = self.panels.first() {
            group.insert(
                "detectorDist",
                Dataset::scalar(panel.distance_from_interaction_plane.meters()).with_attr("units", "m"),
            )?;
            group.insert(
                "pixelWidth",
                Dataset::scalar(panel.pixel_size.meters()).with_attr("units", "m"),
            )?;
            group.insert(
                "pixelHeight",
                Dataset::scalar(panel.pixel_size.meters()).with_attr("units", "m"),
            )?;
        }
        group.insert_text("crystfelGeometry", &self.to_geom_string())?;
        Ok(())
    }
}

fn panel_from_entries(name: &str, entries: &BTreeMap<String, (usize, String)>) -> Result<DetectorPanel> {
    let number = |key: &str| -> Result<Option<f64>> {
        match entries.get(key) {
            None => Ok(None),
            Some((line, value)) => value
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ParametersError::GeometryParse {
                    line: *line,
                    message: format!("{}/{} is not a number: '{}'", name, key, value),
                }),
        }
    };
    let required = |key: &str| -> Result<f64> {
        number(key)?.ok_or_else(|| ParametersError::GeometryParse {
            line: 0,
            message: format!("panel {} has no {}", name, key),
        })
    };
    let index = |key: &str| -> Result<u32> {
        let value = required(key)?;
        if value < 0.0 || value.fract() != 0.0 {
            return Err(ParametersError::invalid(
                format!("{}/{}", name, key),
                "must be a non-negative integer",
            ));
        }
        Ok(value as u32)
    };

    let res = required("res")?;
    check_positive("res", res)?;
    let panel = DetectorPanel {
        fast_scan_min: index("min_fs")?,
        fast_scan_max: index("max_fs")?,
        slow_scan_min: index("min_ss")?,
        slow_scan_max: index("max_ss")?,
        pixel_size: Length::from_meters(1.0 / res),
        photon_response: number("adu_per_photon")?.unwrap_or(1.0),
        distance_from_interaction_plane: Length::from_meters(required("clen")?),
        corners: [required("corner_x")?, required("corner_y")?],
        saturation_adu: number("max_adu")?,
    };
    panel.validate()?;
    Ok(panel)
}

/// Where a calculator gets its detector geometry from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorSource {
    /// An existing CrystFEL `.geom` file
    File(PathBuf),
    Panels(DetectorGeometry),
}

impl DetectorSource {
    pub fn validate(&self) -> Result<()> {
        match self {
            DetectorSource::File(path) if !path.is_file() => {
                Err(ParametersError::MissingFile(path.clone()))
            }
            DetectorSource::File(_) => Ok(()),
            DetectorSource::Panels(geometry) => geometry.validate(),
        }
    }

    pub fn geometry(&self) -> Result<DetectorGeometry> {
        match self {
            DetectorSource::File(path) => DetectorGeometry::from_geom_file(path),
            DetectorSource::Panels(geometry) => Ok(geometry.clone()),
        }
    }

    /// Path of a `.geom` file describing the detector, writing one into
    /// `directory` when the geometry is held in memory
    pub fn geom_file(&self, directory: &Path) -> Result<PathBuf> {
        match self {
            DetectorSource::File(path) => Ok(path.clone()),
            DetectorSource::Panels(geometry) => {
                let path = directory.join(GEOMETRY_FILE_NAME);
                geometry.write_geom(&path)?;
                Ok(path)
            }
        }
    }
}

impl From<DetectorGeometry> for DetectorSource {
    fn from(geometry: DetectorGeometry) -> Self {
        DetectorSource::Panels(geometry)
    }
}
