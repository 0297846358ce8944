//! Panel geometry: body-frame normals, CubeSat face factories, and the
//! power contract that turns sun direction + irradiance into generated
//! watts.
//!
//! Body-frame convention: +Z = nadir (toward Earth), +X = ram (velocity
//! direction), +Y = cross-track, right-handed.

use nalgebra::Vector3;
use std::sync::Arc;

use crate::error::{ConfigError, Result};
use crate::solar_cell::SolarCellParams;

/// CubeSat form factor, used by the body-panel factories to size faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormFactor {
    /// 1U (10x10x10 cm).
    U1,
    /// 3U (10x10x30 cm).
    U3,
    /// 6U (10x20x30 cm).
    U6,
}

/// A named body face, used to exclude faces from the body-panel factories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Face {
    /// +X (ram).
    PlusX,
    /// -X.
    MinusX,
    /// +Y (cross-track).
    PlusY,
    /// -Y.
    MinusY,
    /// +Z (nadir).
    PlusZ,
    /// -Z (zenith).
    MinusZ,
}

impl Face {
    fn normal(self) -> Vector3<f64> {
        match self {
            Face::PlusX => Vector3::new(1.0, 0.0, 0.0),
            Face::MinusX => Vector3::new(-1.0, 0.0, 0.0),
            Face::PlusY => Vector3::new(0.0, 1.0, 0.0),
            Face::MinusY => Vector3::new(0.0, -1.0, 0.0),
            Face::PlusZ => Vector3::new(0.0, 0.0, 1.0),
            Face::MinusZ => Vector3::new(0.0, 0.0, -1.0),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Face::PlusX => "+X",
            Face::MinusX => "-X",
            Face::PlusY => "+Y",
            Face::MinusY => "-Y",
            Face::PlusZ => "+Z",
            Face::MinusZ => "-Z",
        }
    }

    const ALL: [Face; 6] = [
        Face::PlusX,
        Face::MinusX,
        Face::PlusY,
        Face::MinusY,
        Face::PlusZ,
        Face::MinusZ,
    ];

    fn area_m2(self, form_factor: FormFactor) -> f64 {
        match (form_factor, self) {
            (FormFactor::U1, _) => 0.01,
            (FormFactor::U3, Face::PlusX | Face::MinusX | Face::PlusY | Face::MinusY) => 0.03,
            (FormFactor::U3, Face::PlusZ | Face::MinusZ) => 0.01,
            (FormFactor::U6, Face::PlusX | Face::MinusX) => 0.02,
            (FormFactor::U6, Face::PlusY | Face::MinusY) => 0.06,
            (FormFactor::U6, Face::PlusZ | Face::MinusZ) => 0.02,
        }
    }
}

/// A flat solar panel: area, body-frame inward-facing normal, and the cell
/// technology mounted on it.
#[derive(Debug, Clone)]
pub struct Panel {
    /// Panel area (m²).
    pub area_m2: f64,
    /// Outward-facing unit normal in the body frame.
    pub normal_body: Vector3<f64>,
    /// Cell parameters, shared across panels using the same cell type.
    pub cell: Arc<SolarCellParams>,
    /// Optional descriptive name.
    pub name: Option<String>,
}

impl Panel {
    /// Number of whole cells that fit on this panel.
    pub fn cell_count(&self) -> u32 {
        ((self.area_m2 * self.cell.packing_factor) / self.cell.area_m2).floor() as u32
    }

    /// Generated electrical power (W) given the sun direction in the body
    /// frame (unit vector), total irradiance `g` (W/m²) before projection,
    /// cell temperature, and MPPT tracking efficiency.
    ///
    /// `G_eff = G * max(0, sun_dir . normal)` is the irradiance actually
    /// incident on the panel; `power_at_mpp` already converts that into
    /// per-cell watts, so it is not re-multiplied by `G` here.
    pub fn power(&self, sun_dir_body: Vector3<f64>, g: f64, t_cell_k: f64, eta_mppt: f64) -> f64 {
        let cos_incidence = sun_dir_body.dot(&self.normal_body).max(0.0);
        if cos_incidence <= 0.0 {
            return 0.0;
        }
        let g_eff = g * cos_incidence;
        let n_cells = self.cell_count() as f64;
        n_cells * self.cell.power_at_mpp(g_eff, t_cell_k) * eta_mppt
    }
}

fn body_panels(
    form_factor: FormFactor,
    cell: &Arc<SolarCellParams>,
    exclude_faces: &[Face],
) -> Vec<Panel> {
    Face::ALL
        .iter()
        .filter(|f| !exclude_faces.contains(f))
        .map(|&face| Panel {
            area_m2: face.area_m2(form_factor),
            normal_body: face.normal(),
            cell: Arc::clone(cell),
            name: Some(face.name().to_string()),
        })
        .collect()
}

/// Build the six body-mounted panels for a CubeSat form factor, excluding
/// any faces named in `exclude_faces`. Passing an empty slice is equivalent
/// to omitting exclusions.
pub fn cubesat_body(
    form_factor: FormFactor,
    cell: Arc<SolarCellParams>,
    exclude_faces: &[Face],
) -> Vec<Panel> {
    body_panels(form_factor, &cell, exclude_faces)
}

/// Build body panels plus deployable wings.
///
/// `wing_count` must be 2 (wings on +-Y) or 4 (wings on +-X and +-Y).
/// `wing_area_m2` defaults to twice the long-face area of the form factor
/// when `None`.
pub fn cubesat_with_wings(
    form_factor: FormFactor,
    cell: Arc<SolarCellParams>,
    wing_count: u32,
    wing_area_m2: Option<f64>,
    exclude_faces: &[Face],
) -> Result<Vec<Panel>> {
    if wing_count != 2 && wing_count != 4 {
        return Err(ConfigError::InvalidWingCount(wing_count).into());
    }

    let long_face_area = Face::ALL
        .iter()
        .map(|&f| f.area_m2(form_factor))
        .fold(0.0_f64, f64::max);
    let wing_area = wing_area_m2.unwrap_or(2.0 * long_face_area);

    let mut panels = body_panels(form_factor, &cell, exclude_faces);

    let wing_normals: &[Face] = if wing_count == 2 {
        &[Face::PlusY, Face::MinusY]
    } else {
        &[Face::PlusX, Face::MinusX, Face::PlusY, Face::MinusY]
    };

    for &face in wing_normals {
        panels.push(Panel {
            area_m2: wing_area,
            normal_body: face.normal(),
            cell: Arc::clone(&cell),
            name: Some(format!("wing {}", face.name())),
        });
    }

    Ok(panels)
}

/// Build a single deployed panel with an arbitrary area and normal.
pub fn deployed(
    area_m2: f64,
    cell: Arc<SolarCellParams>,
    normal_body: Vector3<f64>,
    name: impl Into<String>,
) -> Result<Panel> {
    if !(area_m2 > 0.0) {
        return Err(ConfigError::NonPositiveParameter {
            field: "area_m2",
            value: area_m2,
        }
        .into());
    }
    Ok(Panel {
        area_m2,
        normal_body: normal_body.normalize(),
        cell,
        name: Some(name.into()),
    })
}

/// Rotation from body frame to ECI for a nadir-pointing attitude: +Z_body
/// points toward Earth center, +X_body along the velocity direction.
pub fn body_to_eci_sun_direction(
    position_eci: Vector3<f64>,
    velocity_eci: Vector3<f64>,
    sun_dir_eci: Vector3<f64>,
) -> Vector3<f64> {
    let z_body = -position_eci.normalize();
    let x_body = velocity_eci.normalize();
    let y_body = z_body.cross(&x_body).normalize();
    // Re-orthogonalize x to guard against non-perpendicular inputs.
    let x_body = y_body.cross(&z_body).normalize();

    Vector3::new(
        x_body.dot(&sun_dir_eci),
        y_body.dot(&sun_dir_eci),
        z_body.dot(&sun_dir_eci),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cell() -> Arc<SolarCellParams> {
        Arc::new(
            SolarCellParams::new(
                0.003018, 2.70, 0.52, 2.30, 0.495, 1.3, 0.01, 1000.0, -0.0062, 0.00028, -0.0012,
                0.92, 0.85, 0.85,
            )
            .unwrap(),
        )
    }

    #[test]
    fn body_panels_u1_all_same_area() {
        let panels = cubesat_body(FormFactor::U1, test_cell(), &[]);
        assert_eq!(panels.len(), 6);
        for p in &panels {
            assert!((p.area_m2 - 0.01).abs() < 1e-12);
        }
    }

    #[test]
    fn body_panels_u3_areas_match_spec() {
        let panels = cubesat_body(FormFactor::U3, test_cell(), &[]);
        let long_faces = panels.iter().filter(|p| (p.area_m2 - 0.03).abs() < 1e-9).count();
        let short_faces = panels.iter().filter(|p| (p.area_m2 - 0.01).abs() < 1e-9).count();
        assert_eq!(long_faces, 4);
        assert_eq!(short_faces, 2);
    }

    #[test]
    fn exclude_faces_empty_equals_omitted() {
        let explicit_empty = cubesat_body(FormFactor::U3, test_cell(), &[]);
        let omitted = cubesat_body(FormFactor::U3, test_cell(), &Vec::new());
        assert_eq!(explicit_empty.len(), omitted.len());
    }

    #[test]
    fn exclude_faces_removes_named_face() {
        let panels = cubesat_body(FormFactor::U3, test_cell(), &[Face::MinusZ]);
        assert_eq!(panels.len(), 5);
    }

    #[test]
    fn wings_auto_area_is_twice_long_face() {
        let panels =
            cubesat_with_wings(FormFactor::U3, test_cell(), 2, None, &[]).unwrap();
        let wing = panels.iter().find(|p| p.name.as_deref() == Some("wing +Y")).unwrap();
        assert!((wing.area_m2 - 0.06).abs() < 1e-9);
    }

    #[test]
    fn four_wings_cover_x_and_y() {
        let panels =
            cubesat_with_wings(FormFactor::U3, test_cell(), 4, Some(0.05), &[]).unwrap();
        let wing_count = panels.iter().filter(|p| p.name.as_deref().unwrap_or("").starts_with("wing")).count();
        assert_eq!(wing_count, 4);
    }

    #[test]
    fn invalid_wing_count_rejected() {
        let result = cubesat_with_wings(FormFactor::U3, test_cell(), 3, None, &[]);
        assert!(result.is_err());
    }

    #[test]
    fn panel_power_zero_when_facing_away_from_sun() {
        let panels = cubesat_body(FormFactor::U1, test_cell(), &[]);
        let plus_z = panels.iter().find(|p| p.name.as_deref() == Some("+Z")).unwrap();
        let sun_dir = Vector3::new(0.0, 0.0, -1.0); // sun behind the panel
        assert_eq!(plus_z.power(sun_dir, 1361.0, 301.15, 0.97), 0.0);
    }

    #[test]
    fn panel_power_positive_when_facing_sun() {
        let panels = cubesat_body(FormFactor::U3, test_cell(), &[]);
        let plus_x = panels.iter().find(|p| p.name.as_deref() == Some("+X")).unwrap();
        let sun_dir = Vector3::new(1.0, 0.0, 0.0);
        assert!(plus_x.power(sun_dir, 1361.0, 301.15, 0.97) > 0.0);
    }

    #[test]
    fn body_to_eci_nadir_pointing_places_nadir_on_plus_z() {
        let position = Vector3::new(7_000_000.0, 0.0, 0.0);
        let velocity = Vector3::new(0.0, 7500.0, 0.0);
        // Sun directly behind the nadir direction from the satellite means
        // sun is at +Z body (opposite of position unit vector).
        let sun_dir = -position.normalize();
        let body_sun = body_to_eci_sun_direction(position, velocity, sun_dir);
        assert!((body_sun.z - 1.0).abs() < 1e-9);
    }
}
