/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Unit quaternions describing sample orientations

use super::errors::{Result, SampleError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Rotation quaternion `[w, x, y, z]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    pub const fn identity() -> Self {
        Self {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Build from `[w, x, y, z]`; components must be finite with a non-zero norm
    pub fn from_array(components: [f64; 4]) -> Result<Self> {
        if components.iter().any(|c| !c.is_finite()) {
            return Err(SampleError::InvalidRotation(format!(
                "components must be finite, got {:?}",
                components
            )));
        }
        let [w, x, y, z] = components;
        let quaternion = Self { w, x, y, z };
        if quaternion.norm() == 0.0 {
            return Err(SampleError::InvalidRotation(
                "quaternion has zero norm".to_string(),
            ));
        }
        Ok(quaternion)
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.w, self.x, self.y, self.z]
    }

    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn normalized(self) -> Self {
        let norm = self.norm();
        Self {
            w: self.w / norm,
            x: self.x / norm,
            y: self.y / norm,
            z: self.z / norm,
        }
    }

    /// True if the quaternion describes no rotation (q and -q are equivalent)
    pub fn is_identity(&self) -> bool {
        let q = self.normalized();
        (q.w.abs() - 1.0).abs() < 1e-12
    }

    /// Uniformly distributed random rotation (Shoemake's method)
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let u1: f64 = rng.random();
        let u2: f64 = rng.random();
        let u3: f64 = rng.random();

        let a = (1.0 - u1).sqrt();
        let b = u1.sqrt();
        Self {
            w: b * (TAU * u3).cos(),
            x: a * (TAU * u2).sin(),
            y: a * (TAU * u2).cos(),
            z: b * (TAU * u3).sin(),
        }
    }

    /// Rotate `v` by this quaternion (normalized first)
    pub fn rotate(&self, v: [f64; 3]) -> [f64; 3] {
        let q = self.normalized();
        let (w, x, y, z) = (q.w, q.x, q.y, q.z);

        let r00 = 1.0 - 2.0 * (y * y + z * z);
        let r01 = 2.0 * (x * y - w * z);
        let r02 = 2.0 * (x * z + w * y);
        let r10 = 2.0 * (x * y + w * z);
        let r11 = 1.0 - 2.0 * (x * x + z * z);
        let r12 = 2.0 * (y * z - w * x);
        let r20 = 2.0 * (x * z - w * y);
        let r21 = 2.0 * (y * z + w * x);
        let r22 = 1.0 - 2.0 * (x * x + y * y);

        [
            r00 * v[0] + r01 * v[1] + r02 * v[2],
            r10 * v[0] + r11 * v[1] + r12 * v[2],
            r20 * v[0] + r21 * v[1] + r22 * v[2],
        ]
    }
}
