//! Dilution of precision
use map_3d::{ecef2geodetic, Ellipsoid};
use nalgebra::{DMatrix, Matrix3, Vector3};

use crate::solutions::DilutionOfPrecision;

/// Rotation of the position cofactor block into the local ENU frame
fn q_enu(cofactor: &DMatrix<f64>, lat_rad: f64, lon_rad: f64) -> Matrix3<f64> {
    let r = Matrix3::<f64>::new(
        -lon_rad.sin(),
        -lon_rad.cos() * lat_rad.sin(),
        lat_rad.cos() * lon_rad.cos(),
        lon_rad.cos(),
        -lat_rad.sin() * lon_rad.sin(),
        lat_rad.cos() * lon_rad.sin(),
        0.0_f64,
        lat_rad.cos(),
        lat_rad.sin(),
    );

    let q_3 = Matrix3::<f64>::new(
        cofactor[(0, 0)],
        cofactor[(0, 1)],
        cofactor[(0, 2)],
        cofactor[(1, 0)],
        cofactor[(1, 1)],
        cofactor[(1, 2)],
        cofactor[(2, 0)],
        cofactor[(2, 1)],
        cofactor[(2, 2)],
    );

    r.transpose() * q_3 * r
}

/// Derive [DilutionOfPrecision] values from the unweighted cofactor
/// matrix (AᵗA)⁻¹ of the last instantaneous solve, at given receiver
/// position.
pub(crate) fn dilution_of_precision(
    cofactor: &DMatrix<f64>,
    position_m: Vector3<f64>,
) -> DilutionOfPrecision {
    let (lat_rad, lon_rad, _) =
        ecef2geodetic(position_m.x, position_m.y, position_m.z, Ellipsoid::WGS84);

    let q_local = q_enu(cofactor, lat_rad, lon_rad);

    // geometry block: position + primary clock
    let gdop = (cofactor[(0, 0)] + cofactor[(1, 1)] + cofactor[(2, 2)] + cofactor[(3, 3)]).sqrt();

    DilutionOfPrecision {
        gdop,
        tdop: cofactor[(3, 3)].sqrt(),
        hdop: (q_local[(0, 0)] + q_local[(1, 1)]).sqrt(),
        vdop: q_local[(2, 2)].sqrt(),
    }
}
