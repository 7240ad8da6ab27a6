/// Speed of light in m.s⁻¹
pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// Earth angular velocity, in WGS84 frame rad/s
pub const EARTH_ANGULAR_VEL_RAD: f64 = 7.2921151467E-5;

/// Earth gravitational constant (m^3 s-2), WGS84
pub const EARTH_GRAVITATION_MU_M3_S2: f64 = 3.986005E14;

/// Earth gravitational constant (m^3 s-2), PZ90 frame
pub const EARTH_GRAVITATION_MU_PZ90_M3_S2: f64 = 3.9860044E14;

/// Second zonal harmonic of the geopotential (PZ90)
pub const EARTH_J2: f64 = 1.0826257E-3;

/// Earth equatorial radius (meters), PZ90
pub const EARTH_EQUATORIAL_RADIUS_M: f64 = 6378136.0;

/// Relativistic clock correction factor -2√µ/c² (s per √m)
pub const RELATIVISTIC_CLOCK_CORR_F: f64 = -4.442807633E-10;
