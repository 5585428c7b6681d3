//! Great-circle distance and ground travel time

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Ground ambulance speed assumed when none is given
pub const DEFAULT_GROUND_SPEED_KMH: f64 = 60.0;

/// Haversine distance in meters between two WGS84 points
pub fn haversine_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (lat1, lat2) = (lat1.to_radians(), lat2.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    c * EARTH_RADIUS_M
}

/// Travel time in whole minutes, never less than one
pub fn estimate_ground_eta(distance_m: f64, speed_kmh: f64) -> u32 {
    let minutes = (distance_m / 1000.0 / speed_kmh * 60.0).round();
    if minutes.is_finite() && minutes > 1.0 {
        minutes as u32
    } else {
        1
    }
}
