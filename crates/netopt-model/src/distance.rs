/// Multiplier from great-circle to approximate road mileage
pub const ROAD_FACTOR: f64 = 1.3;

/// Mean Earth radius in miles
pub const EARTH_RADIUS_MI: f64 = 3958.8;

/// Great-circle distance in miles between two (longitude, latitude) points in degrees.
///
/// Coordinates are not range-checked; out-of-range values go through the
/// trigonometry unchanged.
pub fn haversine(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (lon1, lat1, lon2, lat2) = (
        lon1.to_radians(),
        lat1.to_radians(),
        lon2.to_radians(),
        lat2.to_radians(),
    );
    let dlon = lon2 - lon1;
    let dlat = lat2 - lat1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `a` just past 1 for antipodal points
    2.0 * EARTH_RADIUS_MI * a.clamp(0.0, 1.0).sqrt().asin()
}

/// Road-adjusted distance in miles
pub fn road_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    haversine(lon1, lat1, lon2, lat2) * ROAD_FACTOR
}
