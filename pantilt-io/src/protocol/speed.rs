//! Speed codes of the scanner head
//!
//! Measured angular speed (degrees per second) for each speed byte.
//! Code 0x01 was never measured and codes above 0x3F are not accepted by
//! the head.

/// Highest speed code the head accepts
pub const MAX_SPEED_CODE: u8 = 0x3F;

/// Degrees per second for codes 0x02..=0x3F (index = code - 2)
const SPEED_TABLE: [f64; 62] = [
    0.122901332,
    0.135453838,
    0.149244141,
    0.164443858,
    0.18121377,
    0.19970621,
    0.220039216,
    0.242505404,
    0.267204639,
    0.294448902,
    0.324489492,
    0.357579899,
    0.394007151,
    0.434113089,
    0.47838243,
    0.527145813,
    0.580813785,
    0.640080792,
    0.7051606,
    0.777037673,
    0.865105951,
    0.943534691,
    1.039546065,
    1.145522756,
    1.261781004,
    1.390321048,
    1.532240902,
    1.68822277,
    1.859619398,
    2.048608938,
    2.256770311,
    2.487149726,
    2.738871433,
    3.016742923,
    3.324867236,
    3.660582643,
    4.034291478,
    4.28556123,
    4.892700363,
    5.389463599,
    5.934326784,
    6.530730716,
    7.191514013,
    7.902015014,
    8.692712609,
    9.589004608,
    10.56524036,
    11.60466766,
    12.77048599,
    14.05261925,
    15.46391753,
    17.00118064,
    18.70712949,
    20.49880424,
    22.57761054,
    24.87218461,
    27.25001892,
    29.8136646,
    32.66787659,
    36.05769231,
    39.23278117,
    43.01075269,
];

/// Angular speed for a speed code, `None` if the code is unmapped
pub fn degrees_per_second(code: u8) -> Option<f64> {
    match code {
        0x00 => Some(0.0),
        0x02..=MAX_SPEED_CODE => Some(SPEED_TABLE[(code - 2) as usize]),
        _ => None,
    }
}
