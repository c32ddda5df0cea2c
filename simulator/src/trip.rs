use crate::telemetry::Telemetry;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

const CARGO_SETPOINT_C: f64 = 5.0;
const KM_PER_DEGREE: f64 = 111.32;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Leg {
    Driving { remaining: u32 },
    Stopped { elapsed: u32, remaining: u32, door_steps: u32 },
}

/// Produces a chronological trip for one device: driving legs separated by
/// stops, with the door opened at some stops.
pub struct TripGenerator<R> {
    rng: R,
    device_id: String,
    interval: Duration,
    timestamp: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
    heading: f64,
    temperature: f64,
    leg: Leg,
}

impl<R: Rng> TripGenerator<R> {
    pub fn new(
        mut rng: R,
        device_id: String,
        start: DateTime<Utc>,
        interval: Duration,
        origin: (f64, f64),
    ) -> Self {
        let heading = rng.gen_range(0.0..360.0);
        Self {
            rng,
            device_id,
            interval,
            timestamp: start,
            latitude: origin.0,
            longitude: origin.1,
            heading,
            temperature: CARGO_SETPOINT_C,
            leg: Leg::Stopped {
                elapsed: 0,
                remaining: 3,
                door_steps: 0,
            },
        }
    }

    pub fn generate(&mut self, count: usize) -> Vec<Telemetry> {
        (0..count).map(|_| self.next_sample()).collect()
    }

    fn next_sample(&mut self) -> Telemetry {
        let (speed_kmh, door_open) = self.advance_leg();

        if let Some(speed) = speed_kmh.filter(|s| *s > 0.0) {
            self.heading = (self.heading + self.rng.gen_range(-10.0..10.0)).rem_euclid(360.0);
            let hours = self.interval.num_seconds() as f64 / 3600.0;
            let km = speed * hours;
            let rad = self.heading.to_radians();
            self.latitude = (self.latitude + km * rad.cos() / KM_PER_DEGREE).clamp(-89.9, 89.9);
            self.longitude += km * rad.sin() / (KM_PER_DEGREE * self.latitude.to_radians().cos());
            self.longitude = (self.longitude + 180.0).rem_euclid(360.0) - 180.0;
        }

        if door_open {
            self.temperature += self.rng.gen_range(0.8..2.0);
        } else {
            self.temperature += (CARGO_SETPOINT_C - self.temperature) * 0.2
                + self.rng.gen_range(-0.2..0.2);
        }

        let humidity = if door_open {
            self.rng.gen_range(70.0..90.0)
        } else {
            self.rng.gen_range(45.0..65.0)
        };

        let sample = Telemetry {
            timestamp: self.timestamp,
            device_id: self.device_id.clone(),
            latitude: round_to(self.latitude, 6),
            longitude: round_to(self.longitude, 6),
            speed_kmh: speed_kmh.map(|s| round_to(s, 1)),
            course_deg: round_to(self.heading, 1),
            temperature_c: round_to(self.temperature, 2),
            humidity_percent: round_to(humidity, 1),
            pressure_kpa: round_to(101.3 + self.rng.gen_range(-0.4..0.4), 2),
            door_open,
        };

        self.timestamp += self.interval;
        sample
    }

    /// Steps the current leg and returns this sample's speed and door state.
    fn advance_leg(&mut self) -> (Option<f64>, bool) {
        match self.leg {
            Leg::Driving { remaining } if remaining > 0 => {
                self.leg = Leg::Driving {
                    remaining: remaining - 1,
                };
                (Some(self.rng.gen_range(40.0..90.0)), false)
            }
            Leg::Driving { .. } => {
                // door never opens on the first sample of a stop
                let door_steps = if self.rng.gen_bool(0.5) {
                    self.rng.gen_range(1..=2)
                } else {
                    0
                };
                self.leg = Leg::Stopped {
                    elapsed: 1,
                    remaining: self.rng.gen_range(2..8) + door_steps,
                    door_steps,
                };
                (Some(0.0), false)
            }
            Leg::Stopped {
                elapsed,
                remaining,
                door_steps,
            } if remaining > 0 => {
                self.leg = Leg::Stopped {
                    elapsed: elapsed + 1,
                    remaining: remaining - 1,
                    door_steps,
                };
                let door_open = (1..=door_steps).contains(&elapsed);
                let speed = if self.rng.gen_bool(0.05) { None } else { Some(0.0) };
                (speed, door_open)
            }
            Leg::Stopped { .. } => {
                self.leg = Leg::Driving {
                    remaining: self.rng.gen_range(6..24),
                };
                (Some(self.rng.gen_range(40.0..90.0)), false)
            }
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generator(seed: u64) -> TripGenerator<StdRng> {
        TripGenerator::new(
            StdRng::seed_from_u64(seed),
            "truck_01".to_string(),
            Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap(),
            Duration::minutes(5),
            (60.17, 24.94),
        )
    }

    #[test]
    fn test_same_seed_same_trip() {
        assert_eq!(generator(7).generate(100), generator(7).generate(100));
    }

    #[test]
    fn test_timestamps_step_by_interval() {
        let trip = generator(1).generate(50);
        assert!(trip
            .windows(2)
            .all(|p| p[1].timestamp - p[0].timestamp == Duration::minutes(5)));
    }

    #[test]
    fn test_door_only_opens_when_stopped() {
        let trip = generator(3).generate(500);
        for sample in trip.iter().filter(|s| s.door_open) {
            assert!(sample.speed_kmh.unwrap_or(0.0) == 0.0);
        }
        assert!(trip.iter().any(|s| s.door_open));
        assert!(trip.iter().any(|s| s.speed_kmh.unwrap_or(0.0) > 0.0));
    }

    #[test]
    fn test_position_stays_on_earth() {
        for sample in generator(11).generate(300) {
            assert!((-90.0..=90.0).contains(&sample.latitude));
            assert!((-180.0..=180.0).contains(&sample.longitude));
            assert!((0.0..360.0).contains(&sample.course_deg) || sample.course_deg == 360.0);
        }
    }
}
