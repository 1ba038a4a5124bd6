// Generates synthetic readings of a phone lying at rest, for demos and tests.

use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::gaussian::GaussianNoise;
use crate::constants::READING_CHANNEL_CAPACITY;
use crate::models::errors::TelemetryError;
use common::{Reading, SensorType, XYZ};

const GRAVITY: f64 = 9.81;
const GAUSSIAN_SENSOR_MEAN: f64 = 0f64;
const GAUSSIAN_SENSOR_STDEV: f64 = 0.05;

/// Emits accelerometer and gyroscope readings at a fixed period.
pub struct MockReadingSource {
    period_millis: u64,
    sequence: AtomicU64,
    sensor_noise: Option<GaussianNoise>,
    rng: Mutex<StdRng>,
}

impl MockReadingSource {
    /// Fails with InvalidInput if `period_millis` is zero.
    pub fn new(period_millis: u64, add_sensor_noise: bool) -> Result<Self, TelemetryError> {
        if period_millis == 0 {
            return Err(TelemetryError::InvalidInput(
                "Reading period must be positive".to_string(),
            ));
        }
        let sensor_noise = if add_sensor_noise {
            Some(GaussianNoise::new(GAUSSIAN_SENSOR_MEAN, GAUSSIAN_SENSOR_STDEV)?)
        } else {
            None
        };
        Ok(Self {
            period_millis,
            sequence: AtomicU64::new(0),
            sensor_noise,
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    pub fn period_millis(&self) -> u64 {
        self.period_millis
    }

    /// Next reading. Sequence numbers start at 1 and timestamps advance by one period.
    pub fn next_reading(&self) -> Reading {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let timestamp = sequence as f64 * self.period_millis as f64 / 1000.0;

        let mut accel = [0.0, 0.0, GRAVITY];
        let mut gyro = [0.0; 3];
        if let Some(noise) = self.sensor_noise.as_ref() {
            if let Ok(mut rng) = self.rng.lock() {
                accel = noise.add_noise(&mut rng, accel);
                gyro = noise.add_noise(&mut rng, gyro);
            }
        }

        Reading::new(sequence, timestamp)
            .with(SensorType::Accelerometer, XYZ::new(accel))
            .with(SensorType::Gyroscope, XYZ::new(gyro))
    }

    /// Pushes a reading every period into the returned channel.
    ///
    /// Stops after `run_for_millis`, or when the receiver is dropped if no limit is given.
    pub fn spawn(self, run_for_millis: Option<u64>) -> (JoinHandle<()>, mpsc::Receiver<Reading>) {
        let (tx, rx) = mpsc::channel(READING_CHANNEL_CAPACITY);
        let handle = tokio::spawn(async move {
            let deadline = run_for_millis
                .map(|millis| tokio::time::Instant::now() + Duration::from_millis(millis));
            let mut interval = tokio::time::interval(Duration::from_millis(self.period_millis));
            loop {
                interval.tick().await;
                if deadline.is_some_and(|deadline| tokio::time::Instant::now() >= deadline) {
                    info!("Mock source run time elapsed");
                    break;
                }
                let reading = self.next_reading();
                debug!("Mock reading #{}", reading.sequence());
                if tx.send(reading).await.is_err() {
                    debug!("Reading receiver dropped. Stopping mock source");
                    break;
                }
            }
        });
        (handle, rx)
    }
}
