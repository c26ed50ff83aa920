// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::alarm::{Alarm, AlarmSet, evaluate_alarms};
use crate::config::{ConfigError, load_configuration};
use crate::interface::{ConfigSource, RawReadingSource, StatusTransport};
use crate::scheduler::{FALLBACK_SLEEP_SECONDS, SchedulerError, compute_sleep_seconds};
use crate::tank::{TankState, TankStateError, update_tank_state};
use log::{debug, error, info, warn};
use propanemon_messages::{SerializationError, build_message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleError {
    Config(ConfigError),
    /// The load cell driver failed to produce a reading
    Acquisition,
    TankState(TankStateError),
    Scheduler(SchedulerError),
    Serialization(SerializationError),
}

impl From<ConfigError> for CycleError {
    fn from(err: ConfigError) -> Self {
        CycleError::Config(err)
    }
}

impl From<TankStateError> for CycleError {
    fn from(err: TankStateError) -> Self {
        CycleError::TankState(err)
    }
}

impl From<SchedulerError> for CycleError {
    fn from(err: SchedulerError) -> Self {
        CycleError::Scheduler(err)
    }
}

impl From<SerializationError> for CycleError {
    fn from(err: SerializationError) -> Self {
        CycleError::Serialization(err)
    }
}

/// What a successful cycle measured and sent.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub tank: TankState,
    pub alarms: AlarmSet,
    pub payload_len: usize,
}

impl CycleReport {
    pub fn alarm_raised(&self) -> bool {
        self.alarms.is_raised()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    /// How long to sleep before the next wake, [`FALLBACK_SLEEP_SECONDS`] if the cycle failed
    pub sleep_seconds: u32,
    pub result: Result<CycleReport, CycleError>,
}

/// Run one wake cycle: configure, measure, decide, publish.
///
/// Any failure aborts the cycle before anything is published and the outcome carries the
/// fallback sleep.
pub async fn run_wake_cycle<S, R, T>(
    config_source: &mut S,
    scale: &mut R,
    transport: &mut T,
) -> CycleOutcome
where
    S: ConfigSource,
    R: RawReadingSource,
    T: StatusTransport,
{
    match measure_and_publish(config_source, scale, transport).await {
        Ok((report, sleep_seconds)) => {
            info!(
                "Tank {}% full, alarms {}, sleeping {} s",
                report.tank.percent_full(),
                report.alarms,
                sleep_seconds
            );
            CycleOutcome {
                sleep_seconds,
                result: Ok(report),
            }
        }
        Err(e) => {
            error!(
                "Wake cycle aborted: {:?}, nothing published, sleeping {} s",
                e, FALLBACK_SLEEP_SECONDS
            );
            CycleOutcome {
                sleep_seconds: FALLBACK_SLEEP_SECONDS,
                result: Err(e),
            }
        }
    }
}

async fn measure_and_publish<S, R, T>(
    config_source: &mut S,
    scale: &mut R,
    transport: &mut T,
) -> Result<(CycleReport, u32), CycleError>
where
    S: ConfigSource,
    R: RawReadingSource,
    T: StatusTransport,
{
    let config = load_configuration(config_source).await?;

    let raw_reading = scale.read_raw().await.map_err(|e| {
        error!("Load cell read failed: {:?}", e);
        CycleError::Acquisition
    })?;
    debug!("Raw reading = {}", raw_reading);

    let tank = update_tank_state(&TankState::new(&config.tank), raw_reading, &config)?;

    let mut alarms = evaluate_alarms(
        &tank,
        config.tank.hi_alarm_factor,
        config.tank.lo_alarm_factor,
    );
    if scale.max_depth_fault() {
        warn!("Load cell reported a depth fault");
        alarms.insert(Alarm::MaxDepth);
    }

    // decided before publishing so a bad sleep tier aborts the cycle cleanly
    let sleep_seconds = compute_sleep_seconds(
        tank.percent_full(),
        config.site.sleep_time_floor,
        config.site.sleep_time_above_floor,
        config.site.sleep_time_below_floor,
    )?;

    let payload = build_message(
        &config.site.site_name,
        tank.tank_num(),
        tank.tank_type(),
        tank.percent_full(),
        alarms.bits(),
    )?;
    if config.site.debug {
        info!("Status payload: {:02x?}", payload.as_bytes());
    }

    transport
        .publish(&config.site.data_topic, payload.as_bytes(), alarms.is_raised())
        .await;

    Ok((
        CycleReport {
            tank,
            alarms,
            payload_len: payload.len(),
        },
        sleep_seconds,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationError;
    use crate::testing::{
        FixedScale, MemoryConfigSource, RecordingTransport, StorageFault, assert_close,
    };
    use embassy_futures::block_on;
    use propanemon_messages::decode_status_message;

    const SITE: &str = r#"{"site": {
        "sitename": "cabin",
        "mqtt_topic_data": "cabin/propane",
        "sleeptimeabovefloor": 1800,
        "sleepttimebelowfloor": 300,
        "sleeptimefloor": 25
    }}"#;

    fn run(source: &mut MemoryConfigSource, scale: &mut FixedScale) -> (CycleOutcome, RecordingTransport) {
        let mut transport = RecordingTransport::default();
        let outcome = block_on(run_wake_cycle(source, scale, &mut transport));
        (outcome, transport)
    }

    fn assert_aborted(outcome: &CycleOutcome, transport: &RecordingTransport, expected: CycleError) {
        assert_eq!(outcome.result, Err(expected));
        assert_eq!(outcome.sleep_seconds, FALLBACK_SLEEP_SECONDS);
        assert!(transport.published.is_empty());
    }

    #[test]
    fn healthy_cycle_publishes_once() {
        let (outcome, transport) = run(
            &mut MemoryConfigSource::new(SITE),
            &mut FixedScale::new(-189440.0),
        );

        let report = outcome.result.unwrap();
        assert_eq!(report.alarms, AlarmSet::CLEAR);
        assert!(!report.alarm_raised());
        // 13% is below the 25% floor
        assert_eq!(outcome.sleep_seconds, 300);

        assert_eq!(transport.published.len(), 1);
        let published = &transport.published[0];
        assert_eq!(published.topic, "cabin/propane");
        assert!(!published.alarm_raised);
        assert_eq!(published.payload.len(), report.payload_len);

        let message = decode_status_message(&published.payload).unwrap();
        assert_eq!(message.node, "cabin");
        assert_eq!(message.tank_num, 4);
        assert_eq!(message.tank_type, "P");
        assert_close(message.percent_full, 13.363);
        assert_eq!(message.alarm_flags, 0);
    }

    #[test]
    fn well_supplied_tank_sleeps_longer() {
        // 10 kg of propane on the default cylinder
        let raw = (10.0 + 6.486) * -23680.0;
        let (outcome, _) = run(&mut MemoryConfigSource::new(SITE), &mut FixedScale::new(raw));
        assert_eq!(outcome.sleep_seconds, 1800);
    }

    #[test]
    fn low_tank_publishes_alarm() {
        let (outcome, transport) = run(
            &mut MemoryConfigSource::new(SITE),
            &mut FixedScale::new(-21312.0),
        );

        let report = outcome.result.unwrap();
        assert!(report.alarms.contains(Alarm::Lo));
        assert_eq!(report.tank.percent_full(), 0.0);

        let published = &transport.published[0];
        assert!(published.alarm_raised);
        let message = decode_status_message(&published.payload).unwrap();
        assert_eq!(message.alarm_flags, Alarm::Lo.bits());
        assert_eq!(message.percent_full, 0.0);
    }

    #[test]
    fn depth_fault_is_added_to_alarms() {
        let (outcome, transport) = run(
            &mut MemoryConfigSource::new(SITE),
            &mut FixedScale::new(-189440.0).with_depth_fault(),
        );

        assert_eq!(outcome.result.unwrap().alarms.bits(), Alarm::MaxDepth.bits());
        assert!(transport.published[0].alarm_raised);
    }

    #[test]
    fn configuration_failure_publishes_nothing() {
        let (outcome, transport) = run(
            &mut MemoryConfigSource::new(SITE).with_fault(StorageFault::Mount),
            &mut FixedScale::new(-189440.0),
        );
        assert_aborted(&outcome, &transport, CycleError::Config(ConfigError::MountFailed));

        let (outcome, transport) = run(
            &mut MemoryConfigSource::empty(),
            &mut FixedScale::new(-189440.0),
        );
        assert_aborted(&outcome, &transport, CycleError::Config(ConfigError::NotFound));
    }

    #[test]
    fn zero_scale_factor_publishes_nothing() {
        let document = r#"{"site": {"empiricalscalefactor": 0.0}}"#;
        let (outcome, transport) = run(
            &mut MemoryConfigSource::new(document),
            &mut FixedScale::new(-189440.0),
        );
        assert_aborted(
            &outcome,
            &transport,
            CycleError::TankState(TankStateError::Calibration(CalibrationError::InvalidFactor)),
        );
    }

    #[test]
    fn zero_capacity_publishes_nothing() {
        let document = r#"{"site": {}, "tank": {"capacitykg": 0}}"#;
        let (outcome, transport) = run(
            &mut MemoryConfigSource::new(document),
            &mut FixedScale::new(-189440.0),
        );
        assert_aborted(
            &outcome,
            &transport,
            CycleError::TankState(TankStateError::InvalidCapacity),
        );
    }

    #[test]
    fn negative_sleep_publishes_nothing() {
        let document = r#"{"site": {"sleeptimeabovefloor": -60}}"#;
        let (outcome, transport) = run(
            &mut MemoryConfigSource::new(document),
            &mut FixedScale::new(-189440.0),
        );
        assert_aborted(
            &outcome,
            &transport,
            CycleError::Scheduler(SchedulerError::InvalidDuration),
        );
    }

    #[test]
    fn failed_reading_publishes_nothing() {
        let (outcome, transport) = run(
            &mut MemoryConfigSource::new(SITE),
            &mut FixedScale::failing(),
        );
        assert_aborted(&outcome, &transport, CycleError::Acquisition);
    }
}
