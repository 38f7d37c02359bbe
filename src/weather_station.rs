// THEORY:
// The `weather_station` module is the boundary to ground weather records. The
// energy-balance step that consumes the anchor pixels also needs air temperature,
// dew point and wind speed near the scene at overpass time. This module decides
// WHICH station's records to use and renders them as the semicolon-separated text
// the downstream step reads. It never touches the pixel selection.
//
// Retrieval itself (FTP, HTTP, local archive) lives behind `StationOperator`. A
// station whose records cannot be read or are not usable is skipped and the next
// nearest one is tried; running out of stations is `None`, not an error.

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hours (HHMM) a station must have a record for.
pub const WANTED_STATION_HOURS: [&str; 1] = ["1200"];
/// Wind speeds below this are raised to it.
pub const MIN_WIND_SPEED_VALUE: &str = "0.3";
const MIN_WIND_SPEED: f64 = 0.3;
/// Records with wind speeds above this are discarded.
const MAX_WIND_SPEED: f64 = 31.0;
pub const MIN_STATION_RECORDS: usize = 3;
/// Days searched on each side of the scene date.
const DAYS_WINDOW: u32 = 0;
const MISSING_VALUE: &str = "NA";

#[derive(Debug, Error)]
pub enum StationError {
    #[error("station {station} could not be read: {message}")]
    Operator { station: String, message: String },

    #[error("station {station} reported unparseable wind speed `{value}`")]
    InvalidWindSpeed { station: String, value: String },

    #[error("malformed station JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl StationError {
    pub fn operator(station: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Operator {
            station: station.into(),
            message: message.into(),
        }
    }
}

/// One hourly record of a station. Missing values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationRecord {
    #[serde(rename = "id")]
    pub station_id: String,
    pub date: String,
    /// Hour of the record as HHMM.
    pub time: String,
    pub latitude: String,
    pub longitude: String,
    #[serde(rename = "windSpeed")]
    pub wind_speed: String,
    #[serde(rename = "airTemp")]
    pub air_temperature: String,
    #[serde(rename = "dewTemp")]
    pub dewpoint_temperature: String,
    #[serde(rename = "avgAirTemp")]
    pub avg_air_temperature: String,
    #[serde(rename = "relativeHumidity")]
    pub relative_humidity: String,
    #[serde(rename = "minTemp")]
    pub min_temperature: String,
    #[serde(rename = "maxTemp")]
    pub max_temperature: String,
    #[serde(rename = "solarRad")]
    pub solar_radiation: String,
}

impl StationRecord {
    /// Whether every value the energy balance cannot do without is present.
    pub fn has_needed_values(&self) -> bool {
        [
            &self.date,
            &self.time,
            &self.latitude,
            &self.longitude,
            &self.air_temperature,
            &self.dewpoint_temperature,
            &self.wind_speed,
        ]
        .iter()
        .all(|value| !value.is_empty())
    }

    /// Renders the record as one `;`-terminated line, with `NA` for the optional
    /// values the station did not report.
    pub fn to_line(&self, distance_km: f64) -> String {
        let fields: [&str; 13] = [
            or_missing(&self.station_id),
            &self.date,
            &self.time,
            &self.latitude,
            &self.longitude,
            &self.wind_speed,
            &self.air_temperature,
            &self.dewpoint_temperature,
            or_missing(&self.avg_air_temperature),
            or_missing(&self.relative_humidity),
            or_missing(&self.min_temperature),
            or_missing(&self.max_temperature),
            or_missing(&self.solar_radiation),
        ];
        let mut line = String::new();
        for field in fields {
            line.push_str(field);
            line.push(';');
        }
        line.push_str(&format!("{distance_km:?};"));
        line
    }
}

fn or_missing(value: &str) -> &str {
    if value.is_empty() { MISSING_VALUE } else { value }
}

/// A station returned by the proximity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyStation {
    pub id: String,
    /// Distance from the requested point, in kilometres.
    pub distance: f64,
}

/// Source of station metadata and records.
pub trait StationOperator {
    /// Stations around (lat, lon), nearest first, with data around `date`.
    fn find_nearest_stations(
        &self,
        date: &str,
        lat: f64,
        lon: f64,
        days_window: u32,
    ) -> Option<Vec<NearbyStation>>;

    /// All records of `station_id` between `begin_date` and `end_date`, inclusive.
    fn read_station(
        &self,
        station_id: &str,
        begin_date: &str,
        end_date: &str,
    ) -> Result<Vec<StationRecord>, StationError>;
}

/// Parses the JSON array of records most station services answer with.
pub fn parse_records(json: &str) -> Result<Vec<StationRecord>, StationError> {
    Ok(serde_json::from_str(json)?)
}

pub struct WeatherStation<O> {
    operator: O,
}

impl<O: StationOperator> WeatherStation<O> {
    pub fn new(operator: O) -> Self {
        Self { operator }
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    /// Formatted records of the nearest usable station, one line per record.
    pub fn station_data(
        &self,
        lat: f64,
        lon: f64,
        date: &str,
        scene_center_time: &str,
    ) -> Option<String> {
        debug!(
            "looking up stations at latitude {} longitude {} date {} scene time {}",
            lat, lon, date, scene_center_time
        );
        let stations = self
            .operator
            .find_nearest_stations(date, lat, lon, DAYS_WINDOW)?;
        self.select_station(date, &stations)
    }

    fn select_station(&self, date: &str, stations: &[NearbyStation]) -> Option<String> {
        if stations.is_empty() {
            info!("stations list is empty");
            return None;
        }

        for station in stations {
            match self.usable_records(station, date) {
                Ok(Some(records)) => {
                    info!(
                        "using station {} at {}km with {} records",
                        station.id,
                        station.distance,
                        records.len()
                    );
                    return Some(render_records(&records, station.distance));
                }
                Ok(None) => debug!("station {} does not have enough usable records", station.id),
                Err(e) => error!("error while reading station {}: {}", station.id, e),
            }
        }
        None
    }

    fn usable_records(
        &self,
        station: &NearbyStation,
        date: &str,
    ) -> Result<Option<Vec<StationRecord>>, StationError> {
        let records = self.operator.read_station(&station.id, date, date)?;
        let records = correct_wind_speed(&station.id, records)?;
        Ok(check_records(records))
    }
}

/// Raises calm wind speeds to the minimum and drops records with implausibly
/// strong wind. A wind speed that is not a number invalidates the whole station.
pub fn correct_wind_speed(
    station_id: &str,
    records: Vec<StationRecord>,
) -> Result<Vec<StationRecord>, StationError> {
    let mut corrected = Vec::with_capacity(records.len());
    for mut record in records {
        let speed: f64 =
            record
                .wind_speed
                .trim()
                .parse()
                .map_err(|_| StationError::InvalidWindSpeed {
                    station: station_id.to_string(),
                    value: record.wind_speed.clone(),
                })?;
        if speed < MIN_WIND_SPEED {
            record.wind_speed = MIN_WIND_SPEED_VALUE.to_string();
        } else if speed > MAX_WIND_SPEED {
            continue;
        }
        corrected.push(record);
    }
    Ok(corrected)
}

/// Keeps complete records and accepts them only if there are enough of them and
/// every wanted hour is covered.
pub fn check_records(records: Vec<StationRecord>) -> Option<Vec<StationRecord>> {
    let complete: Vec<StationRecord> = records
        .into_iter()
        .filter(StationRecord::has_needed_values)
        .collect();
    if complete.len() < MIN_STATION_RECORDS {
        return None;
    }
    let has_wanted_hours = WANTED_STATION_HOURS
        .iter()
        .all(|hour| complete.iter().any(|record| record.time == *hour));
    has_wanted_hours.then_some(complete)
}

fn render_records(records: &[StationRecord], distance_km: f64) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&record.to_line(distance_km));
        out.push('\n');
    }
    out.trim().to_string()
}
