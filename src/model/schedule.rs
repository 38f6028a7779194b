use chrono::DateTime;
use chrono_tz::Tz;
use serde::Deserialize;

/// One day of the schedule embedded in a tvking channel page.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DaySchedule {
    #[serde(default, deserialize_with = "crate::utils::deserialize_as_string")]
    pub date: String,
    #[serde(default, rename = "programList")]
    pub program_list: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ScheduleEntry {
    #[serde(default, rename = "timeS")]
    pub time_start: Option<String>,
    #[serde(default, rename = "timeE")]
    pub time_end: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
}

/// A programme scraped from the lstimes schedule table.
#[derive(Debug, Clone)]
pub struct ScrapedProgramme {
    pub title: String,
    pub cast_host: String,
    pub description: String,
    pub start: DateTime<Tz>,
    pub stop: Option<DateTime<Tz>>,
    pub image_url: String,
    pub original_time: String,
}
