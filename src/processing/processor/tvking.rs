use crate::error::{fatal_err, TvEpgError};
use crate::model::{format_xmltv_time, DaySchedule, Epg, ScheduleEntry, TvKingChannel, TvKingConfig, XmlTag,
                   EPG_ATTRIB_CHANNEL, EPG_ATTRIB_LANG, EPG_ATTRIB_START, EPG_ATTRIB_STOP, EPG_TAG_PROGRAMME, EPG_TAG_TITLE};
use crate::processing::parser::js_literal::extract_schedule_list;
use crate::repository::epg_repository::epg_write_file;
use crate::utils::{create_client, debug_if_enabled, fetch_text, get_file_path};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use log::{info, warn};

const TAIPEI: Tz = chrono_tz::Asia::Taipei;
const LANG: &str = "zh";
const AD_PROGRAMME: &str = "ads";
const LOCAL_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

fn parse_schedule_time(date: &str, time: &str) -> Option<DateTime<Tz>> {
    let text = format!("{} {}", date.trim(), time.trim());
    LOCAL_TIME_FORMATS.iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&text, fmt).ok())
        .and_then(|naive| TAIPEI.from_local_datetime(&naive).earliest())
        .or_else(|| DateTime::parse_from_rfc3339(&text.replacen(' ', "T", 1)).ok().map(|dt| dt.with_timezone(&TAIPEI)))
        .or_else(|| DateTime::parse_from_rfc3339(time.trim()).ok().map(|dt| dt.with_timezone(&TAIPEI)))
}

/// Xmltv start and stop of a schedule entry in Taipei time.
/// Unparseable values are passed through as `<date> <time>`.
pub fn format_schedule_times(date: &str, time_start: &str, time_end: &str) -> (String, String) {
    let start = parse_schedule_time(date, time_start);
    let stop = parse_schedule_time(date, time_end).map(|stop| match start {
        // ends after midnight
        Some(start) if stop <= start => stop + Duration::days(1),
        _ => stop,
    });
    let render = |time: Option<DateTime<Tz>>, raw: &str| {
        time.map_or_else(|| format!("{} {}", date.trim(), raw.trim()), |t| format_xmltv_time(&t))
    };
    (render(start, time_start), render(stop, time_end))
}

fn listed_entry(entry: &ScheduleEntry) -> Option<(&str, &str, &str)> {
    let time_start = entry.time_start.as_deref().filter(|t| !t.trim().is_empty())?;
    let time_end = entry.time_end.as_deref().filter(|t| !t.trim().is_empty())?;
    let title = entry.program.as_deref().unwrap_or_default();
    if title == AD_PROGRAMME {
        return None;
    }
    Some((time_start, time_end, title))
}

pub fn schedule_to_programmes(channel_name: &str, schedule: &[DaySchedule]) -> Vec<XmlTag> {
    let mut result = Vec::new();
    for day in schedule {
        for entry in &day.program_list {
            let Some((time_start, time_end, title)) = listed_entry(entry) else { continue; };
            let (start, stop) = format_schedule_times(&day.date, time_start, time_end);
            result.push(XmlTag::new(EPG_TAG_PROGRAMME)
                .with_attribute(EPG_ATTRIB_CHANNEL, channel_name)
                .with_attribute(EPG_ATTRIB_START, &start)
                .with_attribute(EPG_ATTRIB_STOP, &stop)
                .with_child(XmlTag::new(EPG_TAG_TITLE).with_attribute(EPG_ATTRIB_LANG, LANG).with_text(title)));
        }
    }
    result
}

pub fn add_channel_schedule(epg: &mut Epg, channel: &TvKingChannel, schedule: &[DaySchedule]) -> usize {
    epg.add_channel(&channel.name, &channel.name, LANG, None);
    let programmes = schedule_to_programmes(&channel.name, schedule);
    let count = programmes.len();
    for programme in programmes {
        epg.add_programme(programme);
    }
    count
}

/// Scrapes the configured tvking channels into one xmltv file.
pub async fn scrape_tvking_epg(cfg: &TvKingConfig, working_dir: &str) -> Result<Epg, TvEpgError> {
    let client = create_client(30, &cfg.user_agent).build()
        .map_err(|err| fatal_err!("Can't create http client: {err}"))?;

    let mut epg = Epg::new(&[
        ("generator-info-name", cfg.generator_info_name.as_str()),
        ("generator-info-url", cfg.generator_info_url.as_str()),
    ]);

    for channel in &cfg.channels {
        info!("Fetching epg of channel {}", channel.name);
        let url = format!("{}/{}", cfg.base_url.trim_end_matches('/'), channel.id);
        let Some(html) = fetch_text(&client, &url, &format!("channel page {}", channel.name)).await else {
            continue;
        };
        match extract_schedule_list(&html) {
            Ok(schedule) if !schedule.is_empty() => {
                let count = add_channel_schedule(&mut epg, channel, &schedule);
                info!("Channel {} done with {count} programmes", channel.name);
            }
            Ok(_) => warn!("No schedule data found for channel {}", channel.name),
            Err(err) => warn!("Can't extract schedule data for channel {}: {err}", channel.name),
        }
    }

    let path = get_file_path(working_dir, &cfg.output);
    epg_write_file(&epg, &path).await.map_err(|err| fatal_err!("{}", err.message))?;
    debug_if_enabled!("{} channels and {} programmes written", epg.channel_count(), epg.programme_count());
    info!("Epg written to {}", path.display());
    Ok(epg)
}

#[cfg(test)]
mod tests {
    use super::{add_channel_schedule, format_schedule_times, schedule_to_programmes};
    use crate::model::{DaySchedule, Epg, TvKingChannel};

    fn schedule() -> Vec<DaySchedule> {
        serde_json::from_str(r#"[{"date": "2025-11-07", "programList": [
            {"timeS": "00:00:00", "timeE": "02:00:00", "program": "F1 大奖赛"},
            {"timeS": "02:00:00", "timeE": "02:05:00", "program": "ads"},
            {"program": "ads"},
            {"timeS": "23:00:00", "program": "缺少结束"},
            {"timeS": "23:30", "timeE": "01:00", "program": "跨夜"}
        ]}]"#).unwrap()
    }

    #[test]
    fn test_format_schedule_times() {
        assert_eq!(format_schedule_times("2025-11-07", "00:00:00", "01:30:00"),
                   ("20251107000000 +0800".to_string(), "20251107013000 +0800".to_string()));
        assert_eq!(format_schedule_times("2025-11-07", "23:30:00", "00:30:00").1, "20251108003000 +0800");
        assert_eq!(format_schedule_times("2025-11-07", "x", "01:00:00").0, "2025-11-07 x");
        assert_eq!(format_schedule_times("2025-11-07", "2025-11-07T00:00:00Z", "2025-11-07T01:00:00Z"),
                   ("20251107080000 +0800".to_string(), "20251107090000 +0800".to_string()));
    }

    #[test]
    fn test_schedule_to_programmes() {
        let programmes = schedule_to_programmes("DAZN 1", &schedule());
        assert_eq!(programmes.len(), 2);
        assert_eq!(programmes[0].get_attribute_value("channel"), Some("DAZN 1"));
        assert_eq!(programmes[0].get_attribute_value("start"), Some("20251107000000 +0800"));
        assert_eq!(programmes[0].children[0].value.as_deref(), Some("F1 大奖赛"));
        assert_eq!(programmes[1].get_attribute_value("stop"), Some("20251108010000 +0800"));
    }

    #[test]
    fn test_add_channel_schedule() {
        let mut epg = Epg::new(&[]);
        let channel = TvKingChannel { id: "325".to_string(), name: "DAZN 1".to_string() };
        assert_eq!(add_channel_schedule(&mut epg, &channel, &schedule()), 2);
        assert_eq!(epg.channel_count(), 1);
        assert_eq!(epg.programme_count(), 2);
    }
}
