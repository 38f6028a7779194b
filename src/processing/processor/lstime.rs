use crate::error::{fatal_err, TvEpgError};
use crate::model::{format_xmltv_time, programme_tag, Epg, LsTimeConfig, ScrapedProgramme, XmlTag,
                   EPG_ATTRIB_LANG, EPG_ATTRIB_SRC, EPG_TAG_CATEGORY, EPG_TAG_DESC, EPG_TAG_ICON, EPG_TAG_SUB_TITLE};
use crate::processing::parser::schedule_html::{parse_schedule_rows, ScheduleRow};
use crate::repository::epg_repository::epg_write_file;
use crate::utils::{create_client, debug_if_enabled, get_file_path, post_form_json, CONSTANTS, DEFAULT_BROWSER_USER_AGENT};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use log::{error, info, warn};
use std::collections::HashSet;
use std::time::Duration;

const BEIJING: Tz = chrono_tz::Asia::Shanghai;
const EASTERN: Tz = chrono_tz::America::Toronto;
const LANG: &str = "zh";
const NOT_AVAILABLE: &str = "N/A";

const SCHEDULE_ACTION: &str = "extvs_get_schedule_simple";
const SCHEDULE_CHANNEL: &str = "节目表";
const PARAM_SHORTCODE: &str = r#"{"style":"1","fullcontent_in":"modal","show_image":"show","channel":"","slidesshow":"4","slidesscroll":"1","start_on":"1","before_today":"1","after_today":"7","order":"DESC","orderby":"date","meta_key":"","meta_value":"","ID":"ex-1160"}"#;

const SOURCE_INFO_NAME: &str = "lstimes.ca";
const GENERATOR_INFO_NAME: &str = "TV Schedule Converter";

pub fn beijing_today() -> NaiveDate {
    Utc::now().with_timezone(&BEIJING).date_naive()
}

fn date_range(first: NaiveDate, count: u64) -> Vec<NaiveDate> {
    first.iter_days().take(usize::try_from(count).unwrap_or(usize::MAX)).collect()
}

/// `today - days_before ..= today + days_after`
pub fn request_dates(today: NaiveDate, days_before: u32, days_after: u32) -> Vec<NaiveDate> {
    let first = today.checked_sub_days(Days::new(u64::from(days_before))).unwrap_or(today);
    date_range(first, u64::from(days_before) + u64::from(days_after) + 1)
}

/// `today ..= today + output_days - 1`
pub fn output_dates(today: NaiveDate, output_days: u32) -> Vec<NaiveDate> {
    date_range(today, u64::from(output_days))
}

/// Unix timestamp of the UTC midnight of the date.
pub fn request_timestamp(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

// the site expects the already percent encoded value, the form encoding is applied on top
fn encoded_channel() -> String {
    url::form_urlencoded::byte_serialize(SCHEDULE_CHANNEL.as_bytes()).collect()
}

pub fn schedule_form(date: NaiveDate) -> Vec<(&'static str, String)> {
    vec![
        ("action", String::from(SCHEDULE_ACTION)),
        ("param_shortcode", String::from(PARAM_SHORTCODE)),
        ("date", request_timestamp(date).to_string()),
        ("chanel", encoded_channel()),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

fn detect_meridiem(text: &str) -> Option<Meridiem> {
    let upper = text.to_uppercase();
    if text.contains("下午") || upper.contains("PM") {
        Some(Meridiem::Pm)
    } else if text.contains("上午") || upper.contains("AM") {
        Some(Meridiem::Am)
    } else {
        None
    }
}

/// Parses the eastern time line of a time cell (`东 下午 8:00`) on the given date
/// and converts it to Beijing time.
pub fn parse_eastern_time(time_text: &str, date: NaiveDate) -> Option<DateTime<Tz>> {
    let line = time_text.lines().map(str::trim).find(|l| l.contains('东') || l.contains('東'))?;
    let caps = CONSTANTS.re_clock.captures(line)?;
    let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
    match detect_meridiem(line) {
        Some(Meridiem::Pm) if hour < 12 => hour += 12,
        Some(Meridiem::Am) if hour == 12 => hour = 0,
        _ => {}
    }
    let naive = date.and_hms_opt(hour, minute, 0)?;
    EASTERN.from_local_datetime(&naive).earliest().map(|dt| dt.with_timezone(&BEIJING))
}

/// Description lines without the repeated title, cast and date lines.
pub fn clean_description(text: &str, title: &str, cast_host: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| title.is_empty() || !line.contains(title))
        .filter(|line| cast_host.is_empty() || !line.contains(cast_host))
        .filter(|line| !line.contains("md-date") && !CONSTANTS.re_date_prefix.is_match(line))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn categorize(programme: &ScrapedProgramme) -> &'static str {
    let title = programme.title.as_str();
    let in_any = |keyword: &str| title.contains(keyword) || programme.description.contains(keyword);
    if title.contains("新闻") {
        "新闻"
    } else if title.contains("娱乐") || title.contains("头条") {
        "娱乐"
    } else if in_any("旅行") {
        "旅游"
    } else if in_any("侦探") {
        "犯罪"
    } else if in_any("爱情") {
        "爱情"
    } else if programme.cast_host.contains("主持") {
        "综艺"
    } else {
        "电影"
    }
}

fn row_to_programme(row: &ScheduleRow, date: NaiveDate) -> Option<ScrapedProgramme> {
    let time_text = row.time_text.as_deref()?;
    let Some(start) = parse_eastern_time(time_text, date) else {
        warn!("Can't parse time: {}", time_text.trim());
        return None;
    };
    if !row.has_programme {
        return None;
    }
    let title = row.title_or_default();
    let description = clean_description(&row.description, &title, &row.cast_host);
    Some(ScrapedProgramme {
        title,
        cast_host: row.cast_host.clone(),
        description,
        start,
        stop: None,
        image_url: row.image_url.clone().unwrap_or_default(),
        original_time: time_text.trim().to_string(),
    })
}

pub fn parse_schedule_html(html: &str, date: NaiveDate) -> Result<Vec<ScrapedProgramme>, TvEpgError> {
    let rows = parse_schedule_rows(html)?;
    Ok(rows.iter().filter_map(|row| row_to_programme(row, date)).collect())
}

/// Drops duplicates, sets the stop to the start of the following programme
/// and keeps the programmes starting on one of the output dates.
/// The last programme has no stop and is dropped.
pub fn finalize_programmes(programmes: Vec<ScrapedProgramme>, output_dates: &[NaiveDate]) -> Vec<ScrapedProgramme> {
    let mut seen = HashSet::new();
    let mut unique: Vec<ScrapedProgramme> = programmes.into_iter()
        .filter(|p| seen.insert((p.start, p.title.clone())))
        .collect();
    unique.sort_by_key(|p| p.start);

    let next_starts: Vec<Option<DateTime<Tz>>> = unique.iter().skip(1).map(|p| Some(p.start)).chain(std::iter::once(None)).collect();
    unique.into_iter()
        .zip(next_starts)
        .filter_map(|(mut p, stop)| {
            p.stop = Some(stop?);
            Some(p)
        })
        .filter(|p| output_dates.contains(&p.start.date_naive()))
        .collect()
}

pub fn programme_to_tag(channel_id: &str, programme: &ScrapedProgramme) -> Option<XmlTag> {
    let stop = programme.stop.as_ref()?;
    let mut tag = programme_tag(channel_id, &format_xmltv_time(&programme.start), &format_xmltv_time(stop), &programme.title, LANG);
    if !programme.cast_host.is_empty() && programme.cast_host != NOT_AVAILABLE {
        tag = tag.with_child(XmlTag::new(EPG_TAG_SUB_TITLE).with_attribute(EPG_ATTRIB_LANG, LANG).with_text(&programme.cast_host));
    }
    if !programme.description.is_empty() {
        tag = tag.with_child(XmlTag::new(EPG_TAG_DESC).with_attribute(EPG_ATTRIB_LANG, LANG).with_text(&programme.description));
    }
    tag = tag.with_child(XmlTag::new(EPG_TAG_CATEGORY).with_attribute(EPG_ATTRIB_LANG, LANG).with_text(categorize(programme)));
    if !programme.image_url.is_empty() {
        tag = tag.with_child(XmlTag::new(EPG_TAG_ICON).with_attribute(EPG_ATTRIB_SRC, &programme.image_url));
    }
    Some(tag)
}

pub fn build_lstime_epg(cfg: &LsTimeConfig, programmes: &[ScrapedProgramme]) -> Epg {
    let mut epg = Epg::new(&[
        ("source-info-name", SOURCE_INFO_NAME),
        ("generator-info-name", GENERATOR_INFO_NAME),
        ("generator-info-url", ""),
    ]);
    let icon = Some(cfg.channel_icon.as_str()).filter(|i| !i.is_empty());
    epg.add_channel(&cfg.channel_id, &cfg.channel_name, LANG, icon);
    for tag in programmes.iter().filter_map(|p| programme_to_tag(&cfg.channel_id, p)) {
        epg.add_programme(tag);
    }
    epg
}

pub fn count_by_date(programmes: &[ScrapedProgramme], dates: &[NaiveDate]) -> Vec<(NaiveDate, usize)> {
    dates.iter()
        .map(|date| (*date, programmes.iter().filter(|p| p.start.date_naive() == *date).count()))
        .collect()
}

async fn fetch_schedule(client: &reqwest::Client, api_url: &str, date: NaiveDate) -> Result<Vec<ScrapedProgramme>, TvEpgError> {
    let response = post_form_json(client, api_url, &schedule_form(date)).await?;
    let html = response.get("html").and_then(serde_json::Value::as_str).unwrap_or_default();
    parse_schedule_html(html, date)
}

/// Scrapes the lstimes schedule of the configured date range into one xmltv file.
pub async fn scrape_lstime_epg(cfg: &LsTimeConfig, working_dir: &str) -> Result<Epg, TvEpgError> {
    let client = create_client(30, DEFAULT_BROWSER_USER_AGENT).build()
        .map_err(|err| fatal_err!("Can't create http client: {err}"))?;

    let today = beijing_today();
    let request_dates = request_dates(today, cfg.days_before, cfg.days_after);
    let output_dates = output_dates(today, cfg.output_days);
    if let (Some(first), Some(last)) = (request_dates.first(), request_dates.last()) {
        info!("Request dates: {first} - {last}");
    }
    if let (Some(first), Some(last)) = (output_dates.first(), output_dates.last()) {
        info!("Output dates: {first} - {last}");
    }

    let mut all_programmes = Vec::new();
    for (idx, date) in request_dates.iter().enumerate() {
        if idx > 0 && cfg.request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(cfg.request_delay_ms)).await;
        }
        match fetch_schedule(&client, &cfg.api_url, *date).await {
            Ok(programmes) => {
                info!("Fetched {} programmes for {date}", programmes.len());
                for p in &programmes {
                    debug_if_enabled!("{} {} ({})", p.start, p.title, p.original_time);
                }
                all_programmes.extend(programmes);
            }
            Err(err) => error!("Failed to fetch schedule for {date}: {err}"),
        }
    }
    info!("Fetched {} programmes in total", all_programmes.len());

    let programmes = finalize_programmes(all_programmes, &output_dates);
    info!("Keeping {} programmes", programmes.len());

    let epg = build_lstime_epg(cfg, &programmes);
    let path = get_file_path(working_dir, &cfg.output);
    epg_write_file(&epg, &path).await.map_err(|err| fatal_err!("{}", err.message))?;
    info!("Epg written to {}", path.display());

    for (date, count) in count_by_date(&programmes, &output_dates) {
        info!("{date}: {count} programmes");
    }
    Ok(epg)
}
