use crate::error::{info_err, TvEpgError};
use crate::utils::decode_html_text;
use lol_html::{element, text, RewriteStrSettings};
use std::cell::RefCell;

const UNKNOWN_TITLE: &str = "未知节目";

/// The cells of one `<tr>` of the lstimes schedule table, as raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleRow {
    pub time_text: Option<String>,
    pub has_programme: bool,
    pub title: String,
    pub cast_host: String,
    pub description: String,
    pub image_url: Option<String>,
    h3_count: usize,
    sub_tt_count: usize,
}

impl ScheduleRow {
    pub fn title_or_default(&self) -> String {
        let title = self.title.trim();
        if title.is_empty() {
            String::from(UNKNOWN_TITLE)
        } else {
            title.to_string()
        }
    }
}

fn with_row<F: FnOnce(&mut ScheduleRow)>(rows: &RefCell<Vec<ScheduleRow>>, f: F) {
    if let Some(row) = rows.borrow_mut().last_mut() {
        f(row);
    }
}

/// Collects the schedule rows of the html table.
pub fn parse_schedule_rows(html: &str) -> Result<Vec<ScheduleRow>, TvEpgError> {
    let rows: RefCell<Vec<ScheduleRow>> = RefCell::new(Vec::new());

    let settings = RewriteStrSettings {
        element_content_handlers: vec![
            element!("tr", |_el| {
                rows.borrow_mut().push(ScheduleRow::default());
                Ok(())
            }),
            element!("td.extvs-table1-time", |_el| {
                with_row(&rows, |row| { row.time_text.get_or_insert_with(String::new); });
                Ok(())
            }),
            text!("td.extvs-table1-time", |t| {
                with_row(&rows, |row| row.time_text.get_or_insert_with(String::new).push_str(t.as_str()));
                Ok(())
            }),
            element!("td.extvs-table1-programme", |_el| {
                with_row(&rows, |row| row.has_programme = true);
                Ok(())
            }),
            element!("td.extvs-table1-programme h3", |_el| {
                with_row(&rows, |row| row.h3_count += 1);
                Ok(())
            }),
            text!("td.extvs-table1-programme h3", |t| {
                with_row(&rows, |row| if row.h3_count == 1 { row.title.push_str(t.as_str()); });
                Ok(())
            }),
            element!("td.extvs-table1-programme span.sub-tt", |_el| {
                with_row(&rows, |row| row.sub_tt_count += 1);
                Ok(())
            }),
            text!("td.extvs-table1-programme span.sub-tt", |t| {
                with_row(&rows, |row| if row.sub_tt_count == 1 { row.cast_host.push_str(t.as_str()); });
                Ok(())
            }),
            text!("td.extvs-table1-programme div.tvs-modal-content div.tvs_modal_des", |t| {
                with_row(&rows, |row| row.description.push_str(t.as_str()));
                Ok(())
            }),
            element!("td.extvs-table1-image img[src]", |el| {
                let src = el.get_attribute("src");
                with_row(&rows, |row| if row.image_url.is_none() { row.image_url = src; });
                Ok(())
            }),
        ],
        ..RewriteStrSettings::default()
    };

    lol_html::rewrite_str(html, settings).map_err(|err| info_err!("can't parse schedule html: {err}"))?;

    Ok(rows.into_inner().into_iter()
        .map(|mut row| {
            row.time_text = row.time_text.map(|t| decode_html_text(&t).into_owned());
            row.title = decode_html_text(row.title.trim()).into_owned();
            row.cast_host = decode_html_text(row.cast_host.trim()).into_owned();
            row.description = decode_html_text(&row.description).into_owned();
            row.image_url = row.image_url.map(|u| decode_html_text(u.trim()).into_owned());
            row
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::parse_schedule_rows;

    const HTML: &str = r#"
<table class="extvs-table1">
  <thead><tr><th>时间</th><th></th><th>节目</th></tr></thead>
  <tbody>
    <tr>
      <td class="extvs-table1-time"><span>北京 上午 9:00</span>
<span>东 下午 8:00</span></td>
      <td class="extvs-table1-image"><img src="https://lstimes.ca/a.jpg" alt=""></td>
      <td class="extvs-table1-programme">
        <h3>新闻 &amp; 头条</h3>
        <span class="sub-tt">主持: 王小明</span>
        <div class="tvs-modal-content"><h3>新闻 &amp; 头条</h3>
          <div class="tvs_modal_des">
            新闻 &amp; 头条
            主持: 王小明
            <span class="md-date">2025-11-07</span>
            今日要闻回顾
          </div>
        </div>
      </td>
    </tr>
    <tr>
      <td class="extvs-table1-time">东 10:30 PM</td>
      <td class="extvs-table1-programme"><span class="sub-tt">N/A</span></td>
    </tr>
  </tbody>
</table>"#;

    #[test]
    fn test_parse_schedule_rows() {
        let rows = parse_schedule_rows(HTML).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].time_text.is_none());

        let first = &rows[1];
        assert!(first.time_text.as_deref().is_some_and(|t| t.contains("东 下午 8:00")));
        assert_eq!(first.title, "新闻 & 头条");
        assert_eq!(first.cast_host, "主持: 王小明");
        assert_eq!(first.image_url.as_deref(), Some("https://lstimes.ca/a.jpg"));
        assert!(first.description.contains("今日要闻回顾"));

        let second = &rows[2];
        assert!(second.has_programme);
        assert_eq!(second.title_or_default(), "未知节目");
        assert_eq!(second.cast_host, "N/A");
        assert!(second.image_url.is_none());
    }

    #[test]
    fn test_parse_schedule_rows_with_bare_ampersand() {
        let html = r#"<table><tr><td class="extvs-table1-programme"><h3>Tom & Jerry &amp; friends</h3>
<div class="tvs-modal-content"><div class="tvs_modal_des">R&D &quot;特辑&quot;</div></div></td></tr></table>"#;
        let rows = parse_schedule_rows(html).unwrap();
        assert_eq!(rows[0].title, "Tom & Jerry & friends");
        assert_eq!(rows[0].description, "R&D \"特辑\"");
    }
}
