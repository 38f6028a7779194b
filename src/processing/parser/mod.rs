pub mod channel_list;
pub mod js_literal;
pub mod m3u;
pub mod schedule_html;
