mod config;
mod epg_index;
mod m3u;
mod schedule;
mod xmltv;

pub use self::config::*;
pub use self::epg_index::*;
pub use self::m3u::*;
pub use self::schedule::*;
pub use self::xmltv::*;
