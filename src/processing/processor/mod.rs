pub mod epg_downloader;
pub mod json_reshape;
pub mod lstime;
pub mod m3u_generator;
pub mod name_cleaner;
pub mod normalize;
pub mod tvking;
