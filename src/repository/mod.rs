pub mod epg_repository;
pub mod m3u_repository;
