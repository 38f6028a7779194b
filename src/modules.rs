#[macro_export]
macro_rules! include_modules {
    () => {
        extern crate env_logger;
        pub mod error;
        pub mod model;
        pub mod processing;
        pub mod repository;
        pub mod utils;
    }
}
