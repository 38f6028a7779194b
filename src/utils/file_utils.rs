use crate::utils::CONSTANTS;
use log::error;
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const IO_BUFFER_SIZE: usize = 256 * 1024; // 256kb

pub fn file_reader<R>(r: R) -> std::io::BufReader<R>
where
    R: std::io::Read,
{
    std::io::BufReader::with_capacity(IO_BUFFER_SIZE, r)
}

pub fn resolve_env_var(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    CONSTANTS.re_env_var.replace_all(value, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_else(|e| {
            error!("Could not resolve env var '{var_name}': {e}");
            format!("${{env:{var_name}}}")
        })
    }).to_string()
}

/// Reads a config file and resolves `${env:NAME}` placeholders.
pub fn read_config_text(path: &str) -> std::io::Result<String> {
    let mut content = String::new();
    file_reader(File::open(path)?).read_to_string(&mut content)?;
    Ok(resolve_env_var(&content))
}

/// Relative paths are resolved against the working dir, absolute paths are kept.
pub fn get_file_path(working_dir: &str, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() || working_dir.is_empty() {
        path.to_path_buf()
    } else {
        Path::new(working_dir).join(path)
    }
}
