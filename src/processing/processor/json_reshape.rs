use crate::error::{info_err, info_err_res, TvEpgError};
use serde_json::{Map, Value};
use std::path::Path;

/// Wraps every value of the top level object into a one element array.
pub fn wrap_values(value: Value) -> Result<Value, TvEpgError> {
    let Value::Object(map) = value else {
        return info_err_res!("Expected a json object at top level");
    };
    let wrapped: Map<String, Value> = map.into_iter()
        .map(|(key, value)| (key, Value::Array(vec![value])))
        .collect();
    Ok(Value::Object(wrapped))
}

pub fn reshape_json_str(content: &str) -> Result<String, TvEpgError> {
    let value: Value = serde_json::from_str(content).map_err(|err| info_err!("Invalid json: {err}"))?;
    serde_json::to_string_pretty(&wrap_values(value)?).map_err(|err| info_err!("Can't serialize json: {err}"))
}

pub async fn reshape_json_file(input: &Path, output: &Path) -> Result<(), TvEpgError> {
    let content = tokio::fs::read_to_string(input).await
        .map_err(|err| info_err!("Can't read {}: {err}", input.display()))?;
    let reshaped = reshape_json_str(&content)
        .map_err(|err| info_err!("{}: {err}", input.display()))?;
    tokio::fs::write(output, reshaped).await
        .map_err(|err| info_err!("Can't write {}: {err}", output.display()))
}

#[cfg(test)]
mod tests {
    use super::{reshape_json_file, reshape_json_str};

    #[test]
    fn test_reshape_json_str() {
        let reshaped = reshape_json_str(r#"{"z": "新闻", "a": {"x": 1}, "m": [1]}"#).unwrap();
        assert_eq!(reshaped, "{\n  \"z\": [\n    \"新闻\"\n  ],\n  \"a\": [\n    {\n      \"x\": 1\n    }\n  ],\n  \"m\": [\n    [\n      1\n    ]\n  ]\n}");
        assert!(reshape_json_str("[1, 2]").is_err());
        assert!(reshape_json_str("{").is_err());
        assert_eq!(reshape_json_str("{}").unwrap(), "{}");
    }

    #[test]
    fn test_reshape_keeps_numbers_exact() {
        let reshaped = reshape_json_str(r#"{"a": 123456789012345678901234567890, "b": 0.1000000000000000055511151231257827}"#).unwrap();
        assert_eq!(reshaped, "{\n  \"a\": [\n    123456789012345678901234567890\n  ],\n  \"b\": [\n    0.1000000000000000055511151231257827\n  ]\n}");
    }

    #[tokio::test]
    async fn test_reshape_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("epg_title_info.json");
        let output = dir.path().join("epg_title_info_transformed.json");
        std::fs::write(&input, r#"{"CCTV1": "综合"}"#).unwrap();
        reshape_json_file(&input, &output).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(value["CCTV1"][0], "综合");
    }
}
