use serde_json::Value;

pub fn deserialize_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Value = serde::Deserialize::deserialize(deserializer)?;

    match &value {
        Value::String(s) => Ok(s.to_string()),
        Value::Null => Ok(String::new()),
        _ => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Entry {
        #[serde(deserialize_with = "crate::utils::deserialize_as_string")]
        id: String,
    }

    #[test]
    fn test_deserialize_as_string() {
        assert_eq!(serde_json::from_str::<Entry>(r#"{"id": 12}"#).unwrap().id, "12");
        assert_eq!(serde_json::from_str::<Entry>(r#"{"id": "cctv1"}"#).unwrap().id, "cctv1");
        assert_eq!(serde_json::from_str::<Entry>(r#"{"id": null}"#).unwrap().id, "");
    }
}
