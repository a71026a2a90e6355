use anyhow::Result;
use serde::Serialize;

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaps::GapMatrix;
    use crate::optimizer::IdealGoals;

    #[test]
    fn goals_render_as_nested_objects() {
        let rendered = render_json(&IdealGoals::default()).expect("json");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");
        assert_eq!(value["operation"]["optimal_capacity"], 40.0);
    }

    #[test]
    fn empty_matrix_renders_empty_entries() {
        let rendered = render_json(&GapMatrix::default()).expect("json");
        assert!(rendered.contains("\"entries\": {}"));
    }
}
