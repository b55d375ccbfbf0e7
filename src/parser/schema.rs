//! Model schema - the persisted form of a state machine model
//!
//! ```toml
//! [[states]]
//! name = "IDLE"
//! class = "observational"
//!
//! [[transitions]]
//! source = "IDLE"
//! target = "CONFIGURING"
//! trigger_label = "Configure"
//! trigger_kind = "command"
//! ```

use crate::error::{Error, Result};
use crate::parser::parser_for;
use crate::state_machine::{StateClass, StateMachineModel, TriggerKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Model schema definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
    #[serde(default)]
    pub states: Vec<StateRecord>,
    #[serde(default)]
    pub transitions: Vec<TransitionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub name: String,
    pub class: String,
}

/// Kinds stay textual so an unknown value is reported as a malformed
/// transition rather than a deserialization failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub source: String,
    pub target: String,
    pub trigger_label: String,
    pub trigger_kind: String,
}

impl ModelSchema {
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)?;
        parser_for(&path)
            .parse_schema(&contents)
            .map_err(|e| e.in_file(&path))
    }

    /// Read a schema file and build its model, parse errors naming the file
    pub fn load_model(path: impl Into<PathBuf>) -> Result<StateMachineModel> {
        let path = path.into();
        Self::from_file(&path)?
            .into_model()
            .map_err(|e| e.in_file(&path))
    }

    /// Write the schema, format chosen from the file extension
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = parser_for(path).render_schema(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Snapshot of an existing model, in declaration order
    pub fn from_model(model: &StateMachineModel) -> Self {
        Self {
            states: model
                .states()
                .iter()
                .map(|s| StateRecord {
                    name: s.name.clone(),
                    class: s.class.to_string(),
                })
                .collect(),
            transitions: model
                .transitions()
                .iter()
                .map(|t| TransitionRecord {
                    source: model.state_at(t.source).name.clone(),
                    target: model.state_at(t.target).name.clone(),
                    trigger_label: t.trigger_label.clone(),
                    trigger_kind: t.trigger_kind.to_string(),
                })
                .collect(),
        }
    }

    /// Build a model by replaying every record through the model's own
    /// construction checks.
    pub fn into_model(&self) -> Result<StateMachineModel> {
        let mut model = StateMachineModel::new();

        for record in &self.states {
            let class = record
                .class
                .parse::<StateClass>()
                .map_err(|_| Error::SchemaParse {
                    file: PathBuf::from("unknown"),
                    message: format!(
                        "state {} has unknown class '{}'",
                        record.name, record.class
                    ),
                })?;
            model.add_state(record.name.as_str(), class)?;
        }

        for (idx, record) in self.transitions.iter().enumerate() {
            let kind = record.trigger_kind.parse::<TriggerKind>().map_err(|_| {
                Error::malformed_transition(format!(
                    "transition #{} ({} -> {}) has unrecognized trigger kind '{}'",
                    idx + 1,
                    record.source,
                    record.target,
                    record.trigger_kind
                ))
            })?;
            model.add_transition(
                &record.source,
                &record.target,
                record.trigger_label.as_str(),
                kind,
            )?;
        }

        tracing::debug!(
            states = model.states().len(),
            transitions = model.transitions().len(),
            "loaded model from schema"
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::reference_model;
    use std::io::Write;

    const TOML_SCHEMA: &str = r#"
[[states]]
name = "IDLE"
class = "observational"

[[states]]
name = "CONFIGURING"
class = "observational"

[[transitions]]
source = "IDLE"
target = "CONFIGURING"
trigger_label = "Configure"
trigger_kind = "command"
"#;

    #[test]
    fn test_parse_toml_schema() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(TOML_SCHEMA.as_bytes()).unwrap();

        let schema = ModelSchema::from_file(file.path()).unwrap();
        assert_eq!(schema.states.len(), 2);
        assert_eq!(schema.transitions[0].trigger_kind, "command");

        let model = schema.into_model().unwrap();
        assert_eq!(model.transitions().len(), 1);
        assert!(model.transitions()[0].is_command());
    }

    #[test]
    fn test_parse_json_schema() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(
            br#"{
                "states": [{"name": "ABORTING", "class": "observational"},
                           {"name": "ABORTED", "class": "observational"}],
                "transitions": [{"source": "ABORTING", "target": "ABORTED",
                                 "trigger_label": "Abort complete", "trigger_kind": "event"}]
            }"#,
        )
        .unwrap();

        let model = ModelSchema::from_file(file.path())
            .unwrap()
            .into_model()
            .unwrap();
        assert!(model.transitions()[0].is_event());
    }

    #[test]
    fn test_parse_error_names_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[[states]\nname = ").unwrap();

        let err = ModelSchema::from_file(file.path()).unwrap_err();
        match err {
            Error::SchemaParse { file: path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_trigger_kind() {
        let mut schema: ModelSchema = toml::from_str(TOML_SCHEMA).unwrap();
        schema.transitions[0].trigger_kind = "signal".to_string();
        assert!(matches!(
            schema.into_model(),
            Err(Error::MalformedTransition(_))
        ));
    }

    #[test]
    fn test_unknown_state_class() {
        let schema = ModelSchema {
            states: vec![StateRecord {
                name: "IDLE".to_string(),
                class: "power".to_string(),
            }],
            transitions: Vec::new(),
        };
        match schema.into_model() {
            Err(Error::SchemaParse { message, .. }) => {
                assert!(message.contains("IDLE"));
                assert!(message.contains("power"));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[[states]]\nname = \"IDLE\"\nclass = \"power\"\n")
            .unwrap();
        match ModelSchema::load_model(file.path()) {
            Err(Error::SchemaParse { file: path, .. }) => assert_eq!(path, file.path()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_dangling_transition() {
        let mut schema: ModelSchema = toml::from_str(TOML_SCHEMA).unwrap();
        schema.transitions[0].target = "READY".to_string();
        assert!(schema.into_model().unwrap_err().is_unknown_state());
    }

    #[test]
    fn test_reference_model_survives_file_round_trip() {
        let model = reference_model().unwrap();
        let schema = ModelSchema::from_model(&model);

        let dir = tempfile::tempdir().unwrap();
        for name in ["model.toml", "model.json"] {
            let path = dir.path().join(name);
            schema.to_file(&path).unwrap();
            let reloaded = ModelSchema::from_file(&path).unwrap();
            assert_eq!(reloaded, schema);

            let rebuilt = reloaded.into_model().unwrap();
            assert_eq!(rebuilt.states(), model.states());
            assert_eq!(rebuilt.transitions(), model.transitions());
        }
    }
}
